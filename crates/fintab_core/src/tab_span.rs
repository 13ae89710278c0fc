//! Fin tab span resolution.
//!
//! Support rings inside the body tube limit where a fin tab may sit: the tab
//! must not run through a ring, and when two rings bracket the root chord the
//! tab should fill the gap between them. The resolver picks the (at most two)
//! rings that bound the fin and derives the tab offset and length from their
//! position relative to the root chord.

use crate::geometry::{merge_intervals, FinSpan, RingInterval, TabPlacement, TabResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Indices into a merged interval list of the rings bounding a fin tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingPair {
    pub top: Option<usize>,
    pub bottom: Option<usize>,
}

/// Scans sorted, disjoint intervals and selects the top/bottom bounding rings.
pub fn select_bounding_pair(intervals: &[RingInterval], fin: &FinSpan) -> BoundingPair {
    let mut top: Option<usize> = None;
    let mut bottom: Option<usize> = None;

    for (index, ring) in intervals.iter().enumerate() {
        let Some(top_index) = top else {
            top = Some(index);
            continue;
        };

        if ring.end() <= fin.start {
            // Entirely ahead of the fin: supersedes any earlier candidate.
            top = Some(index);
            bottom = None;
        } else if intervals[top_index].end() <= fin.start {
            match bottom {
                None => {
                    if ring.end() < fin.midpoint() {
                        top = Some(index);
                    } else {
                        bottom = Some(index);
                    }
                }
                Some(bottom_index) => {
                    if ring.start <= fin.end() {
                        top = Some(bottom_index);
                        bottom = Some(index);
                    }
                }
            }
        } else if bottom.is_none() {
            bottom = Some(index);
        }
    }

    BoundingPair { top, bottom }
}

/// Computes the tab placement for an already selected bounding pair.
///
/// The returned length is never negative; ring layouts too tight to host a
/// tab yield a zero-length tab.
pub fn resolve_tab(intervals: &[RingInterval], pair: BoundingPair, fin: &FinSpan) -> TabResult {
    let top = pair.top.and_then(|i| intervals.get(i));
    let bottom = pair.bottom.and_then(|i| intervals.get(i));

    let (offset, length, placement) = match (top, bottom) {
        (None, _) => (0.0, fin.length, TabPlacement::Unconstrained),
        (Some(_), Some(_)) if pair.top == pair.bottom => {
            (0.0, fin.length, TabPlacement::Unconstrained)
        }
        (Some(top), None) if top.end() >= fin.start => (
            top.end() - fin.start,
            fin.end() - top.end(),
            TabPlacement::BehindLeadingRing,
        ),
        (Some(top), None) => {
            let gap = top.start - fin.start;
            let length = if gap < 0.0 { fin.length } else { gap };
            (0.0, length, TabPlacement::AheadOfRing)
        }
        (Some(top), Some(bottom)) if top.end() < fin.start => {
            let gap = bottom.start - fin.start;
            let length = if gap > fin.length { fin.length } else { gap };
            (0.0, length, TabPlacement::UpToTrailingRing)
        }
        (Some(top), Some(bottom)) if bottom.start > fin.end() => (
            top.end() - fin.start,
            fin.end() - top.end(),
            TabPlacement::BehindLeadingRingToTrailingEdge,
        ),
        (Some(top), Some(bottom)) => (
            top.end() - fin.start,
            bottom.start - top.end(),
            TabPlacement::BetweenRings,
        ),
    };

    TabResult {
        offset,
        length: length.max(0.0),
        placement,
    }
}

/// Places a fin tab between the support rings surrounding a fin root chord.
///
/// `rings` may be in any order and may overlap. The returned offset is
/// measured from the fin's leading edge.
pub fn compute_tab_span(rings: &[RingInterval], fin: &FinSpan) -> TabResult {
    let intervals = merge_intervals(rings);
    let pair = select_bounding_pair(&intervals, fin);
    let result = resolve_tab(&intervals, pair, fin);
    debug!(
        rings = intervals.len(),
        top = ?pair.top,
        bottom = ?pair.bottom,
        placement = ?result.placement,
        offset = result.offset,
        length = result.length,
        "resolved fin tab span"
    );
    result
}
