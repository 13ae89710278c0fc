//! Axial geometry shared by the tab placement routines.
//!
//! All positions are measured along the rocket axis from a common reference
//! (usually the top of the parent body tube) and may be negative.

use crate::error::{ensure_finite, ensure_non_negative, GeometryError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Axial extent of one support ring (or of several rings merged together).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingInterval {
    pub start: f64,
    pub thickness: f64,
}

impl RingInterval {
    pub fn new(start: f64, thickness: f64) -> Self {
        Self { start, thickness }
    }

    /// Trailing edge of the ring.
    pub fn end(&self) -> f64 {
        self.start + self.thickness
    }

    /// Returns the smallest interval covering both `self` and `other`.
    pub fn merge(&self, other: &RingInterval) -> RingInterval {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        RingInterval::new(start, end - start)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        ensure_finite("ring start", self.start)?;
        ensure_non_negative("ring thickness", self.thickness)
    }
}

/// Axial extent of a fin root chord.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinSpan {
    pub start: f64,
    pub length: f64,
}

impl FinSpan {
    pub fn new(start: f64, length: f64) -> Self {
        Self { start, length }
    }

    /// Trailing edge of the root chord.
    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    pub fn midpoint(&self) -> f64 {
        self.start + self.length / 2.0
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        ensure_finite("fin start", self.start)?;
        ensure_non_negative("fin length", self.length)
    }
}

/// Which ring configuration determined a tab placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabPlacement {
    /// No bounding ring; the tab spans the full root chord.
    Unconstrained,
    /// A single ring overlaps the leading edge; the tab starts behind it.
    BehindLeadingRing,
    /// A single ring lies entirely ahead of the fin.
    AheadOfRing,
    /// The top ring lies ahead of the fin; the tab runs up to the bottom ring.
    UpToTrailingRing,
    /// The bottom ring sits past the trailing edge; the tab runs to the trailing edge.
    BehindLeadingRingToTrailingEdge,
    /// Both rings fall within the root chord; the tab fills the gap between them.
    BetweenRings,
}

/// Tab position relative to the fin's leading edge, and tab length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabResult {
    pub offset: f64,
    pub length: f64,
    pub placement: TabPlacement,
}

/// Sorts rings by leading edge and coalesces any that touch or overlap.
///
/// Consecutive intervals of the result satisfy `a.end() < b.start`.
pub fn merge_intervals(rings: &[RingInterval]) -> Vec<RingInterval> {
    let mut sorted = rings.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<RingInterval> = Vec::with_capacity(sorted.len());
    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for ring in iter {
        if current.end() >= ring.start {
            current = current.merge(&ring);
        } else {
            merged.push(current);
            current = ring;
        }
    }
    merged.push(current);

    debug!(
        input = rings.len(),
        merged = merged.len(),
        "merged ring intervals"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn merge_of_empty_input_is_empty() {
        assert!(merge_intervals(&[]).is_empty());
    }

    #[test]
    fn adjacent_rings_collapse_into_one() {
        let rings = [RingInterval::new(0.0, 0.01), RingInterval::new(0.01, 0.01)];
        let merged = merge_intervals(&rings);
        assert_eq!(merged.len(), 1);
        assert_close(merged[0].start, 0.0);
        assert_close(merged[0].thickness, 0.02);
    }

    #[test]
    fn contained_ring_does_not_shrink_the_merge() {
        let rings = [RingInterval::new(0.0, 0.1), RingInterval::new(0.02, 0.01)];
        let merged = merge_intervals(&rings);
        assert_eq!(merged.len(), 1);
        assert_close(merged[0].end(), 0.1);
    }

    #[test]
    fn unordered_input_is_sorted() {
        let rings = [
            RingInterval::new(0.5, 0.01),
            RingInterval::new(-0.2, 0.01),
            RingInterval::new(0.1, 0.01),
        ];
        let merged = merge_intervals(&rings);
        let starts: Vec<f64> = merged.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![-0.2, 0.1, 0.5]);
    }

    #[test]
    fn merge_is_idempotent_on_disjoint_input() {
        let rings = [RingInterval::new(0.0, 0.01), RingInterval::new(0.05, 0.01)];
        let once = merge_intervals(&rings);
        let twice = merge_intervals(&once);
        assert_eq!(once, twice);
        assert_eq!(once, rings.to_vec());
    }

    #[test]
    fn validate_rejects_negative_thickness() {
        let err = RingInterval::new(0.0, -0.01).validate().expect_err("negative");
        assert!(matches!(err, GeometryError::Negative { .. }));
        assert!(FinSpan::new(f64::NAN, 0.1).validate().is_err());
        assert!(FinSpan::new(-1.0, 0.0).validate().is_ok());
    }

    fn ring_strategy() -> impl Strategy<Value = RingInterval> {
        (-1.0f64..1.0, 0.0f64..0.2)
            .prop_map(|(start, thickness)| RingInterval::new(start, thickness))
    }

    fn covered(intervals: &[RingInterval], x: f64) -> bool {
        intervals.iter().any(|r| r.start <= x && x <= r.end())
    }

    proptest! {
        #[test]
        fn merged_intervals_are_sorted_and_disjoint(
            rings in prop::collection::vec(ring_strategy(), 0..12),
        ) {
            let merged = merge_intervals(&rings);
            for pair in merged.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start);
                prop_assert!(pair[0].end() < pair[1].start);
            }
        }

        #[test]
        fn merge_preserves_coverage(
            rings in prop::collection::vec(ring_strategy(), 1..12),
            x in -1.0f64..1.2,
        ) {
            let merged = merge_intervals(&rings);
            // Endpoints of merged spans can drift by rounding, so sample away from them.
            let near_edge = rings
                .iter()
                .chain(merged.iter())
                .any(|r| (r.start - x).abs() < 1e-9 || (r.end() - x).abs() < 1e-9);
            prop_assume!(!near_edge);
            prop_assert_eq!(covered(&rings, x), covered(&merged, x));
        }

        #[test]
        fn merge_is_order_independent(rings in prop::collection::vec(ring_strategy(), 0..8)) {
            let mut reversed = rings.clone();
            reversed.reverse();
            let a = merge_intervals(&rings);
            let b = merge_intervals(&reversed);
            prop_assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b.iter()) {
                prop_assert!((x.start - y.start).abs() < 1e-12);
                prop_assert!((x.end() - y.end()).abs() < 1e-12);
            }
        }
    }
}
