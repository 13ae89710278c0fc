//! Automatic fin tab sizing from the parts mounted inside the parent body.
//!
//! Collects the centering rings and inner tubes that share the fin's parent,
//! discards rings that cannot reach the fin tab, then places the tab with
//! [`compute_tab_span`] and sizes its height down to the widest inner tube.

use crate::error::{ensure_finite, ensure_non_negative};
use crate::geometry::{FinSpan, RingInterval, TabPlacement, TabResult};
use crate::tab_span::compute_tab_span;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outer radius of the parent body as a function of axial position.
pub trait BodyProfile {
    /// Radius at `x`, measured from the top of the body.
    fn radius_at(&self, x: f64) -> f64;
}

/// Parent body shapes that can carry a fin set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ParentBody {
    Tube { length: f64, radius: f64 },
    /// Straight conical section between two radii.
    Transition {
        length: f64,
        fore_radius: f64,
        aft_radius: f64,
    },
}

impl BodyProfile for ParentBody {
    fn radius_at(&self, x: f64) -> f64 {
        match *self {
            ParentBody::Tube { radius, .. } => radius,
            ParentBody::Transition {
                length,
                fore_radius,
                aft_radius,
            } => {
                if length <= 0.0 {
                    return fore_radius.max(aft_radius);
                }
                let t = (x / length).clamp(0.0, 1.0);
                fore_radius + (aft_radius - fore_radius) * t
            }
        }
    }
}

/// A centering ring positioned relative to the top of the parent body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenteringRing {
    pub axial_offset: f64,
    pub length: f64,
    pub outer_radius: f64,
}

/// An inner (motor mount) tube positioned relative to the top of the parent body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InnerTube {
    pub axial_offset: f64,
    pub length: f64,
    pub outer_radius: f64,
}

/// Fin root chord position relative to the top of the parent body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinMount {
    pub axial_offset: f64,
    pub root_chord: f64,
}

impl FinMount {
    pub fn span(&self) -> FinSpan {
        FinSpan::new(self.axial_offset, self.root_chord)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoTabInput {
    pub fin: Option<FinMount>,
    #[serde(default)]
    pub rings: Vec<CenteringRing>,
    #[serde(default)]
    pub tubes: Vec<InnerTube>,
}

/// Tab dimensions produced by [`compute_auto_tab`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoTab {
    /// Tab leading edge, measured from the fin's leading edge.
    pub offset: f64,
    pub length: f64,
    /// `None` when the inner tube is wider than the parent body at the tab.
    pub height: Option<f64>,
    pub placement: TabPlacement,
    /// Number of rings that constrained the placement.
    pub supporting_rings: usize,
}

/// True when the component overlaps the fin span at all.
pub fn overlaps_fin_span(fin: &FinSpan, start: f64, length: f64) -> bool {
    let end = start + length;
    (start >= fin.start && start < fin.end())
        || (end > fin.start && end <= fin.end())
        || (start <= fin.start && end >= fin.end())
}

/// Sizes a fin tab against the rings and tubes inside the parent body.
pub fn compute_auto_tab(input: &AutoTabInput, parent: &impl BodyProfile) -> Result<AutoTab> {
    let mount = input.fin.context("Auto tab requires a fin mount.")?;
    validate_input(&mount, input)?;
    let fin = mount.span();
    info!(
        rings = input.rings.len(),
        tubes = input.tubes.len(),
        "computing fin tab"
    );

    let max_tube_radius = input
        .tubes
        .iter()
        .filter(|tube| overlaps_fin_span(&fin, tube.axial_offset, tube.length))
        .map(|tube| tube.outer_radius)
        .fold(0.0, f64::max);
    let max_ring_radius = input
        .rings
        .iter()
        .map(|ring| ring.outer_radius)
        .fold(0.0, f64::max);

    let supporting: Vec<RingInterval> = input
        .rings
        .iter()
        .filter(|ring| ring.outer_radius > max_tube_radius)
        .map(|ring| RingInterval::new(ring.axial_offset, ring.length))
        .collect();
    if supporting.len() < input.rings.len() {
        debug!(
            dropped = input.rings.len() - supporting.len(),
            max_tube_radius, "dropped rings no wider than the inner tube"
        );
    }

    let tab = if max_ring_radius > max_tube_radius && !supporting.is_empty() {
        compute_tab_span(&supporting, &fin)
    } else {
        TabResult {
            offset: 0.0,
            length: fin.length,
            placement: TabPlacement::Unconstrained,
        }
    };

    let tab_front = fin.start + tab.offset;
    let tab_end = tab_front + tab.length;
    let parent_min_radius = parent.radius_at(tab_front).min(parent.radius_at(tab_end));
    let height = parent_min_radius - max_tube_radius;

    Ok(AutoTab {
        offset: tab.offset,
        length: tab.length,
        height: (height >= 0.0).then_some(height),
        placement: tab.placement,
        supporting_rings: supporting.len(),
    })
}

fn validate_input(mount: &FinMount, input: &AutoTabInput) -> Result<()> {
    ensure_finite("fin axial offset", mount.axial_offset)?;
    ensure_non_negative("fin root chord", mount.root_chord)?;
    for (i, ring) in input.rings.iter().enumerate() {
        check_part(ring.axial_offset, ring.length, ring.outer_radius)
            .with_context(|| format!("Invalid centering ring at index {}.", i))?;
    }
    for (i, tube) in input.tubes.iter().enumerate() {
        check_part(tube.axial_offset, tube.length, tube.outer_radius)
            .with_context(|| format!("Invalid inner tube at index {}.", i))?;
    }
    Ok(())
}

fn check_part(axial_offset: f64, length: f64, outer_radius: f64) -> Result<()> {
    ensure_finite("axial offset", axial_offset)?;
    ensure_non_negative("length", length)?;
    ensure_non_negative("outer radius", outer_radius)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: ParentBody = ParentBody::Tube {
        length: 0.6,
        radius: 0.025,
    };

    fn ring(axial_offset: f64, length: f64, outer_radius: f64) -> CenteringRing {
        CenteringRing {
            axial_offset,
            length,
            outer_radius,
        }
    }

    fn mount() -> FinMount {
        FinMount {
            axial_offset: 0.5,
            root_chord: 0.125,
        }
    }

    #[test]
    fn places_tab_between_rings_and_sizes_to_tube() {
        let input = AutoTabInput {
            fin: Some(mount()),
            rings: vec![ring(0.5625, 0.004, 0.025), ring(0.4375, 0.0625, 0.025)],
            tubes: vec![InnerTube {
                axial_offset: 0.4,
                length: 0.2,
                outer_radius: 0.0125,
            }],
        };
        let tab = compute_auto_tab(&input, &BODY).expect("auto tab");
        assert_eq!(tab.placement, TabPlacement::BetweenRings);
        assert_eq!(tab.offset, 0.0);
        assert_eq!(tab.length, 0.0625);
        assert!((tab.height.expect("height") - 0.0125).abs() < 1e-12);
        assert_eq!(tab.supporting_rings, 2);
    }

    #[test]
    fn rings_no_wider_than_tube_are_ignored() {
        let input = AutoTabInput {
            fin: Some(mount()),
            rings: vec![ring(0.53, 0.004, 0.01)],
            tubes: vec![InnerTube {
                axial_offset: 0.45,
                length: 0.2,
                outer_radius: 0.012,
            }],
        };
        let tab = compute_auto_tab(&input, &BODY).expect("auto tab");
        assert_eq!(tab.placement, TabPlacement::Unconstrained);
        assert_eq!(tab.offset, 0.0);
        assert_eq!(tab.length, 0.125);
        assert_eq!(tab.supporting_rings, 0);
    }

    #[test]
    fn tubes_outside_fin_span_do_not_limit_rings() {
        let input = AutoTabInput {
            fin: Some(mount()),
            rings: vec![ring(0.4375, 0.125, 0.02)],
            tubes: vec![InnerTube {
                axial_offset: 0.0,
                length: 0.1,
                outer_radius: 0.024,
            }],
        };
        let tab = compute_auto_tab(&input, &BODY).expect("auto tab");
        assert_eq!(tab.supporting_rings, 1);
        assert_eq!(tab.placement, TabPlacement::BehindLeadingRing);
        assert_eq!(tab.offset, 0.0625);
        assert_eq!(tab.length, 0.0625);
        assert!((tab.height.expect("height") - 0.025).abs() < 1e-12);
    }

    #[test]
    fn height_is_omitted_when_tube_exceeds_body() {
        let input = AutoTabInput {
            fin: Some(mount()),
            rings: Vec::new(),
            tubes: vec![InnerTube {
                axial_offset: 0.5,
                length: 0.125,
                outer_radius: 0.03,
            }],
        };
        let tab = compute_auto_tab(&input, &BODY).expect("auto tab");
        assert_eq!(tab.height, None);
    }

    #[test]
    fn transition_uses_narrowest_radius_along_tab() {
        let parent = ParentBody::Transition {
            length: 1.0,
            fore_radius: 0.05,
            aft_radius: 0.03,
        };
        let input = AutoTabInput {
            fin: Some(FinMount {
                axial_offset: 0.5,
                root_chord: 0.5,
            }),
            rings: Vec::new(),
            tubes: Vec::new(),
        };
        let tab = compute_auto_tab(&input, &parent).expect("auto tab");
        assert!((tab.height.expect("height") - 0.03).abs() < 1e-12);
    }

    #[test]
    fn rejects_missing_fin_and_bad_parts() {
        let err = compute_auto_tab(&AutoTabInput::default(), &BODY).expect_err("no fin");
        assert!(format!("{err}").contains("fin mount"));

        let input = AutoTabInput {
            fin: Some(mount()),
            rings: vec![CenteringRing {
                axial_offset: 0.1,
                length: -0.01,
                outer_radius: 0.02,
            }],
            tubes: Vec::new(),
        };
        let err = compute_auto_tab(&input, &BODY).expect_err("negative ring length");
        assert!(format!("{err}").contains("centering ring at index 0"));
    }

    #[test]
    fn overlap_check_covers_partial_and_enclosing_parts() {
        let fin = FinSpan::new(1.0, 1.0);
        assert!(overlaps_fin_span(&fin, 1.5, 2.0));
        assert!(overlaps_fin_span(&fin, 0.0, 1.5));
        assert!(overlaps_fin_span(&fin, 0.0, 3.0));
        assert!(!overlaps_fin_span(&fin, 2.0, 1.0));
        assert!(!overlaps_fin_span(&fin, 0.0, 1.0));
    }
}
