//! Hand-authored rejection rules applied after automated prediction.

use serde::{Deserialize, Serialize};

use crate::classification::RegionState;
use crate::features::RegionProps;

/// A deterministic rule that force-rejects a region. Rules always win over
/// the model output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OverrideRule {
    /// Reject when the filled area is below this many pixels.
    MinArea(f64),
    MinConvexity(f64),
    MaxEccentricity(f64),
    MinCircularity(f64),
}

impl OverrideRule {
    /// The two rules historically hard-wired after logistic prediction:
    /// fewer than 15 pixels, or circularity below 0.6.
    pub fn legacy_defaults() -> Vec<Self> {
        vec![Self::MinArea(15.0), Self::MinCircularity(0.6)]
    }

    pub fn rejects(&self, region: &RegionProps) -> bool {
        match *self {
            Self::MinArea(px) => (region.filled_area as f64) < px,
            Self::MinConvexity(v) => region.convexity() < v,
            Self::MaxEccentricity(v) => region.eccentricity > v,
            Self::MinCircularity(v) => region.circularity() < v,
        }
    }
}

/// Forces Reject on every region matched by any rule. Returns how many
/// regions changed state.
pub fn apply_overrides(
    states: &mut [RegionState],
    regions: &[RegionProps],
    rules: &[OverrideRule],
) -> usize {
    assert_eq!(states.len(), regions.len(), "one state per region");

    let mut changed = 0;
    for (state, region) in states.iter_mut().zip(regions) {
        if rules.iter().any(|rule| rule.rejects(region)) && *state != RegionState::Reject {
            *state = RegionState::Reject;
            changed += 1;
        }
    }
    changed
}
