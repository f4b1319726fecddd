use crate::config::RuleThresholds;
use crate::features::FeatureVector;

use super::RegionState;

/// First matching rejection rule wins; a region passing all of them is
/// accepted.
pub fn rule_state(features: &FeatureVector, t: &RuleThresholds) -> RegionState {
    let rejected = features.area_norm < t.min_area
        || features.convexity < t.min_convexity
        || (features.eccentricity > t.max_eccentricity
            && features.convexity < t.elongated_min_convexity)
        || features.area_norm > t.max_area
        || features.circularity < t.min_circularity;

    if rejected {
        RegionState::Reject
    } else {
        RegionState::Accept
    }
}
