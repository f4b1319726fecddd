use strum::IntoEnumIterator;

use super::*;
use crate::config::{Connectivity, FeatureConfig};
use crate::features::{feature_vectors, region_props};
use crate::testing::mask_from_ascii;

fn features(area_norm: f64, eccentricity: f64, convexity: f64, circularity: f64) -> FeatureVector {
    FeatureVector {
        area_norm,
        eccentricity,
        convexity,
        circularity,
        minor_axis_length: 10.0,
    }
}

fn three_regions() -> LabelMap {
    LabelMap::from_mask(
        &mask_from_ascii(&[
            "##...#...", //
            "##.......",
            "......###",
        ]),
        Connectivity::Eight,
    )
}

// ============================================================================
// RegionState
// ============================================================================

#[test]
fn test_three_toggles_return_to_start() {
    for start in RegionState::iter() {
        let mut state = ClassificationState::from_states(vec![start]);
        state.toggle(1);
        state.toggle(1);
        assert_eq!(state.toggle(1), Some(start));
    }
}

#[test]
fn test_toggle_cycle_order() {
    let mut state = ClassificationState::new(1);
    assert_eq!(state.toggle(1), Some(RegionState::Accept));
    assert_eq!(state.toggle(1), Some(RegionState::Reject));
    assert_eq!(state.toggle(1), Some(RegionState::Unset));
}

#[test]
fn test_toggle_out_of_range_is_noop() {
    let mut state = ClassificationState::new(2);
    assert_eq!(state.toggle(0), None);
    assert_eq!(state.toggle(3), None);
    assert_eq!(state, ClassificationState::new(2));
}

#[test]
fn test_try_from_u8() {
    for s in RegionState::iter() {
        assert_eq!(RegionState::try_from(s.as_u8()).unwrap(), s);
    }
    assert!(matches!(RegionState::try_from(3), Err(Error::InvalidState(3))));
}

#[test]
fn test_training_label_mapping() {
    assert_eq!(RegionState::Unset.training_label(), None);
    assert_eq!(RegionState::Accept.training_label(), Some(1));
    assert_eq!(RegionState::Reject.training_label(), Some(0));
    assert_eq!(RegionState::from_prediction(1), RegionState::Accept);
    assert_eq!(RegionState::from_prediction(0), RegionState::Reject);
}

// ============================================================================
// Rules
// ============================================================================

#[test]
fn test_rule_set_reference_cases() {
    let t = RuleThresholds::default();
    assert_eq!(rule_state(&features(0.5, 0.5, 0.95, 0.8), &t), RegionState::Accept);
    assert_eq!(rule_state(&features(0.01, 0.5, 0.95, 0.8), &t), RegionState::Reject);
    assert_eq!(rule_state(&features(3.5, 0.5, 0.95, 0.8), &t), RegionState::Reject);
    assert_eq!(rule_state(&features(0.5, 0.5, 0.6, 0.8), &t), RegionState::Reject);
    assert_eq!(rule_state(&features(0.5, 0.5, 0.95, 0.3), &t), RegionState::Reject);
}

#[test]
fn test_eccentric_rule_needs_both_conditions() {
    let t = RuleThresholds::default();
    // Elongated but convex enough.
    assert_eq!(rule_state(&features(0.5, 0.98, 0.9, 0.8), &t), RegionState::Accept);
    // Elongated and somewhat concave.
    assert_eq!(rule_state(&features(0.5, 0.98, 0.8, 0.8), &t), RegionState::Reject);
    // Concave to the same degree but round.
    assert_eq!(rule_state(&features(0.5, 0.5, 0.8, 0.8), &t), RegionState::Accept);
}

#[test]
fn test_two_tiny_squares_rejected() {
    let labels = LabelMap::from_mask(
        &mask_from_ascii(&[
            "................", //
            ".##..........##.",
            ".##..........##.",
        ]),
        Connectivity::Eight,
    );
    assert_eq!(labels.num_labels(), 2);

    let config = FeatureConfig::default();
    let vectors = feature_vectors(&region_props(&labels), &config);
    for v in &vectors {
        assert_eq!(v.convexity, 1.0);
        assert!((v.area_norm - 0.001).abs() < 1e-15);
    }

    let mut state = ClassificationState::new(2);
    state
        .apply_rule_set(&vectors, &RuleThresholds::default())
        .unwrap();
    assert_eq!(state.states(), &[RegionState::Reject, RegionState::Reject]);
}

#[test]
fn test_apply_rule_set_length_mismatch_leaves_state() {
    let mut state = ClassificationState::from_states(vec![RegionState::Accept; 3]);
    let before = state.clone();
    let err = state
        .apply_rule_set(&[features(0.5, 0.5, 0.95, 0.8)], &RuleThresholds::default())
        .unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 3, actual: 1 }));
    assert_eq!(state, before);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classifications.json");

    let saved = ClassificationState::from_states(vec![
        RegionState::Accept,
        RegionState::Unset,
        RegionState::Reject,
        RegionState::Accept,
    ]);
    saved.save(&path).unwrap();

    let mut loaded = ClassificationState::new(4);
    loaded.load(&path).unwrap();
    assert_eq!(loaded, saved);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"states\""));
}

#[test]
fn test_load_length_mismatch_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classifications.json");
    ClassificationState::new(3).save(&path).unwrap();

    let mut state = ClassificationState::from_states(vec![RegionState::Accept, RegionState::Reject]);
    let before = state.clone();
    let err = state.load(&path).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 2, actual: 3 }));
    assert_eq!(state, before);
}

#[test]
fn test_load_invalid_value_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classifications.json");
    std::fs::write(&path, "{\"states\": [1, 7]}").unwrap();

    let mut state = ClassificationState::from_states(vec![RegionState::Reject, RegionState::Reject]);
    let before = state.clone();
    assert!(matches!(state.load(&path), Err(Error::InvalidState(7))));
    assert_eq!(state, before);
}

#[test]
fn test_load_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classifications.yaml");
    let saved = ClassificationState::from_states(vec![RegionState::Reject, RegionState::Accept]);
    saved.save(&path).unwrap();

    let mut loaded = ClassificationState::new(2);
    loaded.load(&path).unwrap();
    assert_eq!(loaded, saved);
}

// ============================================================================
// Derived views
// ============================================================================

#[test]
fn test_training_set_skips_unset() {
    let state = ClassificationState::from_states(vec![
        RegionState::Accept,
        RegionState::Unset,
        RegionState::Reject,
    ]);
    let rows = vec![vec![1.0], vec![2.0], vec![3.0]];
    let (x, y) = state.training_set(&rows).unwrap();
    assert_eq!(x, vec![vec![1.0], vec![3.0]]);
    assert_eq!(y, vec![1, 0]);
}

#[test]
fn test_accepted_mask() {
    let labels = three_regions();
    assert_eq!(labels.num_labels(), 3);
    let state = ClassificationState::from_states(vec![
        RegionState::Accept,
        RegionState::Reject,
        RegionState::Accept,
    ]);
    let mask = state.accepted_mask(&labels);
    assert_eq!(mask.count_ones(), 7);
    assert!(mask.get_xy(0, 0));
    assert!(!mask.get_xy(5, 0));
    assert!(mask.get_xy(8, 2));
}

#[test]
fn test_overlay_recomputed_from_state() {
    let labels = three_regions();
    let mut state = ClassificationState::new(3);
    let overlay = state.overlay(&labels);
    assert_eq!(overlay[(0, 0)], [255, 255, 255]);
    assert_eq!(overlay[(2, 0)], [0, 0, 0]);

    state.toggle(1);
    state.toggle(2);
    state.toggle(2);
    let overlay = state.overlay(&labels);
    assert_eq!(overlay[(1, 1)], [0, 255, 0]);
    assert_eq!(overlay[(5, 0)], [255, 0, 0]);
    assert_eq!(overlay[(7, 2)], [255, 255, 255]);
}
