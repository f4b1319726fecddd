//! One analysis session: a labeled mask, its cached region features, the
//! manual/automatic classification and an optional trained classifier.
//!
//! Every mutating operation is all-or-nothing. A failed call returns an
//! [`Error`] and leaves the session exactly as it was.


use std::path::Path;

use common::bit_buffer2::BitBuffer2;
use common::buffer2::Buffer2;
use tracing::{debug, info};

use crate::boundary_repair::{repair, repaired_mask};
use crate::classification::{ClassificationState, RegionState};
use crate::classifier::{TrainedClassifier, TrainingData, apply_overrides};
use crate::config::{BoundaryRepairConfig, SessionConfig};
use crate::error::{Error, Result};
use crate::export::{FiberRow, FiberStore, fiber_rows};
use crate::features::{FeatureVector, RegionProps, feature_matrix, feature_vectors, region_props};
use crate::labeling::LabelMap;
use crate::validation::ConfusionMatrix;

/// Region features computed for one labeling generation.
struct FeatureCache {
    generation: u64,
    regions: Vec<RegionProps>,
}

/// What [`Session::inspect`] reports for the region under a pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInspection {
    pub region: u32,
    pub state: RegionState,
    pub features: FeatureVector,
    pub area_px: usize,
    pub min_feret_diameter: f64,
}

/// Single writer: a session is mutated by one caller at a time.
pub struct Session {
    config: SessionConfig,
    labels: LabelMap,
    generation: u64,
    cache: Option<FeatureCache>,
    classification: ClassificationState,
    classifier: Option<TrainedClassifier>,
}

impl Session {
    pub fn new(mask: &BitBuffer2, config: SessionConfig) -> Self {
        config.validate();

        let labels = LabelMap::from_mask(mask, config.connectivity);
        info!(
            width = labels.width(),
            height = labels.height(),
            regions = labels.num_labels(),
            "Opened session"
        );
        Self {
            classification: ClassificationState::new(labels.num_labels()),
            config,
            labels,
            generation: 0,
            cache: None,
            classifier: None,
        }
    }

    /// Repairs merged boundaries in a grayscale image, thresholds it and
    /// opens a session on the resulting mask.
    pub fn from_image(
        image: &Buffer2<f64>,
        repair_config: &BoundaryRepairConfig,
        config: SessionConfig,
    ) -> Self {
        let repaired = repair(image, repair_config);
        let mask = repaired_mask(&repaired, repair_config.upper_bound, repair_config.sentinel);
        Self::new(&mask, config)
    }

    /// Replaces the mask. Bumps the labeling generation, drops cached
    /// features and resets every region to Unset. A trained classifier is
    /// kept since it only depends on feature rows.
    pub fn relabel(&mut self, mask: &BitBuffer2) {
        self.labels = LabelMap::from_mask(mask, self.config.connectivity);
        self.generation += 1;
        self.cache = None;
        self.classification = ClassificationState::new(self.labels.num_labels());
        info!(
            generation = self.generation,
            regions = self.labels.num_labels(),
            "Relabeled session"
        );
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn num_regions(&self) -> usize {
        self.labels.num_labels()
    }

    #[inline]
    pub fn classification(&self) -> &ClassificationState {
        &self.classification
    }

    #[inline]
    pub fn states(&self) -> &[RegionState] {
        self.classification.states()
    }

    #[inline]
    pub fn classifier(&self) -> Option<&TrainedClassifier> {
        self.classifier.as_ref()
    }

    /// Installs a classifier trained elsewhere.
    pub fn set_classifier(&mut self, classifier: TrainedClassifier) {
        self.classifier = Some(classifier);
    }

    // ------------------------------------------------------------------------
    // Features
    // ------------------------------------------------------------------------

    /// Region properties of the current labeling, computed once per
    /// generation.
    pub fn regions(&mut self) -> &[RegionProps] {
        let stale = self
            .cache
            .as_ref()
            .is_none_or(|c| c.generation != self.generation);
        if stale {
            self.cache = Some(FeatureCache {
                generation: self.generation,
                regions: region_props(&self.labels),
            });
        } else {
            debug!(generation = self.generation, "Feature cache hit");
        }
        match &self.cache {
            Some(cache) => &cache.regions,
            None => &[],
        }
    }

    pub fn feature_vectors(&mut self) -> Vec<FeatureVector> {
        let config = self.config.features;
        feature_vectors(self.regions(), &config)
    }

    /// Classifier input rows, one per region.
    pub fn feature_matrix(&mut self) -> Vec<Vec<f64>> {
        let config = self.config.features;
        let vectors = self.feature_vectors();
        feature_matrix(&vectors, &config)
    }

    // ------------------------------------------------------------------------
    // Manual classification
    // ------------------------------------------------------------------------

    /// Advances the region under pixel `(x, y)` through the toggle cycle.
    /// Pixels outside the image or on background are ignored.
    pub fn toggle_at(&mut self, x: i64, y: i64) -> Option<(u32, RegionState)> {
        let region = self.labels.label_at_checked(x, y)?;
        let state = self.classification.toggle(region)?;
        Some((region, state))
    }

    pub fn toggle(&mut self, region: u32) -> Option<RegionState> {
        self.classification.toggle(region)
    }

    /// Descriptors of the region under pixel `(x, y)`.
    pub fn inspect(&mut self, x: i64, y: i64) -> Option<RegionInspection> {
        let region = self.labels.label_at_checked(x, y)?;
        let state = self.classification.get(region)?;
        let config = self.config.features;
        let props = self.regions().get(region as usize - 1)?;
        Some(RegionInspection {
            region,
            state,
            features: FeatureVector::from_region(props, &config),
            area_px: props.filled_area,
            min_feret_diameter: props.min_feret_diameter(),
        })
    }

    /// Sets every region from the configured rule thresholds.
    pub fn apply_rules(&mut self) -> Result<()> {
        let rules = self.config.rules;
        let vectors = self.feature_vectors();
        self.classification.apply_rule_set(&vectors, &rules)
    }

    pub fn save_classifications(&self, path: &Path) -> Result<()> {
        self.classification.save(path)
    }

    pub fn load_classifications(&mut self, path: &Path) -> Result<()> {
        self.classification.load(path)
    }

    // ------------------------------------------------------------------------
    // Training and prediction
    // ------------------------------------------------------------------------

    fn require_regions(&self) -> Result<()> {
        if self.num_regions() == 0 {
            return Err(Error::MissingSelection("no regions in the labeled image"));
        }
        Ok(())
    }

    /// Labeled rows of this session, Unset regions excluded.
    pub fn training_data(&mut self) -> Result<TrainingData> {
        self.require_regions()?;
        let rows = self.feature_matrix();
        let (features, states) = self.classification.training_set(&rows)?;
        TrainingData::new(features, states)
    }

    pub fn export_training_data(&mut self, path: &Path) -> Result<()> {
        self.training_data()?.save(path)
    }

    /// Fits the configured classifier on the manually labeled regions.
    pub fn train(&mut self) -> Result<&TrainedClassifier> {
        let data = self.training_data()?;
        let classifier = TrainedClassifier::fit(&data.features, &data.states, &self.config.classifier)?;
        Ok(self.classifier.insert(classifier))
    }

    /// Fits on stored rows instead of this session's labels.
    pub fn train_from_data(&mut self, data: &TrainingData) -> Result<&TrainedClassifier> {
        let classifier = TrainedClassifier::fit(&data.features, &data.states, &self.config.classifier)?;
        Ok(self.classifier.insert(classifier))
    }

    /// Relabels every region from the classifier, then applies the override
    /// rules. Returns how many regions the overrides forced to Reject.
    pub fn predict(&mut self) -> Result<usize> {
        self.require_regions()?;

        let rows = self.feature_matrix();
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(Error::MissingSelection("no trained classifier"))?;
        let mut states = classifier.predict_states(&rows)?;
        let overrides = self.config.overrides.clone();
        let overridden = apply_overrides(&mut states, self.regions(), &overrides);
        self.classification.assign(&states)?;

        info!(
            regions = states.len(),
            accepted = self.classification.count(RegionState::Accept),
            overridden,
            "Predicted classifications"
        );
        Ok(overridden)
    }

    /// Compares a manual classification of this labeling against the
    /// current states.
    pub fn compare(&self, manual: &[RegionState]) -> Result<ConfusionMatrix> {
        ConfusionMatrix::compare(manual, self.classification.states())
    }

    // ------------------------------------------------------------------------
    // Outputs
    // ------------------------------------------------------------------------

    pub fn accepted_mask(&self) -> BitBuffer2 {
        self.classification.accepted_mask(&self.labels)
    }

    pub fn overlay(&self) -> Buffer2<[u8; 3]> {
        self.classification.overlay(&self.labels)
    }

    /// Accepted fibers in physical units of the configured scale factor.
    pub fn fiber_rows(&mut self) -> Result<Vec<FiberRow>> {
        let scale = self.config.scale_factor;
        let states = self.classification.states().to_vec();
        fiber_rows(self.regions(), &states, scale)
    }

    /// Hands the accepted fibers to `store`, returns the store's batch id.
    pub fn export_fibers(&mut self, store: &mut dyn FiberStore, session_id: &str) -> Result<String> {
        let rows = self.fiber_rows()?;
        store.add_fibers(session_id, &rows)
    }
}
