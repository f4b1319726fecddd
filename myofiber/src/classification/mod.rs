//! Tri-state classification of labeled regions.
//!
//! [`ClassificationState`] is the single source of truth for which regions are
//! fibers. Every derived view (accepted mask, color overlay, training set) is
//! recomputed from it on request.

mod rules;

#[cfg(test)]
mod tests;

pub use rules::rule_state;

use std::path::Path;

use common::bit_buffer2::BitBuffer2;
use common::buffer2::Buffer2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use tracing::{debug, info};

use crate::config::RuleThresholds;
use crate::error::{Error, Result};
use crate::features::FeatureVector;
use crate::labeling::LabelMap;
use crate::persistence::{read_document, write_document};

// ============================================================================
// RegionState
// ============================================================================

#[repr(u8)]
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegionState {
    #[default]
    Unset = 0,
    Accept = 1,
    Reject = 2,
}

impl RegionState {
    /// Next state of the manual toggle cycle Unset → Accept → Reject → Unset.
    pub fn successor(self) -> Self {
        match self {
            Self::Unset => Self::Accept,
            Self::Accept => Self::Reject,
            Self::Reject => Self::Unset,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Binary training label: Accept → 1, Reject → 0, Unset is excluded.
    pub fn training_label(self) -> Option<u8> {
        match self {
            Self::Unset => None,
            Self::Accept => Some(1),
            Self::Reject => Some(0),
        }
    }

    /// Maps a predicted binary label back: 1 → Accept, anything else → Reject.
    pub fn from_prediction(label: u8) -> Self {
        if label == 1 { Self::Accept } else { Self::Reject }
    }

    /// Display color of the overlay.
    pub fn color(self) -> [u8; 3] {
        match self {
            Self::Unset => [255, 255, 255],
            Self::Accept => [0, 255, 0],
            Self::Reject => [255, 0, 0],
        }
    }
}

impl TryFrom<u8> for RegionState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Unset),
            1 => Ok(Self::Accept),
            2 => Ok(Self::Reject),
            other => Err(Error::InvalidState(other)),
        }
    }
}

/// On-disk form: `{"states": [0, 1, 2, ...]}`.
#[derive(Debug, Serialize, Deserialize)]
struct StatesDocument {
    states: Vec<u8>,
}

// ============================================================================
// ClassificationState
// ============================================================================

/// One [`RegionState`] per region; index `i` is region `i + 1`.
///
/// The length is fixed at construction. Single writer: callers must not
/// mutate one instance from several threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationState {
    states: Vec<RegionState>,
}

impl ClassificationState {
    /// All regions unset.
    pub fn new(num_regions: usize) -> Self {
        Self {
            states: vec![RegionState::Unset; num_regions],
        }
    }

    pub fn from_states(states: Vec<RegionState>) -> Self {
        Self { states }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn states(&self) -> &[RegionState] {
        &self.states
    }

    /// State of region `region` (1-based).
    pub fn get(&self, region: u32) -> Option<RegionState> {
        let idx = (region as usize).checked_sub(1)?;
        self.states.get(idx).copied()
    }

    /// Advances a region through the toggle cycle and returns its new state.
    /// Out-of-range regions are ignored.
    pub fn toggle(&mut self, region: u32) -> Option<RegionState> {
        let idx = (region as usize).checked_sub(1)?;
        let state = self.states.get_mut(idx)?;
        *state = state.successor();
        debug!(region, state = %state, "Toggled region");
        Some(*state)
    }

    /// Sets a region directly. Returns `false` when `region` is out of range.
    pub fn set(&mut self, region: u32, state: RegionState) -> bool {
        match (region as usize)
            .checked_sub(1)
            .and_then(|idx| self.states.get_mut(idx))
        {
            Some(slot) => {
                *slot = state;
                true
            }
            None => false,
        }
    }

    /// Replaces every state at once.
    pub fn assign(&mut self, states: &[RegionState]) -> Result<()> {
        if states.len() != self.states.len() {
            return Err(Error::LengthMismatch {
                expected: self.states.len(),
                actual: states.len(),
            });
        }
        self.states.copy_from_slice(states);
        Ok(())
    }

    /// Sets every region from the fixed rejection rules.
    pub fn apply_rule_set(
        &mut self,
        features: &[FeatureVector],
        thresholds: &RuleThresholds,
    ) -> Result<()> {
        let states: Vec<RegionState> = features
            .iter()
            .map(|f| rule_state(f, thresholds))
            .collect();
        self.assign(&states)?;

        info!(
            regions = states.len(),
            accepted = self.count(RegionState::Accept),
            rejected = self.count(RegionState::Reject),
            "Applied rule set"
        );
        Ok(())
    }

    pub fn count(&self, state: RegionState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }

    /// Rows and binary labels of every labeled region, Unset regions skipped.
    pub fn training_set(&self, rows: &[Vec<f64>]) -> Result<(Vec<Vec<f64>>, Vec<u8>)> {
        if rows.len() != self.states.len() {
            return Err(Error::LengthMismatch {
                expected: self.states.len(),
                actual: rows.len(),
            });
        }
        Ok(self
            .states
            .iter()
            .zip(rows)
            .filter_map(|(state, row)| state.training_label().map(|y| (row.clone(), y)))
            .unzip())
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    pub fn save(&self, path: &Path) -> Result<()> {
        let doc = StatesDocument {
            states: self.states.iter().map(|s| s.as_u8()).collect(),
        };
        write_document(path, &doc)?;
        info!(path = %path.display(), regions = self.len(), "Saved classifications");
        Ok(())
    }

    /// Loads states saved by [`save`](Self::save). The file must hold exactly
    /// one state per region; on any error the current states are kept.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let doc: StatesDocument = read_document(path)?;
        if doc.states.len() != self.states.len() {
            return Err(Error::LengthMismatch {
                expected: self.states.len(),
                actual: doc.states.len(),
            });
        }
        let states = doc
            .states
            .into_iter()
            .map(RegionState::try_from)
            .collect::<Result<Vec<_>>>()?;
        self.states = states;
        info!(path = %path.display(), regions = self.len(), "Loaded classifications");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    fn assert_matches(&self, labels: &LabelMap) {
        assert_eq!(
            labels.num_labels(),
            self.states.len(),
            "label map has {} regions, state has {}",
            labels.num_labels(),
            self.states.len()
        );
    }

    /// Mask of all accepted regions.
    pub fn accepted_mask(&self, labels: &LabelMap) -> BitBuffer2 {
        self.assert_matches(labels);
        BitBuffer2::from_buffer(labels.buffer(), |&l| {
            l != 0 && self.states[l as usize - 1] == RegionState::Accept
        })
    }

    /// Per-pixel colors: black background, white unset, green accepted,
    /// red rejected.
    pub fn overlay(&self, labels: &LabelMap) -> Buffer2<[u8; 3]> {
        self.assert_matches(labels);
        labels.buffer().map(|&l| {
            if l == 0 {
                [0, 0, 0]
            } else {
                self.states[l as usize - 1].color()
            }
        })
    }
}
