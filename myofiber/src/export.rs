//! Per-fiber result rows and the storage hook they are handed to.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::classification::RegionState;
use crate::error::{Error, Result};
use crate::features::RegionProps;

/// One accepted fiber in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiberRow {
    /// Filled area divided by `scale²`.
    pub area: f64,
    pub eccentricity: f64,
    pub convexity: f64,
    pub circularity: f64,
    /// Region label in the labeled image (1-based).
    pub region: u32,
    /// Minor axis length multiplied by `scale`.
    pub minor_axis_length: f64,
}

/// Rows for every accepted region. `scale` converts pixels to physical
/// length units.
pub fn fiber_rows(
    regions: &[RegionProps],
    states: &[RegionState],
    scale: f64,
) -> Result<Vec<FiberRow>> {
    assert!(scale > 0.0, "scale must be positive");
    if regions.len() != states.len() {
        return Err(Error::LengthMismatch {
            expected: regions.len(),
            actual: states.len(),
        });
    }

    Ok(regions
        .iter()
        .zip(states)
        .filter(|(_, state)| **state == RegionState::Accept)
        .map(|(region, _)| FiberRow {
            area: region.filled_area as f64 / (scale * scale),
            eccentricity: region.eccentricity,
            convexity: region.convexity(),
            circularity: region.circularity(),
            region: region.label,
            minor_axis_length: region.minor_axis_length * scale,
        })
        .collect())
}

// ============================================================================
// Store
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn unique() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for BatchId {
    type Err = anyhow::Error;

    fn from_str(id: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(id)?))
    }
}

/// Destination for exported fibers. Returns an identifier of the stored
/// batch.
pub trait FiberStore {
    fn add_fibers(&mut self, session_id: &str, rows: &[FiberRow]) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiberBatch {
    pub session_id: String,
    pub rows: Vec<FiberRow>,
}

#[derive(Debug, Default)]
pub struct MemoryFiberStore {
    batches: BTreeMap<BatchId, FiberBatch>,
}

impl MemoryFiberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(&self, id: &str) -> Option<&FiberBatch> {
        let id: BatchId = id.parse().ok()?;
        self.batches.get(&id)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// All rows stored for one session, across batches.
    pub fn session_rows(&self, session_id: &str) -> Vec<FiberRow> {
        self.batches
            .values()
            .filter(|b| b.session_id == session_id)
            .flat_map(|b| b.rows.iter().copied())
            .collect()
    }
}

impl FiberStore for MemoryFiberStore {
    fn add_fibers(&mut self, session_id: &str, rows: &[FiberRow]) -> Result<String> {
        let id = BatchId::unique();
        self.batches.insert(
            id,
            FiberBatch {
                session_id: session_id.to_string(),
                rows: rows.to_vec(),
            },
        );
        info!(session_id, batch = %id, fibers = rows.len(), "Stored fibers");
        Ok(id.to_string())
    }
}
