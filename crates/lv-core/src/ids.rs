//! Identifier types shared by every crate in the workspace

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of one record, assigned once at ingestion.
///
/// Identifiers are sequential in ingestion order and are only meaningful
/// together with the [`Generation`] of the dataset they were assigned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for RecordId {
    fn from(index: usize) -> Self {
        RecordId(index as u64)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for a view
pub type ViewId = uuid::Uuid;

/// Snapshot number of the loaded dataset. Bumped on every successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}
