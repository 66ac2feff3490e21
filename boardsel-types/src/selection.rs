use crate::board::Architecture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final decision for one CI run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Sorted, deduplicated board IDs per architecture. Every architecture is present.
    pub boards: BTreeMap<Architecture, Vec<String>>,

    /// Boards in `boards` that are there only because the previous run failed them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub restored: BTreeMap<Architecture, Vec<String>>,

    /// Selected boards left out of every bucket: unknown port, or a port with no architecture.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unplaced: Vec<String>,

    pub build_docs: bool,

    /// True when the "build everything" path was taken.
    #[serde(default)]
    pub build_all: bool,
}

impl SelectionResult {
    pub fn boards_for(&self, arch: Architecture) -> &[String] {
        self.boards.get(&arch).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_boards(&self) -> usize {
        self.boards.values().map(Vec::len).sum()
    }
}
