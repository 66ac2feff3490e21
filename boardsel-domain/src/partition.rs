use crate::registry::BoardRegistry;
use crate::rules::RuleSet;
use boardsel_types::{Architecture, FailedJobsReport};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Boards per architecture bucket. Every architecture has an entry, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchBuckets {
    pub selected: BTreeMap<Architecture, BTreeSet<String>>,
    /// Boards added only because the previous run failed them.
    pub restored: BTreeMap<Architecture, BTreeSet<String>>,
    /// Selected boards that fit no bucket.
    pub unplaced: BTreeSet<String>,
}

impl ArchBuckets {
    fn empty() -> Self {
        let selected = Architecture::ALL
            .into_iter()
            .map(|a| (a, BTreeSet::new()))
            .collect();
        Self {
            selected,
            restored: BTreeMap::new(),
            unplaced: BTreeSet::new(),
        }
    }

    /// Sorted board list for one architecture.
    pub fn boards(&self, arch: Architecture) -> Vec<String> {
        self.selected
            .get(&arch)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Split selected boards into architecture buckets.
///
/// Boards with no known port (deleted in this change) and boards of ports missing from the
/// architecture table go to `unplaced`.
pub fn partition(
    boards: &BTreeSet<String>,
    registry: &BoardRegistry,
    rules: &RuleSet,
) -> ArchBuckets {
    let mut buckets = ArchBuckets::empty();
    for board in boards {
        let Some(port) = registry.port_of(board) else {
            debug!(board = %board, "selected board has no port; skipping");
            buckets.unplaced.insert(board.clone());
            continue;
        };
        let Some(arch) = rules.arch_for_port(port) else {
            debug!(board = %board, port = %port, "port has no architecture; skipping");
            buckets.unplaced.insert(board.clone());
            continue;
        };
        buckets.selected.entry(arch).or_default().insert(board.clone());
    }
    buckets
}

/// Add the previous run's failed boards to each bucket.
pub fn merge_failed(buckets: &mut ArchBuckets, failed: &FailedJobsReport) {
    for arch in Architecture::ALL {
        let bucket = buckets.selected.entry(arch).or_default();
        for board in failed.boards_for(arch) {
            if bucket.insert(board.clone()) {
                debug!(board = %board, arch = %arch, "restoring previously failed board");
                buckets
                    .restored
                    .entry(arch)
                    .or_default()
                    .insert(board.clone());
            }
        }
    }
}
