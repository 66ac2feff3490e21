use crate::board::Architecture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Boards (and the docs job) that failed in the previous run, keyed by job name.
///
/// Keys are job names such as `build-arm` or `build-doc`. A key may be present with an empty list;
/// for `build-doc` presence alone is what matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailedJobsReport {
    jobs: BTreeMap<String, Vec<String>>,
}

impl FailedJobsReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(jobs: BTreeMap<String, Vec<String>>) -> Self {
        Self { jobs }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Boards that failed in the given architecture's build job.
    pub fn boards_for(&self, arch: Architecture) -> &[String] {
        self.jobs
            .get(&arch.job_name())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn docs_failed(&self) -> bool {
        self.jobs.contains_key(crate::jobs::BUILD_DOC)
    }

    /// Record a failed job, optionally naming the board it built.
    pub fn record(&mut self, job: &str, board: Option<&str>) {
        let boards = self.jobs.entry(job.to_string()).or_default();
        if let Some(board) = board {
            boards.push(board.to_string());
        }
    }

    pub fn jobs(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.jobs.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
