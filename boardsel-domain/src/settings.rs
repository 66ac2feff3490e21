//! Per-board build settings: typed view, reference resolution, and the per-run cache.
//!
//! Settings are fetched lazily, at most once per board per run. A batch of missing boards is
//! fetched on a bounded pool of scoped threads and merged into the cache only after every worker
//! has joined, so lookups never observe a partially filled batch.

use crate::classify::AmbiguousPath;
use crate::ports::SettingsSource;
use crate::registry::BoardRegistry;
use crate::rules::RuleSet;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

/// Setting names read from a board's build description.
pub mod keys {
    pub const FROZEN_MPY_DIRS: &str = "FROZEN_MPY_DIRS";
    pub const SRC_SUPERVISOR: &str = "SRC_SUPERVISOR";
    pub const CIRCUITPY_WEB_WORKFLOW: &str = "CIRCUITPY_WEB_WORKFLOW";
    pub const SRC_PATTERNS: &str = "SRC_PATTERNS";
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("board {board}: required setting {key} is missing")]
    MissingSetting { board: String, key: String },

    #[error("board {board}: {key} references undefined setting {missing}")]
    UnresolvedReference {
        board: String,
        key: String,
        missing: String,
    },

    #[error("board {board}: {key} has malformed reference {value:?}")]
    MalformedReference {
        board: String,
        key: String,
        value: String,
    },

    #[error("board {board}: {key} did not resolve to a value within {depth} references")]
    ReferenceDepthExceeded {
        board: String,
        key: String,
        depth: usize,
    },

    #[error("board {board} (port {port}): fetch settings: {source:#}")]
    Fetch {
        board: String,
        port: String,
        #[source]
        source: anyhow::Error,
    },
}

/// The settings the selector needs from one board, validated at fetch time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSettings {
    pub frozen_mpy_dirs: String,
    pub src_supervisor: String,
    /// `CIRCUITPY_WEB_WORKFLOW` after following `$(KEY)` references.
    pub web_workflow: String,
    pub src_patterns: String,
}

impl BoardSettings {
    pub fn from_raw(
        board: &str,
        raw: &BTreeMap<String, String>,
        max_depth: usize,
    ) -> Result<Self, SettingsError> {
        Ok(Self {
            frozen_mpy_dirs: raw
                .get(keys::FROZEN_MPY_DIRS)
                .cloned()
                .unwrap_or_default(),
            src_supervisor: required(board, raw, keys::SRC_SUPERVISOR)?.to_string(),
            web_workflow: resolve_reference(board, raw, keys::CIRCUITPY_WEB_WORKFLOW, max_depth)?,
            src_patterns: required(board, raw, keys::SRC_PATTERNS)?.to_string(),
        })
    }

    pub fn web_workflow_enabled(&self) -> bool {
        self.web_workflow != "0"
    }

    /// Whether a change to `path` affects this board. Each condition is independent.
    pub fn is_affected_by(&self, path: &str, ambiguous: &AmbiguousPath, rules: &RuleSet) -> bool {
        let frozen = path.starts_with(rules.frozen_prefix.as_str())
            && !self.frozen_mpy_dirs.is_empty()
            && self.frozen_mpy_dirs.contains(path);

        let supervisor = path.starts_with(rules.supervisor_prefix.as_str())
            && (self.src_supervisor.contains(path)
                || (path.starts_with(rules.web_workflow_static_dir.as_str())
                    && self.web_workflow_enabled()));

        let module = ambiguous
            .module
            .as_ref()
            .is_some_and(|m| self.src_patterns.contains(&format!("{}/", m)));

        frozen || supervisor || module
    }
}

fn required<'a>(
    board: &str,
    raw: &'a BTreeMap<String, String>,
    key: &str,
) -> Result<&'a str, SettingsError> {
    raw.get(key)
        .map(String::as_str)
        .ok_or_else(|| SettingsError::MissingSetting {
            board: board.to_string(),
            key: key.to_string(),
        })
}

/// A value starting with `$(` is a reference; it must be exactly `$(NAME)`.
fn placeholder<'a>(
    board: &str,
    key: &str,
    value: &'a str,
) -> Result<Option<&'a str>, SettingsError> {
    let Some(rest) = value.strip_prefix("$(") else {
        return Ok(None);
    };
    match rest.strip_suffix(')') {
        Some(name) if !name.is_empty() && !name.contains(')') => Ok(Some(name)),
        _ => Err(SettingsError::MalformedReference {
            board: board.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Follow `$(KEY)` placeholders in `key`'s value until a literal is reached.
pub(crate) fn resolve_reference(
    board: &str,
    raw: &BTreeMap<String, String>,
    key: &str,
    max_depth: usize,
) -> Result<String, SettingsError> {
    let mut value = required(board, raw, key)?;
    let mut hops = 0;
    while let Some(next) = placeholder(board, key, value)? {
        if hops == max_depth {
            return Err(SettingsError::ReferenceDepthExceeded {
                board: board.to_string(),
                key: key.to_string(),
                depth: max_depth,
            });
        }
        value = raw
            .get(next)
            .map(String::as_str)
            .ok_or_else(|| SettingsError::UnresolvedReference {
                board: board.to_string(),
                key: key.to_string(),
                missing: next.to_string(),
            })?;
        hops += 1;
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Worker threads; 0 means available parallelism.
    pub workers: usize,
    pub max_reference_depth: usize,
}

impl FetchOptions {
    fn worker_count(&self, jobs: usize) -> usize {
        let n = match self.workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            n => n,
        };
        n.min(jobs).max(1)
    }
}

/// Settings computed so far in this run, keyed by board ID.
#[derive(Debug, Default)]
pub struct SettingsCache {
    entries: BTreeMap<String, BoardSettings>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, board: &str) -> Option<&BoardSettings> {
        self.entries.get(board)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make sure every candidate board has settings cached.
    ///
    /// Boards unknown to the registry are skipped. The first failing board (in board order) fails
    /// the whole batch and nothing from the batch is cached.
    pub fn ensure(
        &mut self,
        candidates: &BTreeSet<String>,
        registry: &BoardRegistry,
        source: &dyn SettingsSource,
        opts: FetchOptions,
    ) -> Result<(), SettingsError> {
        let jobs: Vec<(&str, &str)> = candidates
            .iter()
            .filter(|b| !self.entries.contains_key(b.as_str()))
            .filter_map(|b| registry.port_of(b).map(|port| (b.as_str(), port)))
            .collect();
        if jobs.is_empty() {
            return Ok(());
        }

        let workers = opts.worker_count(jobs.len());
        debug!(boards = jobs.len(), workers, "fetching board settings");

        let next = AtomicUsize::new(0);
        let (next, jobs_ref) = (&next, &jobs);
        let mut results = std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(move || {
                        let mut out = Vec::new();
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            let Some(&(board, port)) = jobs_ref.get(i) else {
                                break;
                            };
                            out.push((board, fetch_one(source, port, board, opts)));
                        }
                        out
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        });

        results.sort_by(|a, b| a.0.cmp(b.0));
        let mut fetched = Vec::with_capacity(results.len());
        for (board, result) in results {
            fetched.push((board.to_string(), result?));
        }
        self.entries.extend(fetched);
        Ok(())
    }
}

fn fetch_one(
    source: &dyn SettingsSource,
    port: &str,
    board: &str,
    opts: FetchOptions,
) -> Result<BoardSettings, SettingsError> {
    let raw = source
        .settings_for_board(port, board)
        .map_err(|source| SettingsError::Fetch {
            board: board.to_string(),
            port: port.to_string(),
            source,
        })?;
    BoardSettings::from_raw(board, &raw, opts.max_reference_depth)
}
