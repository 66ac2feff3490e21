//! Domain logic: turn changed paths + board metadata into a deterministic build selection.
//!
//! This crate owns *which* boards and docs get rebuilt and why. It does not own where the inputs
//! come from or where the decision is written; that's the `boardsel-core` crate.

mod classify;
mod docs;
mod failed_jobs;
mod partition;
mod ports;
mod registry;
mod rules;
mod selector;
mod settings;

pub use classify::{AmbiguousPath, Classification, IgnoreReason, PathClassifier};
pub use docs::{DEFAULT_DOC_PATTERN, DocSelector};
pub use failed_jobs::{collect_failed_jobs, parse_check_run};
pub use partition::{ArchBuckets, merge_failed, partition};
pub use ports::{BoardSource, SettingsSource, StaticBoardSource, StaticSettingsSource};
pub use registry::BoardRegistry;
pub use rules::RuleSet;
pub use selector::{
    BoardSelection, SelectionRequest, Selector, SelectorConfig, DEFAULT_MAX_REFERENCE_DEPTH,
};
pub use settings::{BoardSettings, FetchOptions, SettingsCache, SettingsError, keys};
