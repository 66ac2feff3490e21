//! Embeddable core library for boardsel.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a CI helper binary or other host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits:
//! - [`InputSource`](ports::InputSource) - load the changed paths and prior failures
//! - [`OutputSink`](ports::OutputSink) - publish named decision values
//! - [`BoardSource`] / [`SettingsSource`] - board metadata, from `boardsel-domain`
//!
//! The [`adapters`] module provides default filesystem, process, and
//! environment-backed implementations.
//!
//! # Entry points
//!
//! - [`run_selection`](pipeline::run_selection) - compute and emit the build matrix
//! - [`run_failed_jobs`](pipeline::run_failed_jobs) - turn failed check runs into a report
//! - [`classify_paths`](pipeline::classify_paths) - explain how paths are classified

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the domain's ports so callers don't need boardsel-domain directly.
pub use boardsel_domain::{BoardSource, SettingsSource};
