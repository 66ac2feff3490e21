//! Shared DTOs for the boardsel workspace.
//!
//! # Design constraints
//! - Inputs are read from CI environment variables and JSON files; be tolerant of extra fields.
//! - Outputs are consumed by workflow expressions; names and value shapes are a contract.

pub mod board;
pub mod failed;
pub mod selection;

pub use board::{Architecture, BoardInfo, ParseArchitectureError};
pub use failed::FailedJobsReport;
pub use selection::SelectionResult;

/// Output names written to the CI output sink.
pub mod outputs {
    /// Boolean output telling the workflow to rebuild documentation.
    pub const BUILD_DOC: &str = "build-doc";
    /// Failed-job report produced by `boardsel failed-jobs`.
    pub const CHECKRUNS: &str = "checkruns";
    /// Prefix of the per-architecture board list outputs (`boards-arm`, ...).
    pub const BOARDS_PREFIX: &str = "boards-";
}

/// Job names used as keys in a failed-job report.
pub mod jobs {
    /// The documentation build job.
    pub const BUILD_DOC: &str = "build-doc";
    /// Prefix of the per-architecture board build jobs (`build-arm`, ...).
    pub const BUILD_PREFIX: &str = "build-";
}
