//! Port traits abstracting the process boundary away from the pipeline.

use boardsel_types::FailedJobsReport;
use thiserror::Error;

/// What one run has to decide on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeInputs {
    pub changed: Vec<String>,
    pub failed: FailedJobsReport,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("environment variable {0} is not set")]
    MissingVar(String),

    #[error("{var} is not valid JSON: {source}")]
    InvalidJson {
        var: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of changed paths and prior failures.
pub trait InputSource {
    fn load(&self) -> Result<ChangeInputs, InputError>;
}

/// Named decision values (`boards-arm`, `build-doc`, ...).
pub trait OutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> anyhow::Result<()>;
}
