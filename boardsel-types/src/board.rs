use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CPU architecture bucket used to shard board builds across CI jobs.
///
/// The declaration order is the emission order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    Aarch,
    Arm,
    Riscv,
    Espressif,
}

impl Architecture {
    pub const ALL: [Architecture; 4] = [
        Architecture::Aarch,
        Architecture::Arm,
        Architecture::Riscv,
        Architecture::Espressif,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::Aarch => "aarch",
            Architecture::Arm => "arm",
            Architecture::Riscv => "riscv",
            Architecture::Espressif => "espressif",
        }
    }

    /// Name of the output carrying this bucket's board list, e.g. `boards-arm`.
    pub fn output_name(self) -> String {
        format!("{}{}", crate::outputs::BOARDS_PREFIX, self.as_str())
    }

    /// Name of the CI job building this bucket, e.g. `build-arm`.
    pub fn job_name(self) -> String {
        format!("{}{}", crate::jobs::BUILD_PREFIX, self.as_str())
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown architecture '{0}' (expected one of: aarch, arm, riscv, espressif)")]
pub struct ParseArchitectureError(pub String);

impl FromStr for Architecture {
    type Err = ParseArchitectureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| ParseArchitectureError(s.to_string()))
    }
}

/// One entry of the board mapping.
///
/// The board-info tooling emits more fields (`download_only`, `aliases`); they are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    pub port: String,

    /// Alias boards point at another board's definition and are never built directly.
    #[serde(default)]
    pub alias: bool,
}

impl BoardInfo {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            alias: false,
        }
    }

    pub fn alias(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            alias: true,
        }
    }
}
