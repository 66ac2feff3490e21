//! Default filesystem, process, and environment-backed port implementations.

use crate::ports::{ChangeInputs, InputError, InputSource, OutputSink};
use anyhow::Context;
use boardsel_domain::{BoardSource, SettingsSource, StaticSettingsSource};
use boardsel_types::{BoardInfo, FailedJobsReport};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::Command;
use tracing::{debug, info, warn};

/// Discovers boards from `ports/*/boards/*/mpconfigboard.mk` under the repository root.
#[derive(Debug, Clone)]
pub struct FsBoardSource {
    pub repo_root: Utf8PathBuf,
    /// Board ID -> alias board IDs sharing its port.
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl FsBoardSource {
    pub fn new(repo_root: Utf8PathBuf) -> Self {
        Self {
            repo_root,
            aliases: BTreeMap::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: BTreeMap<String, Vec<String>>) -> Self {
        self.aliases = aliases;
        self
    }
}

impl BoardSource for FsBoardSource {
    fn board_mapping(&self) -> anyhow::Result<BTreeMap<String, BoardInfo>> {
        let pattern = format!(
            "{}/ports/*/boards/*/mpconfigboard.mk",
            glob::Pattern::escape(self.repo_root.as_str())
        );
        debug!(pattern = %pattern, "scanning for board definitions");

        let mut mapping = BTreeMap::new();
        for entry in glob(&pattern).context("glob ports/*/boards/*/mpconfigboard.mk")? {
            let path = entry.map_err(|e| anyhow::anyhow!("glob error: {e}"))?;
            let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
                warn!("skipping board directory with a non UTF-8 path");
                continue;
            };
            let board_dir = path.parent();
            let board = board_dir.and_then(Utf8Path::file_name);
            let port = board_dir
                .and_then(Utf8Path::parent)
                .and_then(Utf8Path::parent)
                .and_then(Utf8Path::file_name);
            if let (Some(board), Some(port)) = (board, port) {
                mapping.insert(board.to_string(), BoardInfo::new(port));
            }
        }

        for (board, aliases) in &self.aliases {
            let Some(port) = mapping.get(board).map(|info| info.port.clone()) else {
                warn!(board = %board, "alias target not found; skipping its aliases");
                continue;
            };
            for alias in aliases {
                mapping
                    .entry(alias.clone())
                    .or_insert_with(|| BoardInfo::alias(port.clone()));
            }
        }

        debug!(boards = mapping.len(), "discovered boards");
        Ok(mapping)
    }
}

/// Board mapping read from a JSON file (`{ board_id: { "port": ..., "alias": ... } }`).
#[derive(Debug, Clone)]
pub struct JsonBoardSource {
    pub path: Utf8PathBuf,
}

impl JsonBoardSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl BoardSource for JsonBoardSource {
    fn board_mapping(&self) -> anyhow::Result<BTreeMap<String, BoardInfo>> {
        read_json(&self.path)
    }
}

/// Extracts board settings from the port's make database.
///
/// Runs `make -C ports/<port> -f Makefile BOARD=<board> -qp print-CC` and keeps every
/// `NAME = value` / `NAME := value` assignment with an upper-case name.
#[derive(Debug, Clone)]
pub struct MakeSettingsSource {
    repo_root: Utf8PathBuf,
    make: String,
    assignment: Regex,
}

impl MakeSettingsSource {
    pub fn new(repo_root: Utf8PathBuf) -> anyhow::Result<Self> {
        Ok(Self {
            repo_root,
            make: "make".to_string(),
            assignment: Regex::new(r"^([A-Z][A-Z0-9_]*)\s*:?=\s*(.*)$")
                .context("compile make assignment pattern")?,
        })
    }

    /// Use a different `make` executable.
    pub fn with_make(mut self, make: impl Into<String>) -> Self {
        self.make = make.into();
        self
    }

    /// Parse `make -p` output. Later assignments win.
    pub fn parse_database(&self, text: &str) -> BTreeMap<String, String> {
        text.lines()
            .filter_map(|line| self.assignment.captures(line))
            .filter_map(|c| Some((c.get(1)?.as_str().to_string(), c.get(2)?.as_str().to_string())))
            .collect()
    }
}

impl SettingsSource for MakeSettingsSource {
    fn settings_for_board(
        &self,
        port: &str,
        board: &str,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        let port_dir = self.repo_root.join("ports").join(port);
        debug!(port = %port, board = %board, "querying make database");

        let output = Command::new(&self.make)
            .arg("-C")
            .arg(port_dir.as_str())
            .args(["-f", "Makefile"])
            .arg(format!("BOARD={}", board))
            .args(["-qp", "print-CC"])
            .output()
            .with_context(|| format!("run {} in {}", self.make, port_dir))?;

        // -q reports "target out of date" as status 1.
        match output.status.code() {
            Some(0) | Some(1) => {}
            _ => anyhow::bail!(
                "{} -qp for board {} failed ({}): {}",
                self.make,
                board,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }

        Ok(self.parse_database(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Settings read from a JSON file (`{ board_id: { KEY: value } }`).
#[derive(Debug, Clone)]
pub struct JsonSettingsSource {
    inner: StaticSettingsSource,
}

impl JsonSettingsSource {
    pub fn load(path: &Utf8Path) -> anyhow::Result<Self> {
        let boards: BTreeMap<String, BTreeMap<String, String>> = read_json(path)?;
        debug!(path = %path, boards = boards.len(), "loaded settings file");
        Ok(Self {
            inner: StaticSettingsSource::new(boards),
        })
    }
}

impl SettingsSource for JsonSettingsSource {
    fn settings_for_board(
        &self,
        port: &str,
        board: &str,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        self.inner.settings_for_board(port, board)
    }
}

fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> anyhow::Result<T> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("parse JSON in {}", path))
}

pub const CHANGED_FILES: &str = "CHANGED_FILES";
pub const LAST_FAILED_JOBS: &str = "LAST_FAILED_JOBS";

/// Reads `CHANGED_FILES` and `LAST_FAILED_JOBS`. Both must be set; empty means "none".
#[derive(Debug, Clone, Default)]
pub struct EnvInputSource {
    vars: BTreeMap<String, String>,
}

impl EnvInputSource {
    pub fn new(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    pub fn from_process_env() -> Self {
        Self::new(
            [CHANGED_FILES, LAST_FAILED_JOBS]
                .into_iter()
                .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v))),
        )
    }

    fn parse<T: DeserializeOwned + Default>(
        &self,
        name: &str,
        sanitize: fn(&str) -> String,
    ) -> Result<T, InputError> {
        let raw = self
            .vars
            .get(name)
            .ok_or_else(|| InputError::MissingVar(name.to_string()))?;
        if raw.is_empty() {
            info!("{} is in environment, but value is empty", name);
            return Ok(T::default());
        }
        serde_json::from_str(&sanitize(raw)).map_err(|source| InputError::InvalidJson {
            var: name.to_string(),
            source,
        })
    }
}

impl InputSource for EnvInputSource {
    fn load(&self) -> Result<ChangeInputs, InputError> {
        let changed: Vec<String> = self.parse(CHANGED_FILES, |s| s.replace('\\', ""))?;
        if !changed.is_empty() {
            info!(paths = changed.len(), "using files list in {}", CHANGED_FILES);
        }
        let failed: FailedJobsReport = self.parse(LAST_FAILED_JOBS, str::to_string)?;
        Ok(ChangeInputs { changed, failed })
    }
}

/// Inputs given up front, e.g. paths from the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticInputSource {
    inputs: ChangeInputs,
}

impl StaticInputSource {
    pub fn new(inputs: ChangeInputs) -> Self {
        Self { inputs }
    }

    /// Explicit paths carry no prior failures.
    pub fn from_paths(paths: Vec<String>) -> Self {
        Self::new(ChangeInputs {
            changed: paths,
            failed: FailedJobsReport::new(),
        })
    }
}

impl InputSource for StaticInputSource {
    fn load(&self) -> Result<ChangeInputs, InputError> {
        Ok(self.inputs.clone())
    }
}

/// Appends `name=value` lines to a GitHub Actions output file.
#[derive(Debug, Clone)]
pub struct GithubOutputFile {
    pub path: Utf8PathBuf,
}

impl GithubOutputFile {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl OutputSink for GithubOutputFile {
    fn set_output(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}={}", name, value).with_context(|| format!("append to {}", self.path))
    }
}

/// Prints what would have been set, for local runs.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn set_output(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        println!("Would set GitHub actions output {} to '{}'", name, value);
        Ok(())
    }
}

/// Collects outputs in order, for embedding and testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    pub outputs: Vec<(String, String)>,
}

impl MemoryOutput {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl OutputSink for MemoryOutput {
    fn set_output(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        self.outputs.push((name.to_string(), value.to_string()));
        Ok(())
    }
}
