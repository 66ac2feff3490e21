//! Configuration file loading for boardsel.
//!
//! Discovers and loads `boardsel.toml` from the repository root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use boardsel_core::settings::SelectionSettings;
use boardsel_types::Architecture;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "boardsel.toml";

/// Top-level configuration from boardsel.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoardselConfig {
    /// Port -> architecture, added to (or replacing entries of) the built-in table.
    pub ports: BTreeMap<String, Architecture>,

    /// Classification rule overrides.
    pub rules: RulesConfig,

    /// Settings fetch tuning.
    pub settings: SettingsConfig,

    /// Board -> alias boards, for filesystem discovery.
    pub aliases: BTreeMap<String, Vec<String>>,

    pub docs: DocsConfig,
}

/// Rules section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Extra exact paths to ignore (extends the built-in list).
    pub ignore_files: Vec<String>,

    /// Extra directory prefixes to ignore (extends the built-in list).
    pub ignore_dirs: Vec<String>,

    pub host_port: Option<String>,
    pub frozen_prefix: Option<String>,
    pub supervisor_prefix: Option<String>,
    pub web_workflow_static_dir: Option<String>,
}

/// Settings section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Parallel settings fetches; 0 means available parallelism.
    pub workers: Option<usize>,

    /// Maximum `$(KEY)` hops when resolving a setting.
    pub max_reference_depth: Option<usize>,
}

/// Docs section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Regex replacing the built-in doc pattern.
    pub pattern: Option<String>,
}

/// Discover the boardsel.toml config file.
///
/// Returns `None` if no config file is found.
pub fn discover_config(repo_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = repo_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a boardsel.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<BoardselConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<BoardselConfig> {
    let config: BoardselConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from repo root, or return default if not found.
pub fn load_or_default(repo_root: &Utf8Path) -> anyhow::Result<BoardselConfig> {
    match discover_config(repo_root) {
        Some(path) => load_config(&path),
        None => Ok(BoardselConfig::default()),
    }
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: BoardselConfig,
}

impl ConfigMerger {
    pub fn new(config: BoardselConfig) -> Self {
        Self { config }
    }

    /// Merge with `matrix` command arguments.
    ///
    /// `--workers` overrides the config value.
    pub fn merge_matrix_args(
        self,
        repo_root: &Utf8Path,
        cli_workers: Option<usize>,
        cli_build_all: bool,
    ) -> SelectionSettings {
        let mut settings = self.into_settings(repo_root);
        if let Some(workers) = cli_workers {
            settings.workers = workers;
        }
        settings.build_all = cli_build_all;
        settings
    }

    /// Merge for `classify`, which only needs the rule tables.
    pub fn merge_classify_args(self, repo_root: &Utf8Path) -> SelectionSettings {
        self.into_settings(repo_root)
    }

    fn into_settings(self, repo_root: &Utf8Path) -> SelectionSettings {
        let mut settings = SelectionSettings {
            repo_root: repo_root.to_path_buf(),
            ..SelectionSettings::default()
        };
        let config = self.config;
        let rules = &mut settings.rules;

        rules.port_arch.extend(config.ports);
        for file in config.rules.ignore_files {
            if !rules.ignore_files.contains(&file) {
                rules.ignore_files.push(file);
            }
        }
        for dir in config.rules.ignore_dirs {
            if !rules.ignore_dirs.contains(&dir) {
                rules.ignore_dirs.push(dir);
            }
        }
        if let Some(v) = config.rules.host_port {
            rules.host_port = v;
        }
        if let Some(v) = config.rules.frozen_prefix {
            rules.frozen_prefix = v;
        }
        if let Some(v) = config.rules.supervisor_prefix {
            rules.supervisor_prefix = v;
        }
        if let Some(v) = config.rules.web_workflow_static_dir {
            rules.web_workflow_static_dir = v;
        }

        if let Some(workers) = config.settings.workers {
            settings.workers = workers;
        }
        if let Some(depth) = config.settings.max_reference_depth {
            settings.max_reference_depth = depth;
        }
        if let Some(pattern) = config.docs.pattern {
            settings.doc_pattern = pattern;
        }
        settings.aliases = config.aliases;
        settings
    }
}
