//! Clap-free settings for the selection pipeline.

use boardsel_domain::{DEFAULT_DOC_PATTERN, DEFAULT_MAX_REFERENCE_DEPTH, RuleSet, SelectorConfig};
use camino::Utf8PathBuf;
use std::collections::BTreeMap;

/// Settings for the selection pipeline, already merged from config file and flags.
#[derive(Debug, Clone)]
pub struct SelectionSettings {
    pub repo_root: Utf8PathBuf,

    // Engine
    pub rules: RuleSet,
    pub doc_pattern: String,
    pub workers: usize,
    pub max_reference_depth: usize,

    // Board discovery
    pub aliases: BTreeMap<String, Vec<String>>,

    // Mode
    pub build_all: bool,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            repo_root: Utf8PathBuf::from("."),
            rules: RuleSet::default(),
            doc_pattern: DEFAULT_DOC_PATTERN.to_string(),
            workers: 0,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            aliases: BTreeMap::new(),
            build_all: false,
        }
    }
}

impl SelectionSettings {
    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            rules: self.rules.clone(),
            doc_pattern: self.doc_pattern.clone(),
            workers: self.workers,
            max_reference_depth: self.max_reference_depth,
        }
    }
}
