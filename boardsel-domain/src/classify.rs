use crate::rules::RuleSet;
use anyhow::Context;
use regex::Regex;
use std::fmt;

const BOARD_SHAPE: &str = r"^ports/[^/]+/boards/([^/]+)/";
const PORT_SHAPE: &str = r"^ports/([^/]+)/";
const MODULE_SHAPE: &str =
    r"^(ports/[^/]+/(?:common-hal|bindings)|shared-bindings|shared-module)/([^/]+)/";

/// Why a path contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    HostPort,
    File,
    Dir,
}

/// A path whose effect depends on each candidate board's build settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousPath {
    /// Owning port, when the path sits under `ports/<port>/`.
    pub port: Option<String>,
    /// Module name, when the path matched the module shape.
    pub module: Option<String>,
}

/// Outcome of classifying one changed path. Rules are tried in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Board(String),
    Port(String),
    Ignore(IgnoreReason),
    Ambiguous(AmbiguousPath),
    /// No rule matched: the run must build everything.
    Unclassified,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Board(board) => write!(f, "board {}", board),
            Classification::Port(port) => write!(f, "all boards of port {}", port),
            Classification::Ignore(IgnoreReason::HostPort) => f.write_str("ignored (host port)"),
            Classification::Ignore(IgnoreReason::File) => f.write_str("ignored (file)"),
            Classification::Ignore(IgnoreReason::Dir) => f.write_str("ignored (directory)"),
            Classification::Ambiguous(a) => write!(
                f,
                "depends on board settings (port={}, module={})",
                a.port.as_deref().unwrap_or("*"),
                a.module.as_deref().unwrap_or("-")
            ),
            Classification::Unclassified => f.write_str("unclassified: build everything"),
        }
    }
}

/// Maps a changed path to a [`Classification`] by its position in the source tree.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    rules: RuleSet,
    board_shape: Regex,
    port_shape: Regex,
    module_shape: Regex,
}

impl PathClassifier {
    pub fn new(rules: RuleSet) -> anyhow::Result<Self> {
        Ok(Self {
            rules,
            board_shape: Regex::new(BOARD_SHAPE).context("compile board shape")?,
            port_shape: Regex::new(PORT_SHAPE).context("compile port shape")?,
            module_shape: Regex::new(MODULE_SHAPE).context("compile module shape")?,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classify(&self, path: &str) -> Classification {
        if let Some(board) = capture(&self.board_shape, path, 1) {
            return Classification::Board(board);
        }

        let port = capture(&self.port_shape, path, 1);
        let module = capture(&self.module_shape, path, 2);

        if let Some(port) = &port
            && module.is_none()
        {
            if *port == self.rules.host_port {
                return Classification::Ignore(IgnoreReason::HostPort);
            }
            return Classification::Port(port.clone());
        }

        if let Some(reason) = self.rules.ignore_reason(path) {
            return Classification::Ignore(reason);
        }

        if path.starts_with(self.rules.frozen_prefix.as_str())
            || path.starts_with(self.rules.supervisor_prefix.as_str())
            || module.is_some()
        {
            return Classification::Ambiguous(AmbiguousPath { port, module });
        }

        Classification::Unclassified
    }
}

fn capture(re: &Regex, text: &str, group: usize) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str().to_string())
}
