use anyhow::Context;
use boardsel_types::FailedJobsReport;
use regex::Regex;

/// Paths that affect the rendered documentation: workflow definitions, the docs tree, the ulab
/// submodule, binding sources, doc tooling, stubs, and markdown/reST files anywhere.
pub const DEFAULT_DOC_PATTERN: &str = r"^(?:.github/workflows/|docs|extmod/ulab|(?:(?:ports/\w+/bindings|shared-bindings)\S+\.c|conf\.py|tools/extract_pyi\.py|requirements-doc\.txt)$)|(?:-stubs|\.(?:md|MD|rst|RST))$";

/// Decides whether the documentation build must run.
#[derive(Debug, Clone)]
pub struct DocSelector {
    pattern: Regex,
}

impl DocSelector {
    pub fn new(pattern: &str) -> anyhow::Result<Self> {
        let pattern =
            Regex::new(pattern).with_context(|| format!("compile doc pattern {}", pattern))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    pub fn should_build(&self, paths: &[String], build_all: bool, failed: &FailedJobsReport) -> bool {
        build_all || failed.docs_failed() || paths.iter().any(|p| self.matches(p))
    }
}
