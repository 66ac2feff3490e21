//! Selection and failed-job pipelines, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: inputs, board metadata, settings,
//! and outputs all go through port traits.

use crate::ports::{InputError, InputSource, OutputSink};
use crate::settings::SelectionSettings;
use anyhow::Context;
use boardsel_domain::{
    BoardSource, Classification, SelectionRequest, Selector, SettingsSource, collect_failed_jobs,
};
use boardsel_render::{render_console, render_selection_md};
use boardsel_types::{Architecture, FailedJobsReport, SelectionResult, outputs};
use camino::Utf8Path;
use fs_err as fs;
use std::io::Write;
use tracing::{debug, info};

/// Error type for pipeline results. Every variant maps to exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Outcome of `run_selection`.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub result: SelectionResult,
    /// Name/value pairs in the order they were emitted.
    pub outputs: Vec<(String, String)>,
    /// Human-readable listing of what is being built.
    pub console: String,
}

/// Run the selection pipeline and publish its outputs.
pub fn run_selection(
    settings: &SelectionSettings,
    inputs: &dyn InputSource,
    boards: &dyn BoardSource,
    board_settings: &dyn SettingsSource,
    sink: &mut dyn OutputSink,
) -> Result<SelectionOutcome, ToolError> {
    let inputs = inputs.load()?;
    debug!(
        changed = inputs.changed.len(),
        failed_jobs = inputs.failed.jobs().count(),
        "loaded change inputs"
    );

    let selector = Selector::new(settings.selector_config()).context("build selector")?;
    let request = SelectionRequest {
        changed: inputs.changed,
        failed: inputs.failed,
        force_all: settings.build_all,
    };
    let result = selector.select(&request, boards, board_settings)?;
    info!(
        boards = result.total_boards(),
        docs = result.build_docs,
        build_all = result.build_all,
        "selection complete"
    );

    let outputs = selection_outputs(&result)?;
    emit_outputs(&outputs, sink)?;

    Ok(SelectionOutcome {
        console: render_console(&result),
        result,
        outputs,
    })
}

/// Output values for a selection: one board list per architecture, then the doc flag.
pub fn selection_outputs(result: &SelectionResult) -> anyhow::Result<Vec<(String, String)>> {
    let mut out = Vec::with_capacity(Architecture::ALL.len() + 1);
    for arch in Architecture::ALL {
        let boards = serde_json::to_string(result.boards_for(arch))
            .with_context(|| format!("serialize boards for {}", arch))?;
        out.push((arch.output_name(), boards));
    }
    out.push((outputs::BUILD_DOC.to_string(), result.build_docs.to_string()));
    Ok(out)
}

pub fn emit_outputs(outputs: &[(String, String)], sink: &mut dyn OutputSink) -> anyhow::Result<()> {
    for (name, value) in outputs {
        sink.set_output(name, value)
            .with_context(|| format!("set output {}", name))?;
    }
    Ok(())
}

/// Append the markdown summary of a selection to `path`.
pub fn write_summary(result: &SelectionResult, path: &Utf8Path) -> anyhow::Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(render_selection_md(result).as_bytes())
        .with_context(|| format!("write summary {}", path))
}

/// Turn failed check-run names into a report and publish it as `checkruns`.
pub fn run_failed_jobs<'a>(
    names: impl IntoIterator<Item = &'a str>,
    sink: &mut dyn OutputSink,
) -> Result<FailedJobsReport, ToolError> {
    let report = collect_failed_jobs(names);
    info!(jobs = report.jobs().count(), "collected failed jobs");

    let value = serde_json::to_string(&report).context("serialize failed jobs")?;
    emit_outputs(&[(outputs::CHECKRUNS.to_string(), value)], sink)?;
    Ok(report)
}

/// Classify each path without fetching any board settings.
pub fn classify_paths(
    settings: &SelectionSettings,
    paths: &[String],
) -> Result<Vec<(String, Classification)>, ToolError> {
    let selector = Selector::new(settings.selector_config()).context("build selector")?;
    Ok(paths
        .iter()
        .map(|p| (p.clone(), selector.classify(p)))
        .collect())
}
