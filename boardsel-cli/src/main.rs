use anyhow::Context;
use boardsel_cli::config::{self, ConfigMerger};
use boardsel_core::adapters::{
    ConsoleOutput, EnvInputSource, FsBoardSource, GithubOutputFile, JsonBoardSource,
    JsonSettingsSource, MakeSettingsSource, StaticInputSource,
};
use boardsel_core::pipeline::{classify_paths, run_failed_jobs, run_selection, write_summary};
use boardsel_core::ports::{InputSource, OutputSink};
use boardsel_core::{BoardSource, SettingsSource};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "boardsel",
    version,
    about = "Decide which firmware boards and docs a CI run must rebuild."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the per-architecture board matrix and the docs flag.
    Matrix(MatrixArgs),
    /// Show how each path is classified, without reading board settings.
    Classify(ClassifyArgs),
    /// Turn failed check-run names into the report consumed by `matrix`.
    FailedJobs(FailedJobsArgs),
}

#[derive(Debug, Parser)]
struct MatrixArgs {
    /// Changed paths. When omitted, CHANGED_FILES and LAST_FAILED_JOBS are read from the
    /// environment.
    paths: Vec<String>,

    /// Repository root (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Board mapping JSON file (default: scan <repo_root>/ports/*/boards).
    #[arg(long)]
    board_info: Option<Utf8PathBuf>,

    /// Per-board settings JSON file (default: query each port's make database).
    #[arg(long)]
    settings_json: Option<Utf8PathBuf>,

    /// Parallel settings fetches (0 = available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// File to append `name=value` outputs to (default: print them).
    #[arg(long, env = "GITHUB_OUTPUT")]
    output: Option<Utf8PathBuf>,

    /// File to append a markdown summary to.
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    summary: Option<Utf8PathBuf>,

    /// Build every board and the docs regardless of the changed paths.
    #[arg(long, default_value_t = false)]
    build_all: bool,
}

#[derive(Debug, Parser)]
struct ClassifyArgs {
    /// Paths to classify.
    #[arg(required = true)]
    paths: Vec<String>,

    /// Repository root, for boardsel.toml (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct FailedJobsArgs {
    /// Check-run names, e.g. "build-arm (pygamer)". Read from stdin, one per line, when omitted.
    names: Vec<String>,

    /// File to append `name=value` outputs to (default: print them).
    #[arg(long, env = "GITHUB_OUTPUT")]
    output: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Matrix(args) => cmd_matrix(args),
        Command::Classify(args) => cmd_classify(args),
        Command::FailedJobs(args) => cmd_failed_jobs(args),
    }
}

fn output_sink(output: Option<Utf8PathBuf>) -> Box<dyn OutputSink> {
    match output {
        Some(path) => Box::new(GithubOutputFile::new(path)),
        None => Box::new(ConsoleOutput),
    }
}

fn cmd_matrix(args: MatrixArgs) -> anyhow::Result<()> {
    let repo_root = args.repo_root;

    let file_config = config::load_or_default(&repo_root).context("load boardsel.toml config")?;
    let settings =
        ConfigMerger::new(file_config).merge_matrix_args(&repo_root, args.workers, args.build_all);
    debug!(
        "merged config: workers={}, max_reference_depth={}, build_all={}",
        settings.workers, settings.max_reference_depth, settings.build_all
    );

    let inputs: Box<dyn InputSource> = if args.paths.is_empty() {
        Box::new(EnvInputSource::from_process_env())
    } else {
        info!("using files list on commandline");
        Box::new(StaticInputSource::from_paths(args.paths))
    };

    let boards: Box<dyn BoardSource> = match args.board_info {
        Some(path) => Box::new(JsonBoardSource::new(path)),
        None => Box::new(
            FsBoardSource::new(repo_root.clone()).with_aliases(settings.aliases.clone()),
        ),
    };
    let board_settings: Box<dyn SettingsSource> = match &args.settings_json {
        Some(path) => Box::new(JsonSettingsSource::load(path)?),
        None => Box::new(MakeSettingsSource::new(repo_root.clone())?),
    };

    let mut sink = output_sink(args.output);
    let outcome = run_selection(
        &settings,
        inputs.as_ref(),
        boards.as_ref(),
        board_settings.as_ref(),
        sink.as_mut(),
    )?;
    print!("{}", outcome.console);

    if let Some(path) = args.summary {
        write_summary(&outcome.result, &path)?;
    }
    Ok(())
}

fn cmd_classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let file_config =
        config::load_or_default(&args.repo_root).context("load boardsel.toml config")?;
    let settings = ConfigMerger::new(file_config).merge_classify_args(&args.repo_root);

    for (path, classification) in classify_paths(&settings, &args.paths)? {
        println!("{}: {}", path, classification);
    }
    Ok(())
}

fn cmd_failed_jobs(args: FailedJobsArgs) -> anyhow::Result<()> {
    let names = if args.names.is_empty() {
        let mut names = Vec::new();
        for line in std::io::stdin().lock().lines() {
            let line = line.context("read check-run names from stdin")?;
            let line = line.trim();
            if !line.is_empty() {
                names.push(line.to_string());
            }
        }
        names
    } else {
        args.names
    };

    let mut sink = output_sink(args.output);
    let report = run_failed_jobs(names.iter().map(String::as_str), sink.as_mut())?;
    for (job, boards) in report.jobs() {
        println!("{}: {}", job, boards.join(", "));
    }
    Ok(())
}
