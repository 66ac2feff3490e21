use crate::classify::{Classification, PathClassifier};
use crate::docs::{DEFAULT_DOC_PATTERN, DocSelector};
use crate::partition::{merge_failed, partition};
use crate::ports::{BoardSource, SettingsSource};
use crate::registry::BoardRegistry;
use crate::rules::RuleSet;
use crate::settings::{FetchOptions, SettingsCache};
use anyhow::Context;
use boardsel_types::{Architecture, FailedJobsReport, SelectionResult};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub rules: RuleSet,
    pub doc_pattern: String,
    /// Settings fetch workers; 0 means available parallelism.
    pub workers: usize,
    pub max_reference_depth: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            doc_pattern: DEFAULT_DOC_PATTERN.to_string(),
            workers: 0,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }
}

/// Inputs of one selection run.
#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    pub changed: Vec<String>,
    pub failed: FailedJobsReport,
    /// Skip path classification and select everything.
    pub force_all: bool,
}

impl SelectionRequest {
    /// An empty change list means "build everything".
    pub fn build_all(&self) -> bool {
        self.force_all || self.changed.is_empty()
    }
}

/// Boards chosen by path classification, before partitioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSelection {
    pub boards: BTreeSet<String>,
    pub build_all: bool,
    /// The path that forced a full build, if one did.
    pub trigger: Option<String>,
}

enum Scan {
    Scanning(BTreeSet<String>),
    BuildAll(Option<String>),
}

pub struct Selector {
    classifier: PathClassifier,
    docs: DocSelector,
    fetch: FetchOptions,
}

impl Selector {
    pub fn new(config: SelectorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            classifier: PathClassifier::new(config.rules)?,
            docs: DocSelector::new(&config.doc_pattern)?,
            fetch: FetchOptions {
                workers: config.workers,
                max_reference_depth: config.max_reference_depth,
            },
        })
    }

    pub fn rules(&self) -> &RuleSet {
        self.classifier.rules()
    }

    pub fn classify(&self, path: &str) -> Classification {
        self.classifier.classify(path)
    }

    /// Run the full selection: boards, partitioning, failed-job merge, and docs.
    pub fn select(
        &self,
        request: &SelectionRequest,
        boards: &dyn BoardSource,
        settings: &dyn SettingsSource,
    ) -> anyhow::Result<SelectionResult> {
        let build_all = request.build_all();
        if build_all {
            info!("building all docs/boards");
        } else {
            info!(
                paths = request.changed.len(),
                "adding docs/boards to build based on changed files"
            );
        }

        let build_docs = self
            .docs
            .should_build(&request.changed, build_all, &request.failed);

        let registry = BoardRegistry::load(boards)?;
        let selection = if build_all {
            BoardSelection {
                boards: registry.all_boards(),
                build_all: true,
                trigger: None,
            }
        } else {
            self.select_boards(&request.changed, &registry, settings)?
        };

        let mut buckets = partition(&selection.boards, &registry, self.rules());
        merge_failed(&mut buckets, &request.failed);

        let boards = Architecture::ALL
            .into_iter()
            .map(|a| (a, buckets.boards(a)))
            .collect();
        let restored = buckets
            .restored
            .iter()
            .map(|(a, b)| (*a, b.iter().cloned().collect()))
            .collect();

        Ok(SelectionResult {
            boards,
            restored,
            unplaced: buckets.unplaced.into_iter().collect(),
            build_docs,
            build_all: selection.build_all,
        })
    }

    /// Classify every changed path and accumulate the boards it selects.
    ///
    /// The first unclassified path switches to "all boards" and stops the scan.
    pub fn select_boards(
        &self,
        changed: &[String],
        registry: &BoardRegistry,
        settings: &dyn SettingsSource,
    ) -> anyhow::Result<BoardSelection> {
        let mut cache = SettingsCache::new();
        let mut state = Scan::Scanning(BTreeSet::new());

        for path in changed {
            let Scan::Scanning(selected) = &mut state else {
                break;
            };

            match self.classifier.classify(path) {
                Classification::Board(board) => {
                    debug!(path = %path, board = %board, "board-specific change");
                    selected.insert(board);
                }
                Classification::Port(port) => {
                    let boards = registry.boards_of_port(&port);
                    debug!(path = %path, port = %port, boards = boards.len(), "port-wide change");
                    selected.extend(boards);
                }
                Classification::Ignore(reason) => {
                    debug!(path = %path, ?reason, "ignored");
                }
                Classification::Ambiguous(ambiguous) => {
                    let candidates = match &ambiguous.port {
                        Some(port) => registry.boards_of_port(port),
                        None => registry.all_boards(),
                    };
                    cache
                        .ensure(&candidates, registry, settings, self.fetch)
                        .with_context(|| format!("resolve settings for {}", path))?;

                    let mut hits = 0usize;
                    for board in &candidates {
                        let affected = cache
                            .get(board)
                            .is_some_and(|s| s.is_affected_by(path, &ambiguous, self.rules()));
                        if affected {
                            hits += 1;
                            selected.insert(board.clone());
                        }
                    }
                    debug!(
                        path = %path,
                        candidates = candidates.len(),
                        selected = hits,
                        "settings-dependent change"
                    );
                }
                Classification::Unclassified => {
                    info!(path = %path, "unclassified change; building all boards");
                    state = Scan::BuildAll(Some(path.clone()));
                }
            }
        }

        Ok(match state {
            Scan::Scanning(boards) => BoardSelection {
                boards,
                build_all: false,
                trigger: None,
            },
            Scan::BuildAll(trigger) => BoardSelection {
                boards: registry.all_boards(),
                build_all: true,
                trigger,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{StaticBoardSource, StaticSettingsSource};
    use crate::settings::keys;
    use boardsel_types::BoardInfo;

    fn boards() -> StaticBoardSource {
        StaticBoardSource::default()
            .with_board("pico", BoardInfo::new("raspberrypi"))
            .with_board("pico_w", BoardInfo::new("raspberrypi"))
            .with_board("pico_alias", BoardInfo::alias("raspberrypi"))
            .with_board("feather_s3", BoardInfo::new("espressif"))
    }

    fn settings() -> StaticSettingsSource {
        let common = |patterns: &'static str| {
            vec![
                (keys::SRC_SUPERVISOR, "supervisor/shared/display.c"),
                (keys::SRC_PATTERNS, patterns),
                (keys::CIRCUITPY_WEB_WORKFLOW, "1"),
            ]
        };
        StaticSettingsSource::default()
            .with_board("pico", common("busio/%"))
            .with_board("pico_w", common("busio/% socket/% wifi/%"))
            .with_board("feather_s3", common("socket/% wifi/%"))
    }

    fn selector() -> Selector {
        Selector::new(SelectorConfig::default()).expect("selector")
    }

    fn select(paths: &[&str]) -> BoardSelection {
        let selector = selector();
        let registry = BoardRegistry::load(&boards()).expect("registry");
        let changed: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        selector
            .select_boards(&changed, &registry, &settings())
            .expect("select")
    }

    fn names(selection: &BoardSelection) -> Vec<&str> {
        selection.boards.iter().map(String::as_str).collect()
    }

    #[test]
    fn module_change_selects_boards_with_matching_sources() {
        let s = select(&["ports/raspberrypi/common-hal/socket/SSLSocket.c"]);
        assert_eq!(names(&s), vec!["pico_w"]);
        assert!(!s.build_all);
    }

    #[test]
    fn shared_module_change_considers_every_port() {
        let s = select(&["shared-bindings/socketpool/SocketPool.c"]);
        assert!(s.boards.is_empty());
        let s = select(&["shared-bindings/socket/Socket.c"]);
        assert_eq!(names(&s), vec!["feather_s3", "pico_w"]);
    }

    #[test]
    fn port_change_selects_non_alias_boards_of_port() {
        let s = select(&["ports/raspberrypi/Makefile"]);
        assert_eq!(names(&s), vec!["pico", "pico_w"]);
    }

    #[test]
    fn unclassified_path_short_circuits_to_all_boards() {
        let s = select(&["tests/foo.c", "py/obj.c", "ports/raspberrypi/boards/pico/board.c"]);
        assert!(s.build_all);
        assert_eq!(s.trigger.as_deref(), Some("py/obj.c"));
        assert_eq!(names(&s), vec!["feather_s3", "pico", "pico_w"]);
    }

    #[test]
    fn ignored_paths_add_nothing() {
        let s = select(&["tests/foo.c", "docs/index.rst", "ports/unix/main.c"]);
        assert!(s.boards.is_empty());
        assert!(!s.build_all);
    }

    #[test]
    fn select_partitions_and_merges_failures() {
        let selector = selector();
        let mut failed = FailedJobsReport::new();
        failed.record("build-espressif", Some("feather_s3"));
        let request = SelectionRequest {
            changed: vec!["ports/raspberrypi/boards/pico/pins.c".to_string()],
            failed,
            force_all: false,
        };

        let result = selector
            .select(&request, &boards(), &settings())
            .expect("select");

        assert_eq!(result.boards_for(Architecture::Arm), ["pico".to_string()]);
        assert_eq!(
            result.boards_for(Architecture::Espressif),
            ["feather_s3".to_string()]
        );
        assert!(result.boards_for(Architecture::Riscv).is_empty());
        assert!(!result.build_docs);
        assert!(!result.build_all);
    }

    #[test]
    fn empty_change_list_builds_everything() {
        let selector = selector();
        let result = selector
            .select(&SelectionRequest::default(), &boards(), &settings())
            .expect("select");

        assert!(result.build_all);
        assert!(result.build_docs);
        assert_eq!(result.total_boards(), 3);
    }
}
