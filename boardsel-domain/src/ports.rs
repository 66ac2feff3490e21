use anyhow::Context;
use boardsel_types::BoardInfo;
use std::collections::BTreeMap;

/// Source of the board mapping (board ID -> owning port + alias flag).
///
/// boardsel-domain uses this so it can be tested against an in-memory implementation.
pub trait BoardSource {
    fn board_mapping(&self) -> anyhow::Result<BTreeMap<String, BoardInfo>>;
}

/// Source of per-board build settings.
///
/// Returns the raw, untyped settings bag for one board. Implementations are called from several
/// worker threads at once, one board per call.
pub trait SettingsSource: Sync {
    fn settings_for_board(&self, port: &str, board: &str)
    -> anyhow::Result<BTreeMap<String, String>>;
}

/// In-memory `BoardSource`.
#[derive(Debug, Clone, Default)]
pub struct StaticBoardSource {
    mapping: BTreeMap<String, BoardInfo>,
}

impl StaticBoardSource {
    pub fn new(mapping: BTreeMap<String, BoardInfo>) -> Self {
        Self { mapping }
    }

    pub fn with_board(mut self, board: &str, info: BoardInfo) -> Self {
        self.mapping.insert(board.to_string(), info);
        self
    }
}

impl BoardSource for StaticBoardSource {
    fn board_mapping(&self) -> anyhow::Result<BTreeMap<String, BoardInfo>> {
        Ok(self.mapping.clone())
    }
}

/// In-memory `SettingsSource` keyed by board ID.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsSource {
    boards: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticSettingsSource {
    pub fn new(boards: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { boards }
    }

    pub fn with_board<'a>(
        mut self,
        board: &str,
        settings: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let bag = settings
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.boards.insert(board.to_string(), bag);
        self
    }
}

impl SettingsSource for StaticSettingsSource {
    fn settings_for_board(
        &self,
        port: &str,
        board: &str,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        self.boards
            .get(board)
            .cloned()
            .with_context(|| format!("no settings recorded for board {} (port {})", board, port))
    }
}
