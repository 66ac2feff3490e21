use crate::ports::BoardSource;
use anyhow::Context;
use boardsel_types::BoardInfo;
use std::collections::{BTreeMap, BTreeSet};

/// Read-only view of the buildable boards for one run.
///
/// Alias boards are dropped on construction; they are never selected by classification.
#[derive(Debug, Clone, Default)]
pub struct BoardRegistry {
    board_to_port: BTreeMap<String, String>,
    port_to_boards: BTreeMap<String, BTreeSet<String>>,
}

impl BoardRegistry {
    pub fn from_mapping(mapping: &BTreeMap<String, BoardInfo>) -> Self {
        let mut registry = Self::default();
        for (board, info) in mapping {
            if info.alias {
                continue;
            }
            registry
                .board_to_port
                .insert(board.clone(), info.port.clone());
            registry
                .port_to_boards
                .entry(info.port.clone())
                .or_default()
                .insert(board.clone());
        }
        registry
    }

    pub fn load(source: &dyn BoardSource) -> anyhow::Result<Self> {
        let mapping = source.board_mapping().context("load board mapping")?;
        Ok(Self::from_mapping(&mapping))
    }

    pub fn all_boards(&self) -> BTreeSet<String> {
        self.board_to_port.keys().cloned().collect()
    }

    /// Boards of a port; empty when the port has no buildable boards.
    pub fn boards_of_port(&self, port: &str) -> BTreeSet<String> {
        self.port_to_boards.get(port).cloned().unwrap_or_default()
    }

    pub fn port_of(&self, board: &str) -> Option<&str> {
        self.board_to_port.get(board).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.board_to_port.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board_to_port.is_empty()
    }
}
