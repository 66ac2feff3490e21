//! Rendering helpers (console and markdown) for human-readable selection output.

use boardsel_types::{Architecture, SelectionResult};
use std::collections::BTreeSet;

/// Console listing of what this run builds.
///
/// Boards picked by classification come first, sorted, including those no bucket took; boards
/// restored from the failed-job report follow in architecture order.
pub fn render_console(result: &SelectionResult) -> String {
    let mut out = String::new();
    out.push_str("Building boards:\n");

    let restored: BTreeSet<&str> = result
        .restored
        .values()
        .flatten()
        .map(String::as_str)
        .collect();
    let selected: BTreeSet<&str> = result
        .boards
        .values()
        .flatten()
        .map(String::as_str)
        .chain(result.unplaced.iter().map(String::as_str))
        .filter(|b| !restored.contains(b))
        .collect();

    for board in &selected {
        out.push_str(&format!("  {}\n", board));
    }
    for arch in Architecture::ALL {
        for board in result.restored.get(&arch).into_iter().flatten() {
            out.push_str(&format!("  {}\n", board));
        }
    }

    out.push_str(&format!("Building docs: {}\n", result.build_docs));
    out
}

/// Markdown step summary.
pub fn render_selection_md(result: &SelectionResult) -> String {
    let mut out = String::new();
    out.push_str("# boardsel selection\n\n");
    out.push_str(&format!(
        "- Mode: {}\n",
        if result.build_all {
            "build all"
        } else {
            "changed files"
        }
    ));
    out.push_str(&format!("- Boards: {}\n", result.total_boards()));
    let restored: usize = result.restored.values().map(Vec::len).sum();
    if restored > 0 {
        out.push_str(&format!("- Retried from previous run: {}\n", restored));
    }
    out.push_str(&format!(
        "- Docs: {}\n\n",
        if result.build_docs { "yes" } else { "no" }
    ));

    out.push_str("## Boards\n\n");
    if result.total_boards() == 0 {
        out.push_str("_No boards selected._\n");
        return out;
    }

    out.push_str("| Architecture | Count | Boards |\n");
    out.push_str("|---|---:|---|\n");
    for arch in Architecture::ALL {
        let boards = result.boards_for(arch);
        if boards.is_empty() {
            continue;
        }
        let restored = result.restored.get(&arch);
        let cells: Vec<String> = boards
            .iter()
            .map(|b| {
                if restored.is_some_and(|r| r.contains(b)) {
                    format!("`{}` (retry)", b)
                } else {
                    format!("`{}`", b)
                }
            })
            .collect();
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            arch,
            boards.len(),
            cells.join(", ")
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn result() -> SelectionResult {
        let mut boards: BTreeMap<Architecture, Vec<String>> =
            Architecture::ALL.into_iter().map(|a| (a, Vec::new())).collect();
        boards.insert(
            Architecture::Arm,
            vec!["pico".to_string(), "pygamer".to_string()],
        );
        boards.insert(Architecture::Espressif, vec!["feather_s3".to_string()]);
        let mut restored = BTreeMap::new();
        restored.insert(Architecture::Arm, vec!["pygamer".to_string()]);
        SelectionResult {
            boards,
            restored,
            unplaced: Vec::new(),
            build_docs: false,
            build_all: false,
        }
    }

    #[test]
    fn console_lists_selected_then_restored() {
        assert_eq!(
            render_console(&result()),
            "Building boards:\n  feather_s3\n  pico\n  pygamer\nBuilding docs: false\n"
        );
    }

    #[test]
    fn console_lists_boards_outside_every_bucket() {
        let mut result = result();
        result.unplaced = vec!["deleted_board".to_string()];
        assert_eq!(
            render_console(&result),
            "Building boards:\n  deleted_board\n  feather_s3\n  pico\n  pygamer\nBuilding docs: false\n"
        );
        assert!(!render_selection_md(&result).contains("deleted_board"));
    }

    #[test]
    fn markdown_summarises_buckets() {
        let md = render_selection_md(&result());
        assert!(md.starts_with("# boardsel selection\n"));
        assert!(md.contains("- Boards: 3\n"));
        assert!(md.contains("- Retried from previous run: 1\n"));
        assert!(md.contains("| arm | 2 | `pico`, `pygamer` (retry) |\n"));
        assert!(md.contains("| espressif | 1 | `feather_s3` |\n"));
        assert!(!md.contains("| riscv"));
    }

    #[test]
    fn markdown_handles_empty_selection() {
        let empty = SelectionResult {
            boards: Architecture::ALL
                .into_iter()
                .map(|a| (a, Vec::new()))
                .collect(),
            restored: BTreeMap::new(),
            unplaced: Vec::new(),
            build_docs: true,
            build_all: false,
        };
        let md = render_selection_md(&empty);
        assert!(md.contains("- Docs: yes\n"));
        assert!(md.contains("_No boards selected._"));
    }
}
