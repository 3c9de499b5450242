//! Tables to pipe tables, or to grouped lists when the first column spans
//! several rows.

use markup::NodeId;

use crate::markdown::Renderer;

pub(crate) fn render(renderer: &Renderer<'_>, table: NodeId, depth: usize) -> String {
    let tree = renderer.tree;
    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();

    let own_rows = tree.descendants(table).filter(|&node| {
        tree.is(node, "tr", None)
            && tree.ancestors(node).find(|&a| tree.is(a, "table", None)) == Some(table)
    });
    for tr in own_rows {
        let cells: Vec<String> = tree
            .element_children(tr)
            .filter(|&cell| tree.is(cell, "td", None) || tree.is(cell, "th", None))
            .map(|cell| renderer.inline(cell, depth + 1).replace('|', "\\|"))
            .collect();
        if cells.is_empty() {
            continue;
        }
        let in_thead = tree
            .ancestors(tr)
            .take_while(|&a| a != table)
            .any(|a| tree.is(a, "thead", None));
        if in_thead {
            if header.is_none() {
                header = Some(cells);
            }
        } else {
            rows.push(cells);
        }
    }

    if rows.is_empty() && header.is_none() {
        return String::new();
    }

    let grouped = rows.first().is_some_and(|first| first.len() >= 3)
        && rows
            .iter()
            .skip(1)
            .any(|row| row.len() >= 2 && row[0].is_empty());
    if grouped {
        return grouped_lists(&rows);
    }

    if header.is_none() && !rows.is_empty() {
        header = Some(rows.remove(0));
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    if let Some(header) = &header {
        lines.push(format!("| {} |", header.join(" | ")));
        let rule: Vec<&str> = header.iter().map(|_| "---").collect();
        lines.push(format!("| {} |", rule.join(" | ")));
    }
    for row in &rows {
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines.join("\n")
}

/// A blank first cell continues the group named by the last non-blank one.
fn grouped_lists(rows: &[Vec<String>]) -> String {
    let mut lines = Vec::new();
    for row in rows.iter().filter(|row| row.len() >= 2) {
        if !row[0].is_empty() {
            lines.push(format!("\n**{}:**", row[0]));
        }
        let rest = &row[1..];
        if rest.len() >= 2 {
            let key = &rest[0];
            let value = rest[1..].join(" – ");
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() {
                lines.push(format!("- {key}: {value}"));
            } else if !key.is_empty() {
                lines.push(format!("- {key}"));
            }
        } else if !rest[0].is_empty() {
            lines.push(format!("- {}", rest[0]));
        }
    }
    lines.join("\n")
}
