//! Content-loss safety net.
//!
//! A rewrite is measured against the original by collapsed text length. When
//! too little survives, the rewrite is discarded in favour of the fallback
//! document: the canonical wrapper around the original markup, minus the
//! Riksdag metadata header, with no chapter or paragraf structure.

use ingest::DocumentHeader;
use markup::{
    char_len, collapse_whitespace, escape_text, write_close_tag, write_open_tag, NodeId,
    NodeKind, Tree,
};

use crate::notisum::is_wrapper;
use crate::writer::{CanonicalWriter, FooterBuilder};

/// Loose top-level text shorter than this is header residue in a fallback.
const ORPHAN_TEXT_MAX_CHARS: usize = 100;

/// Collapsed text length of the original body: the Riksdag content div when
/// a metadata header marks the input as a Riksdag export, else everything.
pub(crate) fn original_body_len(tree: &Tree) -> usize {
    let root = tree.root();
    let top = tree.children(root);
    let riksdag = top
        .iter()
        .any(|&n| tree.is(n, "b", None) || tree.is(n, "div", Some("sfstoc")));
    let content = top
        .iter()
        .rev()
        .copied()
        .find(|&n| tree.is(n, "div", None) && !tree.has_class(n, "sfstoc"));
    match content {
        Some(div) if riksdag => char_len(&tree.collapsed_text(div)),
        _ => char_len(&tree.collapsed_text(root)),
    }
}

/// Collapsed text length of `div.body` plus `footer.back` in rewritten markup.
pub(crate) fn retained_len(markup: &str) -> usize {
    let tree = Tree::parse(markup);
    let root = tree.root();
    let mut parts: Vec<String> = tree
        .find_all(root, "div", Some("body"))
        .chain(tree.find_all(root, "footer", Some("back")))
        .map(|node| tree.collapsed_text(node))
        .collect();
    if parts.is_empty() {
        let total = char_len(&tree.collapsed_text(root));
        let lovhead: usize = tree
            .find_all(root, "div", Some("lovhead"))
            .map(|node| char_len(&tree.collapsed_text(node)))
            .sum();
        return total.saturating_sub(lovhead);
    }
    parts.retain(|p| !p.is_empty());
    char_len(&parts.join(" "))
}

/// Canonical wrapper around the original markup.
///
/// Wrapper layers that would re-trigger detection (`article`, Notisum
/// annotation zones, an existing lovhead) are unwrapped or dropped so the
/// fallback is a fixed point of [`normalize`](crate::normalize).
pub(crate) fn fallback_document(tree: &Tree, header: &DocumentHeader) -> String {
    let root = tree.root();
    let top = tree.children(root);
    let first_h2 = top.iter().copied().find(|&n| tree.is(n, "h2", None));

    let mut html = String::new();
    for &node in top {
        match &tree.node(node).kind {
            NodeKind::Text(text) => {
                let collapsed = collapse_whitespace(text);
                let orphan = char_len(&collapsed) < ORPHAN_TEXT_MAX_CHARS
                    && !collapsed.contains('§')
                    && !collapsed.contains("kap.");
                if !orphan {
                    html.push_str(&escape_text(text));
                }
            }
            NodeKind::Element(el) => {
                let header_part = match el.tag.as_str() {
                    "div" => el.has_class("sfstoc"),
                    "h2" => Some(node) == first_h2,
                    "hr" | "b" | "br" | "style" | "script" => true,
                    _ => false,
                };
                if !header_part {
                    write_flattened(tree, node, &mut html);
                }
            }
            NodeKind::Root => {}
        }
    }

    let body: Vec<String> = html
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("    {}", line.trim_end()))
        .collect();
    CanonicalWriter::new(header).finish(body, FooterBuilder::default())
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

fn write_flattened(tree: &Tree, node: NodeId, out: &mut String) {
    let mut stack = vec![Step::Enter(node)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Leave(id) => {
                if let Some(tag) = tree.tag(id) {
                    write_close_tag(tag, out);
                }
                continue;
            }
            Step::Enter(id) => id,
        };
        match &tree.node(id).kind {
            NodeKind::Text(text) => {
                let raw = tree
                    .parent(id)
                    .and_then(|p| tree.tag(p))
                    .is_some_and(|t| matches!(t, "script" | "style" | "noscript"));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            NodeKind::Element(el) => {
                if tree.is(id, "div", Some("lovhead")) {
                    continue;
                }
                if el.tag == "article" || is_wrapper(tree, id) {
                    stack.extend(tree.children(id).iter().rev().map(|&c| Step::Enter(c)));
                    continue;
                }
                let mut open = el.clone();
                open.attrs
                    .retain(|(key, value)| key != "id" || !value.trim().is_empty());
                write_open_tag(&open, None, out);
                if markup::is_void_element(&open.tag) {
                    continue;
                }
                stack.push(Step::Leave(id));
                stack.extend(tree.children(id).iter().rev().map(|&c| Step::Enter(c)));
            }
            NodeKind::Root => {}
        }
    }
}
