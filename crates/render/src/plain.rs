//! Markup to a single line of search text.

use markup::{collapse_whitespace, NodeId, NodeKind, Tree};

enum Visit {
    Enter(NodeId),
    Leave,
}

/// Flatten `markup` to its text. Script, style and noscript content is
/// dropped, block boundaries become spaces, and whitespace is collapsed.
pub fn to_plain_text(markup: &str) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }
    let tree = Tree::parse(markup);
    let mut out = String::with_capacity(markup.len() / 2);
    let mut stack = vec![Visit::Enter(tree.root())];

    while let Some(visit) = stack.pop() {
        let id = match visit {
            Visit::Leave => {
                out.push(' ');
                continue;
            }
            Visit::Enter(id) => id,
        };
        match &tree.node(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Root => push_children(&tree, id, &mut stack),
            NodeKind::Element(el) => {
                let tag = el.tag.as_str();
                if matches!(tag, "script" | "style" | "noscript" | "template") {
                    continue;
                }
                if is_block(tag) {
                    out.push(' ');
                    stack.push(Visit::Leave);
                }
                push_children(&tree, id, &mut stack);
            }
        }
    }

    collapse_whitespace(&out)
}

fn push_children(tree: &Tree, id: NodeId, stack: &mut Vec<Visit>) {
    stack.extend(tree.children(id).iter().rev().map(|&child| Visit::Enter(child)));
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "br"
            | "hr"
            | "li"
            | "ul"
            | "ol"
            | "dl"
            | "dt"
            | "dd"
            | "table"
            | "tr"
            | "td"
            | "th"
            | "blockquote"
            | "pre"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "main"
            | "nav"
            | "aside"
    )
}
