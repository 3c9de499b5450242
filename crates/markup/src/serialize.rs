//! Serializes arena subtrees back to HTML.
//!
//! Output follows the HTML fragment serialization rules closely enough for
//! canonical storage: void elements have no end tag, text is escaped except
//! inside raw-text elements, and attribute values are always double quoted.

use crate::text::{escape_attr, escape_text};
use crate::tree::{Element, NodeId, NodeKind, Tree};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

/// Writes `<tag attr="…">`, optionally replacing the `class` attribute.
pub fn write_open_tag(element: &Element, class_override: Option<&str>, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    let mut class_written = false;
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        if key == "class" {
            if let Some(class) = class_override {
                out.push_str(&escape_attr(class));
                class_written = true;
                out.push('"');
                continue;
            }
        }
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    if let (Some(class), false) = (class_override, class_written) {
        out.push_str(" class=\"");
        out.push_str(&escape_attr(class));
        out.push('"');
    }
    out.push('>');
}

pub fn write_close_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Appends the serialization of `id` (element, text or root) to `out`.
pub fn write_subtree(tree: &Tree, id: NodeId, out: &mut String) {
    write_with_override(tree, id, None, out);
}

fn write_with_override(tree: &Tree, id: NodeId, class_override: Option<&str>, out: &mut String) {
    let mut stack = vec![Step::Enter(id)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => match &tree.node(node).kind {
                NodeKind::Root => push_children(tree, node, &mut stack),
                NodeKind::Text(text) => {
                    let raw = tree
                        .parent(node)
                        .and_then(|p| tree.tag(p))
                        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
                    if raw {
                        out.push_str(text);
                    } else {
                        out.push_str(&escape_text(text));
                    }
                }
                NodeKind::Element(element) => {
                    let class = if node == id { class_override } else { None };
                    write_open_tag(element, class, out);
                    if is_void_element(&element.tag) {
                        continue;
                    }
                    stack.push(Step::Leave(node));
                    push_children(tree, node, &mut stack);
                }
            },
            Step::Leave(node) => {
                if let Some(tag) = tree.tag(node) {
                    write_close_tag(tag, out);
                }
            }
        }
    }
}

fn push_children(tree: &Tree, id: NodeId, stack: &mut Vec<Step>) {
    stack.extend(tree.children(id).iter().rev().map(|c| Step::Enter(*c)));
}

/// Markup of `id` including its own tags.
pub fn outer_html(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    write_subtree(tree, id, &mut out);
    out
}

/// Like [`outer_html`] but with the top element's `class` replaced.
pub fn outer_html_with_class(tree: &Tree, id: NodeId, class: &str) -> String {
    let mut out = String::new();
    write_with_override(tree, id, Some(class), &mut out);
    out
}

/// Markup of the children of `id`.
pub fn inner_html(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    for child in tree.children(id) {
        write_subtree(tree, *child, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_elements_have_no_end_tag() {
        let tree = Tree::parse("<p>a<br>b<img src=\"x.png\"></p>");
        let p = tree.find_element(tree.root(), "p", None).expect("p");
        assert_eq!(outer_html(&tree, p), "<p>a<br>b<img src=\"x.png\"></p>");
    }

    #[test]
    fn attribute_values_are_escaped() {
        let tree = Tree::parse(r#"<sup title="a &quot;b&quot; &amp; c">1</sup>"#);
        let sup = tree.find_element(tree.root(), "sup", None).expect("sup");
        assert_eq!(
            outer_html(&tree, sup),
            r#"<sup title="a &quot;b&quot; &amp; c">1</sup>"#
        );
    }

    #[test]
    fn inner_html_skips_own_tags() {
        let tree = Tree::parse("<div><b>x</b> y</div>");
        let div = tree.find_element(tree.root(), "div", None).expect("div");
        assert_eq!(inner_html(&tree, div), "<b>x</b> y");
    }

    #[test]
    fn class_is_added_when_missing() {
        let tree = Tree::parse("<table><tbody><tr><td>1</td></tr></tbody></table>");
        let table = tree.find_element(tree.root(), "table", None).expect("table");
        assert!(outer_html_with_class(&tree, table, "legal-table")
            .starts_with("<table class=\"legal-table\"><tbody>"));
    }
}
