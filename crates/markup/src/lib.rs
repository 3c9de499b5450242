//! Markup layer for the legal-document pipeline.
//!
//! Every stage that reads HTML goes through this crate: the normalizers, the
//! canonical parser and the markdown/plain-text renderers. Input is parsed
//! once with html5ever and copied into an immutable arena ([`Tree`]) whose
//! nodes are addressed by [`NodeId`]. Nothing downstream mutates a tree;
//! rewrites walk it and emit a new string.
//!
//! ## What lives here
//!
//! - [`Tree`]: arena of element and text nodes, with `html`/`head`/`body`
//!   wrappers flattened away so fragments and full documents look alike
//! - Serialization back to markup ([`outer_html`], [`inner_html`]) with a
//!   class override hook used when tables get `class="legal-table"`
//! - Text helpers shared by every stage ([`collapse_whitespace`],
//!   [`escape_html`], [`escape_text`], [`slugify`])
//!
//! ## Invariants worth knowing
//!
//! - Building a tree never fails and never recurses on DOM depth
//! - Serialization of an unchanged subtree is deterministic
//! - Text nodes hold decoded text; escaping happens on the way out
//!
//! ```
//! use markup::Tree;
//!
//! let tree = Tree::parse(r#"<p class="text">1 &sect; Lagen gäller</p>"#);
//! let p = tree.find_element(tree.root(), "p", Some("text")).unwrap();
//! assert_eq!(tree.text(p), "1 § Lagen gäller");
//! ```

mod serialize;
mod text;
mod tree;

pub use crate::serialize::{
    inner_html, is_void_element, outer_html, outer_html_with_class, write_close_tag,
    write_open_tag, write_subtree,
};
pub use crate::text::{
    char_len, collapse_whitespace, escape_attr, escape_html, escape_text, slugify,
};
pub use crate::tree::{Descendants, Element, Node, NodeId, NodeKind, Tree};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flattens_document_wrappers() {
        let tree = Tree::parse("<html><head><title>x</title></head><body><p>a</p></body></html>");
        let kids: Vec<_> = tree.element_children(tree.root()).collect();
        assert_eq!(kids.len(), 1);
        assert_eq!(tree.tag(kids[0]), Some("p"));
    }

    #[test]
    fn serialization_preserves_structure() {
        let src = r#"<div class="body"><p class="text">A &amp; B</p><br></div>"#;
        let tree = Tree::parse(src);
        let div = tree.element_children(tree.root()).next().expect("div");
        assert_eq!(outer_html(&tree, div), src);
    }

    #[test]
    fn class_override_applies_to_root_element_only() {
        let tree = Tree::parse(r#"<table class="old"><tr><td class="c">1</td></tr></table>"#);
        let table = tree.find_element(tree.root(), "table", None).expect("table");
        let html = outer_html_with_class(&tree, table, "legal-table");
        assert!(html.starts_with(r#"<table class="legal-table">"#));
        assert!(html.contains(r#"<td class="c">1</td>"#));
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let depth = 2_000;
        let mut src = String::new();
        for _ in 0..depth {
            src.push_str("<div>");
        }
        src.push_str("x");
        let tree = Tree::parse(&src);
        assert_eq!(collapse_whitespace(&tree.text(tree.root())), "x");
        assert!(!outer_html(&tree, tree.root()).is_empty());
    }
}
