//! Format detection.
//!
//! Classifies a parsed document into one [`Dialect`]. Detection never fails:
//! anything that matches no known grammar is [`Dialect::Unstructured`].
//!
//! Checks run in this order, first match wins:
//!
//! 1. Notisum amendment markers (`article.sfs`, or the canonical wrapper with
//!    `div.annzone`, `section.ann`, `div.N2` or an `a.paragraf` whose id is
//!    empty). These documents already carry the canonical wrapper class, so
//!    they must be caught before the canonical fast path.
//! 2. Canonical / partially canonical wrapper.
//! 3. Class-tagged (`p.LedKapitel`, `p.LedParagraf`).
//! 4. Anchor-tagged Riksdag markup.

use std::fmt;

use markup::{NodeId, Tree};
use serde::{Deserialize, Serialize};

use crate::patterns::chapter_anchor;

/// The closed set of source grammars the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Canonical,
    PartiallyCanonical,
    NotisumAmendment,
    ClassTagged,
    AnchorTagged,
    Unstructured,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Canonical => "canonical",
            Dialect::PartiallyCanonical => "partially_canonical",
            Dialect::NotisumAmendment => "notisum_amendment",
            Dialect::ClassTagged => "class_tagged",
            Dialect::AnchorTagged => "anchor_tagged",
            Dialect::Unstructured => "unstructured",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses `markup` and classifies it.
///
/// ```rust
/// use normalize::{detect_markup, Dialect};
///
/// assert_eq!(detect_markup("<p class=\"LedParagraf\">1 §</p>"), Dialect::ClassTagged);
/// assert_eq!(detect_markup("<p>Tillkännagivande</p>"), Dialect::Unstructured);
/// ```
pub fn detect_markup(markup: &str) -> Dialect {
    detect(&Tree::parse(markup))
}

pub fn detect(tree: &Tree) -> Dialect {
    let root = tree.root();

    if tree.find_element(root, "article", Some("sfs")).is_some() {
        return Dialect::NotisumAmendment;
    }

    if let Some(wrapper) = tree.find_element(root, "article", Some("legal-document")) {
        if has_notisum_markers(tree, wrapper) {
            return Dialect::NotisumAmendment;
        }
        let structured = tree.find_element(wrapper, "h3", Some("paragraph")).is_some()
            || tree.find_element(wrapper, "a", Some("paragraf")).is_some();
        if structured || !tree.text(wrapper).contains('§') {
            return Dialect::Canonical;
        }
        return Dialect::PartiallyCanonical;
    }

    let has_led = tree.find_element(root, "p", Some("LedKapitel")).is_some()
        || tree.find_element(root, "p", Some("LedParagraf")).is_some();
    let has_paragraf_anchor = tree.find_element(root, "a", Some("paragraf")).is_some();
    if has_led && !has_paragraf_anchor {
        return Dialect::ClassTagged;
    }

    if has_paragraf_anchor || has_riksdag_markers(tree, root) {
        return Dialect::AnchorTagged;
    }

    Dialect::Unstructured
}

fn has_notisum_markers(tree: &Tree, wrapper: NodeId) -> bool {
    tree.descendants(wrapper).any(|node| {
        tree.is(node, "div", Some("annzone"))
            || tree.is(node, "section", Some("ann"))
            || tree.is(node, "div", Some("N2"))
            || (tree.is(node, "a", Some("paragraf"))
                && tree.attr(node, "id").is_some_and(|id| id.trim().is_empty()))
    })
}

fn has_riksdag_markers(tree: &Tree, root: NodeId) -> bool {
    tree.descendants(root).any(|node| match tree.tag(node) {
        Some("a") => tree
            .attr(node, "name")
            .is_some_and(|name| name == "overgang" || chapter_anchor(name).is_some()),
        Some("div") => tree.has_class(node, "sfstoc"),
        Some("b") => tree.collapsed_text(node).starts_with("SFS nr"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_wrapper_with_markers() {
        let html = r#"<article class="legal-document" id="X"><div class="body">
            <h3 class="paragraph"><a class="paragraf" id="X_P1" name="X_P1">1 §</a></h3>
            </div></article>"#;
        assert_eq!(detect_markup(html), Dialect::Canonical);
    }

    #[test]
    fn canonical_wrapper_without_sections_is_canonical() {
        let html = r#"<article class="legal-document" id="X"><div class="body"><p>Kungörelse</p></div></article>"#;
        assert_eq!(detect_markup(html), Dialect::Canonical);
    }

    #[test]
    fn wrapper_with_bare_section_signs_is_partial() {
        let html = r#"<article class="legal-document" id="X"><div class="body"><p>1 § Text</p></div></article>"#;
        assert_eq!(detect_markup(html), Dialect::PartiallyCanonical);
    }

    #[test]
    fn notisum_markers_win_over_canonical_wrapper() {
        let html = r#"<article class="legal-document"><div class="N2"><h3 class="paragraph">1 §</h3></div></article>"#;
        assert_eq!(detect_markup(html), Dialect::NotisumAmendment);
        let broken = r#"<article class="legal-document"><h3 class="paragraph"><a class="paragraf" id="">1 §</a></h3></article>"#;
        assert_eq!(detect_markup(broken), Dialect::NotisumAmendment);
        assert_eq!(detect_markup(r#"<article class="sfs"></article>"#), Dialect::NotisumAmendment);
    }

    #[test]
    fn led_classes_need_absent_anchors() {
        let led = r#"<p class="LedKapitel">1 kap.</p><p class="LedParagraf">1 §</p>"#;
        assert_eq!(detect_markup(led), Dialect::ClassTagged);
        let mixed = r#"<p class="LedParagraf">1 §</p><a class="paragraf" name="P1">1 §</a>"#;
        assert_eq!(detect_markup(mixed), Dialect::AnchorTagged);
    }

    #[test]
    fn riksdag_header_alone_is_anchor_tagged() {
        assert_eq!(detect_markup("<b>SFS nr</b>: 1977:1160<br><div>Text</div>"), Dialect::AnchorTagged);
        assert_eq!(detect_markup(r#"<div class="sfstoc"></div><p>x</p>"#), Dialect::AnchorTagged);
        assert_eq!(detect_markup(r#"<h3><a name="K1">1 kap.</a></h3>"#), Dialect::AnchorTagged);
    }
}
