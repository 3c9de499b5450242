//! Riksdag header stripping and content-div unwrapping.
//!
//! Riksdag exports start with a metadata header (`div.sfstoc`, an `h2` title,
//! `<b>Label</b>: value<br>` pairs, `hr`) followed by one plain `div` holding
//! the law text. [`prepare`] turns that into a flat item sequence the dialect
//! rewrites walk, and harvests the header metadata on the way.

use markup::{collapse_whitespace, NodeId, NodeKind, Tree};

use crate::patterns::{is_preamble_text, promulgation_from_text};
use crate::writer::HeaderMeta;

#[derive(Debug)]
pub(crate) struct Prepared {
    pub items: Vec<NodeId>,
    pub meta: HeaderMeta,
}

pub(crate) fn prepare(tree: &Tree) -> Prepared {
    let root = tree.root();
    let top = tree.children(root);

    let has_header = top.iter().any(|&node| {
        tree.is(node, "b", None) || tree.is(node, "div", Some("sfstoc"))
    });

    let content_divs = content_divs(tree, top);
    let first_h2 = top.iter().copied().find(|&node| tree.is(node, "h2", None));

    let mut items = Vec::new();
    let mut meta = HeaderMeta::default();

    for (pos, &node) in top.iter().enumerate() {
        match &tree.node(node).kind {
            NodeKind::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if has_header && !trimmed.contains('§') && !trimmed.contains("kap.") {
                    continue;
                }
                items.push(node);
            }
            NodeKind::Element(el) => match el.tag.as_str() {
                "div" if el.has_class("sfstoc") => {}
                "h2" if Some(node) == first_h2 => {}
                "hr" | "br" | "style" | "script" => {}
                "b" => {
                    let value = top.get(pos + 1).and_then(|&next| tree.text_node(next));
                    read_label(&tree.collapsed_text(node), value, &mut meta);
                }
                "div" if content_divs.contains(&node) => {
                    for &child in tree.children(node) {
                        push_item(tree, child, &mut items);
                    }
                }
                _ => push_item(tree, node, &mut items),
            },
            NodeKind::Root => {}
        }
    }

    Prepared { items, meta }
}

/// Divs holding law anchors; when none do, every non-TOC div.
fn content_divs(tree: &Tree, top: &[NodeId]) -> Vec<NodeId> {
    let divs: Vec<NodeId> = top
        .iter()
        .copied()
        .filter(|&node| tree.is(node, "div", None) && !tree.has_class(node, "sfstoc"))
        .collect();
    let with_anchors: Vec<NodeId> = divs
        .iter()
        .copied()
        .filter(|&div| {
            tree.find_all(div, "a", None).any(|a| {
                tree.has_class(a, "paragraf")
                    || tree.attr(a, "name").is_some_and(|n| n.starts_with('K'))
            })
        })
        .collect();
    if with_anchors.is_empty() {
        divs
    } else {
        with_anchors
    }
}

/// Empty `<p>` spacers around name anchors are transparent.
fn push_item(tree: &Tree, node: NodeId, items: &mut Vec<NodeId>) {
    if tree.is(node, "p", None) && tree.collapsed_text(node).is_empty() {
        let kids: Vec<NodeId> = tree.element_children(node).collect();
        let all_anchors = kids
            .iter()
            .all(|&k| tree.is(k, "a", None) && tree.attr(k, "name").is_some());
        if kids.len() <= 1 && all_anchors {
            items.extend(kids);
            return;
        }
    }
    items.push(node);
}

fn read_label(label: &str, value: Option<&str>, meta: &mut HeaderMeta) {
    let Some(value) = value else {
        return;
    };
    let value = collapse_whitespace(value.trim_start().trim_start_matches(':'));
    if value.is_empty() {
        return;
    }
    let label = label.trim_end_matches(':').trim();
    if label.eq_ignore_ascii_case("Departement/myndighet") {
        meta.issuer.get_or_insert(value);
    } else if label.eq_ignore_ascii_case("Utfärdad") {
        meta.promulgated.get_or_insert(value);
    }
}

/// Preamble filter that remembers an "Utfärdad den …" date it drops.
pub(crate) struct PreambleFilter<'a> {
    title: &'a str,
    pub promulgated: Option<String>,
}

impl<'a> PreambleFilter<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            promulgated: None,
        }
    }

    /// True when `text` is empty or lovhead boilerplate.
    pub fn skip(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return true;
        }
        if self.promulgated.is_none() {
            self.promulgated = promulgation_from_text(text);
        }
        is_preamble_text(text, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIKSDAG: &str = r##"<h2>Arbetsmiljölag (1977:1160)</h2>
<b>SFS nr</b>: 1977:1160<br>
<b>Departement/myndighet</b>: Arbetsmarknadsdepartementet ARM<br>
<b>Utfärdad</b>: 1977-12-19<br>
<hr>
<div class="sfstoc"><a href="#K1">1 kap.</a></div>
<div><h3 name="K1"><a name="K1">1 kap.</a> Lagens ändamål</h3>
<p><a name="K1P1S1"></a></p>
<a class="paragraf" name="K1P1"><b>1 §</b></a> Lagens ändamål är att förebygga ohälsa.
</div>"##;

    #[test]
    fn header_is_stripped_and_metadata_harvested() {
        let tree = Tree::parse(RIKSDAG);
        let prepared = prepare(&tree);
        assert_eq!(
            prepared.meta.issuer.as_deref(),
            Some("Arbetsmarknadsdepartementet ARM")
        );
        assert_eq!(prepared.meta.promulgated.as_deref(), Some("1977-12-19"));

        let tags: Vec<Option<&str>> = prepared.items.iter().map(|&n| tree.tag(n)).collect();
        assert!(!tags.contains(&Some("h2")));
        assert!(!tags.contains(&Some("b")));
        assert!(!tags.contains(&Some("div")));
        assert_eq!(tags.iter().filter(|t| **t == Some("h3")).count(), 1);
        // the spacer <p> collapsed into its anchor
        assert!(!tags.contains(&Some("p")));
    }

    #[test]
    fn orphan_text_is_kept_without_header() {
        let tree = Tree::parse("Kungörelse om något.<p>Mer text</p>");
        let prepared = prepare(&tree);
        assert_eq!(prepared.items.len(), 2);
    }

    #[test]
    fn filter_captures_promulgation_date() {
        let mut filter = PreambleFilter::new("Lag om test");
        assert!(filter.skip("Utfärdad den 1 juli 2020."));
        assert!(filter.skip("Lag om test"));
        assert!(!filter.skip("1 § Denna lag gäller."));
        assert_eq!(filter.promulgated.as_deref(), Some("1 juli 2020"));
    }
}
