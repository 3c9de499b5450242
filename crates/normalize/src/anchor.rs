//! Rewrite for anchor-tagged Riksdag markup.
//!
//! Chapters are `h3` headings carrying `a[name=K{n}]`, sections are
//! `a.paragraf` anchors, and the text between them is a mix of loose text
//! nodes and `p`/`i`/`b` elements. Everything from the `a[name=overgang]`
//! item onwards is transitional and moves to the footer.

use ingest::DocumentHeader;
use markup::{
    char_len, collapse_whitespace, escape_text, inner_html, outer_html, outer_html_with_class,
    NodeId, NodeKind, Tree,
};

use crate::patterns::{chapter_anchor, chapter_prefix, section_number, transition_class};
use crate::prepare::{prepare, PreambleFilter};
use crate::writer::{BodyBuilder, CanonicalWriter, FooterBuilder};

/// Transparent containers deeper than this are flattened to text.
const MAX_CONTAINER_DEPTH: usize = 32;

pub(crate) fn rewrite(tree: &Tree, header: &DocumentHeader) -> String {
    rewrite_items(tree, header, true)
}

/// Shared walk; `chapters` is off for unstructured input, which never has
/// chapter anchors worth honouring.
pub(crate) fn rewrite_items(tree: &Tree, header: &DocumentHeader, chapters: bool) -> String {
    let prepared = prepare(tree);
    let mut meta = prepared.meta;
    let doc_id = header.doc_id();

    let split = transition_start(tree, &prepared.items).unwrap_or(prepared.items.len());
    let (body_items, transition_items) = prepared.items.split_at(split);

    let mut walk = BodyWalk {
        tree,
        body: BodyBuilder::new(&doc_id),
        filter: PreambleFilter::new(&header.title),
        chapters: chapters && has_chapter_markers(tree, body_items),
    };
    for &item in body_items {
        walk.item(item, 0);
    }
    if meta.promulgated.is_none() {
        meta.promulgated = walk.filter.promulgated.take();
    }
    let body = walk.body.finish();
    let footer = transition_footer(tree, transition_items);

    CanonicalWriter::new(header).with_meta(meta).finish(body, footer)
}

struct BodyWalk<'a> {
    tree: &'a Tree,
    body: BodyBuilder,
    filter: PreambleFilter<'a>,
    chapters: bool,
}

impl BodyWalk<'_> {
    fn item(&mut self, node: NodeId, depth: usize) {
        let tree = self.tree;
        let el = match &tree.node(node).kind {
            NodeKind::Text(text) => {
                let text = collapse_whitespace(text);
                if char_len(&text) > 1 && !self.filter.skip(&text) {
                    self.body.text(&text);
                }
                return;
            }
            NodeKind::Element(el) => el,
            NodeKind::Root => return,
        };

        match el.tag.as_str() {
            "h3" if self.chapters && chapter_of_heading(tree, node).is_some() => {
                if let Some(number) = chapter_of_heading(tree, node) {
                    self.body.start_chapter(number, &tree.collapsed_text(node));
                }
            }
            "h3" | "h4" | "h5" | "h6" => {
                let text = tree.collapsed_text(node);
                if !self.filter.skip(&text) {
                    self.body.group_heading(&text);
                }
            }
            "a" if is_paragraf_anchor(tree, node) => self.paragraf(node),
            "a" => {
                let text = tree.collapsed_text(node);
                if tree.attr(node, "href").is_some() && !self.filter.skip(&text) {
                    self.body.text_html(&outer_html(tree, node));
                }
            }
            "br" | "hr" | "style" | "script" => {}
            "p" if tree
                .element_children(node)
                .any(|child| is_paragraf_anchor(tree, child)) =>
            {
                self.split_paragraph(node)
            }
            "p" => {
                let text = tree.collapsed_text(node);
                if !self.filter.skip(&text) {
                    self.body.text_html(&inner_html(tree, node));
                }
            }
            "i" | "em" => {
                let text = tree.collapsed_text(node);
                if !self.filter.skip(&text) {
                    self.body
                        .text_html(&format!("<em>{}</em>", inner_html(tree, node).trim()));
                }
            }
            "b" | "strong" => {
                let text = tree.collapsed_text(node);
                if !text.is_empty() && !text.contains("SFS nr") && !text.contains("Departement") {
                    self.body
                        .text_html(&format!("<strong>{}</strong>", escape_text(&text)));
                }
            }
            "table" => self
                .body
                .raw(&outer_html_with_class(tree, node, "legal-table")),
            "ol" | "ul" | "dl" => self.body.raw(&outer_html(tree, node)),
            "div" | "section" | "article" | "span" if depth < MAX_CONTAINER_DEPTH => {
                for &child in tree.children(node) {
                    self.item(child, depth + 1);
                }
            }
            _ => {
                let text = tree.collapsed_text(node);
                if !self.filter.skip(&text) {
                    self.body.text(&text);
                }
            }
        }
    }

    fn paragraf(&mut self, anchor: NodeId) {
        let tree = self.tree;
        let name = tree
            .attr(anchor, "name")
            .or_else(|| tree.attr(anchor, "id"))
            .unwrap_or("");
        let number = section_number(&tree.collapsed_text(anchor));
        let chapter = if self.chapters { chapter_prefix(name) } else { None };
        let id = self.body.paragraf_id(chapter, &number);
        self.body.paragraf(&id, &number);
    }

    /// `<p><a class="paragraf">1 §</a> Text</p>`: marker first, then the rest.
    fn split_paragraph(&mut self, p: NodeId) {
        let tree = self.tree;
        let mut html = String::new();
        let mut text = String::new();
        for &child in tree.children(p) {
            if tree.element(child).is_some() && is_paragraf_anchor(tree, child) {
                self.flush_split(&mut html, &mut text);
                self.paragraf(child);
                continue;
            }
            html.push_str(&outer_html(tree, child));
            text.push_str(&tree.text(child));
        }
        self.flush_split(&mut html, &mut text);
    }

    fn flush_split(&mut self, html: &mut String, text: &mut String) {
        let collapsed = collapse_whitespace(text);
        if !self.filter.skip(&collapsed) {
            self.body.text_html(html);
        }
        html.clear();
        text.clear();
    }
}

fn is_paragraf_anchor(tree: &Tree, node: NodeId) -> bool {
    tree.is(node, "a", None)
        && tree
            .attr(node, "class")
            .is_some_and(|class| class.contains("paragraf"))
}

/// Chapter number of an `h3` carrying or containing `a[name=K{n}]`.
fn chapter_of_heading(tree: &Tree, h3: NodeId) -> Option<&str> {
    let anchor_name = tree
        .find_all(h3, "a", None)
        .filter_map(|a| tree.attr(a, "name"))
        .find(|name| name.starts_with('K'));
    let name = anchor_name.or_else(|| tree.attr(h3, "name"))?;
    chapter_anchor(name)
}

fn has_chapter_markers(tree: &Tree, items: &[NodeId]) -> bool {
    items.iter().any(|&item| {
        std::iter::once(item)
            .chain(tree.descendants(item))
            .any(|node| {
                (tree.is(node, "a", None) || tree.is(node, "h3", None))
                    && tree.attr(node, "name").and_then(chapter_anchor).is_some()
            })
    })
}

fn is_overgang(tree: &Tree, node: NodeId) -> bool {
    tree.is(node, "a", None) && tree.attr(node, "name") == Some("overgang")
}

fn transition_start(tree: &Tree, items: &[NodeId]) -> Option<usize> {
    items.iter().position(|&item| {
        is_overgang(tree, item) || tree.descendants(item).any(|node| is_overgang(tree, node))
    })
}

fn transition_footer(tree: &Tree, items: &[NodeId]) -> FooterBuilder {
    let mut footer = FooterBuilder::default();
    for &item in items {
        match &tree.node(item).kind {
            NodeKind::Text(text) => {
                let text = collapse_whitespace(text);
                if char_len(&text) > 1 {
                    footer.paragraph(transition_class(&text), &escape_text(&text));
                }
            }
            NodeKind::Element(el) => {
                let text = tree.collapsed_text(item);
                if text.is_empty() || text == "Övergångsbestämmelser" {
                    continue;
                }
                match el.tag.as_str() {
                    "a" | "br" => {}
                    "p" => footer.paragraph(transition_class(&text), &inner_html(tree, item)),
                    "i" => footer.paragraph("text", &format!("<em>{}</em>", inner_html(tree, item).trim())),
                    _ => footer.paragraph(transition_class(&text), &escape_text(&text)),
                }
            }
            NodeKind::Root => {}
        }
    }
    footer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> DocumentHeader {
        DocumentHeader::new("SFS 1977:1160", "Arbetsmiljölag (1977:1160)")
    }

    const CHAPTERED: &str = r#"<h2>Arbetsmiljölag (1977:1160)</h2>
<b>SFS nr</b>: 1977:1160<br>
<b>Departement/myndighet</b>: Arbetsmarknadsdepartementet<br>
<hr>
<div class="sfstoc">innehåll</div>
<div>
<h3 name="K1"><a name="K1">1 kap.</a> Lagens ändamål och tillämpningsområde</h3>
<a class="paragraf" name="K1P1"><b>1 §</b></a> Lagens ändamål är att förebygga ohälsa och olycksfall i arbetet.
<p><a name="K1P1S2"></a></p>
<a class="paragraf" name="K1P2a"><b>2 a §</b></a> Med arbetsgivare avses även den som anlitar inhyrd arbetskraft.
<i>Lag (2002:585).</i>
<h3 name="K2"><a name="K2">2 kap.</a> Arbetsmiljöns beskaffenhet</h3>
<a class="paragraf" name="K2P1"><b>1 §</b></a> Arbetsmiljön skall vara tillfredsställande.
<table><tr><td>a</td><td>b</td></tr></table>
<h3><a name="overgang">Övergångsbestämmelser</a></h3>
1977:1160
Denna lag träder i kraft den 1 juli 1978.
</div>"#;

    #[test]
    fn chaptered_document_gets_semantic_ids() {
        let out = rewrite(&Tree::parse(CHAPTERED), &header());
        assert!(out.contains(r#"<section class="kapitel" id="SFS1977-1160_K1">"#));
        assert!(out.contains(r#"<h2 class="kapitel-rubrik">1 kap. Lagens ändamål och tillämpningsområde</h2>"#));
        assert!(out.contains(r#"id="SFS1977-1160_K1_P1" name="SFS1977-1160_K1_P1">1 §</a>"#));
        assert!(out.contains(r#"id="SFS1977-1160_K1_P2a""#));
        assert!(out.contains(r#"id="SFS1977-1160_K2_P1""#));
        assert!(out.contains(r#"<p class="text"><em>Lag (2002:585).</em></p>"#));
        assert!(out.contains(r#"<table class="legal-table">"#));
    }

    #[test]
    fn metadata_header_is_stripped() {
        let out = rewrite(&Tree::parse(CHAPTERED), &header());
        assert!(!out.contains("SFS nr"));
        assert!(!out.contains("sfstoc"));
        assert!(!out.contains("innehåll"));
        assert!(out.contains(r#"<p class="issuer">Arbetsmarknadsdepartementet</p>"#));
    }

    #[test]
    fn transition_moves_to_footer() {
        let out = rewrite(&Tree::parse(CHAPTERED), &header());
        let footer = out.split(r#"<footer class="back">"#).nth(1).expect("footer present");
        // adjacent loose lines arrive as one text node
        assert!(footer.contains(r#"<p class="text">1977:1160 Denna lag träder i kraft den 1 juli 1978.</p>"#));
        assert_eq!(footer.matches("Övergångsbestämmelser").count(), 1);
        let body = out.split(r#"<footer class="back">"#).next().expect("body");
        assert!(!body.contains("träder i kraft den 1 juli 1978"));
    }

    #[test]
    fn sfs_number_lines_are_tagged_in_footer() {
        let html = r#"<div><a class="paragraf" name="P1"><b>1 §</b></a> Text om regler för något viktigt.
<a name="overgang"></a><p>2025:1535</p><p>Denna förordning träder i kraft den 1 januari 2026.</p></div>"#;
        let out = rewrite(&Tree::parse(html), &DocumentHeader::new("SFS 2025:1535", "Förordning"));
        assert!(out.contains(r#"<p class="text sfs-number">2025:1535</p>"#));
        assert!(out.contains(r#"<p class="text">Denna förordning träder i kraft den 1 januari 2026.</p>"#));
        assert!(out.contains(r#"id="SFS2025-1535_P1""#));
    }

    #[test]
    fn preamble_lines_are_dropped() {
        let html = r#"<div><p>Arbetsmiljölag</p><p>Utfärdad den 19 december 1977.</p>
<p>Regeringen föreskriver följande.</p><a class="paragraf" name="P1"><b>1 §</b></a> Innehåll.</div>"#;
        let out = rewrite(&Tree::parse(html), &header());
        assert!(!out.contains("Regeringen föreskriver"));
        assert!(!out.contains("<p class=\"text\">Arbetsmiljölag</p>"));
        assert!(out.contains(r#"<p class="promulgated">19 december 1977</p>"#));
        assert!(out.contains(r#"<p class="text">Innehåll.</p>"#));
    }

    #[test]
    fn anchor_inside_paragraph_is_split_out() {
        let html = r#"<div><p><a class="paragraf" name="P3"><b>3 §</b></a> Regler om tillsyn.</p></div>"#;
        let out = rewrite(&Tree::parse(html), &header());
        let marker = out.find(r#"id="SFS1977-1160_P3""#).expect("marker");
        let text = out.find("Regler om tillsyn.").expect("text");
        assert!(marker < text);
    }
}
