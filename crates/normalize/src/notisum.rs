//! Rewrite for Notisum-style amendment markup.
//!
//! Amendment documents are produced by an LLM that mimics Notisum nesting:
//! `article.sfs` wrappers, `div.N2` / `div.annzone` / `section.ann` layers and
//! bare "N §" headings. This pass keeps the document's own markup and only
//! repairs the canonical shape:
//!
//! - `article.sfs` becomes `article.legal-document`
//! - `section.kapitel > h2` gains `kapitel-rubrik`
//! - `span.kapitel` and `sup.footnote` are dropped from section headings
//! - an emptied section heading hands its id to the next one
//! - bare section headings get an `a.paragraf` anchor, generated id included
//! - `section.group > h3.group` loses the `group` class
//! - Notisum wrapper layers are unwrapped
//! - a lovhead is injected when the wrapper lacks one

use ingest::DocumentHeader;
use markup::{
    escape_attr, escape_text, outer_html, write_close_tag, write_open_tag, Element, NodeId,
    NodeKind, Tree,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::{chapter_from_section_id, chapter_number, section_number};
use crate::writer::CanonicalWriter;

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").expect("blank run pattern"));

const RAW_TEXT_PARENTS: &[&str] = &["script", "style", "noscript"];

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

pub(crate) fn rewrite(tree: &Tree, header: &DocumentHeader) -> String {
    let mut rewriter = Rewriter {
        tree,
        header,
        out: String::new(),
        carried_id: None,
    };
    rewriter.run();
    BLANK_RUN.replace_all(&rewriter.out, "\n\n").into_owned()
}

struct Rewriter<'a> {
    tree: &'a Tree,
    header: &'a DocumentHeader,
    out: String,
    /// Id of an emptied section heading, waiting for the next one.
    carried_id: Option<String>,
}

impl Rewriter<'_> {
    fn run(&mut self) {
        let tree = self.tree;
        let mut stack: Vec<Step> = children_steps(tree, tree.root());

        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Leave(node) => {
                    if let Some(tag) = tree.tag(node) {
                        write_close_tag(tag, &mut self.out);
                    }
                    continue;
                }
                Step::Enter(node) => node,
            };

            let el = match &tree.node(node).kind {
                NodeKind::Text(text) => {
                    self.write_text(node, text);
                    continue;
                }
                NodeKind::Element(el) => el,
                NodeKind::Root => continue,
            };

            if is_wrapper(tree, node) {
                stack.extend(children_steps(tree, node));
                continue;
            }

            if tree.is(node, "h3", Some("paragraph")) {
                self.section_heading(node);
                continue;
            }

            let is_document = el.tag == "article"
                && (el.has_class("sfs") || el.has_class("legal-document"));
            let open = if is_document {
                with_classes(el, |classes| {
                    for class in classes.iter_mut() {
                        if class == "sfs" {
                            *class = "legal-document".to_string();
                        }
                    }
                    dedup(classes);
                })
            } else if el.tag == "h2" && parent_is(tree, node, "section", "kapitel") {
                with_classes(el, |classes| {
                    if !classes.iter().any(|c| c == "kapitel-rubrik") {
                        classes.push("kapitel-rubrik".to_string());
                    }
                })
            } else if el.tag == "h3" && el.has_class("group") && parent_is(tree, node, "section", "group") {
                with_classes(el, |classes| classes.retain(|c| c != "group"))
            } else {
                el.clone()
            };

            write_open_tag(&open, None, &mut self.out);
            if markup::is_void_element(&open.tag) {
                continue;
            }
            if is_document && tree.child_element(node, "div", Some("lovhead")).is_none() {
                let lovhead = CanonicalWriter::new(self.header).lovhead_lines();
                self.out.push('\n');
                self.out.push_str(&lovhead.join("\n"));
            }
            stack.push(Step::Leave(node));
            stack.extend(children_steps(tree, node));
        }
    }

    fn write_text(&mut self, node: NodeId, text: &str) {
        let raw = self
            .tree
            .parent(node)
            .and_then(|p| self.tree.tag(p))
            .is_some_and(|tag| RAW_TEXT_PARENTS.contains(&tag));
        if raw {
            self.out.push_str(text);
        } else {
            self.out.push_str(&escape_text(text));
        }
    }

    fn section_heading(&mut self, h3: NodeId) {
        let tree = self.tree;
        let cleaned = filtered_text(tree, h3, is_heading_noise);

        if cleaned.trim().is_empty() {
            let next_is_section = tree
                .next_element_sibling(h3)
                .is_some_and(|next| tree.is(next, "h3", Some("paragraph")));
            if next_is_section {
                if let Some(id) = non_empty(tree.attr(h3, "id")) {
                    self.carried_id.get_or_insert_with(|| id.to_string());
                }
                return;
            }
        }

        let carried = self.carried_id.take();
        let anchor = tree.find_element(h3, "a", Some("paragraf"));
        let own_id = non_empty(tree.attr(h3, "id"));

        if let Some(anchor) = anchor {
            let anchor_id = match non_empty(tree.attr(anchor, "id")) {
                Some(id) => id.to_string(),
                None => carried
                    .or_else(|| own_id.map(str::to_string))
                    .unwrap_or_else(|| self.generate_id(h3, &tree.collapsed_text(anchor))),
            };
            let el = element(tree, h3);
            write_open_tag(&el, None, &mut self.out);
            self.write_clean_children(h3, Some((anchor, &anchor_id)));
            write_close_tag("h3", &mut self.out);
            return;
        }

        let section_text = collapse(&filtered_text(tree, h3, |t, n| {
            is_heading_noise(t, n) || t.is(n, "sup", None)
        }));

        if !section_text.contains('§') {
            let mut el = element(tree, h3);
            if own_id.is_none() {
                if let Some(id) = carried {
                    set_attr(&mut el, "id", &id);
                }
            }
            write_open_tag(&el, None, &mut self.out);
            self.write_clean_children(h3, None);
            write_close_tag("h3", &mut self.out);
            return;
        }

        let id = own_id
            .map(str::to_string)
            .or(carried)
            .unwrap_or_else(|| self.generate_id(h3, &section_text));

        let mut el = element(tree, h3);
        el.attrs.retain(|(key, _)| key != "id");
        write_open_tag(&el, None, &mut self.out);
        let id = escape_attr(&id);
        self.out.push_str(&format!(
            "<a class=\"paragraf\" id=\"{id}\" name=\"{id}\">{}</a>",
            escape_text(&section_text)
        ));
        for sup in tree.find_all(h3, "sup", Some("footnote-ref")) {
            self.out.push_str(&outer_html(tree, sup));
        }
        write_close_tag("h3", &mut self.out);
    }

    /// Serializes the children of a section heading without Notisum noise,
    /// filling in the anchor's id when it was left empty.
    fn write_clean_children(&mut self, h3: NodeId, anchor_fix: Option<(NodeId, &str)>) {
        let tree = self.tree;
        let mut stack = children_steps(tree, h3);
        while let Some(step) = stack.pop() {
            match step {
                Step::Leave(node) => {
                    if let Some(tag) = tree.tag(node) {
                        write_close_tag(tag, &mut self.out);
                    }
                }
                Step::Enter(node) => match &tree.node(node).kind {
                    NodeKind::Text(text) => self.write_text(node, text),
                    NodeKind::Element(el) => {
                        if is_heading_noise(tree, node) {
                            continue;
                        }
                        let mut open = el.clone();
                        if let Some((anchor, id)) = anchor_fix {
                            if anchor == node {
                                set_attr(&mut open, "id", id);
                                set_attr(&mut open, "name", id);
                            }
                        }
                        write_open_tag(&open, None, &mut self.out);
                        if markup::is_void_element(&open.tag) {
                            continue;
                        }
                        stack.push(Step::Leave(node));
                        stack.extend(children_steps(tree, node));
                    }
                    NodeKind::Root => {}
                },
            }
        }
    }

    fn generate_id(&self, h3: NodeId, section_text: &str) -> String {
        let tree = self.tree;
        let doc_id = tree
            .ancestors(h3)
            .find(|&a| tree.is(a, "article", None))
            .and_then(|a| non_empty(tree.attr(a, "id")))
            .map(str::to_string)
            .unwrap_or_else(|| self.header.doc_id());
        let number = section_number(section_text);
        match self.chapter_context(h3) {
            Some(chapter) => format!("{doc_id}_K{chapter}_P{number}"),
            None => format!("{doc_id}_P{number}"),
        }
    }

    fn chapter_context(&self, h3: NodeId) -> Option<String> {
        let tree = self.tree;
        let section = tree
            .ancestors(h3)
            .find(|&a| tree.is(a, "section", Some("kapitel")))?;
        if let Some(ch) = tree.attr(section, "id").and_then(chapter_from_section_id) {
            return Some(ch.to_string());
        }
        let heading = tree
            .child_element(section, "h2", None)
            .or_else(|| tree.child_element(section, "h3", Some("kapitel-rubrik")))?;
        chapter_number(&tree.collapsed_text(heading))
    }
}

pub(crate) fn is_wrapper(tree: &Tree, node: NodeId) -> bool {
    tree.is(node, "div", Some("N2"))
        || tree.is(node, "div", Some("annzone"))
        || tree.is(node, "div", Some("element-body"))
        || tree.is(node, "section", Some("ann"))
        || tree.is(node, "section", Some("group"))
}

fn is_heading_noise(tree: &Tree, node: NodeId) -> bool {
    tree.is(node, "span", Some("kapitel")) || tree.is(node, "sup", Some("footnote"))
}

/// Text below `root`, skipping subtrees for which `skip` holds.
fn filtered_text(tree: &Tree, root: NodeId, skip: impl Fn(&Tree, NodeId) -> bool) -> String {
    let mut out = String::new();
    let mut stack: Vec<NodeId> = tree.children(root).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        match &tree.node(node).kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) if skip(tree, node) => {}
            _ => stack.extend(tree.children(node).iter().rev().copied()),
        }
    }
    out
}

fn collapse(text: &str) -> String {
    markup::collapse_whitespace(text)
}

fn children_steps(tree: &Tree, node: NodeId) -> Vec<Step> {
    tree.children(node).iter().rev().map(|c| Step::Enter(*c)).collect()
}

fn parent_is(tree: &Tree, node: NodeId, tag: &str, class: &str) -> bool {
    tree.parent(node)
        .is_some_and(|parent| tree.is(parent, tag, Some(class)))
}

fn element(tree: &Tree, node: NodeId) -> Element {
    tree.element(node).cloned().unwrap_or_else(|| Element {
        tag: "h3".to_string(),
        attrs: Vec::new(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn set_attr(el: &mut Element, key: &str, value: &str) {
    match el.attrs.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value.to_string(),
        None => el.attrs.push((key.to_string(), value.to_string())),
    }
}

/// Copy of `el` with its class tokens edited; an emptied class is removed.
fn with_classes(el: &Element, edit: impl FnOnce(&mut Vec<String>)) -> Element {
    let mut classes: Vec<String> = el.classes().map(str::to_string).collect();
    edit(&mut classes);
    let mut out = el.clone();
    if classes.is_empty() {
        out.attrs.retain(|(key, _)| key != "class");
    } else {
        set_attr(&mut out, "class", &classes.join(" "));
    }
    out
}

fn dedup(classes: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(classes.len());
    classes.retain(|c| {
        if seen.contains(c) {
            false
        } else {
            seen.push(c.clone());
            true
        }
    });
}
