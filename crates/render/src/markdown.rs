//! Markup to markdown.
//!
//! Each node renders to a string fragment; block elements pad themselves
//! with blank lines and [`clean`] squeezes the result afterwards. Heading
//! levels follow the legal classes rather than the tag where one applies.

use markup::{Element, NodeId, NodeKind, Tree};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RenderConfig;
use crate::table;

/// Subtrees nested deeper than this render as their flattened text.
const MAX_DEPTH: usize = 256;

static FOOTNOTE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\)?").expect("footnote number pattern"));

static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t\u{A0}]+$").expect("blank line pattern"));

static BOLD_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*\*(\d+\s*[a-z]?\s*§)\*\*[ \t]*").expect("bold section pattern")
});

static NEWLINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("newline run pattern"));

/// Render `markup` as markdown. Blank input gives an empty string; anything
/// else ends with exactly one newline.
pub fn to_markdown(markup: &str, cfg: &RenderConfig) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }
    let tree = Tree::parse(markup);
    let renderer = Renderer { tree: &tree, cfg };
    clean(&renderer.children(tree.root(), 0, 0))
}

pub(crate) struct Renderer<'a> {
    pub(crate) tree: &'a Tree,
    cfg: &'a RenderConfig,
}

impl Renderer<'_> {
    pub(crate) fn children(&self, id: NodeId, list_depth: usize, depth: usize) -> String {
        self.tree
            .children(id)
            .iter()
            .map(|&child| self.node(child, list_depth, depth + 1))
            .collect()
    }

    /// Rendered content squeezed onto one line, for table cells and headings.
    pub(crate) fn inline(&self, id: NodeId, depth: usize) -> String {
        markup::collapse_whitespace(&self.children(id, 0, depth))
    }

    fn node(&self, id: NodeId, list_depth: usize, depth: usize) -> String {
        let el = match &self.tree.node(id).kind {
            NodeKind::Text(text) => return squash_spaces(text),
            NodeKind::Root => return self.children(id, list_depth, depth),
            NodeKind::Element(el) => el,
        };
        if depth > MAX_DEPTH {
            return squash_spaces(&self.tree.text(id));
        }

        let inner = || self.children(id, list_depth, depth);
        match el.tag.as_str() {
            "script" | "style" | "noscript" | "template" => String::new(),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.heading(id, el, depth),
            "p" => block(inner().trim()),
            "br" if self.cfg.preserve_line_breaks => "\n".into(),
            "br" => " ".into(),
            "hr" => "\n\n---\n\n".into(),
            "strong" | "b" => wrap("**", inner().trim()),
            "em" | "i" => wrap("*", inner().trim()),
            "u" => wrap("_", inner().trim()),
            "code" => format!("`{}`", inner()),
            "pre" => {
                let code = self
                    .tree
                    .find_element(id, "code", None)
                    .map(|code| self.tree.text(code))
                    .unwrap_or_else(|| self.tree.text(id));
                format!("\n\n```\n{}\n```\n\n", code.trim())
            }
            "a" => match el.attr("href").filter(|href| !href.is_empty()) {
                Some(href) => format!("[{}]({href}{})", inner().trim(), title_suffix(el)),
                None => inner(),
            },
            "img" => format!(
                "![{}]({}{})",
                el.attr("alt").unwrap_or(""),
                el.attr("src").unwrap_or(""),
                title_suffix(el)
            ),
            "ul" => block(&self.list(id, false, list_depth, depth)),
            "ol" => block(&self.list(id, true, list_depth, depth)),
            "dl" if el.has_class("footnote-content") => block(&self.footnote_definition(id, depth)),
            "dl" => block(&self.definition_list(id, depth)),
            "dt" => wrap("**", inner().trim()),
            "dd" => format!(": {}", inner().trim()),
            "blockquote" => {
                let quoted: Vec<String> = inner()
                    .trim()
                    .lines()
                    .map(|line| format!("> {line}"))
                    .collect();
                block(&quoted.join("\n"))
            }
            "table" => block(&table::render(self, id, depth)),
            "section" | "article" | "main" | "header" | "footer" | "nav" | "aside" => {
                format!("\n\n{}\n\n", inner())
            }
            "div" => format!("\n{}\n", inner()),
            "sup" if el.classes().any(|c| c.starts_with("footnote")) => {
                let content = inner();
                match FOOTNOTE_NUMBER.captures(&content) {
                    Some(caps) => format!("[^{}]", &caps[1]),
                    None => wrap("^", content.trim()),
                }
            }
            "sup" => wrap("^", inner().trim()),
            "sub" => format!("~{}~", inner()),
            "abbr" => match el.attr("title") {
                Some(title) => format!("{} ({title})", inner()),
                None => inner(),
            },
            _ => inner(),
        }
    }

    fn heading(&self, id: NodeId, el: &Element, depth: usize) -> String {
        let level = if el.has_class("paragraph") {
            3
        } else if el.has_class("group") {
            2
        } else if el.tag == "h1" {
            1
        } else {
            let tag_level = el.tag[1..].parse::<u8>().unwrap_or(6);
            tag_level.min(self.cfg.max_heading_level.max(1))
        };

        let text = self.inline(id, depth);
        if text.is_empty() {
            return String::new();
        }
        let anchor = if self.cfg.include_anchors {
            self.heading_id(id, el)
                .map(|id| format!(" {{#{id}}}"))
                .unwrap_or_default()
        } else {
            String::new()
        };
        format!("\n\n{} {text}{anchor}\n\n", "#".repeat(level as usize))
    }

    /// The heading's own id, else the id of its section anchor.
    fn heading_id<'t>(&'t self, id: NodeId, el: &'t Element) -> Option<&'t str> {
        el.attr("id").filter(|v| !v.is_empty()).or_else(|| {
            self.tree
                .child_element(id, "a", Some("paragraf"))
                .and_then(|a| self.tree.attr(a, "id"))
                .filter(|v| !v.is_empty())
        })
    }

    fn list(&self, id: NodeId, ordered: bool, list_depth: usize, depth: usize) -> String {
        let indent = "  ".repeat(list_depth);
        let start = self
            .tree
            .attr(id, "start")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);

        let items: Vec<String> = self
            .tree
            .element_children(id)
            .filter(|&child| self.tree.is(child, "li", None))
            .enumerate()
            .map(|(i, li)| {
                let content = self.children(li, list_depth + 1, depth + 1);
                let marker = if ordered {
                    format!("{}.", start + i)
                } else {
                    "-".to_string()
                };
                format!("{indent}{marker} {}", content.trim())
            })
            .collect();
        items.join("\n")
    }

    fn definition_list(&self, id: NodeId, depth: usize) -> String {
        let mut items = Vec::new();
        let mut term = String::new();
        for child in self.tree.element_children(id) {
            let content = self.children(child, 0, depth + 1);
            let content = content.trim();
            match self.tree.tag(child) {
                Some("dt") => term = content.to_string(),
                Some("dd") if term.is_empty() => items.push(content.to_string()),
                Some("dd") => items.push(format!("{term}: {content}")),
                _ => {}
            }
        }
        items.join("\n\n")
    }

    fn footnote_definition(&self, id: NodeId, depth: usize) -> String {
        let mut number = None;
        let mut text = String::new();
        for child in self.tree.element_children(id) {
            let content = self.children(child, 0, depth + 1);
            match self.tree.tag(child) {
                Some("dt") => {
                    number = FOOTNOTE_NUMBER
                        .captures(&content)
                        .map(|caps| caps[1].to_string());
                }
                Some("dd") => {
                    text = content
                        .trim()
                        .trim_start_matches(':')
                        .trim_start()
                        .to_string();
                }
                _ => {}
            }
        }
        match number {
            Some(n) if !text.is_empty() => format!("[^{n}]: {text}"),
            _ => String::new(),
        }
    }
}

fn squash_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn block(content: &str) -> String {
    if content.is_empty() {
        String::new()
    } else {
        format!("\n\n{content}\n\n")
    }
}

fn wrap(marker: &str, content: &str) -> String {
    if content.is_empty() {
        String::new()
    } else {
        format!("{marker}{content}{marker}")
    }
}

fn title_suffix(el: &Element) -> String {
    el.attr("title")
        .map(|title| format!(" \"{title}\""))
        .unwrap_or_default()
}

fn clean(markdown: &str) -> String {
    let text = BLANK_LINE.replace_all(markdown, "");
    let text = BOLD_SECTION.replace_all(&text, "\n\n### $1\n\n");
    let text = NEWLINE_RUN.replace_all(&text, "\n\n");
    let trimmed = text.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(markup: &str) -> String {
        to_markdown(markup, &RenderConfig::default())
    }

    const CHAPTER: &str = r#"<article class="legal-document" id="SFS1977-1160">
<div class="body">
<section class="kapitel" id="SFS1977-1160_K1">
<h2 class="kapitel-rubrik">1 kap. Lagens ändamål</h2>
<h3 class="paragraph"><a class="paragraf" id="SFS1977-1160_K1_P1" name="SFS1977-1160_K1_P1">1 §</a></h3>
<p class="text">Lagens ändamål är att förebygga ohälsa.</p>
</section>
</div>
</article>"#;

    #[test]
    fn legal_headings_follow_classes() {
        assert_eq!(
            md(CHAPTER),
            "## 1 kap. Lagens ändamål\n\n### 1 §\n\nLagens ändamål är att förebygga ohälsa.\n"
        );
        assert_eq!(md("<h3 class=\"group\">Definitioner</h3>"), "## Definitioner\n");
        assert_eq!(md("<h1>Arbetsmiljölag</h1>"), "# Arbetsmiljölag\n");
    }

    #[test]
    fn heading_anchors_use_section_ids() {
        let cfg = RenderConfig {
            include_anchors: true,
            ..RenderConfig::default()
        };
        let out = to_markdown(CHAPTER, &cfg);
        assert!(out.contains("### 1 § {#SFS1977-1160_K1_P1}\n"));
        assert!(out.contains("## 1 kap. Lagens ändamål\n"));
    }

    #[test]
    fn plain_heading_levels_are_capped() {
        let cfg = RenderConfig {
            max_heading_level: 4,
            ..RenderConfig::default()
        };
        assert_eq!(to_markdown("<h5>Rubrik</h5>", &cfg), "#### Rubrik\n");
        assert_eq!(to_markdown("<h2>Rubrik</h2>", &cfg), "## Rubrik\n");
    }

    #[test]
    fn bold_section_numbers_become_headings() {
        assert_eq!(md("<p><b>2 a §</b> Text</p>"), "### 2 a §\n\nText\n");
    }

    #[test]
    fn inline_markup() {
        let out = md(concat!(
            "<p>Se <a href=\"https://x.se\" title=\"X\">länk</a> och <i>kursiv</i>, ",
            "<u>under</u>, <code>c</code>, H<sub>2</sub>O, ",
            "<abbr title=\"Socialstyrelsen\">SoS</abbr>.</p>"
        ));
        assert_eq!(
            out,
            "Se [länk](https://x.se \"X\") och *kursiv*, _under_, `c`, H~2~O, SoS (Socialstyrelsen).\n"
        );
        assert_eq!(md("<p><a name=\"K1\">utan länk</a></p>"), "utan länk\n");
    }

    #[test]
    fn footnotes() {
        let out = md(concat!(
            "<p>Text<sup class=\"footnote-ref\">1)</sup></p>",
            "<dl class=\"footnote-content\"><dt>1)</dt><dd><p class=\"text\">Prop. 2020/21:1.</p></dd></dl>"
        ));
        assert_eq!(out, "Text[^1]\n\n[^1]: Prop. 2020/21:1.\n");
    }

    #[test]
    fn definition_lists() {
        let out = md("<dl><dt>arbetsgivare</dt><dd>den som anlitar arbetskraft</dd></dl>");
        assert_eq!(out, "arbetsgivare: den som anlitar arbetskraft\n");
    }

    #[test]
    fn nested_lists_indent() {
        let out = md("<ol><li>ett</li><li>två<ul><li>a</li></ul></li></ol>");
        assert_eq!(out, "1. ett\n2. två\n\n  - a\n");
        assert_eq!(md("<ol start=\"3\"><li>tre</li></ol>"), "3. tre\n");
    }

    #[test]
    fn line_breaks() {
        assert_eq!(md("<p>a<br>b</p>"), "a b\n");
        let cfg = RenderConfig {
            preserve_line_breaks: true,
            ..RenderConfig::default()
        };
        assert_eq!(to_markdown("<p>a<br>b</p>", &cfg), "a\nb\n");
    }

    #[test]
    fn blocks_and_rules() {
        assert_eq!(md("<p>a</p><hr><p>b</p>"), "a\n\n---\n\nb\n");
        assert_eq!(md("<blockquote><p>rad</p></blockquote>"), "> rad\n");
        assert_eq!(md("<pre><code>x  = 1</code></pre>"), "```\nx  = 1\n```\n");
    }

    #[test]
    fn empty_paragraphs_and_scripts_are_dropped() {
        assert_eq!(md("<p> \u{a0} </p><p>x</p><script>alert(1)</script>"), "x\n");
        assert_eq!(md(""), "");
        assert_eq!(md("<p> </p>"), "");
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let depth = 2_000;
        let markup = format!("{}djupt{}", "<span>".repeat(depth), "</span>".repeat(depth));
        assert_eq!(md(&markup), "djupt\n");
    }
}
