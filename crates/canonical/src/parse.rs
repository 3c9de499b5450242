//! Canonical markup to [`CanonicalDocumentJson`].
//!
//! This is the only code that reads canonical markup, and it does so without
//! knowing which source dialect the markup was normalized from. One top-down
//! walk collects divisions, chapters and paragrafs; every paragraf is then
//! post-processed (amendment citation, status, stycke ordinals, content).
//!
//! Transparent containers and nested lists are followed up to
//! [`ParseConfig::max_depth`](crate::ParseConfig) levels.

use ingest::{doc_id, DocumentType};
use markup::{char_len, collapse_whitespace, inner_html, outer_html, NodeId, NodeKind, Tree};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::model::{
    CanonicalAppendix, CanonicalChapter, CanonicalDivision, CanonicalDocumentJson,
    CanonicalParagraf, CanonicalPreamble, CanonicalStycke, DocumentMetadata, ListItem,
    ParagrafStatus, StyckeRole, TransitionProvision, SCHEMA_VERSION,
};

static SECTION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([a-z])?\s*§").expect("section label pattern"));

static ARTICLE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Artikel\s+(\d+)\s*([a-z])?\b(?:\s*[—–-]\s*(.+))?").expect("article label pattern")
});

static CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*([a-z])?\s*kap\.\s*(.*)$").expect("chapter heading pattern")
});

static ROMAN_CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^KAPITEL\s+([IVXLC]+)\b\s*(.*)$").expect("roman chapter pattern")
});

static DIVISION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Avdelning\s+(\d+)\s*(.*)$").expect("division heading pattern")
});

static CHAPTER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_K(\w+)$").expect("chapter id pattern"));

static AMENDMENT_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Lag|Förordning)\s+\(\d{4}:\d+[a-z]?\)\.?$").expect("amendment citation pattern")
});

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+\.|-|[a-z]\))\s+(.+)$").expect("list item pattern"));

/// The backwards scan for an amendment citation stops at longer text.
const CITATION_SCAN_MAX_CHARS: usize = 80;

/// Per-document values supplied by the caller rather than read from markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Wins over inference when set.
    pub document_type: Option<DocumentType>,
    pub sfs_number: Option<String>,
    pub base_law_sfs: Option<String>,
    pub effective_date: Option<String>,
}

/// Parse canonical markup into the JSON document model.
///
/// Fails only when the `article.legal-document` wrapper is missing or the
/// markup nests deeper than `cfg.max_depth`.
///
/// ```rust
/// use canonical::{parse, ParseConfig, ParseOptions};
///
/// let markup = r#"<article class="legal-document" id="SFS2025-1">
///   <div class="lovhead"><h1><p class="text">SFS 2025:1</p><p class="text">Lag om test</p></h1></div>
///   <div class="body">
///     <h3 class="paragraph"><a class="paragraf" id="SFS2025-1_P1" name="SFS2025-1_P1">1 §</a></h3>
///     <p class="text">Denna lag gäller.</p>
///   </div>
/// </article>"#;
///
/// let doc = parse(markup, &ParseOptions::default(), &ParseConfig::default()).unwrap();
/// let paragrafs = doc.paragrafs.unwrap();
/// assert_eq!(paragrafs[0].number, "1");
/// assert_eq!(paragrafs[0].stycken[0].text, "Denna lag gäller.");
/// ```
pub fn parse(
    markup: &str,
    options: &ParseOptions,
    cfg: &ParseConfig,
) -> Result<CanonicalDocumentJson, ParseError> {
    cfg.validate()?;

    let tree = Tree::parse(markup);
    let article = tree
        .find_element(tree.root(), "article", Some("legal-document"))
        .ok_or(ParseError::MissingRootWrapper)?;

    let preamble = extract_preamble(&tree, article);
    let document_number = preamble
        .as_ref()
        .map(|p| p.document_number.clone())
        .filter(|n| !n.is_empty());
    let article_id = tree
        .attr(article, "id")
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let doc_id = article_id
        .map(str::to_string)
        .or_else(|| document_number.as_deref().map(doc_id))
        .unwrap_or_default();
    let document_type = options.document_type.unwrap_or_else(|| {
        infer_document_type(
            document_number.as_deref().unwrap_or(""),
            article_id.unwrap_or(""),
            tree.attr(article, "class").unwrap_or(""),
        )
    });

    let body = tree
        .child_element(article, "div", Some("body"))
        .unwrap_or(article);
    let mut walker = Walker {
        tree: &tree,
        max_depth: cfg.max_depth,
        loose_text: Vec::new(),
    };
    let mut scope = Scope::new(Level::Body, None);
    walker.walk(body, &mut scope, 0)?;
    let flat = walker.finish(&mut scope);

    let (divisions, chapters, paragrafs) = if !scope.divisions.is_empty() {
        (
            Some(scope.divisions),
            non_empty(scope.chapters),
            non_empty(flat),
        )
    } else if !scope.chapters.is_empty() {
        (None, Some(scope.chapters), non_empty(flat))
    } else {
        (None, None, Some(flat))
    };

    Ok(CanonicalDocumentJson {
        schema_version: SCHEMA_VERSION.to_string(),
        doc_id,
        document_type,
        preamble,
        divisions,
        chapters,
        paragrafs,
        loose_text: walker.loose_text,
        transition_provisions: extract_transitions(&tree, article),
        appendices: extract_appendices(&tree, article),
        metadata: DocumentMetadata {
            sfs_number: options.sfs_number.clone().or(document_number),
            base_law_sfs: options.base_law_sfs.clone(),
            effective_date: options.effective_date.clone(),
        },
    })
}

/// Document type from the number and the wrapper's id and class.
///
/// ```rust
/// use canonical::infer_document_type;
/// use ingest::DocumentType;
///
/// assert_eq!(infer_document_type("SFS 2025:1", "", "legal-document amendment"), DocumentType::SfsAmendment);
/// assert_eq!(infer_document_type("MSBFS 2020:7", "", "legal-document"), DocumentType::AgencyRegulation);
/// assert_eq!(infer_document_type("", "eu-32016R0679", "legal-document"), DocumentType::EuRegulation);
/// ```
pub fn infer_document_type(document_number: &str, article_id: &str, wrapper_class: &str) -> DocumentType {
    if article_id.to_lowercase().starts_with("eu-") {
        return DocumentType::EuRegulation;
    }
    let upper = document_number.trim().to_uppercase();
    if upper.starts_with("SFS") {
        if wrapper_class.contains("amendment") {
            return DocumentType::SfsAmendment;
        }
        return DocumentType::SfsLaw;
    }
    if DocumentType::has_agency_prefix(&upper) {
        return DocumentType::AgencyRegulation;
    }
    DocumentType::SfsLaw
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Body,
    Division,
    Chapter,
}

struct Scope {
    level: Level,
    chapter: Option<String>,
    current: Option<RawParagraf>,
    done: Vec<RawParagraf>,
    /// Group heading seen before the first paragraf of the scope.
    pending_heading: Option<String>,
    divisions: Vec<CanonicalDivision>,
    chapters: Vec<CanonicalChapter>,
}

impl Scope {
    fn new(level: Level, chapter: Option<String>) -> Self {
        Self {
            level,
            chapter,
            current: None,
            done: Vec::new(),
            pending_heading: None,
            divisions: Vec::new(),
            chapters: Vec::new(),
        }
    }

    /// Last non-heading stycke of the open paragraf.
    fn last_stycke(&mut self) -> Option<&mut RawStycke> {
        self.current
            .as_mut()
            .and_then(|p| p.stycken.last_mut())
            .filter(|s| s.role != StyckeRole::Heading)
    }
}

struct RawParagraf {
    number: String,
    heading: Option<String>,
    status: Option<ParagrafStatus>,
    stycken: Vec<RawStycke>,
}

struct RawStycke {
    role: StyckeRole,
    text: String,
    items: Option<Vec<ListItem>>,
    html: Option<String>,
}

impl RawStycke {
    fn text(role: StyckeRole, text: String) -> Self {
        Self {
            role,
            text,
            items: None,
            html: None,
        }
    }
}

struct Walker<'a> {
    tree: &'a Tree,
    max_depth: usize,
    loose_text: Vec<String>,
}

impl Walker<'_> {
    fn walk(&mut self, node: NodeId, scope: &mut Scope, depth: usize) -> Result<(), ParseError> {
        let tree = self.tree;
        for &child in tree.children(node) {
            match &tree.node(child).kind {
                NodeKind::Text(text) => {
                    let text = collapse_whitespace(text);
                    if !text.is_empty() {
                        self.push_text(scope, text);
                    }
                }
                NodeKind::Element(_) => self.element(child, scope, depth)?,
                NodeKind::Root => {}
            }
        }
        Ok(())
    }

    fn element(&mut self, node: NodeId, scope: &mut Scope, depth: usize) -> Result<(), ParseError> {
        let tree = self.tree;
        let Some(el) = tree.element(node) else {
            return Ok(());
        };

        if el.has_class("kapitel-rubrik") || el.has_class("avdelning-rubrik") {
            return Ok(());
        }

        match el.tag.as_str() {
            "div" if el.has_class("lovhead") || el.has_class("preamble") || el.has_class("appendices") => {}
            "footer" | "br" | "hr" | "script" | "style" | "noscript" => {}
            "section" if el.has_class("avdelning") && scope.level == Level::Body => {
                let number = scope.divisions.len() + 1;
                let division = self.division(node, number, depth)?;
                scope.divisions.push(division);
            }
            "section" if el.has_class("kapitel") && scope.level != Level::Chapter => {
                let chapter = self.chapter(node, depth)?;
                scope.chapters.push(chapter);
            }
            "h3" if el.has_class("paragraph") => self.start_paragraf(scope, node),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let text = tree.collapsed_text(node);
                if !text.is_empty() {
                    self.heading(scope, text);
                }
            }
            "p" => {
                let text = tree.collapsed_text(node);
                if !text.is_empty() {
                    self.push_text(scope, text);
                }
            }
            "div" if el.has_class("allmanna-rad") => {
                for p in tree.find_all(node, "p", None) {
                    let text = tree.collapsed_text(p);
                    if !text.is_empty() {
                        self.push_stycke(scope, RawStycke::text(StyckeRole::AllmantRad, text));
                    }
                }
            }
            "table" => self.push_stycke(
                scope,
                RawStycke {
                    role: StyckeRole::Table,
                    text: tree.collapsed_text(node),
                    items: None,
                    html: Some(outer_html(tree, node)),
                },
            ),
            "ol" | "ul" => self.list(scope, node, depth)?,
            "dl" => self.push_stycke(
                scope,
                RawStycke {
                    role: StyckeRole::Stycke,
                    text: tree.collapsed_text(node),
                    items: None,
                    html: Some(outer_html(tree, node)),
                },
            ),
            "div" | "section" | "article" | "main" | "aside" | "blockquote" | "center" => {
                let next = depth + 1;
                if next > self.max_depth {
                    return Err(ParseError::NestingTooDeep {
                        depth: next,
                        limit: self.max_depth,
                    });
                }
                self.walk(node, scope, next)?;
            }
            _ => {
                let text = tree.collapsed_text(node);
                if !text.is_empty() {
                    self.push_text(scope, text);
                }
            }
        }
        Ok(())
    }

    fn division(&mut self, node: NodeId, ordinal: usize, depth: usize) -> Result<CanonicalDivision, ParseError> {
        let tree = self.tree;
        let heading = tree
            .child_element(node, "h2", Some("avdelning-rubrik"))
            .map(|h| tree.collapsed_text(h))
            .unwrap_or_default();
        let (number, title) = match DIVISION_HEADING.captures(&heading) {
            Some(caps) => (
                caps[1].to_string(),
                caps.get(2).map(|m| m.as_str().trim().to_string()),
            ),
            None => (ordinal.to_string(), Some(heading)),
        };

        let mut scope = Scope::new(Level::Division, None);
        self.walk(node, &mut scope, depth)?;
        let loose = self.finish(&mut scope);

        let mut chapters = Vec::with_capacity(scope.chapters.len() + 1);
        if !loose.is_empty() {
            chapters.push(CanonicalChapter {
                number: None,
                title: None,
                paragrafs: loose,
            });
        }
        chapters.extend(scope.chapters);

        Ok(CanonicalDivision {
            number,
            title: title.filter(|t| !t.is_empty()),
            chapters,
        })
    }

    fn chapter(&mut self, node: NodeId, depth: usize) -> Result<CanonicalChapter, ParseError> {
        let tree = self.tree;
        let heading = tree
            .child_element(node, "h2", Some("kapitel-rubrik"))
            .or_else(|| tree.child_element(node, "h3", Some("kapitel-rubrik")))
            .map(|h| tree.collapsed_text(h))
            .unwrap_or_default();
        let (mut number, title) = parse_chapter_heading(&heading);
        if number.is_none() {
            number = tree
                .attr(node, "id")
                .and_then(|id| CHAPTER_ID.captures(id))
                .map(|caps| caps[1].to_string());
        }

        let mut scope = Scope::new(Level::Chapter, number.clone());
        self.walk(node, &mut scope, depth)?;
        let paragrafs = self.finish(&mut scope);

        Ok(CanonicalChapter {
            number,
            title,
            paragrafs,
        })
    }

    fn start_paragraf(&mut self, scope: &mut Scope, h3: NodeId) {
        let tree = self.tree;
        let anchor = tree.find_element(h3, "a", Some("paragraf"));
        let label = tree.collapsed_text(anchor.unwrap_or(h3));
        let (number, mut heading) = parse_paragraf_label(&label);
        let status = status_marker(tree, h3).or_else(|| anchor.and_then(|a| status_marker(tree, a)));

        if let Some(mut previous) = scope.current.take() {
            let trailing_heading = previous
                .stycken
                .last()
                .is_some_and(|s| s.role == StyckeRole::Heading);
            if trailing_heading && heading.is_none() {
                heading = previous.stycken.pop().map(|s| s.text);
            }
            scope.done.push(previous);
        }
        if let Some(pending) = scope.pending_heading.take() {
            match heading {
                None => heading = Some(pending),
                Some(_) => self.loose_text.push(pending),
            }
        }

        scope.current = Some(RawParagraf {
            number,
            heading,
            status,
            stycken: Vec::new(),
        });
    }

    fn heading(&mut self, scope: &mut Scope, text: String) {
        match scope.current.as_mut() {
            Some(current) => current
                .stycken
                .push(RawStycke::text(StyckeRole::Heading, text)),
            None => {
                if let Some(previous) = scope.pending_heading.replace(text) {
                    self.loose_text.push(previous);
                }
            }
        }
    }

    /// Plain text: list-like lines join the previous stycke's items.
    fn push_text(&mut self, scope: &mut Scope, text: String) {
        if let Some(caps) = LIST_ITEM.captures(&text) {
            if let Some(previous) = scope.last_stycke() {
                previous.items.get_or_insert_with(Vec::new).push(ListItem {
                    marker: Some(caps[1].to_string()),
                    text: caps[2].to_string(),
                    items: None,
                });
                return;
            }
        }
        self.push_stycke(scope, RawStycke::text(StyckeRole::Stycke, text));
    }

    fn push_stycke(&mut self, scope: &mut Scope, stycke: RawStycke) {
        match scope.current.as_mut() {
            Some(current) => current.stycken.push(stycke),
            None if !stycke.text.is_empty() => self.loose_text.push(stycke.text),
            None => {}
        }
    }

    fn list(&mut self, scope: &mut Scope, node: NodeId, depth: usize) -> Result<(), ParseError> {
        let items = self.list_items(node, depth + 1)?;
        if let Some(previous) = scope.last_stycke() {
            previous.items.get_or_insert_with(Vec::new).extend(items);
            return Ok(());
        }
        let tree = self.tree;
        self.push_stycke(
            scope,
            RawStycke {
                role: StyckeRole::Stycke,
                text: tree.collapsed_text(node),
                items: Some(items),
                html: Some(outer_html(tree, node)),
            },
        );
        Ok(())
    }

    fn list_items(&self, list: NodeId, depth: usize) -> Result<Vec<ListItem>, ParseError> {
        if depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                depth,
                limit: self.max_depth,
            });
        }
        let tree = self.tree;
        let ordered = tree.is(list, "ol", None);
        let mut ordinal: u32 = tree
            .attr(list, "start")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(1);

        let mut items = Vec::new();
        for li in tree.element_children(list).filter(|&c| tree.is(c, "li", None)) {
            let (text, sublists) = split_list_item(tree, li);
            let mut nested = Vec::new();
            for sublist in sublists {
                nested.extend(self.list_items(sublist, depth + 1)?);
            }

            let (marker, text) = if ordered {
                let marker = format!("{ordinal}.");
                ordinal += 1;
                (Some(marker), text)
            } else {
                match LIST_ITEM.captures(&text) {
                    Some(caps) => (Some(caps[1].to_string()), caps[2].to_string()),
                    None => (None, text),
                }
            };
            items.push(ListItem {
                marker,
                text,
                items: (!nested.is_empty()).then_some(nested),
            });
        }
        Ok(items)
    }

    /// Closes the scope and returns its finished paragrafs.
    fn finish(&mut self, scope: &mut Scope) -> Vec<CanonicalParagraf> {
        if let Some(current) = scope.current.take() {
            scope.done.push(current);
        }
        if let Some(heading) = scope.pending_heading.take() {
            self.loose_text.push(heading);
        }
        let chapter = scope.chapter.clone();
        scope
            .done
            .drain(..)
            .map(|raw| finalize_paragraf(raw, chapter.clone()))
            .collect()
    }
}

fn finalize_paragraf(raw: RawParagraf, chapter: Option<String>) -> CanonicalParagraf {
    let mut stycken = raw.stycken;

    let mut amended_by = None;
    for i in (0..stycken.len()).rev() {
        let stycke = &stycken[i];
        if stycke.role == StyckeRole::Heading {
            continue;
        }
        if stycke.role == StyckeRole::Stycke
            && stycke.items.is_none()
            && AMENDMENT_CITATION.is_match(&stycke.text)
        {
            amended_by = Some(stycke.text.trim_end_matches('.').to_string());
            stycken.remove(i);
            break;
        }
        if char_len(&stycke.text) > CITATION_SCAN_MAX_CHARS {
            break;
        }
    }

    let status = match (raw.status, &amended_by) {
        (Some(status), _) if status != ParagrafStatus::Original => status,
        (_, Some(_)) => ParagrafStatus::Amended,
        (status, None) => status.unwrap_or_default(),
    };

    let mut content = Vec::new();
    for stycke in &stycken {
        if matches!(stycke.role, StyckeRole::Stycke | StyckeRole::AllmantRad) {
            if !stycke.text.is_empty() && stycke.html.is_none() {
                content.push(stycke.text.clone());
            }
            if let Some(items) = &stycke.items {
                push_item_lines(items, &mut content);
            }
        }
    }

    let stycken = stycken
        .into_iter()
        .enumerate()
        .map(|(i, s)| CanonicalStycke {
            number: i as u32 + 1,
            role: s.role,
            text: s.text,
            items: s.items,
            html_content: s.html,
        })
        .collect();

    CanonicalParagraf {
        number: raw.number,
        chapter,
        heading: raw.heading,
        status,
        amended_by,
        content: content.join("\n"),
        stycken,
    }
}

fn push_item_lines(items: &[ListItem], out: &mut Vec<String>) {
    let mut stack: Vec<&ListItem> = items.iter().rev().collect();
    while let Some(item) = stack.pop() {
        match &item.marker {
            Some(marker) => out.push(format!("{marker} {}", item.text)),
            None => out.push(item.text.clone()),
        }
        if let Some(children) = &item.items {
            stack.extend(children.iter().rev());
        }
    }
}

/// Text of a list item outside its nested lists, and those nested lists.
fn split_list_item(tree: &Tree, li: NodeId) -> (String, Vec<NodeId>) {
    let mut text = String::new();
    let mut sublists = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(li).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        match &tree.node(node).kind {
            NodeKind::Text(t) => text.push_str(t),
            NodeKind::Element(el) if el.tag == "ol" || el.tag == "ul" => sublists.push(node),
            NodeKind::Element(_) => stack.extend(tree.children(node).iter().rev().copied()),
            NodeKind::Root => {}
        }
    }
    (collapse_whitespace(&text), sublists)
}

/// "2 a §" gives ("2a", None); "Artikel 5 — Syfte" gives ("art5", Some("Syfte")).
fn parse_paragraf_label(label: &str) -> (String, Option<String>) {
    if let Some(caps) = SECTION_LABEL.captures(label) {
        let mut number = caps[1].to_string();
        if let Some(letter) = caps.get(2) {
            number.push_str(letter.as_str());
        }
        return (number, None);
    }
    if let Some(caps) = ARTICLE_LABEL.captures(label) {
        let mut number = format!("art{}", &caps[1]);
        if let Some(letter) = caps.get(2) {
            number.push_str(letter.as_str());
        }
        let heading = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|h| !h.is_empty());
        return (number, heading);
    }
    let stripped = label.split('§').next().unwrap_or("").trim();
    if stripped.is_empty() {
        (label.to_string(), None)
    } else {
        (stripped.to_string(), None)
    }
}

/// Chapter number and title from "7 kap. Tillsyn" or "KAPITEL IV Avgifter".
fn parse_chapter_heading(heading: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    if let Some(caps) = CHAPTER_HEADING.captures(heading) {
        let mut number = caps[1].to_string();
        if let Some(letter) = caps.get(2) {
            number.push_str(letter.as_str());
        }
        return (Some(number), caps.get(3).and_then(|m| non_empty(m.as_str())));
    }
    if let Some(caps) = ROMAN_CHAPTER_HEADING.captures(heading) {
        return (
            Some(caps[1].to_uppercase()),
            caps.get(2).and_then(|m| non_empty(m.as_str())),
        );
    }
    (None, non_empty(heading))
}

fn status_marker(tree: &Tree, node: NodeId) -> Option<ParagrafStatus> {
    if let Some(status) = tree.attr(node, "data-status").and_then(ParagrafStatus::from_marker) {
        return Some(status);
    }
    let el = tree.element(node)?;
    el.classes().find_map(|class| match class {
        "amended" => Some(ParagrafStatus::Amended),
        "repealed" => Some(ParagrafStatus::Repealed),
        "new" => Some(ParagrafStatus::New),
        _ => None,
    })
}

fn extract_preamble(tree: &Tree, article: NodeId) -> Option<CanonicalPreamble> {
    let lovhead = tree.child_element(article, "div", Some("lovhead"));
    let preamble = tree.child_element(article, "div", Some("preamble"));
    if lovhead.is_none() && preamble.is_none() {
        return None;
    }

    let field = |class: &str| {
        lovhead
            .and_then(|l| tree.find_element(l, "p", Some(class)))
            .map(|p| tree.collapsed_text(p))
            .filter(|t| !t.is_empty())
    };
    let texts: Vec<String> = lovhead
        .map(|l| {
            tree.find_all(l, "p", Some("text"))
                .map(|p| tree.collapsed_text(p))
                .collect()
        })
        .unwrap_or_default();

    Some(CanonicalPreamble {
        document_number: texts.first().cloned().unwrap_or_default(),
        title: texts.get(1).cloned().filter(|t| !t.is_empty()),
        issuing_body: field("issuer"),
        promulgation_date: field("promulgated"),
        text: preamble
            .map(|p| tree.collapsed_text(p))
            .filter(|t| !t.is_empty()),
    })
}

/// Footer paragraphs grouped under the `sfs-number` line introducing them.
fn extract_transitions(tree: &Tree, article: NodeId) -> Vec<TransitionProvision> {
    let Some(footer) = tree.child_element(article, "footer", Some("back")) else {
        return Vec::new();
    };

    let mut groups: Vec<TransitionProvision> = Vec::new();
    for p in tree.find_all(footer, "p", None) {
        let text = tree.collapsed_text(p);
        if text.is_empty() {
            continue;
        }
        if tree.has_class(p, "sfs-number") {
            groups.push(TransitionProvision {
                sfs_number: Some(text),
                stycken: Vec::new(),
            });
            continue;
        }
        if groups.is_empty() {
            groups.push(TransitionProvision {
                sfs_number: None,
                stycken: Vec::new(),
            });
        }
        if let Some(group) = groups.last_mut() {
            let number = group.stycken.len() as u32 + 1;
            group.stycken.push(CanonicalStycke {
                number,
                role: StyckeRole::Stycke,
                text,
                items: None,
                html_content: None,
            });
        }
    }
    groups
}

/// `div.appendices`, split at its `h2` headings.
fn extract_appendices(tree: &Tree, article: NodeId) -> Vec<CanonicalAppendix> {
    let Some(container) = tree.child_element(article, "div", Some("appendices")) else {
        return Vec::new();
    };

    let mut appendices = Vec::new();
    let mut title: Option<String> = None;
    let mut html: Vec<String> = Vec::new();
    let mut text: Vec<String> = Vec::new();

    let mut flush = |title: Option<String>, html: &mut Vec<String>, text: &mut Vec<String>| {
        let joined = collapse_whitespace(&text.join(" "));
        if title.is_some() || !joined.is_empty() {
            appendices.push(CanonicalAppendix {
                title,
                text: joined,
                html_content: html.join("\n"),
            });
        }
        html.clear();
        text.clear();
    };

    if tree.child_element(container, "h2", None).is_none() {
        html.push(inner_html(tree, container).trim().to_string());
        text.push(tree.collapsed_text(container));
        flush(None, &mut html, &mut text);
        return appendices;
    }

    for &child in tree.children(container) {
        if tree.is(child, "h2", None) {
            flush(title.take(), &mut html, &mut text);
            title = Some(tree.collapsed_text(child));
        }
        let fragment = outer_html(tree, child);
        if !fragment.trim().is_empty() {
            html.push(fragment.trim().to_string());
        }
        if !tree.is(child, "h2", None) {
            text.push(tree.collapsed_text(child));
        }
    }
    flush(title.take(), &mut html, &mut text);
    appendices
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
