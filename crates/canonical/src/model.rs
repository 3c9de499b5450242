//! JSON document model produced by the canonical parser.
//!
//! Field names serialize in camelCase; optional fields are omitted when
//! absent so stored JSON stays compact.
//!
//! # Structure
//!
//! ```text
//! CanonicalDocumentJson
//! ├── schemaVersion, docId, documentType
//! ├── preamble?            CanonicalPreamble
//! ├── divisions?           [CanonicalDivision]  ┐
//! ├── chapters?            [CanonicalChapter]   ├ one body shape
//! ├── paragrafs?           [CanonicalParagraf]  ┘
//! ├── looseText            [String]
//! ├── transitionProvisions [TransitionProvision]
//! ├── appendices           [CanonicalAppendix]
//! └── metadata             DocumentMetadata
//! ```

use ingest::DocumentType;
use serde::{Deserialize, Serialize};

/// Version of the JSON layout written into every document.
pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalDocumentJson {
    pub schema_version: String,
    pub doc_id: String,
    pub document_type: DocumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<CanonicalPreamble>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisions: Option<Vec<CanonicalDivision>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<CanonicalChapter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragrafs: Option<Vec<CanonicalParagraf>>,
    /// Body text attached to no paragraf.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loose_text: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transition_provisions: Vec<TransitionProvision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub appendices: Vec<CanonicalAppendix>,
    pub metadata: DocumentMetadata,
}

impl CanonicalDocumentJson {
    /// Which body fields are populated, in priority order.
    pub fn body_shapes(&self) -> Vec<BodyShape> {
        let mut shapes = Vec::new();
        if self.divisions.is_some() {
            shapes.push(BodyShape::Divisions);
        }
        if self.chapters.is_some() {
            shapes.push(BodyShape::Chapters);
        }
        if self.paragrafs.is_some() {
            shapes.push(BodyShape::Paragrafs);
        }
        shapes
    }

    /// Every paragraf in document order, whatever the body shape.
    pub fn all_paragrafs(&self) -> impl Iterator<Item = &CanonicalParagraf> {
        let from_divisions = self
            .divisions
            .iter()
            .flatten()
            .flat_map(|d| d.chapters.iter())
            .flat_map(|c| c.paragrafs.iter());
        let from_chapters = self
            .chapters
            .iter()
            .flatten()
            .flat_map(|c| c.paragrafs.iter());
        let flat = self.paragrafs.iter().flatten();
        from_divisions.chain(from_chapters).chain(flat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyShape {
    Divisions,
    Chapters,
    Paragrafs,
}

impl BodyShape {
    /// JSON field holding this shape.
    pub fn field(self) -> &'static str {
        match self {
            BodyShape::Divisions => "divisions",
            BodyShape::Chapters => "chapters",
            BodyShape::Paragrafs => "paragrafs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPreamble {
    pub document_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuing_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promulgation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalDivision {
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub chapters: Vec<CanonicalChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalChapter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub paragrafs: Vec<CanonicalParagraf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagrafStatus {
    #[default]
    Original,
    Amended,
    Repealed,
    New,
}

impl ParagrafStatus {
    /// Parses a `data-status` value or class token.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "original" => Some(ParagrafStatus::Original),
            "amended" => Some(ParagrafStatus::Amended),
            "repealed" => Some(ParagrafStatus::Repealed),
            "new" => Some(ParagrafStatus::New),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalParagraf {
    /// Compacted section number: "17a", or "art5" for EU articles.
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub status: ParagrafStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amended_by: Option<String>,
    /// Newline-joined text of the text-bearing stycken.
    pub content: String,
    pub stycken: Vec<CanonicalStycke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StyckeRole {
    Stycke,
    Table,
    AllmantRad,
    Heading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalStycke {
    /// 1-based ordinal within the paragraf.
    pub number: u32,
    pub role: StyckeRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ListItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ListItem>>,
}

/// Footer provisions introduced by one amending SFS number line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionProvision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sfs_number: Option<String>,
    pub stycken: Vec<CanonicalStycke>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalAppendix {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    pub html_content: String,
}

/// Caller-supplied identifiers carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default)]
    pub sfs_number: Option<String>,
    #[serde(default)]
    pub base_law_sfs: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
}
