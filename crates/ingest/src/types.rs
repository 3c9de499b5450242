//! Record types flowing into and out of the ingest stage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::metadata::doc_id;

/// Supported legal-source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    SfsLaw,
    SfsAmendment,
    AgencyRegulation,
    EuRegulation,
    EuDirective,
}

/// Agency regulation series ("författningssamlingar") recognised by prefix.
const AGENCY_PREFIXES: &[&str] = &[
    "MSBFS", "NFS", "AFS", "ELSÄK-FS", "BFS", "SKVFS", "KIFS", "SSMFS", "STAFS", "SRVFS",
    "SCB-FS", "MCFFS",
];

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::SfsLaw,
        DocumentType::SfsAmendment,
        DocumentType::AgencyRegulation,
        DocumentType::EuRegulation,
        DocumentType::EuDirective,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::SfsLaw => "SFS_LAW",
            DocumentType::SfsAmendment => "SFS_AMENDMENT",
            DocumentType::AgencyRegulation => "AGENCY_REGULATION",
            DocumentType::EuRegulation => "EU_REGULATION",
            DocumentType::EuDirective => "EU_DIRECTIVE",
        }
    }

    /// True when the number belongs to an agency regulation series.
    pub fn has_agency_prefix(document_number: &str) -> bool {
        let upper = document_number.trim().to_uppercase();
        AGENCY_PREFIXES.iter().any(|prefix| upper.starts_with(prefix))
    }

    /// Best-effort classification from the official number alone.
    ///
    /// ```rust
    /// use ingest::DocumentType;
    ///
    /// assert_eq!(DocumentType::infer("AFS 2023:10"), DocumentType::AgencyRegulation);
    /// assert_eq!(DocumentType::infer("SFS 1977:1160"), DocumentType::SfsLaw);
    /// ```
    pub fn infer(document_number: &str) -> DocumentType {
        let upper = document_number.trim().to_uppercase();
        if upper.starts_with("SFS") {
            return DocumentType::SfsLaw;
        }
        if Self::has_agency_prefix(&upper) {
            return DocumentType::AgencyRegulation;
        }
        if upper.starts_with("(EU)") || upper.starts_with("EU ") {
            return DocumentType::EuRegulation;
        }
        DocumentType::SfsLaw
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = IngestError;

    /// Accepts the canonical tags in any case, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace('-', "_");
        DocumentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| IngestError::UnknownContentType(s.trim().to_string()))
    }
}

/// A document as the store hands it over, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocumentRecord {
    pub id: String,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub markup: Option<String>,
}

/// Number and title used to build the canonical header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub document_number: String,
    pub title: String,
}

impl DocumentHeader {
    pub fn new(document_number: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            document_number: document_number.into(),
            title: title.into(),
        }
    }

    pub fn doc_id(&self) -> String {
        doc_id(&self.document_number)
    }
}

/// A sanitized record ready for normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedDocument {
    pub id: String,
    pub doc_id: String,
    pub header: DocumentHeader,
    pub document_type: DocumentType,
    pub markup: String,
}
