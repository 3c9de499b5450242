use thiserror::Error;

/// Hard failures of the canonical parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("markup has no article.legal-document wrapper")]
    MissingRootWrapper,
    #[error("container nesting depth {depth} exceeds limit {limit}")]
    NestingTooDeep { depth: usize, limit: usize },
}

/// One structural violation found by the schema validator.
///
/// `path` is a JSON-pointer-like location such as `/chapters/2/paragrafs/0`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path}: expected {expected}")]
    WrongType { path: String, expected: &'static str },
    #[error("{path}: missing required field `{field}`")]
    MissingField { path: String, field: &'static str },
    #[error("body carries more than one shape: {}", fields.join(", "))]
    BodyShapeConflict { fields: Vec<String> },
    #[error("/docId: {reason}")]
    InvalidDocId { doc_id: String, reason: &'static str },
    #[error("/docId: expected `{expected}` from the document number, found `{found}`")]
    DocIdMismatch { expected: String, found: String },
    #[error("{path}: preamble document number is empty")]
    EmptyDocumentNumber { path: String },
    #[error("{path}: stycke number {found}, expected {expected}")]
    StyckeGap { path: String, expected: u64, found: String },
    #[error("{path}: duplicate chapter number `{number}`")]
    DuplicateChapter { path: String, number: String },
    #[error("{path}: chapter `{number}` does not follow `{previous}`")]
    ChapterOrder {
        path: String,
        previous: String,
        number: String,
    },
    #[error("{path}: paragraf chapter reference {found:?}, expected {expected:?}")]
    ParentMismatch {
        path: String,
        expected: Option<String>,
        found: Option<String>,
    },
    #[error("document could not be serialized: {0}")]
    Serialization(String),
}
