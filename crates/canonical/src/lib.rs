//! Canonical legal markup to structured JSON.
//!
//! The normalizer guarantees every document arrives here in one shape,
//! `article.legal-document` with a lovhead, a body and an optional footer.
//! This crate reads that shape into [`CanonicalDocumentJson`], checks the
//! result with [`validate`], and hashes canonical markup with a versioned
//! SHA-256 so stored JSON can be tied back to the rules that produced it.
//!
//! ## What we extract
//!
//! - Preamble: document number, title, issuing body, promulgation date
//! - Body in exactly one shape: divisions, chapters, or flat paragrafs
//! - Paragrafs with numbered stycken, headings, status and amendedBy
//! - Transition provisions grouped by amending SFS number
//! - Appendices split at their headings
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls. Same markup, options and config give the same
//! document on any machine.
//!
//! ```rust
//! use canonical::{parse, validate_document, ParseConfig, ParseOptions};
//!
//! let markup = r#"<article class="legal-document" id="SFS1977-1160">
//!   <div class="lovhead"><h1><p class="text">SFS 1977:1160</p><p class="text">Arbetsmiljölag</p></h1></div>
//!   <div class="body">
//!     <section class="kapitel" id="SFS1977-1160_K1">
//!       <h2 class="kapitel-rubrik">1 kap. Lagens ändamål</h2>
//!       <h3 class="paragraph"><a class="paragraf" id="SFS1977-1160_K1_P1" name="SFS1977-1160_K1_P1">1 §</a></h3>
//!       <p class="text">Lagens ändamål är att förebygga ohälsa.</p>
//!     </section>
//!   </div>
//! </article>"#;
//!
//! let doc = parse(markup, &ParseOptions::default(), &ParseConfig::default()).unwrap();
//! assert_eq!(doc.doc_id, "SFS1977-1160");
//! assert_eq!(doc.chapters.as_ref().unwrap()[0].paragrafs[0].chapter.as_deref(), Some("1"));
//! assert!(validate_document(&doc).is_ok());
//! ```

mod config;
mod error;
mod hash;
mod model;
mod parse;
mod validate;

pub use crate::config::ParseConfig;
pub use crate::error::{ParseError, ValidationError};
pub use crate::hash::hash_canonical_bytes;
pub use crate::model::{
    BodyShape, CanonicalAppendix, CanonicalChapter, CanonicalDivision, CanonicalDocumentJson,
    CanonicalParagraf, CanonicalPreamble, CanonicalStycke, DocumentMetadata, ListItem,
    ParagrafStatus, StyckeRole, TransitionProvision, SCHEMA_VERSION,
};
pub use crate::parse::{infer_document_type, parse, ParseOptions};
pub use crate::validate::{validate, validate_document};
