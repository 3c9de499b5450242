//! Normalizer for Swedish legal markup.
//!
//! Raw documents arrive in one of a handful of source dialects: Riksdag
//! exports with `a.paragraf` anchors, class-tagged `p.LedParagraf` markup,
//! LLM-produced Notisum-style amendments, or loose text. [`normalize`] detects
//! the dialect and rewrites it into the single canonical shape the canonical
//! parser reads:
//!
//! ```text
//! <article class="legal-document" id="{DOC_ID}">
//!   <div class="lovhead">…</div>
//!   <div class="body">section.kapitel / h3.paragraph …</div>
//!   <footer class="back">…</footer>
//! </article>
//! ```
//!
//! ## Guarantees
//!
//! - **Total** - malformed input yields the minimal or fallback document,
//!   never an error
//! - **Idempotent** - every output is detected as canonical and passes through
//!   a second run unchanged
//! - **Loss-guarded** - a rewrite retaining less than
//!   [`NormalizeConfig::min_retained_ratio`] of the original text is replaced
//!   by the fallback document, and a `normalize_fallback` event is logged
//!
//! ## Example
//!
//! ```
//! use ingest::DocumentHeader;
//! use normalize::{normalize, Dialect, NormalizeConfig};
//!
//! let header = DocumentHeader::new("SFS 1977:1160", "Arbetsmiljölag");
//! let raw = r#"<p class="LedKapitel">7 kap. Tillsyn</p>
//! <p class="LedParagraf">15 §</p>
//! <p class="LedParagrafText">Innehåll.</p>"#;
//!
//! let out = normalize(raw, &header, &NormalizeConfig::default());
//! assert_eq!(out.dialect, Dialect::ClassTagged);
//! assert!(out.markup.contains(r#"id="SFS1977-1160_K7_P15""#));
//!
//! let again = normalize(&out.markup, &header, &NormalizeConfig::default());
//! assert_eq!(again.markup, out.markup);
//! ```
use std::time::Instant;

use ingest::DocumentHeader;
use markup::Tree;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

mod anchor;
mod class_tagged;
mod config;
mod detect;
mod notisum;
mod patterns;
mod prepare;
mod safety;
mod unstructured;
mod writer;

pub use crate::config::{NormalizeConfig, NormalizeConfigError};
pub use crate::detect::{detect, detect_markup, Dialect};

use crate::writer::CanonicalWriter;

/// What [`normalize`] did to its input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizeOutcome {
    /// A dialect rewrite was kept.
    Rewritten,
    /// Canonical or partially canonical input, returned as-is.
    Unchanged,
    /// Blank input; the minimal document was produced.
    Empty,
    /// The rewrite lost too much text and the fallback document was used.
    Fallback { ratio: f64 },
}

impl NormalizeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizeOutcome::Rewritten => "rewritten",
            NormalizeOutcome::Unchanged => "unchanged",
            NormalizeOutcome::Empty => "empty",
            NormalizeOutcome::Fallback { .. } => "fallback",
        }
    }
}

/// Canonical markup plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub markup: String,
    pub dialect: Dialect,
    pub outcome: NormalizeOutcome,
}

/// Rewrite `raw` into canonical markup for the document described by `header`.
///
/// Never fails. `cfg` is expected to be validated by the caller; an invalid
/// ratio only affects when the fallback kicks in.
pub fn normalize(raw: &str, header: &DocumentHeader, cfg: &NormalizeConfig) -> Normalized {
    let start = Instant::now();
    let doc_id = header.doc_id();
    let span = tracing::span!(Level::INFO, "normalize.normalize", doc_id = %doc_id);
    let _guard = span.enter();

    let result = normalize_inner(raw, header, cfg);

    let elapsed_micros = start.elapsed().as_micros();
    match result.outcome {
        NormalizeOutcome::Fallback { ratio } => warn!(
            dialect = %result.dialect,
            ratio,
            min_retained_ratio = cfg.min_retained_ratio,
            elapsed_micros,
            "normalize_fallback"
        ),
        outcome => info!(
            dialect = %result.dialect,
            outcome = outcome.as_str(),
            markup_len = result.markup.len(),
            elapsed_micros,
            "normalize_success"
        ),
    }
    result
}

fn normalize_inner(raw: &str, header: &DocumentHeader, cfg: &NormalizeConfig) -> Normalized {
    if raw.trim().is_empty() {
        return Normalized {
            markup: CanonicalWriter::new(header).empty(),
            dialect: Dialect::Unstructured,
            outcome: NormalizeOutcome::Empty,
        };
    }

    let tree = Tree::parse(raw);
    let dialect = detect(&tree);

    let rewritten = match dialect {
        Dialect::Canonical | Dialect::PartiallyCanonical => {
            return Normalized {
                markup: raw.to_string(),
                dialect,
                outcome: NormalizeOutcome::Unchanged,
            };
        }
        Dialect::NotisumAmendment => notisum::rewrite(&tree, header),
        Dialect::ClassTagged => class_tagged::rewrite(&tree, header),
        Dialect::AnchorTagged => anchor::rewrite(&tree, header),
        Dialect::Unstructured => unstructured::rewrite(&tree, header),
    };

    let original = safety::original_body_len(&tree);
    if original > cfg.min_measured_chars {
        let ratio = safety::retained_len(&rewritten) as f64 / original as f64;
        if ratio < cfg.min_retained_ratio {
            return Normalized {
                markup: safety::fallback_document(&tree, header),
                dialect,
                outcome: NormalizeOutcome::Fallback { ratio },
            };
        }
    }

    Normalized {
        markup: rewritten,
        dialect,
        outcome: NormalizeOutcome::Rewritten,
    }
}
