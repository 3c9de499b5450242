//! Structural validation of document JSON.
//!
//! [`validate`] works on arbitrary [`serde_json::Value`]s so that stored JSON
//! of unknown provenance can be checked too. It is total: malformed shapes
//! come back as [`ValidationError`]s, never as panics. All violations are
//! collected rather than stopping at the first.
//!
//! Checks:
//!
//! - at most one of `divisions`, `chapters`, `paragrafs`
//! - `docId` non-empty, free of whitespace and control characters, and
//!   derived from `preamble.documentNumber` when that has the
//!   `PREFIX YYYY:N` shape
//! - non-empty preamble document number
//! - stycke numbers run 1..N within each paragraf
//! - chapter numbers unique and increasing within their parent
//! - every paragraf's `chapter` equals its enclosing chapter's number, and
//!   flat paragrafs carry none

use std::cmp::Ordering;
use std::collections::HashSet;

use ingest::doc_id;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::model::CanonicalDocumentJson;

static NUMBER_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\p{Lu}[\p{Lu}\-]*\s*\d{4}:\d+$").expect("document number shape pattern")
});

static CHAPTER_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([a-z]*)$").expect("chapter key pattern"));

const BODY_FIELDS: [&str; 3] = ["divisions", "chapters", "paragrafs"];

/// Validate a JSON document, returning every violation found.
///
/// ```rust
/// use canonical::{validate, ValidationError};
/// use serde_json::json;
///
/// let ok = json!({ "docId": "SFS2025-1", "paragrafs": [] });
/// assert!(validate(&ok).is_ok());
///
/// let mixed = json!({ "docId": "SFS2025-1", "chapters": [], "paragrafs": [] });
/// let errors = validate(&mixed).unwrap_err();
/// assert!(matches!(errors[0], ValidationError::BodyShapeConflict { .. }));
/// ```
pub fn validate(json: &Value) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    match json.as_object() {
        Some(root) => check_root(root, &mut errors),
        None => errors.push(ValidationError::WrongType {
            path: String::new(),
            expected: "object",
        }),
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// [`validate`] for a typed document.
pub fn validate_document(doc: &CanonicalDocumentJson) -> Result<(), Vec<ValidationError>> {
    let json = serde_json::to_value(doc)
        .map_err(|err| vec![ValidationError::Serialization(err.to_string())])?;
    validate(&json)
}

fn check_root(root: &Map<String, Value>, errors: &mut Vec<ValidationError>) {
    let present: Vec<String> = BODY_FIELDS
        .iter()
        .filter(|field| root.get(**field).is_some_and(|v| !v.is_null()))
        .map(|field| field.to_string())
        .collect();
    if present.len() > 1 {
        errors.push(ValidationError::BodyShapeConflict { fields: present });
    }

    let document_number = check_preamble(root.get("preamble"), errors);
    check_doc_id(root.get("docId"), document_number, errors);

    if let Some(divisions) = present_array(root, "divisions", "", errors) {
        for (i, division) in divisions.iter().enumerate() {
            let path = format!("/divisions/{i}");
            let Some(division) = expect_object(division, &path, errors) else {
                continue;
            };
            match division.get("chapters").and_then(Value::as_array) {
                Some(chapters) => check_chapters(chapters, &format!("{path}/chapters"), errors),
                None => errors.push(ValidationError::MissingField {
                    path,
                    field: "chapters",
                }),
            }
        }
    }

    if let Some(chapters) = present_array(root, "chapters", "", errors) {
        check_chapters(chapters, "/chapters", errors);
    }

    if let Some(paragrafs) = present_array(root, "paragrafs", "", errors) {
        for (i, paragraf) in paragrafs.iter().enumerate() {
            check_paragraf(paragraf, &format!("/paragrafs/{i}"), None, errors);
        }
    }
}

/// Returns the document number when it is a usable string.
fn check_preamble<'a>(preamble: Option<&'a Value>, errors: &mut Vec<ValidationError>) -> Option<&'a str> {
    let preamble = preamble.filter(|v| !v.is_null())?;
    let preamble = expect_object(preamble, "/preamble", errors)?;
    match preamble.get("documentNumber") {
        Some(Value::String(number)) if !number.trim().is_empty() => Some(number.as_str()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            errors.push(ValidationError::EmptyDocumentNumber {
                path: "/preamble".into(),
            });
            None
        }
        Some(_) => {
            errors.push(ValidationError::WrongType {
                path: "/preamble/documentNumber".into(),
                expected: "string",
            });
            None
        }
    }
}

fn check_doc_id(value: Option<&Value>, document_number: Option<&str>, errors: &mut Vec<ValidationError>) {
    let id = match value {
        None => {
            errors.push(ValidationError::MissingField {
                path: String::new(),
                field: "docId",
            });
            return;
        }
        Some(Value::String(id)) => id,
        Some(_) => {
            errors.push(ValidationError::WrongType {
                path: "/docId".into(),
                expected: "string",
            });
            return;
        }
    };

    if id.is_empty() {
        errors.push(ValidationError::InvalidDocId {
            doc_id: id.clone(),
            reason: "doc id is empty",
        });
        return;
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        errors.push(ValidationError::InvalidDocId {
            doc_id: id.clone(),
            reason: "doc id contains whitespace or control characters",
        });
        return;
    }

    if let Some(number) = document_number {
        if NUMBER_SHAPE.is_match(number.trim()) {
            let expected = doc_id(number);
            if expected != *id {
                errors.push(ValidationError::DocIdMismatch {
                    expected,
                    found: id.clone(),
                });
            }
        }
    }
}

fn check_chapters(chapters: &[Value], path: &str, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut previous: Option<(&str, ChapterKey)> = None;

    for (i, chapter) in chapters.iter().enumerate() {
        let chapter_path = format!("{path}/{i}");
        let Some(chapter) = expect_object(chapter, &chapter_path, errors) else {
            continue;
        };

        let number = match chapter.get("number") {
            None | Some(Value::Null) => None,
            Some(Value::String(n)) => Some(n.as_str()),
            Some(_) => {
                errors.push(ValidationError::WrongType {
                    path: format!("{chapter_path}/number"),
                    expected: "string",
                });
                None
            }
        };

        if let Some(number) = number {
            if !seen.insert(number) {
                errors.push(ValidationError::DuplicateChapter {
                    path: chapter_path.clone(),
                    number: number.to_string(),
                });
            } else if let Some(key) = chapter_key(number) {
                if let Some((previous_number, previous_key)) = &previous {
                    if key.cmp(previous_key) != Ordering::Greater {
                        errors.push(ValidationError::ChapterOrder {
                            path: chapter_path.clone(),
                            previous: previous_number.to_string(),
                            number: number.to_string(),
                        });
                    }
                }
                previous = Some((number, key));
            }
        }

        match chapter.get("paragrafs").and_then(Value::as_array) {
            Some(paragrafs) => {
                for (j, paragraf) in paragrafs.iter().enumerate() {
                    check_paragraf(paragraf, &format!("{chapter_path}/paragrafs/{j}"), number, errors);
                }
            }
            None => errors.push(ValidationError::MissingField {
                path: chapter_path,
                field: "paragrafs",
            }),
        }
    }
}

fn check_paragraf(value: &Value, path: &str, chapter: Option<&str>, errors: &mut Vec<ValidationError>) {
    let Some(paragraf) = expect_object(value, path, errors) else {
        return;
    };

    let found = match paragraf.get("chapter") {
        None | Some(Value::Null) => None,
        Some(Value::String(c)) => Some(c.as_str()),
        Some(other) => {
            errors.push(ValidationError::ParentMismatch {
                path: path.to_string(),
                expected: chapter.map(str::to_string),
                found: Some(other.to_string()),
            });
            return;
        }
    };
    if found != chapter {
        errors.push(ValidationError::ParentMismatch {
            path: path.to_string(),
            expected: chapter.map(str::to_string),
            found: found.map(str::to_string),
        });
    }

    let Some(stycken) = paragraf.get("stycken").and_then(Value::as_array) else {
        errors.push(ValidationError::MissingField {
            path: path.to_string(),
            field: "stycken",
        });
        return;
    };
    for (j, stycke) in stycken.iter().enumerate() {
        let expected = j as u64 + 1;
        let number = stycke.get("number");
        if number.and_then(Value::as_u64) != Some(expected) {
            errors.push(ValidationError::StyckeGap {
                path: format!("{path}/stycken/{j}"),
                expected,
                found: number.map_or_else(|| "missing".to_string(), Value::to_string),
            });
        }
    }
}

fn present_array<'a>(
    root: &'a Map<String, Value>,
    field: &'static str,
    parent: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a Vec<Value>> {
    match root.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(items),
        Some(_) => {
            errors.push(ValidationError::WrongType {
                path: format!("{parent}/{field}"),
                expected: "array",
            });
            None
        }
    }
}

fn expect_object<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        errors.push(ValidationError::WrongType {
            path: path.to_string(),
            expected: "object",
        });
    }
    object
}

/// Sort key for chapter numbers: arabic with letter suffix, or roman.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ChapterKey(u64, String);

fn chapter_key(number: &str) -> Option<ChapterKey> {
    let number = number.trim();
    if let Some(caps) = CHAPTER_KEY.captures(number) {
        let value = caps[1].parse().ok()?;
        return Some(ChapterKey(value, caps[2].to_string()));
    }
    roman_value(number).map(|value| ChapterKey(value, String::new()))
}

fn roman_value(numeral: &str) -> Option<u64> {
    if numeral.is_empty() {
        return None;
    }
    let digits: Option<Vec<u64>> = numeral
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        })
        .collect();
    let mut total: u64 = 0;
    let mut prev: u64 = 0;
    for digit in digits? {
        total += digit;
        // subtractive pair: the smaller digit was already added once
        if prev < digit {
            total -= 2 * prev;
        }
        prev = digit;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn paragraf(chapter: Option<&str>, stycken: &[u64]) -> Value {
        let stycken: Vec<Value> = stycken
            .iter()
            .map(|n| json!({ "number": n, "role": "STYCKE", "text": "x" }))
            .collect();
        let mut p = json!({ "number": "1", "status": "original", "content": "", "stycken": stycken });
        if let Some(c) = chapter {
            p["chapter"] = json!(c);
        }
        p
    }

    fn document(body_field: &str, body: Value) -> Value {
        let mut doc = json!({
            "schemaVersion": "1.0",
            "docId": "SFS1977-1160",
            "documentType": "SFS_LAW",
            "preamble": { "documentNumber": "SFS 1977:1160" },
            "metadata": {}
        });
        doc[body_field] = body;
        doc
    }

    #[test]
    fn well_formed_chapters_pass() {
        let doc = document(
            "chapters",
            json!([
                { "number": "1", "paragrafs": [paragraf(Some("1"), &[1, 2])] },
                { "number": "2a", "paragrafs": [] },
                { "number": "5", "paragrafs": [paragraf(Some("5"), &[1])] }
            ]),
        );
        assert_eq!(validate(&doc), Ok(()));
    }

    #[test]
    fn empty_body_is_valid() {
        assert_eq!(validate(&document("paragrafs", json!([]))), Ok(()));
    }

    #[test]
    fn mixed_body_shapes_are_rejected() {
        let mut doc = document("chapters", json!([{ "number": "1", "paragrafs": [] }]));
        doc["paragrafs"] = json!([paragraf(None, &[1])]);
        let errors = validate(&doc).expect_err("conflict");
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::BodyShapeConflict { fields } if fields == &vec!["chapters".to_string(), "paragrafs".to_string()]
        )));
    }

    #[test]
    fn stycke_gaps_are_reported_with_path() {
        let doc = document("paragrafs", json!([paragraf(None, &[1, 3])]));
        let errors = validate(&doc).expect_err("gap");
        assert_eq!(
            errors,
            vec![ValidationError::StyckeGap {
                path: "/paragrafs/0/stycken/1".into(),
                expected: 2,
                found: "3".into(),
            }]
        );
    }

    #[test]
    fn chapter_duplicates_and_order() {
        let doc = document(
            "chapters",
            json!([
                { "number": "2", "paragrafs": [] },
                { "number": "2", "paragrafs": [] },
                { "number": "1", "paragrafs": [] },
                { "number": "IV", "paragrafs": [] }
            ]),
        );
        let errors = validate(&doc).expect_err("bad chapters");
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateChapter { number, .. } if number == "2")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ChapterOrder { number, .. } if number == "1")));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn paragraf_parent_must_match() {
        let doc = document(
            "chapters",
            json!([{ "number": "3", "paragrafs": [paragraf(Some("4"), &[1])] }]),
        );
        let errors = validate(&doc).expect_err("mismatch");
        assert!(matches!(&errors[0], ValidationError::ParentMismatch { expected: Some(e), found: Some(f), .. } if e == "3" && f == "4"));

        let flat = document("paragrafs", json!([paragraf(Some("1"), &[1])]));
        assert!(validate(&flat).is_err());
    }

    #[test]
    fn doc_id_rules() {
        let mut doc = document("paragrafs", json!([]));
        doc["docId"] = json!("SFS1977-1161");
        let errors = validate(&doc).expect_err("mismatch");
        assert!(matches!(&errors[0], ValidationError::DocIdMismatch { expected, .. } if expected == "SFS1977-1160"));

        doc["docId"] = json!("SFS 1977-1160");
        assert!(matches!(
            validate(&doc).expect_err("whitespace")[0],
            ValidationError::InvalidDocId { .. }
        ));

        doc["docId"] = json!("");
        assert!(validate(&doc).is_err());

        doc["docId"] = json!("eu-32016R0679");
        doc["preamble"] = json!({ "documentNumber": "(EU) 2016/679" });
        assert_eq!(validate(&doc), Ok(()));
    }

    #[test]
    fn empty_document_number_is_rejected() {
        let mut doc = document("paragrafs", json!([]));
        doc["preamble"] = json!({ "documentNumber": "  " });
        let errors = validate(&doc).expect_err("empty number");
        assert!(matches!(errors[0], ValidationError::EmptyDocumentNumber { .. }));
    }

    #[test]
    fn non_objects_are_reported() {
        assert!(validate(&json!(null)).is_err());
        assert!(validate(&json!([1, 2])).is_err());
        let errors = validate(&json!({ "docId": "X", "chapters": "nope" })).expect_err("wrong type");
        assert!(matches!(&errors[0], ValidationError::WrongType { path, expected: "array" } if path == "/chapters"));
    }

    #[test]
    fn roman_numerals() {
        assert_eq!(roman_value("IV"), Some(4));
        assert_eq!(roman_value("xii"), Some(12));
        assert_eq!(roman_value("IX"), Some(9));
        assert_eq!(roman_value("XIV"), Some(14));
        assert_eq!(roman_value("XL"), Some(40));
        assert_eq!(roman_value("CM"), Some(900));
        assert_eq!(roman_value("MCMXCIV"), Some(1994));
        assert_eq!(roman_value("Q"), None);
        assert!(chapter_key("2a") > chapter_key("2"));
        assert!(chapter_key("10") > chapter_key("9b"));
    }

    #[test]
    fn roman_chapters_in_order_pass() {
        let numerals = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI"];
        let chapters: Vec<Value> = numerals
            .iter()
            .map(|n| json!({ "number": n, "paragrafs": [] }))
            .collect();
        assert_eq!(validate(&document("chapters", json!(chapters))), Ok(()));

        let doc = document(
            "chapters",
            json!([
                { "number": "III", "paragrafs": [] },
                { "number": "IV", "paragrafs": [] },
                { "number": "V", "paragrafs": [] }
            ]),
        );
        assert_eq!(validate(&doc), Ok(()));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 :IV-]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            let key = prop_oneof![
                Just("docId".to_string()),
                Just("preamble".to_string()),
                Just("documentNumber".to_string()),
                Just("divisions".to_string()),
                Just("chapters".to_string()),
                Just("paragrafs".to_string()),
                Just("stycken".to_string()),
                Just("number".to_string()),
                Just("chapter".to_string()),
                "[a-z]{1,6}",
            ];
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::vec((key, inner), 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn validator_is_total(value in arb_json()) {
            let _ = validate(&value);
        }
    }
}
