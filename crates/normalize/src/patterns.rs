//! Text patterns shared by the dialect rewrites.

use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([a-z])?\s*§").expect("section number pattern"));

static CHAPTER_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([a-z])?\s*kap\.").expect("chapter heading pattern"));

static CHAPTER_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^K(\d+[a-z]?)$").expect("chapter anchor pattern"));

static CHAPTER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^K(\d+[a-z]?)P").expect("chapter prefix pattern"));

static CHAPTER_SECTION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_K(\w+)$").expect("chapter section id pattern"));

static SFS_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}:\d+$").expect("sfs number pattern"));

static ENTRY_INTO_FORCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/?träder i kraft").expect("entry into force pattern"));

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*\)").expect("parenthetical pattern"));

/// "2 a §" and "2a §" both become "2a". Text that does not start with a
/// section number yields "0".
pub(crate) fn section_number(text: &str) -> String {
    parse_section_number(text).unwrap_or_else(|| "0".to_string())
}

pub(crate) fn parse_section_number(text: &str) -> Option<String> {
    let normalized = text.replace('\u{a0}', " ");
    SECTION_NUMBER
        .captures(normalized.trim())
        .map(|caps| compact(&caps))
}

/// Chapter number from a heading such as "7 kap. Tillsyn" or "2 a kap.".
pub(crate) fn chapter_number(heading: &str) -> Option<String> {
    let normalized = heading.replace('\u{a0}', " ");
    CHAPTER_HEADING
        .captures(normalized.trim())
        .map(|caps| compact(&caps))
}

/// Chapter number from a Riksdag anchor name: exactly `K{n}`.
pub(crate) fn chapter_anchor(name: &str) -> Option<&str> {
    CHAPTER_ANCHOR
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Chapter encoded as a prefix of a section anchor name, e.g. `K3P2`.
pub(crate) fn chapter_prefix(name: &str) -> Option<&str> {
    CHAPTER_PREFIX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Chapter number from a canonical chapter section id ending in `_K{n}`.
pub(crate) fn chapter_from_section_id(id: &str) -> Option<&str> {
    CHAPTER_SECTION_ID
        .captures(id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Class for a footer line: bare amendment numbers are tagged `sfs-number`.
pub(crate) fn transition_class(text: &str) -> &'static str {
    if SFS_NUMBER_LINE.is_match(text.trim()) {
        "text sfs-number"
    } else {
        "text"
    }
}

/// Boilerplate already represented by the lovhead.
pub(crate) fn is_preamble_text(text: &str, title: &str) -> bool {
    let lower = text.trim().to_lowercase();
    let title_lower = PARENTHETICAL
        .replace(&title.to_lowercase(), "")
        .trim()
        .to_string();
    if lower == title_lower {
        return true;
    }
    if lower.starts_with("utfärdad den ") || lower.starts_with("regeringen föreskriver") {
        return true;
    }
    let unslashed = text.trim().strip_prefix('/').unwrap_or(text.trim());
    ENTRY_INTO_FORCE.is_match(unslashed)
}

/// Date following "Utfärdad den", without a trailing period.
pub(crate) fn promulgation_from_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    if !lower.starts_with("utfärdad den ") {
        return None;
    }
    let rest = trimmed.get("utfärdad den ".len()..)?;
    let rest = rest.trim().trim_end_matches('.').trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn compact(caps: &regex::Captures<'_>) -> String {
    let mut out = caps.get(1).map_or("", |m| m.as_str()).to_string();
    if let Some(letter) = caps.get(2) {
        out.push_str(letter.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_numbers_are_compacted() {
        assert_eq!(section_number("17 a §"), "17a");
        assert_eq!(section_number("2a §"), "2a");
        assert_eq!(section_number("15\u{a0}§"), "15");
        assert_eq!(section_number("Bilaga"), "0");
        assert_eq!(parse_section_number("Bilaga"), None);
    }

    #[test]
    fn chapter_patterns() {
        assert_eq!(chapter_number("7 kap. Tillsyn").as_deref(), Some("7"));
        assert_eq!(chapter_number("2 a kap. Ansvar").as_deref(), Some("2a"));
        assert_eq!(chapter_number("Övergångsbestämmelser"), None);
        assert_eq!(chapter_anchor("K12"), Some("12"));
        assert_eq!(chapter_anchor("K1P2"), None);
        assert_eq!(chapter_prefix("K3P2"), Some("3"));
        assert_eq!(chapter_from_section_id("SFS2025-1_K4"), Some("4"));
    }

    #[test]
    fn preamble_filter() {
        let title = "Arbetsmiljölag (1977:1160)";
        assert!(is_preamble_text("Arbetsmiljölag", title));
        assert!(is_preamble_text("Utfärdad den 19 december 1977.", title));
        assert!(is_preamble_text("Regeringen föreskriver följande.", title));
        assert!(is_preamble_text("/Träder i kraft I:2026-03-01/", title));
        assert!(!is_preamble_text("Lagen gäller arbetsgivare.", title));
    }

    #[test]
    fn promulgation_date_is_extracted() {
        assert_eq!(
            promulgation_from_text("Utfärdad den 19 december 1977.").as_deref(),
            Some("19 december 1977")
        );
        assert_eq!(promulgation_from_text("Lagen gäller"), None);
    }

    #[test]
    fn sfs_number_lines_are_tagged() {
        assert_eq!(transition_class(" 2025:1535 "), "text sfs-number");
        assert_eq!(transition_class("Denna lag träder i kraft"), "text");
    }
}
