//! Text utilities shared by the normalizers, the parser and the renderers.
//!
//! # Examples
//!
//! ```rust
//! use markup::{collapse_whitespace, slugify};
//!
//! assert_eq!(collapse_whitespace("  1 §\u{00A0}\n Lagen "), "1 § Lagen");
//! assert_eq!(slugify("Allmänna bestämmelser"), "allmanna-bestammelser");
//! ```

/// Collapses runs of Unicode whitespace (including no-break space) into a
/// single ASCII space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(segment);
    }
    out
}

/// Length in characters, the unit the safety net measures in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Escapes decoded text for element content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes an attribute value for a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes caller-supplied metadata such as titles.
///
/// Unlike [`escape_text`], an `&` that already starts `&amp;`, `&lt;`,
/// `&gt;`, `&quot;` or a numeric reference is left alone, so metadata that
/// arrives pre-escaped is not escaped twice.
///
/// ```rust
/// use markup::escape_html;
///
/// assert_eq!(escape_html("Lag <om> A & B"), "Lag &lt;om&gt; A &amp; B");
/// assert_eq!(escape_html("A &amp; B"), "A &amp; B");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        match ch {
            '&' => {
                let rest = &text[idx + 1..];
                let is_entity = ["amp;", "lt;", "gt;", "quot;", "#"]
                    .iter()
                    .any(|prefix| rest.starts_with(prefix));
                if is_entity {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Builds an id fragment from heading text.
///
/// Lowercases, folds å/ä to `a`, ö to `o` and é to `e`, turns whitespace runs
/// into `-`, and drops anything outside `[a-z0-9-]`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        let folded = match ch {
            'å' | 'ä' => 'a',
            'ö' => 'o',
            'é' => 'e',
            other => other,
        };
        if folded.is_ascii_lowercase() || folded.is_ascii_digit() || folded == '-' {
            out.push(folded);
        }
    }
    out
}
