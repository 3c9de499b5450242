//! Rewrite for class-tagged markup (`p.LedKapitel`, `p.LedParagraf`,
//! `p.LedParagrafText`).

use ingest::DocumentHeader;
use markup::{char_len, escape_text, NodeId, Tree};

use crate::patterns::{chapter_number, parse_section_number, transition_class};
use crate::prepare::{prepare, PreambleFilter};
use crate::writer::{BodyBuilder, CanonicalWriter, FooterBuilder};

/// Trigger lines up to this length are headings and are not repeated in the
/// footer, which already carries its own heading.
const TRIGGER_HEADING_MAX_CHARS: usize = 80;

pub(crate) fn rewrite(tree: &Tree, header: &DocumentHeader) -> String {
    let prepared = prepare(tree);
    let mut meta = prepared.meta;
    let doc_id = header.doc_id();

    let mut body = BodyBuilder::new(&doc_id);
    let mut footer = FooterBuilder::default();
    let mut filter = PreambleFilter::new(&header.title);
    let mut in_transition = false;

    let elements = prepared
        .items
        .iter()
        .copied()
        .filter(|&node| tree.element(node).is_some());

    for node in elements {
        let text = tree.collapsed_text(node);

        if !in_transition && is_transition_trigger(&text) {
            in_transition = true;
            if char_len(&text) <= TRIGGER_HEADING_MAX_CHARS {
                continue;
            }
        }

        if in_transition {
            if (is_led(tree, node) || tree.is(node, "p", None)) && !text.is_empty() {
                footer.paragraph(transition_class(&text), &escape_text(&text));
            }
            continue;
        }

        if tree.has_class(node, "LedKapitel") {
            match chapter_number(&text) {
                Some(number) => body.start_chapter(&number, &text),
                None if !text.is_empty() => body.group_heading(&text),
                None => {}
            }
        } else if tree.has_class(node, "LedParagraf") {
            match parse_section_number(&text) {
                Some(number) => {
                    let id = body.paragraf_id(None, &number);
                    body.paragraf(&id, &number);
                }
                None if !filter.skip(&text) => body.text(&text),
                None => {}
            }
        } else if tree.has_class(node, "LedParagrafText") {
            if !filter.skip(&text) {
                body.text(&text);
            }
        } else if !filter.skip(&text) {
            let unclassed = tree.attr(node, "class").is_none_or(|c| c.trim().is_empty());
            if unclassed && !text.contains('§') {
                body.group_heading(&text);
            } else {
                body.text(&text);
            }
        }
    }

    if meta.promulgated.is_none() {
        meta.promulgated = filter.promulgated.take();
    }
    CanonicalWriter::new(header)
        .with_meta(meta)
        .finish(body.finish(), footer)
}

fn is_transition_trigger(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("övergångsbestämmelser") || lower.contains("ikraftträdande")
}

fn is_led(tree: &Tree, node: NodeId) -> bool {
    tree.element(node)
        .is_some_and(|el| el.classes().any(|c| c.starts_with("Led")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LED: &str = r#"<div>
<p class="LedKapitel">7 kap. Tillsyn</p>
<p class="LedParagraf">15 §</p>
<p class="LedParagrafText">Innehåll.</p>
</div>"#;

    #[test]
    fn led_chapter_and_section() {
        let header = DocumentHeader::new("SFS 1977:1160", "Arbetsmiljölag");
        let out = rewrite(&Tree::parse(LED), &header);
        assert!(out.contains(r#"<section class="kapitel" id="SFS1977-1160_K7">"#));
        assert!(out.contains(r#"<h2 class="kapitel-rubrik">7 kap. Tillsyn</h2>"#));
        assert!(out.contains(r#"<a class="paragraf" id="SFS1977-1160_K7_P15" name="SFS1977-1160_K7_P15">15 §</a>"#));
        assert!(out.contains(r#"<p class="text">Innehåll.</p>"#));
    }

    #[test]
    fn flat_led_sections_and_headings() {
        let html = r#"<p class="LedParagrafText">Regeringen föreskriver följande.</p>
<p>Inledande bestämmelser</p>
<p class="LedParagraf">1 a §</p>
<p class="LedParagrafText">Text &amp; mer.</p>"#;
        let header = DocumentHeader::new("SFS 2020:1", "Förordning om test");
        let out = rewrite(&Tree::parse(html), &header);
        assert!(!out.contains("Regeringen föreskriver"));
        assert!(out.contains(r#"<h3 id="SFS2020-1_inledande-bestammelser">Inledande bestämmelser</h3>"#));
        assert!(out.contains(r#"id="SFS2020-1_P1a""#));
        assert!(out.contains("Text &amp; mer."));
        assert!(!out.contains("kapitel"));
    }

    #[test]
    fn transition_section_goes_to_footer() {
        let html = r#"<p class="LedParagraf">1 §</p>
<p class="LedParagrafText">Lagen gäller.</p>
<p class="LedKapitel">Övergångsbestämmelser</p>
<p class="LedParagrafText">2021:5</p>
<p class="LedParagrafText">Denna lag träder i kraft den 1 juli 2021.</p>"#;
        let header = DocumentHeader::new("SFS 2021:5", "Lag");
        let out = rewrite(&Tree::parse(html), &header);
        assert!(out.contains(r#"<p class="text sfs-number">2021:5</p>"#));
        assert!(out.contains(r#"<p class="text">Denna lag träder i kraft den 1 juli 2021.</p>"#));
        let body = out.split("<footer").next().expect("body");
        assert!(!body.contains("sfs-number"));
        assert!(!body.contains("träder i kraft"));
    }

    #[test]
    fn unnumbered_chapter_heading_keeps_following_content() {
        let html = r#"<p class="LedKapitel">1 kap. Allmänt</p>
<p class="LedParagraf">1 §</p>
<p class="LedKapitel">Särskilda bestämmelser</p>
<p class="LedParagraf">2 §</p>"#;
        let header = DocumentHeader::new("SFS 2019:3", "Lag");
        let out = rewrite(&Tree::parse(html), &header);
        assert!(out.contains(r#"id="SFS2019-3_K1_P2""#));
        assert!(out.contains(r#"<h3 id="SFS2019-3_sarskilda-bestammelser">"#));
    }
}
