//! Line-oriented builder for canonical documents.
//!
//! Every rewrite emits through [`CanonicalWriter`], so the wrapper, lovhead
//! and footer look identical regardless of the source dialect.

use ingest::DocumentHeader;
use markup::{escape_html, escape_text, slugify};

/// Preamble fields a rewrite managed to recover from the source header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HeaderMeta {
    pub issuer: Option<String>,
    pub promulgated: Option<String>,
}

/// Body lines grouped into an optional chapter sequence.
#[derive(Debug, Default)]
pub(crate) struct BodyBuilder {
    doc_id: String,
    lines: Vec<String>,
    chapter: Option<OpenChapter>,
}

#[derive(Debug)]
struct OpenChapter {
    number: String,
    lines: Vec<String>,
}

impl BodyBuilder {
    pub fn new(doc_id: &str) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            ..Default::default()
        }
    }

    pub fn current_chapter(&self) -> Option<&str> {
        self.chapter.as_ref().map(|c| c.number.as_str())
    }

    /// Closes any open chapter and opens `number` with its heading.
    pub fn start_chapter(&mut self, number: &str, heading: &str) {
        self.flush_chapter();
        self.chapter = Some(OpenChapter {
            number: number.to_string(),
            lines: vec![format!(
                "      <h2 class=\"kapitel-rubrik\">{}</h2>",
                escape_text(heading)
            )],
        });
    }

    /// `<h3 class="paragraph">` marker for section `number`.
    pub fn paragraf(&mut self, id: &str, number: &str) {
        self.push("<h3 class=\"paragraph\">".to_string());
        self.push(format!(
            "  <a class=\"paragraf\" id=\"{id}\" name=\"{id}\">{} §</a>",
            escape_text(number)
        ));
        self.push("</h3>".to_string());
    }

    /// Section id using the open chapter unless `chapter` overrides it.
    pub fn paragraf_id(&self, chapter: Option<&str>, number: &str) -> String {
        match chapter.or(self.current_chapter()) {
            Some(ch) => format!("{}_K{ch}_P{number}", self.doc_id),
            None => format!("{}_P{number}", self.doc_id),
        }
    }

    /// `<p class="text">` from already-escaped inner markup.
    pub fn text_html(&mut self, inner: &str) {
        self.push(format!("<p class=\"text\">{}</p>", inner.trim()));
    }

    /// `<p class="text">` from decoded text.
    pub fn text(&mut self, text: &str) {
        self.push(format!("<p class=\"text\">{}</p>", escape_text(text)));
    }

    pub fn group_heading(&mut self, text: &str) {
        self.push(format!(
            "<h3 id=\"{}_{}\">{}</h3>",
            self.doc_id,
            slugify(text),
            escape_text(text)
        ));
    }

    /// Pre-rendered block markup such as a table or list.
    pub fn raw(&mut self, html: &str) {
        self.push(html.trim().to_string());
    }

    fn push(&mut self, line: String) {
        match &mut self.chapter {
            Some(ch) => ch.lines.push(format!("      {line}")),
            None => self.lines.push(format!("    {line}")),
        }
    }

    fn flush_chapter(&mut self) {
        if let Some(ch) = self.chapter.take() {
            if ch.lines.is_empty() {
                return;
            }
            self.lines.push(format!(
                "    <section class=\"kapitel\" id=\"{}_K{}\">",
                self.doc_id, ch.number
            ));
            self.lines.extend(ch.lines);
            self.lines.push("    </section>".to_string());
        }
    }

    pub fn finish(mut self) -> Vec<String> {
        self.flush_chapter();
        self.lines
    }
}

/// Footer lines for `footer.back`.
#[derive(Debug, Default)]
pub(crate) struct FooterBuilder {
    lines: Vec<String>,
}

impl FooterBuilder {
    pub fn paragraph(&mut self, class: &str, inner_html: &str) {
        self.lines
            .push(format!("    <p class=\"{class}\">{}</p>", inner_html.trim()));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Assembles the canonical wrapper around body and footer lines.
pub(crate) struct CanonicalWriter<'a> {
    header: &'a DocumentHeader,
    doc_id: String,
    meta: HeaderMeta,
}

impl<'a> CanonicalWriter<'a> {
    pub fn new(header: &'a DocumentHeader) -> Self {
        Self {
            header,
            doc_id: header.doc_id(),
            meta: HeaderMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: HeaderMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn lovhead_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "  <div class=\"lovhead\">".to_string(),
            "    <h1>".to_string(),
            format!(
                "      <p class=\"text\">{}</p>",
                escape_html(&self.header.document_number)
            ),
            format!("      <p class=\"text\">{}</p>", escape_html(&self.header.title)),
            "    </h1>".to_string(),
        ];
        if let Some(issuer) = &self.meta.issuer {
            lines.push(format!("    <p class=\"issuer\">{}</p>", escape_html(issuer)));
        }
        if let Some(date) = &self.meta.promulgated {
            lines.push(format!(
                "    <p class=\"promulgated\">{}</p>",
                escape_html(date)
            ));
        }
        lines.push("  </div>".to_string());
        lines
    }

    pub fn finish(&self, body: Vec<String>, footer: FooterBuilder) -> String {
        let mut out = Vec::with_capacity(body.len() + footer.lines.len() + 16);
        out.push(format!(
            "<article class=\"legal-document\" id=\"{}\">",
            self.doc_id
        ));
        out.extend(self.lovhead_lines());
        out.push("  <div class=\"body\">".to_string());
        out.extend(body);
        out.push("  </div>".to_string());
        if !footer.is_empty() {
            out.push("  <footer class=\"back\">".to_string());
            out.push("    <h2>Övergångsbestämmelser</h2>".to_string());
            out.extend(footer.lines);
            out.push("  </footer>".to_string());
        }
        out.push("</article>".to_string());
        out.join("\n")
    }

    /// Wrapper and lovhead with an empty body.
    pub fn empty(&self) -> String {
        self.finish(Vec::new(), FooterBuilder::default())
    }
}
