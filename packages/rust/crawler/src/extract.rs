//! Paragraph-text extraction.

use scraper::{Html, Selector};

/// Collect the text of every `<p>` element in document order, joined by a
/// single space.
///
/// Each paragraph contributes the concatenation of all its descendant text
/// nodes, unmodified. A document without paragraphs yields an empty string.
pub fn extract_paragraph_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let p_sel = Selector::parse("p").expect("static selector");

    doc.select(&p_sel)
        .map(|el| el.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}
