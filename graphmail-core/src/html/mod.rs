//! HTML email bodies to readable plain text.
//!
//! [`convert`] decodes character references, parses the markup with HTML5
//! error recovery, runs the structural rewrite passes (headings, lists,
//! tables, links, line breaks, paragraphs, blocks) and normalizes the
//! resulting whitespace. [`extract_attachments_info`] scans the same kind of
//! input for links that look like attachments.

mod attachments;
mod dom;
mod finalize;
mod passes;

use std::borrow::Cow;

use log::debug;

pub use attachments::{ATTACHMENT_KEYWORDS, AttachmentRef, extract_attachments_info};
pub use dom::{Document, ElementKind, NodeData, NodeId};
pub use finalize::finalize;

/// Convert an HTML body to structured plain text.
///
/// Never fails: malformed markup is recovered and unknown character
/// references are kept literally. Empty input gives an empty string.
pub fn convert(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = finalize(&flatten(html));
    debug!(
        "converted {} bytes of html into {} bytes of text",
        html.len(),
        text.len()
    );
    text
}

/// [`convert`] for a body that may be absent.
pub fn convert_opt(html: Option<&str>) -> String {
    html.map(convert).unwrap_or_default()
}

/// Decode, parse and rewrite, returning the extracted text before
/// whitespace normalization.
pub fn flatten(html: &str) -> String {
    let decoded: Cow<'_, str> = html_escape::decode_html_entities(html);
    let mut doc = Document::parse(&decoded);
    passes::flatten(&mut doc);
    doc.text(doc.root())
}

/// Entry points grouped for callers that prefer a type.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlConverter;

impl HtmlConverter {
    pub fn convert(html: &str) -> String {
        convert(html)
    }

    pub fn extract_attachments_info(html: &str) -> Vec<AttachmentRef> {
        extract_attachments_info(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(convert(""), "");
        assert_eq!(convert_opt(None), "");
        assert_eq!(convert_opt(Some("<p>x</p>")), "x");
    }

    #[test]
    fn test_heading() {
        let text = convert("<h1>Title</h1>");
        assert_eq!(text, "====== TITLE\n=======");
        assert!(text.starts_with("====== TITLE"));
        assert_eq!(text.lines().nth(1), Some("======="));
    }

    #[test]
    fn test_heading_levels_and_unicode() {
        assert_eq!(convert("<h3>Sub</h3>"), "==== SUB\n=====");
        assert_eq!(convert("<h5>привет</h5>"), "== ПРИВЕТ\n===");
    }

    #[test]
    fn test_unordered_list() {
        let raw = flatten("<ul><li>a</li><li></li><li>b</li></ul>");
        assert!(raw.contains("  • a\n  • b"));
        assert_eq!(convert("<ul><li>a</li><li></li><li>b</li></ul>"), "• a\n• b");
    }

    #[test]
    fn test_ordered_list() {
        let raw = flatten("<ol><li>x</li><li>y</li></ol>");
        assert!(raw.contains("  1. x\n  2. y"));
        assert_eq!(convert("<ol><li>x</li><li>y</li></ol>"), "1. x\n2. y");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            convert(r#"<a href="http://e.com">here</a>"#),
            "here [http://e.com]"
        );
        assert_eq!(
            convert(r#"<a href="http://e.com">http://e.com</a>"#),
            "http://e.com"
        );
    }

    #[test]
    fn test_table() {
        let raw = flatten("<table><tr><td>A</td><td>B</td></tr></table>");
        assert!(raw.contains("  A | B"));
        assert_eq!(
            convert("<table><tr><td>A</td><td>B</td></tr></table>"),
            "A | B"
        );
    }

    #[test]
    fn test_table_keeps_rows_of_empty_cells() {
        assert_eq!(
            convert("<table><tr><td>A</td></tr><tr><td></td><td></td></tr><tr><td>B</td></tr></table>"),
            "A\n|\nB"
        );
    }

    #[test]
    fn test_entities_decoded_before_parsing() {
        assert_eq!(convert("<p>Tom &amp; Jerry &#8212; &quot;live&quot;</p>"), "Tom & Jerry — \"live\"");
        assert_eq!(convert("&lt;b&gt;bold&lt;/b&gt; text"), "bold text");
        assert_eq!(convert("AT&T &bogus; rates"), "AT&T &bogus; rates");
    }

    #[test]
    fn test_line_breaks_and_spaces() {
        assert_eq!(convert("Line one<br>Line   two<br/>three"), "Line one\nLine two\nthree");
    }

    #[test]
    fn test_whitespace_only_elements_emit_nothing() {
        let html = "<h2> </h2><p>\n</p><ul><li> </li></ul><table><tr><td> </td></tr></table>\
                    <div>  </div><p>Body</p>";
        assert_eq!(convert(html), "Body");
    }

    #[test]
    fn test_block_with_paragraphs_not_duplicated() {
        assert_eq!(convert("<div><p>One</p><p>Two</p></div>"), "One\n\nTwo");
        assert_eq!(
            convert("<div>Hello <b>world</b></div><div>Next</div>"),
            "Hello world\n\nNext"
        );
    }

    #[test]
    fn test_block_with_heading_or_list_keeps_trailing_text() {
        assert_eq!(convert("<div><h2>T</h2>after</div>"), "===== T\n======\nafter");
        assert_eq!(convert("<div><ul><li>a</li></ul>after</div>"), "• a\nafter");
    }

    #[test]
    fn test_malformed_markup() {
        let text = convert("<div><p>Unclosed <b>bold<ul><li>item");
        assert!(text.contains("Unclosed bold"));
        assert!(text.contains("• item"));
    }

    #[test]
    fn test_full_email() {
        let html = r#"<html><head><meta charset="utf-8"><style>body{}</style></head>
            <body>
              <h2>Quarterly report</h2>
              <p>Hi team,</p>
              <p>Highlights:</p>
              <ul><li>Revenue up</li><li>Costs down</li></ul>
              <table><tr><th>Region</th><th>Sales</th></tr><tr><td>EU</td><td>42</td></tr></table>
              <p>Details on <a href="https://intranet/q3">the intranet</a>.<br>Thanks</p>
            </body></html>"#;
        let expected = "===== QUARTERLY REPORT\n======\n\nHi team,\n\nHighlights:\n\n\
                        • Revenue up\n• Costs down\n\nRegion | Sales\nEU | 42\n\n\
                        Details on the intranet [https://intranet/q3].\nThanks";
        assert_eq!(convert(html), expected);
    }

    #[test]
    fn test_converter_type_delegates() {
        assert_eq!(HtmlConverter::convert("<p>x</p>"), "x");
        assert_eq!(
            HtmlConverter::extract_attachments_info(r#"<a href="a">attachment</a>"#).len(),
            1
        );
    }
}
