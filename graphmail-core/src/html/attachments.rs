//! Heuristic detection of attachment links in a message body.

use serde::{Deserialize, Serialize};

use super::dom::{Document, ElementKind};

/// Lowercase link-text fragments that suggest a downloadable file.
pub const ATTACHMENT_KEYWORDS: [&str; 5] =
    ["attachment", "вложение", "файл", "download", "скачать"];

/// A link whose text suggests it points at an attached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Trimmed link text, original case.
    pub name: String,
    /// The `href` value as written.
    pub url: String,
}

/// Collect attachment-looking links from raw HTML, in document order.
pub fn extract_attachments_info(html: &str) -> Vec<AttachmentRef> {
    if html.is_empty() {
        return Vec::new();
    }

    let doc = Document::parse(html);
    doc.find_all(|k| k == ElementKind::Anchor)
        .into_iter()
        .filter_map(|anchor| {
            let url = doc.attr(anchor, "href")?;
            let name = doc.text(anchor).trim().to_string();
            let lowered = name.to_lowercase();
            ATTACHMENT_KEYWORDS
                .iter()
                .any(|keyword| lowered.contains(keyword))
                .then(|| AttachmentRef {
                    name,
                    url: url.to_string(),
                })
        })
        .collect()
}
