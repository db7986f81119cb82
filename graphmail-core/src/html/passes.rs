//! Structural rewrite passes.
//!
//! Each pass selects elements of one kind, computes an [`Edit`] per element
//! against the current tree, and applies the whole batch afterwards. When
//! two selected elements are nested the outer edit wins; the inner target
//! is already detached by the time its edit comes up.

use log::trace;

use super::dom::{Document, ElementKind, NodeId};

/// Replacement decided for one selected element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Edit {
    Replace(String),
    Remove,
}

/// Run every pass, in order, over the document.
pub(crate) fn flatten(doc: &mut Document) {
    apply(doc, "non-content", |k| k == ElementKind::NonContent, |_, _| {
        Some(Edit::Remove)
    });

    for level in 1..=6u8 {
        apply(doc, "heading", |k| k == ElementKind::Heading(level), |doc, id| {
            Some(heading(doc, id, level))
        });
    }

    apply(doc, "unordered list", |k| k == ElementKind::UnorderedList, |doc, id| {
        Some(unordered_list(doc, id))
    });
    apply(doc, "ordered list", |k| k == ElementKind::OrderedList, |doc, id| {
        Some(ordered_list(doc, id))
    });
    apply(doc, "table", |k| k == ElementKind::Table, |doc, id| Some(table(doc, id)));
    apply(doc, "link", |k| k == ElementKind::Anchor, link);
    apply(doc, "line break", |k| k == ElementKind::LineBreak, |_, _| {
        Some(Edit::Replace("\n".to_string()))
    });
    apply(doc, "paragraph", |k| k == ElementKind::Paragraph, |doc, id| {
        Some(paragraph(doc, id))
    });
    apply(doc, "block", |k| k == ElementKind::Block, block);
}

fn apply<S, R>(doc: &mut Document, name: &str, select: S, rewrite: R)
where
    S: Fn(ElementKind) -> bool,
    R: Fn(&Document, NodeId) -> Option<Edit>,
{
    let snapshot: &Document = doc;
    let edits: Vec<(NodeId, Edit)> = snapshot
        .find_all(select)
        .into_iter()
        .filter_map(|id| rewrite(snapshot, id).map(|edit| (id, edit)))
        .collect();

    let mut applied = 0usize;
    for (id, edit) in edits {
        if !doc.is_attached(id) {
            continue;
        }
        match edit {
            Edit::Replace(text) => {
                doc.replace_with_text(id, text);
            }
            Edit::Remove => doc.detach(id),
        }
        applied += 1;
    }
    trace!("{name} pass applied {applied} edits");
}

fn trimmed_text(doc: &Document, id: NodeId) -> String {
    doc.text(id).trim().to_string()
}

pub(crate) fn heading(doc: &Document, id: NodeId, level: u8) -> Edit {
    let text = trimmed_text(doc, id);
    if text.is_empty() {
        return Edit::Remove;
    }
    let marker = "=".repeat(7 - usize::from(level.clamp(1, 6)));
    // underline spans the marker and its trailing space
    Edit::Replace(format!(
        "\n\n{marker} {}\n{marker}=\n",
        text.to_uppercase()
    ))
}

fn list_block(lines: Vec<String>) -> Edit {
    if lines.is_empty() {
        Edit::Remove
    } else {
        Edit::Replace(format!("\n{}\n", lines.join("\n")))
    }
}

fn list_items(doc: &Document, id: NodeId) -> Vec<String> {
    doc.find_within(id, |k| k == ElementKind::ListItem)
        .into_iter()
        .map(|li| trimmed_text(doc, li))
        .collect()
}

pub(crate) fn unordered_list(doc: &Document, id: NodeId) -> Edit {
    let lines = list_items(doc, id)
        .into_iter()
        .filter(|item| !item.is_empty())
        .map(|item| format!("  • {item}"))
        .collect();
    list_block(lines)
}

/// Items are numbered by position among all `li`, so an empty item keeps
/// its number even though it emits no line.
pub(crate) fn ordered_list(doc: &Document, id: NodeId) -> Edit {
    let lines = list_items(doc, id)
        .into_iter()
        .enumerate()
        .filter(|(_, item)| !item.is_empty())
        .map(|(index, item)| format!("  {}. {item}", index + 1))
        .collect();
    list_block(lines)
}

pub(crate) fn table(doc: &Document, id: NodeId) -> Edit {
    let rows: Vec<String> = doc
        .find_within(id, |k| k == ElementKind::TableRow)
        .into_iter()
        .filter_map(|tr| {
            let cells: Vec<String> = doc
                .find_within(tr, |k| k == ElementKind::TableCell)
                .into_iter()
                .map(|cell| trimmed_text(doc, cell))
                .collect();
            (!cells.is_empty()).then(|| format!("  {}", cells.join(" | ")))
        })
        .collect();

    if rows.is_empty() {
        Edit::Remove
    } else {
        Edit::Replace(format!("\n{}\n", rows.join("\n")))
    }
}

/// Anchors without `href` are left for plain text extraction.
pub(crate) fn link(doc: &Document, id: NodeId) -> Option<Edit> {
    let url = doc.attr(id, "href")?.trim().to_string();
    let text = trimmed_text(doc, id);

    let edit = match (text.is_empty(), url.is_empty()) {
        (false, false) if text != url => Edit::Replace(format!("{text} [{url}]")),
        (false, false) | (true, false) => Edit::Replace(url),
        (false, true) => Edit::Replace(text),
        (true, true) => Edit::Remove,
    };
    Some(edit)
}

pub(crate) fn paragraph(doc: &Document, id: NodeId) -> Edit {
    let text = trimmed_text(doc, id);
    if text.is_empty() {
        Edit::Remove
    } else {
        Edit::Replace(format!("\n{text}\n"))
    }
}

/// A block is only flattened when no immediate child carries structure of
/// its own; otherwise its children already supply the layout.
pub(crate) fn block(doc: &Document, id: NodeId) -> Option<Edit> {
    let has_structure = doc
        .children(id)
        .iter()
        .any(|&child| doc.effective_kind(child).is_some_and(ElementKind::is_structural));
    if has_structure {
        return None;
    }
    let text = trimmed_text(doc, id);
    (!text.is_empty()).then(|| Edit::Replace(format!("\n{text}\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(doc: &Document, kind: ElementKind) -> NodeId {
        doc.find_all(|k| k == kind)[0]
    }

    fn replacement(edit: Edit) -> String {
        match edit {
            Edit::Replace(text) => text,
            Edit::Remove => panic!("expected a replacement"),
        }
    }

    #[test]
    fn test_heading_markers_by_level() {
        let doc = Document::parse("<h1>Title</h1><h6>small print</h6>");
        let h1 = first(&doc, ElementKind::Heading(1));
        let h6 = first(&doc, ElementKind::Heading(6));
        assert_eq!(
            replacement(heading(&doc, h1, 1)),
            "\n\n====== TITLE\n=======\n"
        );
        assert_eq!(replacement(heading(&doc, h6, 6)), "\n\n= SMALL PRINT\n==\n");
    }

    #[test]
    fn test_empty_heading_removed() {
        let doc = Document::parse("<h2> \n </h2>");
        let h2 = first(&doc, ElementKind::Heading(2));
        assert_eq!(heading(&doc, h2, 2), Edit::Remove);
    }

    #[test]
    fn test_unordered_list_skips_empty_items() {
        let doc = Document::parse("<ul><li>a</li><li></li><li>b</li></ul>");
        let ul = first(&doc, ElementKind::UnorderedList);
        assert_eq!(replacement(unordered_list(&doc, ul)), "\n  • a\n  • b\n");
    }

    #[test]
    fn test_ordered_list_numbering_keeps_positions() {
        let doc = Document::parse("<ol><li>x</li><li>  </li><li>z</li></ol>");
        let ol = first(&doc, ElementKind::OrderedList);
        assert_eq!(replacement(ordered_list(&doc, ol)), "\n  1. x\n  3. z\n");
    }

    #[test]
    fn test_list_without_items_removed() {
        let doc = Document::parse("<ol><li> </li></ol>");
        let ol = first(&doc, ElementKind::OrderedList);
        assert_eq!(ordered_list(&doc, ol), Edit::Remove);
    }

    #[test]
    fn test_table_rows() {
        let doc = Document::parse(
            "<table><tr><th>Name</th><th>Qty</th></tr><tr><td></td><td></td></tr>\
             <tr><td>Apple</td><td>3</td></tr></table>",
        );
        let table_id = first(&doc, ElementKind::Table);
        assert_eq!(
            replacement(table(&doc, table_id)),
            "\n  Name | Qty\n   | \n  Apple | 3\n"
        );
    }

    #[test]
    fn test_table_without_cells_removed() {
        let doc = Document::parse("<table><tr></tr></table>");
        let table_id = first(&doc, ElementKind::Table);
        assert_eq!(table(&doc, table_id), Edit::Remove);
    }

    #[test]
    fn test_link_policies() {
        let cases = [
            (r#"<a href="http://e.com">here</a>"#, Some("here [http://e.com]")),
            (r#"<a href=" http://e.com ">http://e.com</a>"#, Some("http://e.com")),
            (r#"<a href="">only text</a>"#, Some("only text")),
            (r#"<a href="http://e.com"> </a>"#, Some("http://e.com")),
            (r#"<a href=" "></a>"#, None),
        ];
        for (html, expected) in cases {
            let doc = Document::parse(html);
            let anchor = first(&doc, ElementKind::Anchor);
            let edit = link(&doc, anchor).unwrap();
            match expected {
                Some(text) => assert_eq!(edit, Edit::Replace(text.to_string()), "{html}"),
                None => assert_eq!(edit, Edit::Remove, "{html}"),
            }
        }
    }

    #[test]
    fn test_anchor_without_href_untouched() {
        let doc = Document::parse(r#"<a name="top">Top</a>"#);
        let anchor = first(&doc, ElementKind::Anchor);
        assert_eq!(link(&doc, anchor), None);
    }

    #[test]
    fn test_block_with_structural_child_untouched() {
        let mut doc = Document::parse("<div>intro<p>para</p></div>");
        let p = first(&doc, ElementKind::Paragraph);
        let div = first(&doc, ElementKind::Block);
        let edit = paragraph(&doc, p);
        doc.replace_with_text(p, replacement(edit));
        assert_eq!(block(&doc, div), None);
    }

    #[test]
    fn test_block_with_inline_children_flattened() {
        let doc = Document::parse("<div> Hello <b>world</b> </div>");
        let div = first(&doc, ElementKind::Block);
        assert_eq!(
            block(&doc, div),
            Some(Edit::Replace("\nHello world\n".to_string()))
        );
    }

    #[test]
    fn test_outer_edit_wins_for_nested_targets() {
        let mut doc = Document::parse("<div>outer<div>inner</div></div>");
        flatten(&mut doc);
        assert_eq!(doc.text(doc.root()), "\nouterinner\n");
    }

    #[test]
    fn test_flatten_strips_non_content() {
        let mut doc = Document::parse(
            "<style>p { color: red }</style><script>alert(1)</script><p>Visible</p>",
        );
        flatten(&mut doc);
        assert_eq!(doc.text(doc.root()), "\nVisible\n");
    }
}
