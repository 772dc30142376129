use tracing::debug;

use crate::dom::Document;

/// Replace the document's display title with `title`.
///
/// Safe to call any number of times: every existing `<title>` in `<head>` is
/// removed before a fresh one is appended, so the last call wins. When the page
/// has not built its `<head>` yet, one is created right before `<body>`.
pub fn inject_title(doc: &mut Document, title: &str) {
    if let Some(head) = doc.head() {
        debug!("document already had <head> element");
        let stale: Vec<_> = doc
            .children(head)
            .iter()
            .copied()
            .filter(|&child| doc.is_element_named(child, "title"))
            .collect();
        for child in stale {
            doc.remove(child);
        }
    }

    let title_el = doc.create_element("title");
    let text = doc.create_text(title);
    doc.append_child(title_el, text);

    match doc.head() {
        Some(head) => doc.append_child(head, title_el),
        None => {
            let head = doc.create_element("head");
            doc.append_child(head, title_el);
            let html = doc.ensure_document_element();
            match doc.body() {
                Some(body) => doc.insert_before(html, head, body),
                None => doc.append_child(html, head),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_titles(doc: &Document) -> Vec<String> {
        let head = doc.head().unwrap();
        doc.children(head)
            .iter()
            .filter(|&&c| doc.is_element_named(c, "title"))
            .map(|&c| doc.text_content(c))
            .collect()
    }

    #[test]
    fn second_call_wins_and_leaves_single_title() {
        let mut doc = Document::parse_html("<html><head><title>viewer</title></head><body></body></html>");
        inject_title(&mut doc, "First");
        inject_title(&mut doc, "Second");
        assert_eq!(head_titles(&doc), vec!["Second".to_string()]);
        assert_eq!(doc.title(), "Second");
    }

    #[test]
    fn creates_head_before_body_when_missing() {
        let mut doc = Document::new();
        let html = doc.ensure_document_element();
        let body = doc.ensure_body();

        inject_title(&mut doc, "Attention Is All You Need");

        let head = doc.head().expect("head created");
        assert_eq!(doc.children(html), &[head, body]);
        assert_eq!(head_titles(&doc), vec!["Attention Is All You Need".to_string()]);

        inject_title(&mut doc, "Again");
        let heads = doc
            .children(html)
            .iter()
            .filter(|&&c| doc.is_element_named(c, "head"))
            .count();
        assert_eq!(heads, 1);
    }

    #[test]
    fn empty_document_gets_html_and_head() {
        let mut doc = Document::new();
        inject_title(&mut doc, "Lonely");
        assert_eq!(doc.to_html(), "<html><head><title>Lonely</title></head></html>");
    }

    #[test]
    fn keeps_other_head_children() {
        let mut doc = Document::parse_html(
            r#"<html><head><meta charset="utf-8"><title>a</title><title>b</title></head><body></body></html>"#,
        );
        inject_title(&mut doc, "c");
        let head = doc.head().unwrap();
        assert_eq!(
            doc.outer_html(head),
            r#"<head><meta charset="utf-8"><title>c</title></head>"#
        );
    }

    #[test]
    fn repeated_injection_keeps_arena_bounded() {
        let mut doc = Document::skeleton();
        inject_title(&mut doc, "warm up");
        let len = doc.arena_len();

        for i in 0..10_000 {
            inject_title(&mut doc, &format!("title {i}"));
        }

        assert_eq!(doc.arena_len(), len);
        assert_eq!(head_titles(&doc), vec!["title 9999".to_string()]);
    }
}
