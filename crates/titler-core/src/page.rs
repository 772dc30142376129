use serde::{Deserialize, Serialize};

use crate::dom::{Document, collapse_whitespace};
use crate::inject::inject_title;

/// Shown when no title could be found for the paper.
pub const TITLE_PLACEHOLDER: &str = "Unknown title.";

/// Where the page was loaded from. Computed once per page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub origin: String,
    pub pathname: String,
}

impl Location {
    pub fn new(origin: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            pathname: pathname.into(),
        }
    }

    /// Last `/`-separated component of the path.
    pub fn last_segment(&self) -> &str {
        self.pathname.rsplit('/').next().unwrap_or_default()
    }

    pub fn href(&self) -> String {
        format!("{}{}", self.origin, self.pathname)
    }
}

/// A loaded host page: its location plus the live document.
#[derive(Debug, Clone)]
pub struct Page {
    pub location: Location,
    pub document: Document,
}

impl Page {
    pub fn new(location: Location, document: Document) -> Self {
        Self { location, document }
    }

    pub fn inject_title(&mut self, title: &str) {
        inject_title(&mut self.document, title);
    }

    /// The current display title, as the browser tab shows it.
    pub fn title(&self) -> String {
        self.document.title()
    }

    /// Title read from the first element carrying `title_class`.
    pub fn landing_title(&self, title_class: &str) -> Option<String> {
        landing_title(&self.document, title_class)
    }
}

/// Rendered text of the first element carrying `title_class`, whitespace collapsed.
pub fn landing_title(doc: &Document, title_class: &str) -> Option<String> {
    let first = doc.elements_by_class_name(title_class).into_iter().next()?;
    Some(collapse_whitespace(&doc.text_content(first)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABS_PAGE: &str = r#"<html><head><title>[1706.03762] Attention</title></head>
<body><div id="abs"><h1 class="title mathjax"><span class="descriptor">Title:</span>Attention Is All You Need</h1>
<h1 class="title">second</h1></div></body></html>"#;

    #[test]
    fn landing_title_reads_first_title_element() {
        let doc = Document::parse_html(ABS_PAGE);
        assert_eq!(
            landing_title(&doc, "title").as_deref(),
            Some("Title:Attention Is All You Need")
        );
    }

    #[test]
    fn landing_title_missing_class() {
        let doc = Document::parse_html("<body><p>nothing here</p></body>");
        assert_eq!(landing_title(&doc, "title"), None);
    }

    #[test]
    fn location_last_segment() {
        let loc = Location::new("https://arxiv.org", "/pdf/1706.03762v5.pdf");
        assert_eq!(loc.last_segment(), "1706.03762v5.pdf");
        assert_eq!(loc.href(), "https://arxiv.org/pdf/1706.03762v5.pdf");
    }

    #[test]
    fn page_inject_updates_title() {
        let mut page = Page::new(
            Location::new("https://arxiv.org", "/abs/1706.03762"),
            Document::parse_html(ABS_PAGE),
        );
        page.inject_title("Attention Is All You Need");
        assert_eq!(page.title(), "Attention Is All You Need");
    }
}
