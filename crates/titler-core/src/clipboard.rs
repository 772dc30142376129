//! Rich (HTML-bearing) clipboard export.
//!
//! Segments are rendered into a temporary container attached to the page body,
//! the container is selected (serialized as HTML plus its plain text), the
//! selection is written to the clipboard, and the container is removed again.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    #[default]
    Plain,
    Bold,
    Italic,
}

impl Emphasis {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Plain => "span",
            Self::Bold => "b",
            Self::Italic => "i",
        }
    }
}

/// One piece of a rich clipboard document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipboardSegment {
    Text {
        content: String,
        #[serde(default)]
        emphasis: Emphasis,
    },
    Link {
        href: String,
        content: String,
    },
}

impl ClipboardSegment {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            emphasis: Emphasis::Plain,
        }
    }

    pub fn bold(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            emphasis: Emphasis::Bold,
        }
    }

    pub fn link(href: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Link {
            href: href.into(),
            content: content.into(),
        }
    }
}

/// What a selection puts on the clipboard: markup plus a plain-text flavour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichContent {
    pub html: String,
    pub plain: String,
}

pub trait Clipboard {
    fn write_rich(&mut self, content: &RichContent) -> Result<()>;
}

/// The operating system clipboard, through arboard.
///
/// The arboard instance is opened on the first write and kept for the life of
/// this value. On X11 and Wayland the copied data is served by that instance,
/// so dropping it early would empty the clipboard.
#[derive(Default)]
pub struct SystemClipboard {
    /// On Linux, block until another client takes over the selection so the
    /// content survives a short-lived process.
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    hold: bool,
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding() -> Self {
        Self {
            hold: true,
            inner: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}

impl Clipboard for SystemClipboard {
    fn write_rich(&mut self, content: &RichContent) -> Result<()> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let clipboard = self.inner.insert(clipboard);

        #[cfg(target_os = "linux")]
        if self.hold {
            use arboard::SetExtLinux;
            clipboard
                .set()
                .wait()
                .html(content.html.as_str(), Some(content.plain.as_str()))?;
            return Ok(());
        }

        clipboard.set_html(content.html.as_str(), Some(content.plain.as_str()))?;
        Ok(())
    }
}

/// Keeps the last written payload in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub contents: Option<RichContent>,
    pub writes: usize,
}

impl Clipboard for MemoryClipboard {
    fn write_rich(&mut self, content: &RichContent) -> Result<()> {
        self.contents = Some(content.clone());
        self.writes += 1;
        Ok(())
    }
}

/// Render `segments` into a detached `<div>` owned by `doc`.
pub fn render_segments(doc: &mut Document, segments: &[ClipboardSegment]) -> NodeId {
    let container = doc.create_element("div");
    for segment in segments {
        let node = match segment {
            ClipboardSegment::Text { content, emphasis } => {
                let el = doc.create_element(emphasis.tag());
                let text = doc.create_text(content);
                doc.append_child(el, text);
                el
            }
            ClipboardSegment::Link { href, content } => {
                let el = doc.create_element("a");
                doc.set_attribute(el, "href", href);
                let text = doc.create_text(content);
                doc.append_child(el, text);
                el
            }
        };
        doc.append_child(container, node);
    }
    container
}

/// Select `node` the way a range over it would: its markup and its text.
pub fn select_node(doc: &Document, node: NodeId) -> RichContent {
    RichContent {
        html: doc.outer_html(node),
        plain: doc.text_content(node),
    }
}

/// Removes the container when dropped, including on early return or panic.
struct AttachedContainer<'a> {
    doc: &'a mut Document,
    node: NodeId,
}

impl<'a> AttachedContainer<'a> {
    fn attach(doc: &'a mut Document, node: NodeId) -> Self {
        let body = doc.ensure_body();
        doc.append_child(body, node);
        Self { doc, node }
    }
}

impl Drop for AttachedContainer<'_> {
    fn drop(&mut self) {
        self.doc.remove(self.node);
    }
}

/// Render `segments`, place them on the page, copy the selection, and clean up.
///
/// The temporary container never outlives this call, even when the clipboard
/// write fails.
pub fn build_and_copy(
    doc: &mut Document,
    segments: &[ClipboardSegment],
    clipboard: &mut dyn Clipboard,
) -> Result<()> {
    let container = render_segments(doc, segments);
    let attached = AttachedContainer::attach(doc, container);
    let selection = select_node(&*attached.doc, attached.node);
    debug!(bytes = selection.html.len(), "copying rich selection");
    clipboard.write_rich(&selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TitlerError;

    struct BrokenClipboard;

    impl Clipboard for BrokenClipboard {
        fn write_rich(&mut self, _content: &RichContent) -> Result<()> {
            Err(TitlerError::Clipboard("no display".to_string()))
        }
    }

    fn citation() -> Vec<ClipboardSegment> {
        vec![
            ClipboardSegment::bold("Foo"),
            ClipboardSegment::text(" [2021.07: "),
            ClipboardSegment::link("/pdf/x", "pdf"),
            ClipboardSegment::text(" | "),
            ClipboardSegment::link("/abs/x", "abs"),
            ClipboardSegment::text("]"),
        ]
    }

    #[test]
    fn copies_markup_and_leaves_no_container() {
        let mut doc = Document::parse_html("<html><head></head><body><p>pdf</p></body></html>");
        let before = doc.to_html();
        let mut clipboard = MemoryClipboard::default();

        build_and_copy(&mut doc, &citation(), &mut clipboard).unwrap();

        let copied = clipboard.contents.unwrap();
        assert_eq!(
            copied.html,
            concat!(
                "<div><b>Foo</b><span> [2021.07: </span><a href=\"/pdf/x\">pdf</a>",
                "<span> | </span><a href=\"/abs/x\">abs</a><span>]</span></div>"
            )
        );
        assert_eq!(copied.plain, "Foo [2021.07: pdf | abs]");
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn failed_copy_still_detaches() {
        let mut doc = Document::skeleton();
        let body = doc.body().unwrap();
        let err = build_and_copy(&mut doc, &citation(), &mut BrokenClipboard);
        assert!(matches!(err, Err(TitlerError::Clipboard(_))));
        assert!(doc.children(body).is_empty());
    }

    #[test]
    fn repeated_export_is_identical() {
        let mut doc = Document::skeleton();
        let mut clipboard = MemoryClipboard::default();
        build_and_copy(&mut doc, &citation(), &mut clipboard).unwrap();
        let first = clipboard.contents.clone();
        build_and_copy(&mut doc, &citation(), &mut clipboard).unwrap();
        assert_eq!(clipboard.contents, first);
        assert_eq!(clipboard.writes, 2);
        assert!(doc.children(doc.body().unwrap()).is_empty());
    }

    #[test]
    fn italic_and_escaped_text() {
        let mut doc = Document::new();
        let node = render_segments(
            &mut doc,
            &[ClipboardSegment::Text {
                content: "a < b".to_string(),
                emphasis: Emphasis::Italic,
            }],
        );
        assert_eq!(doc.outer_html(node), "<div><i>a &lt; b</i></div>");
    }

    #[test]
    fn segments_deserialize_from_tagged_table() {
        let link: ClipboardSegment =
            toml::from_str("kind = \"link\"\nhref = \"/abs/x\"\ncontent = \"abs\"\n").unwrap();
        assert_eq!(link, ClipboardSegment::link("/abs/x", "abs"));

        let text: ClipboardSegment = toml::from_str("kind = \"text\"\ncontent = \"plain\"\n").unwrap();
        assert_eq!(text, ClipboardSegment::text("plain"));
    }

    #[test]
    fn export_releases_container_nodes() {
        let mut doc = Document::skeleton();
        let mut clipboard = MemoryClipboard::default();
        build_and_copy(&mut doc, &citation(), &mut clipboard).unwrap();
        let len = doc.arena_len();

        for _ in 0..1_000 {
            build_and_copy(&mut doc, &citation(), &mut clipboard).unwrap();
        }

        assert_eq!(doc.arena_len(), len);
        assert_eq!(clipboard.writes, 1_001);
    }

    #[test]
    fn system_clipboard_keeps_its_connection() {
        let mut clipboard = SystemClipboard::new();
        assert!(!clipboard.is_open());

        let content = RichContent {
            html: "<b>x</b>".to_string(),
            plain: "x".to_string(),
        };
        match clipboard.write_rich(&content) {
            Ok(()) => {
                assert!(clipboard.is_open());
                clipboard.write_rich(&content).unwrap();
                assert!(clipboard.is_open());
            }
            // Headless: nothing could be opened, so nothing is kept.
            Err(TitlerError::Clipboard(_)) => assert!(!clipboard.is_open()),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
