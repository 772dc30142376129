//! A small arena-backed DOM modelling the host page.
//!
//! Detaching a node only unlinks it from its parent, so its `NodeId` stays
//! valid. [`Document::remove`] releases a subtree for reuse; ids inside it must
//! not be used afterwards.

use std::collections::HashMap;

use scraper::Html;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    /// Slots released by `remove`, handed out again by `push`.
    free: Vec<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: just the root node, no `<html>` element yet.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            free: Vec::new(),
        }
    }

    /// `<html><head></head><body></body></html>`
    pub fn skeleton() -> Self {
        let mut doc = Self::new();
        let html = doc.ensure_document_element();
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.append_child(html, head);
        doc.append_child(html, body);
        doc
    }

    /// Parse a full HTML document. Comments and doctypes are dropped.
    pub fn parse_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Self::new();
        let mut ids = HashMap::new();
        ids.insert(html.tree.root().id(), doc.root());

        for node in html.tree.root().descendants().skip(1) {
            let Some(parent) = node.parent().and_then(|p| ids.get(&p.id()).copied()) else {
                continue;
            };
            let created = match node.value() {
                scraper::Node::Element(el) => {
                    let id = doc.create_element(el.name());
                    for (name, value) in el.attrs() {
                        doc.set_attribute(id, name, value);
                    }
                    id
                }
                scraper::Node::Text(text) => doc.create_text(&**text),
                _ => continue,
            };
            doc.append_child(parent, created);
            ids.insert(node.id(), created);
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // ─── Node creation ─────────────────────────────────────

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Number of slots in the arena, live or free.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    // ─── Accessors ─────────────────────────────────────────

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            match attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((name.to_ascii_lowercase(), value.to_string())),
            }
        }
    }

    /// True when `id` is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root()
    }

    /// The `<html>` element, if the page has one.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&child| self.tag_name(child).is_some())
    }

    pub fn ensure_document_element(&mut self) -> NodeId {
        if let Some(html) = self.document_element() {
            return html;
        }
        let html = self.create_element("html");
        let root = self.root();
        self.append_child(root, html);
        html
    }

    /// First `<head>` child of the document element, like `document.head`.
    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "head")
    }

    /// First `<body>` child of the document element, like `document.body`.
    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "body")
    }

    pub fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body() {
            return body;
        }
        let html = self.ensure_document_element();
        let body = self.create_element("body");
        self.append_child(html, body);
        body
    }

    fn child_element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.is_element_named(child, name))
    }

    /// All attached nodes below `id`, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Elements carrying `class` among their whitespace-separated classes.
    pub fn elements_by_class_name(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&id| {
                self.attribute(id, "class")
                    .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
            })
            .collect()
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(text) = self.data(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Text of the first `<title>` element, whitespace collapsed, like `document.title`.
    pub fn title(&self) -> String {
        self.descendants(self.root())
            .into_iter()
            .find(|&id| self.is_element_named(id, "title"))
            .map(|id| collapse_whitespace(&self.text_content(id)))
            .unwrap_or_default()
    }

    // ─── Mutation ──────────────────────────────────────────

    /// Append `child` as the last child of `parent`, moving it if already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` right before `reference` among `parent`'s children.
    /// Falls back to appending when `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|&c| c == reference) {
            Some(pos) => siblings.insert(pos, child),
            None => siblings.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// Unlink `id` from its parent. A no-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Detach `id` and release it and everything below it for reuse.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root() {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = &mut self.nodes[next.0];
            stack.append(&mut node.children);
            node.parent = None;
            node.data = NodeData::Text(String::new());
            self.free.push(next);
        }
    }

    // ─── Serialization ─────────────────────────────────────

    pub fn to_html(&self) -> String {
        self.outer_html(self.root())
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.data(id) {
            NodeData::Document => {
                for &child in self.children(id) {
                    self.write_node(child, false, out);
                }
            }
            NodeData::Text(text) if raw_text => out.push_str(text),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
                for &child in self.children(id) {
                    self.write_node(child, raw, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}
