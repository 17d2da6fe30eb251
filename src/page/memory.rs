// src/page/memory.rs
//
// Headless document tree built from XHTML book markup with quick-xml. Nodes
// live in an arena; detached nodes stay there without a parent.

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

use super::Page;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(usize);

const ROOT: MemoryNode = MemoryNode(0);

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
    style: BTreeMap<String, String>,
    bottom_edge: f64,
}

impl NodeData {
    fn element(tag: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            kind: NodeKind::Element { tag, attributes },
            parent: None,
            children: Vec::new(),
            style: BTreeMap::new(),
            bottom_edge: 0.0,
        }
    }

    fn text(content: String) -> Self {
        Self {
            kind: NodeKind::Text(content),
            parent: None,
            children: Vec::new(),
            style: BTreeMap::new(),
            bottom_edge: 0.0,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPage {
    nodes: Vec<NodeData>,
    fragment: String,
    fragment_writes: Vec<String>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self {
            nodes: vec![NodeData::element(String::new(), Vec::new())],
            fragment: String::new(),
            fragment_writes: Vec::new(),
        }
    }
}

impl MemoryPage {
    /// Builds a document from well-formed XHTML. Several top-level elements
    /// are allowed.
    pub fn from_xhtml(markup: &str) -> Result<Self> {
        let mut page = Self::default();
        let top = page.parse_fragment(markup)?;
        page.append_children(ROOT.0, &top);
        Ok(page)
    }

    fn parse_fragment(&mut self, markup: &str) -> Result<Vec<usize>> {
        let mut reader = Reader::from_str(markup);
        reader.trim_text(false);

        let mut top = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let id = self.push_element(e);
                    self.attach_parsed(id, open.last().copied(), &mut top);
                    open.push(id);
                }
                Event::Empty(ref e) => {
                    let id = self.push_element(e);
                    self.attach_parsed(id, open.last().copied(), &mut top);
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(e) => {
                    let content = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    if !content.is_empty() {
                        let id = self.push(NodeData::text(content));
                        self.attach_parsed(id, open.last().copied(), &mut top);
                    }
                }
                Event::CData(e) => {
                    let content = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    let id = self.push(NodeData::text(content));
                    self.attach_parsed(id, open.last().copied(), &mut top);
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(top)
    }

    fn push_element(&mut self, e: &BytesStart) -> usize {
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let mut attributes = Vec::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            attributes.push((key, value));
        }
        self.push(NodeData::element(tag, attributes))
    }

    fn push(&mut self, data: NodeData) -> usize {
        self.nodes.push(data);
        self.nodes.len() - 1
    }

    fn attach_parsed(&mut self, id: usize, parent: Option<usize>, top: &mut Vec<usize>) {
        match parent {
            Some(parent) => self.append_children(parent, &[id]),
            None => top.push(id),
        }
    }

    fn append_children(&mut self, parent: usize, children: &[usize]) {
        for &child in children {
            self.nodes[child].parent = Some(parent);
            self.nodes[parent].children.push(child);
        }
    }

    fn unlink(&mut self, id: usize) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    /// Attached element nodes in document order.
    fn walk(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack: Vec<usize> = self.nodes[ROOT.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.nodes[id].is_element() {
                order.push(id);
            }
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        order
    }

    fn serialize_into(&self, id: usize, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(content) => out.push_str(&partial_escape(content.as_str())),
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
                }
                out.push('>');
                for &child in &self.nodes[id].children {
                    self.serialize_into(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    pub fn style(&self, node: &MemoryNode, property: &str) -> Option<&str> {
        self.nodes[node.0].style.get(property).map(String::as_str)
    }

    pub fn attribute(&self, node: &MemoryNode, name: &str) -> Option<&str> {
        self.nodes[node.0].attribute(name)
    }

    pub fn is_visible(&self, node: &MemoryNode) -> bool {
        self.style(node, "display") != Some("none")
    }

    pub fn set_bottom_edge(&mut self, node: &MemoryNode, y: f64) {
        self.nodes[node.0].bottom_edge = y;
    }

    /// Changes the fragment the way the address bar or history buttons do,
    /// without recording it as a write by the reader.
    pub fn enter_fragment(&mut self, fragment: &str) {
        self.fragment = fragment.trim_start_matches('#').to_string();
    }

    /// Every fragment the reader pushed, oldest first.
    pub fn fragment_writes(&self) -> &[String] {
        &self.fragment_writes
    }

    pub fn next_sibling(&self, node: &MemoryNode) -> Option<MemoryNode> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == node.0)?;
        siblings.get(pos + 1).map(|&id| MemoryNode(id))
    }
}

impl Page for MemoryPage {
    type Node = MemoryNode;

    fn elements_by_class(&self, class: &str) -> Vec<MemoryNode> {
        self.walk()
            .into_iter()
            .map(MemoryNode)
            .filter(|node| self.has_class(node, class))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<MemoryNode> {
        self.walk()
            .into_iter()
            .find(|&n| self.nodes[n].attribute("id") == Some(id))
            .map(MemoryNode)
    }

    fn parent(&self, node: &MemoryNode) -> Option<MemoryNode> {
        self.nodes[node.0]
            .parent
            .filter(|&p| p != ROOT.0)
            .map(MemoryNode)
    }

    fn element_id(&self, node: &MemoryNode) -> String {
        self.nodes[node.0]
            .attribute("id")
            .unwrap_or_default()
            .to_string()
    }

    fn has_class(&self, node: &MemoryNode, class: &str) -> bool {
        self.nodes[node.0]
            .attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn set_style(&mut self, node: &MemoryNode, property: &str, value: &str) {
        self.nodes[node.0]
            .style
            .insert(property.to_string(), value.to_string());
    }

    fn set_attribute(&mut self, node: &MemoryNode, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            match attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn inner_html(&self, node: &MemoryNode) -> String {
        let mut out = String::new();
        for &child in &self.nodes[node.0].children {
            self.serialize_into(child, &mut out);
        }
        out
    }

    fn set_inner_html(&mut self, node: &MemoryNode, html: &str) {
        match self.parse_fragment(html) {
            Ok(children) => {
                for old in std::mem::take(&mut self.nodes[node.0].children) {
                    self.nodes[old].parent = None;
                }
                self.append_children(node.0, &children);
            }
            Err(e) => log::warn!("Ignoring malformed markup for #{}: {}", self.element_id(node), e),
        }
    }

    fn bottom_edge(&self, node: &MemoryNode) -> f64 {
        self.nodes[node.0].bottom_edge
    }

    fn insert_html_after(&mut self, node: &MemoryNode, html: &str) {
        let Some(parent) = self.nodes[node.0].parent else {
            return;
        };
        match self.parse_fragment(html) {
            Ok(inserted) => {
                let pos = self.nodes[parent]
                    .children
                    .iter()
                    .position(|&c| c == node.0)
                    .map(|p| p + 1)
                    .unwrap_or(self.nodes[parent].children.len());
                for (offset, &id) in inserted.iter().enumerate() {
                    self.nodes[id].parent = Some(parent);
                    self.nodes[parent].children.insert(pos + offset, id);
                }
            }
            Err(e) => log::warn!("Ignoring malformed markup after #{}: {}", self.element_id(node), e),
        }
    }

    fn detach(&mut self, node: &MemoryNode) {
        if node.0 != ROOT.0 {
            self.unlink(node.0);
        }
    }

    fn fragment(&self) -> String {
        self.fragment.clone()
    }

    fn set_fragment(&mut self, fragment: &str) {
        let fragment = fragment.trim_start_matches('#').to_string();
        self.fragment_writes.push(fragment.clone());
        self.fragment = fragment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"<div id="book">
<div id="chapter-0" class="chapter"><h1>One</h1><p id="para">Hello <em>there</em></p></div>
<div id="chapter-1" class="chapter intro"><h1>Two</h1></div>
</div>"#;

    #[test]
    fn test_class_lookup_in_document_order() {
        let page = MemoryPage::from_xhtml(BOOK).unwrap();
        let chapters = page.elements_by_class("chapter");
        assert_eq!(chapters.len(), 2);
        assert_eq!(page.element_id(&chapters[0]), "chapter-0");
        assert_eq!(page.element_id(&chapters[1]), "chapter-1");
        assert!(page.has_class(&chapters[1], "intro"));
        assert!(page.elements_by_class("chapte").is_empty());
    }

    #[test]
    fn test_parent_walk_stops_at_document() {
        let page = MemoryPage::from_xhtml(BOOK).unwrap();
        let para = page.element_by_id("para").unwrap();
        let chapter = page.parent(&para).unwrap();
        assert_eq!(page.element_id(&chapter), "chapter-0");
        let book = page.parent(&chapter).unwrap();
        assert_eq!(page.element_id(&book), "book");
        assert_eq!(page.parent(&book), None);
    }

    #[test]
    fn test_inner_html_serializes_children() {
        let page = MemoryPage::from_xhtml(BOOK).unwrap();
        let para = page.element_by_id("para").unwrap();
        assert_eq!(page.inner_html(&para), "Hello <em>there</em>");
    }

    #[test]
    fn test_insert_after_and_detach() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let para = page.element_by_id("para").unwrap();
        page.insert_html_after(&para, r#"<aside class="popup">note</aside>"#);

        let popups = page.elements_by_class("popup");
        assert_eq!(popups.len(), 1);
        assert_eq!(page.next_sibling(&para), Some(popups[0]));

        page.detach(&popups[0]);
        assert!(page.elements_by_class("popup").is_empty());
        assert_eq!(page.parent(&popups[0]), None);
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let para = page.element_by_id("para").unwrap();
        page.set_inner_html(&para, "<b id=\"bold\">new</b>");
        assert_eq!(page.inner_html(&para), "<b id=\"bold\">new</b>");
        assert!(page.element_by_id("bold").is_some());

        page.set_inner_html(&para, "<b>unclosed</i>");
        assert_eq!(page.inner_html(&para), "<b id=\"bold\">new</b>");
    }

    #[test]
    fn test_fragment_writes_are_recorded() {
        let mut page = MemoryPage::default();
        page.enter_fragment("#typed");
        assert_eq!(page.fragment(), "typed");
        assert!(page.fragment_writes().is_empty());

        page.set_fragment("chapter-2");
        assert_eq!(page.fragment(), "chapter-2");
        assert_eq!(page.fragment_writes(), ["chapter-2".to_string()]);
    }

    #[test]
    fn test_malformed_markup_is_an_error() {
        assert!(MemoryPage::from_xhtml("<div><p></div>").is_err());
    }
}
