// src/page/mod.rs
//
// The document hooks the reader needs from whatever renders the book. The
// browser implementation lives in `web`, the headless one in `memory`.

pub mod memory;
pub mod web;

pub use memory::{MemoryNode, MemoryPage};
pub use web::WebPage;

/// CSS `display` values written by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    None,
}

impl Display {
    pub fn as_css(self) -> &'static str {
        match self {
            Display::Block => "block",
            Display::None => "none",
        }
    }
}

pub trait Page {
    type Node: Clone + PartialEq;

    /// Elements carrying `class`, in document order.
    fn elements_by_class(&self, class: &str) -> Vec<Self::Node>;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn element_id(&self, node: &Self::Node) -> String;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn inner_html(&self, node: &Self::Node) -> String;

    fn set_inner_html(&mut self, node: &Self::Node, html: &str);

    /// Viewport y coordinate of the bottom edge of `node`.
    fn bottom_edge(&self, node: &Self::Node) -> f64;

    /// Inserts `html` as the next sibling(s) of `node`.
    fn insert_html_after(&mut self, node: &Self::Node, html: &str);

    fn detach(&mut self, node: &Self::Node);

    /// Current address fragment without the leading `#`; empty when unset.
    fn fragment(&self) -> String;

    fn set_fragment(&mut self, fragment: &str);

    fn set_display(&mut self, node: &Self::Node, display: Display) {
        self.set_style(node, "display", display.as_css());
    }
}
