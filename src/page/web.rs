// src/page/web.rs
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Window};

use super::Page;
use crate::error::{ReaderError, Result};

/// `Page` backed by the live browser document.
#[derive(Debug, Clone)]
pub struct WebPage {
    window: Window,
    document: Document,
}

impl WebPage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(ReaderError::NoWindow)?;
        let document = window.document().ok_or(ReaderError::NoDocument)?;
        Ok(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Elements matching a CSS selector, in document order.
    pub fn select_all(&self, selector: &str) -> Vec<Element> {
        let mut found = Vec::new();
        if let Ok(list) = self.document.query_selector_all(selector) {
            for i in 0..list.length() {
                if let Some(element) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    found.push(element);
                }
            }
        }
        found
    }
}

impl Page for WebPage {
    type Node = Element;

    fn elements_by_class(&self, class: &str) -> Vec<Element> {
        let collection = self.document.get_elements_by_class_name(class);
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn element_id(&self, node: &Element) -> String {
        node.id()
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            if let Err(e) = element.style().set_property(property, value) {
                log::warn!("Failed to set {} on #{}: {:?}", property, node.id(), e);
            }
        }
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            log::warn!("Failed to set attribute {} on #{}: {:?}", name, node.id(), e);
        }
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&mut self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn bottom_edge(&self, node: &Element) -> f64 {
        let rect = node.get_bounding_client_rect();
        rect.top() + rect.height()
    }

    fn insert_html_after(&mut self, node: &Element, html: &str) {
        if let Err(e) = node.insert_adjacent_html("afterend", html) {
            log::warn!("Failed to insert markup after #{}: {:?}", node.id(), e);
        }
    }

    fn detach(&mut self, node: &Element) {
        node.remove();
    }

    fn fragment(&self) -> String {
        self.window
            .location()
            .hash()
            .map(|hash| hash.trim_start_matches('#').to_string())
            .unwrap_or_default()
    }

    fn set_fragment(&mut self, fragment: &str) {
        if let Err(e) = self.window.location().set_hash(fragment) {
            log::warn!("Failed to update address fragment: {:?}", e);
        }
    }
}
