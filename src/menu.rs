// src/menu.rs
use crate::page::Page;
use crate::reader_config::ElementIds;

/// Slide-in navigation drawer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDrawer {
    open: bool,
    nav: String,
    content: String,
    menu: String,
}

impl MenuDrawer {
    pub fn new(ids: &ElementIds) -> Self {
        Self {
            open: false,
            nav: ids.nav.clone(),
            content: ids.content.clone(),
            menu: ids.menu.clone(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle<P: Page>(&mut self, page: &mut P) -> bool {
        self.open = !self.open;
        let (nav_left, content_margin, menu_left) = if self.open {
            ("0", "20%", "20%")
        } else {
            ("-21%", "0%", "1em")
        };
        self.style(page, &self.nav, "left", nav_left);
        self.style(page, &self.content, "margin-left", content_margin);
        self.style(page, &self.menu, "left", menu_left);
        self.open
    }

    fn style<P: Page>(&self, page: &mut P, id: &str, property: &str, value: &str) {
        if let Some(element) = page.element_by_id(id) {
            page.set_style(&element, property, value);
        }
    }
}
