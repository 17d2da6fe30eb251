// src/footnote.rs
use crate::page::Page;

/// Hover popups for footnote references. A reference `…source…` shows the
/// content of the element whose id has `source` replaced by `dest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnotePopover {
    popup_class: String,
}

impl FootnotePopover {
    pub fn new(popup_class: &str) -> Self {
        Self {
            popup_class: popup_class.to_string(),
        }
    }

    pub fn target_id(reference_id: &str) -> String {
        reference_id.replacen("source", "dest", 1)
    }

    pub fn show_footnote<P: Page>(&self, page: &mut P, reference: &P::Node) {
        self.remove_footnotes(page);

        let reference_id = page.element_id(reference);
        let target_id = Self::target_id(&reference_id);
        let Some(target) = page.element_by_id(&target_id) else {
            log::warn!("footnote #{} has no #{}", reference_id, target_id);
            return;
        };
        let content = page.inner_html(&target);
        let top = page.bottom_edge(reference).round();
        let popup = format!(
            r#"<aside class="{}" style="position: fixed; top: {}px;">{}</aside>"#,
            self.popup_class, top, content
        );
        page.insert_html_after(reference, &popup);
    }

    pub fn remove_footnotes<P: Page>(&self, page: &mut P) {
        for popup in page.elements_by_class(&self.popup_class) {
            page.detach(&popup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;

    const BOOK: &str = r##"<div>
<p id="text">Claim<a href="#note-dest-1"><sup id="note-source-1" class="footnote_reference">[1]</sup></a>
and another<a href="#note-dest-2"><sup id="note-source-2" class="footnote_reference">[2]</sup></a>
and a dangling one<sup id="note-source-9" class="footnote_reference">[9]</sup></p>
<aside id="note-dest-1">First <em>note</em></aside>
<aside id="note-dest-2">Second note</aside>
</div>"##;

    fn popups(page: &MemoryPage) -> usize {
        page.elements_by_class("popup_footnote").len()
    }

    #[test]
    fn test_target_id_convention() {
        assert_eq!(FootnotePopover::target_id("note-source-4"), "note-dest-4");
        assert_eq!(FootnotePopover::target_id("source12"), "dest12");
    }

    #[test]
    fn test_show_inserts_popup_after_reference() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let popover = FootnotePopover::new("popup_footnote");
        let reference = page.element_by_id("note-source-1").unwrap();
        page.set_bottom_edge(&reference, 120.4);

        popover.show_footnote(&mut page, &reference);

        let popup = page.next_sibling(&reference).unwrap();
        assert!(page.has_class(&popup, "popup_footnote"));
        assert_eq!(page.inner_html(&popup), "First <em>note</em>");
        assert_eq!(page.attribute(&popup, "style"), Some("position: fixed; top: 120px;"));
    }

    #[test]
    fn test_at_most_one_popup() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let popover = FootnotePopover::new("popup_footnote");
        let first = page.element_by_id("note-source-1").unwrap();
        let second = page.element_by_id("note-source-2").unwrap();

        for reference in [&first, &second, &first, &first, &second] {
            popover.show_footnote(&mut page, reference);
            assert_eq!(popups(&page), 1);
        }
        let popup = page.next_sibling(&second).unwrap();
        assert_eq!(page.inner_html(&popup), "Second note");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let popover = FootnotePopover::new("popup_footnote");
        let reference = page.element_by_id("note-source-2").unwrap();

        popover.remove_footnotes(&mut page);
        assert_eq!(popups(&page), 0);

        popover.show_footnote(&mut page, &reference);
        popover.remove_footnotes(&mut page);
        popover.remove_footnotes(&mut page);
        assert_eq!(popups(&page), 0);
    }

    #[test]
    fn test_missing_footnote_content_clears_popups() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let popover = FootnotePopover::new("popup_footnote");
        let good = page.element_by_id("note-source-1").unwrap();
        let dangling = page.element_by_id("note-source-9").unwrap();

        popover.show_footnote(&mut page, &good);
        popover.show_footnote(&mut page, &dangling);
        assert_eq!(popups(&page), 0);
    }
}
