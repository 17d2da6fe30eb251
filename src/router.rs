// src/router.rs
//
// Address fragment → chapter resolution. Navigation triggered from here never
// writes the fragment back.

use crate::chapter::ChapterId;
use crate::error::Result;
use crate::navigation::{NavigationController, RoutePush};
use crate::page::Page;

/// Upper bound on the ancestor walk; deeper trees are treated as malformed.
pub const MAX_ANCESTOR_DEPTH: usize = 1024;

/// Chapter containing `element`: the nearest ancestor-or-self carrying the
/// chapter class. No element, or no chapter ancestor, means the first chapter.
pub fn resolve_chapter<P: Page>(
    page: &P,
    chapter_class: &str,
    element: Option<P::Node>,
) -> ChapterId {
    let mut current = element;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some(node) = current else {
            return ChapterId::FIRST;
        };
        if page.has_class(&node, chapter_class) {
            return ChapterId::from_element_id(&page.element_id(&node));
        }
        current = page.parent(&node);
    }
    log::warn!("ancestor walk exceeded {} levels", MAX_ANCESTOR_DEPTH);
    ChapterId::FIRST
}

/// Resolves a fragment (without `#`). `None` when it names no element.
pub fn resolve_fragment<P: Page>(page: &P, chapter_class: &str, fragment: &str) -> Option<ChapterId> {
    if fragment.is_empty() {
        return Some(ChapterId::FIRST);
    }
    let element = page.element_by_id(fragment)?;
    Some(resolve_chapter(page, chapter_class, Some(element)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRouter {
    chapter_class: String,
}

impl HashRouter {
    pub fn new(chapter_class: &str) -> Self {
        Self {
            chapter_class: chapter_class.to_string(),
        }
    }

    /// Page ready.
    pub fn on_load<P: Page>(
        &self,
        page: &mut P,
        nav: &mut NavigationController<P::Node>,
    ) -> Result<Option<ChapterId>> {
        self.sync(page, nav)
    }

    /// Address bar edit or back/forward.
    pub fn on_hash_change<P: Page>(
        &self,
        page: &mut P,
        nav: &mut NavigationController<P::Node>,
    ) -> Result<Option<ChapterId>> {
        self.sync(page, nav)
    }

    fn sync<P: Page>(
        &self,
        page: &mut P,
        nav: &mut NavigationController<P::Node>,
    ) -> Result<Option<ChapterId>> {
        let fragment = page.fragment();
        match resolve_fragment(page, &self.chapter_class, &fragment) {
            Some(chapter) => nav
                .show_chapter(page, chapter, RoutePush::Suppress)
                .map(Some),
            None => {
                log::debug!("fragment #{} names no element, keeping current view", fragment);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;
    use crate::reader_config::ReaderConfig;

    const BOOK: &str = r#"<main id="root">
<p id="preface">before any chapter</p>
<div id="chapter-0" class="chapter"><h1 id="title">Start</h1></div>
<div id="chapter-1" class="chapter"><section><p><sup id="note-source-3">3</sup></p></section></div>
<div id="chapter-2" class="chapter"/>
<div id="chapter-x" class="chapter"><span id="broken"/></div>
</main>"#;

    #[test]
    fn test_resolve_walks_up_to_chapter() {
        let page = MemoryPage::from_xhtml(BOOK).unwrap();
        let note = page.element_by_id("note-source-3");
        assert_eq!(resolve_chapter(&page, "chapter", note), ChapterId(1));
        let title = page.element_by_id("title");
        assert_eq!(resolve_chapter(&page, "chapter", title), ChapterId(0));
        let chapter = page.element_by_id("chapter-2");
        assert_eq!(resolve_chapter(&page, "chapter", chapter), ChapterId(2));
    }

    #[test]
    fn test_resolve_defaults_to_first_chapter() {
        let page = MemoryPage::from_xhtml(BOOK).unwrap();
        assert_eq!(resolve_chapter(&page, "chapter", None), ChapterId::FIRST);
        let preface = page.element_by_id("preface");
        assert_eq!(resolve_chapter(&page, "chapter", preface), ChapterId::FIRST);
        let broken = page.element_by_id("broken");
        assert_eq!(resolve_chapter(&page, "chapter", broken), ChapterId::FIRST);
    }

    #[test]
    fn test_resolve_fragment() {
        let page = MemoryPage::from_xhtml(BOOK).unwrap();
        assert_eq!(resolve_fragment(&page, "chapter", ""), Some(ChapterId::FIRST));
        assert_eq!(resolve_fragment(&page, "chapter", "chapter-2"), Some(ChapterId(2)));
        assert_eq!(resolve_fragment(&page, "chapter", "nowhere"), None);
    }

    #[test]
    fn test_hash_change_navigates_without_echo() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let mut nav = NavigationController::new(&page, &ReaderConfig::default(), None);
        let router = HashRouter::new("chapter");

        page.enter_fragment("note-source-3");
        assert_eq!(router.on_hash_change(&mut page, &mut nav), Ok(Some(ChapterId(1))));
        assert_eq!(page.fragment(), "note-source-3");
        assert!(page.fragment_writes().is_empty());

        let chapter_1 = page.element_by_id("chapter-1").unwrap();
        assert!(page.is_visible(&chapter_1));
    }

    #[test]
    fn test_unknown_fragment_keeps_current_chapter() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let mut nav = NavigationController::new(&page, &ReaderConfig::default(), None);
        let router = HashRouter::new("chapter");

        page.enter_fragment("chapter-2");
        router.on_load(&mut page, &mut nav).unwrap();

        page.enter_fragment("does-not-exist");
        assert_eq!(router.on_hash_change(&mut page, &mut nav), Ok(None));
        let chapter_2 = page.element_by_id("chapter-2").unwrap();
        assert!(page.is_visible(&chapter_2));
    }

    #[test]
    fn test_empty_fragment_on_load_shows_first_chapter() {
        let mut page = MemoryPage::from_xhtml(BOOK).unwrap();
        let mut nav = NavigationController::new(&page, &ReaderConfig::default(), None);
        let router = HashRouter::new("chapter");

        assert_eq!(router.on_load(&mut page, &mut nav), Ok(Some(ChapterId::FIRST)));
        assert_eq!(page.fragment(), "");
        let chapter_0 = page.element_by_id("chapter-0").unwrap();
        let chapter_1 = page.element_by_id("chapter-1").unwrap();
        assert!(page.is_visible(&chapter_0));
        assert!(!page.is_visible(&chapter_1));
    }
}
