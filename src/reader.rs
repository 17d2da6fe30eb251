// src/reader.rs
//
// One reading session: the page plus every piece of state the event handlers
// touch. Constructed once at startup and driven one event at a time.

use crate::chapter::ChapterId;
use crate::error::Result;
use crate::footnote::FootnotePopover;
use crate::menu::MenuDrawer;
use crate::narrative::{Action, Initializer, Narrative, NarrativeSnapshot, Story};
use crate::navigation::{DisplayMode, NavigationController, RoutePush};
use crate::page::Page;
use crate::reader_config::{ReaderConfig, ToggleFace};
use crate::router::HashRouter;

pub struct Reader<P: Page> {
    page: P,
    config: ReaderConfig,
    nav: NavigationController<P::Node>,
    router: HashRouter,
    popover: FootnotePopover,
    menu: MenuDrawer,
    /// Last fragment this reader wrote. The browser echoes it back as a
    /// `hashchange`, which must not count as a second visit.
    pushed: Option<String>,
}

impl<P: Page> Reader<P> {
    /// `story` is only used by the interactive variant.
    pub fn new(page: P, config: ReaderConfig, story: Story) -> Self {
        let narrative = if config.variant.is_interactive() {
            Some(Narrative::start(story))
        } else {
            None
        };
        let nav = NavigationController::new(&page, &config, narrative);
        log::info!(
            "reader ready: {:?} variant, {} chapters",
            config.variant,
            nav.registry().len()
        );
        Self {
            router: HashRouter::new(&config.classes.chapter),
            popover: FootnotePopover::new(&config.classes.popup_footnote),
            menu: MenuDrawer::new(&config.ids),
            pushed: None,
            page,
            config,
            nav,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn mode(&self) -> DisplayMode {
        self.nav.mode()
    }

    pub fn chapter_count(&self) -> usize {
        self.nav.registry().len()
    }

    pub fn on_load(&mut self) -> Option<ChapterId> {
        match self.router.on_load(&mut self.page, &mut self.nav) {
            Ok(shown) => shown,
            Err(e) => {
                log::warn!("initial route: {}", e);
                None
            }
        }
    }

    pub fn on_hash_change(&mut self) -> Option<ChapterId> {
        let fragment = self.page.fragment();
        if self.pushed.as_deref() == Some(fragment.as_str()) {
            log::debug!("ignoring echo of pushed fragment #{}", fragment);
            return None;
        }
        self.pushed = None;
        match self.router.on_hash_change(&mut self.page, &mut self.nav) {
            Ok(shown) => shown,
            Err(e) => {
                log::warn!("route change: {}", e);
                None
            }
        }
    }

    pub fn show_chapter(&mut self, target: ChapterId, route: RoutePush) -> Result<ChapterId> {
        self.tracking_push(|r| r.nav.show_chapter(&mut r.page, target, route))
    }

    pub fn switch_all(&mut self) -> Result<DisplayMode> {
        self.tracking_push(|r| r.nav.switch_all(&mut r.page))
    }

    fn tracking_push<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let before = self.page.fragment();
        let out = f(self);
        let after = self.page.fragment();
        if after != before {
            self.pushed = Some(after);
        }
        out
    }

    /// Replaces the content of an output slot right away.
    pub fn write_result(&mut self, slot: &str, html: &str) {
        match self.page.element_by_id(slot) {
            Some(element) => self.page.set_inner_html(&element, html),
            None => log::warn!("no output slot #{}", slot),
        }
    }

    /// Re-reads the mode toggle after it was mounted into the page.
    pub fn refresh_mode_toggle(&mut self) {
        let id = self.config.ids.book_button.clone();
        self.nav.attach_mode_toggle(&self.page, &id);
    }

    pub fn toggle_face(&self) -> &ToggleFace {
        self.nav.face(self.nav.mode())
    }

    /// Runs a named action and returns its result without navigating.
    pub fn perform(&mut self, name: &str) -> Option<ChapterId> {
        match self.nav.narrative_mut() {
            Some(narrative) => narrative.perform(name),
            None => {
                log::debug!("action {} ignored: book is not interactive", name);
                None
            }
        }
    }

    /// Runs a named action and shows the chapter it returns, if any.
    pub fn follow_action(&mut self, name: &str) -> Result<Option<ChapterId>> {
        match self.perform(name) {
            Some(target) => self.show_chapter(target, RoutePush::Push).map(Some),
            None => Ok(None),
        }
    }

    pub fn passage_count(&self, id: ChapterId) -> usize {
        self.nav
            .narrative()
            .map(|n| n.state.passage_count(id))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> Option<NarrativeSnapshot> {
        self.nav.narrative().map(|n| n.state.snapshot())
    }

    pub fn register_action(&mut self, name: &str, action: Action) {
        if let Some(narrative) = self.nav.narrative_mut() {
            narrative.state.actions.insert(name, action);
        }
    }

    pub fn register_default_action(&mut self, name: &str, action: Action) {
        if let Some(narrative) = self.nav.narrative_mut() {
            narrative.dispatcher.defaults_mut().insert(name, action);
        }
    }

    pub fn register_initializer(&mut self, chapter: ChapterId, init: Initializer) {
        if let Some(narrative) = self.nav.narrative_mut() {
            narrative.set_initializer(chapter, init);
        }
    }

    pub fn show_footnote(&mut self, reference: &P::Node) {
        self.popover.show_footnote(&mut self.page, reference);
    }

    pub fn remove_footnotes(&mut self) {
        self.popover.remove_footnotes(&mut self.page);
    }

    pub fn footnote_references(&self) -> Vec<P::Node> {
        self.page
            .elements_by_class(&self.config.classes.footnote_reference)
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu.toggle(&mut self.page)
    }

    pub fn menu_open(&self) -> bool {
        self.menu.is_open()
    }
}
