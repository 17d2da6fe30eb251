// src/navigation.rs
//
// Chapter visibility and the SINGLE/ALL display mode.

use crate::chapter::{ChapterId, ChapterRegistry};
use crate::error::Result;
use crate::narrative::Narrative;
use crate::page::{Display, Page};
use crate::reader_config::{ReaderConfig, ToggleFace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Single,
    All,
}

/// Whether a transition writes the address fragment. Transitions triggered by
/// the fragment itself must pass `Suppress` so they do not echo back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePush {
    Push,
    Suppress,
}

pub struct NavigationController<N> {
    registry: ChapterRegistry<N>,
    mode: DisplayMode,
    toc: Option<N>,
    mode_toggle: Option<N>,
    manage_toc: bool,
    show_all_face: ToggleFace,
    show_one_face: ToggleFace,
    narrative: Option<Narrative>,
}

impl<N: Clone + PartialEq> NavigationController<N> {
    pub fn new<P>(page: &P, config: &ReaderConfig, narrative: Option<Narrative>) -> Self
    where
        P: Page<Node = N>,
    {
        let registry = ChapterRegistry::scan(
            page,
            &config.classes.chapter,
            &config.classes.chapter_controls,
        );
        let toc = page.element_by_id(&config.ids.toc);
        let mode_toggle = page.element_by_id(&config.ids.book_button);
        Self {
            registry,
            mode: DisplayMode::Single,
            toc,
            mode_toggle,
            manage_toc: config.variant.manages_toc(),
            show_all_face: face_with_base(&config.toggle.show_all, &config.base_path),
            show_one_face: face_with_base(&config.toggle.show_one, &config.base_path),
            narrative,
        }
    }

    pub fn registry(&self) -> &ChapterRegistry<N> {
        &self.registry
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn narrative(&self) -> Option<&Narrative> {
        self.narrative.as_ref()
    }

    pub fn narrative_mut(&mut self) -> Option<&mut Narrative> {
        self.narrative.as_mut()
    }

    /// Re-reads the mode toggle element, for affordances mounted after startup.
    pub fn attach_mode_toggle<P: Page<Node = N>>(&mut self, page: &P, id: &str) {
        self.mode_toggle = page.element_by_id(id);
    }

    /// Shows `target` and returns the chapter actually displayed, which differs
    /// when an interactive initializer redirects.
    pub fn show_chapter<P>(
        &mut self,
        page: &mut P,
        target: ChapterId,
        route: RoutePush,
    ) -> Result<ChapterId>
    where
        P: Page<Node = N>,
    {
        let mut target = self.registry.check(target)?;

        if let Some(narrative) = self.narrative.as_mut() {
            let mut hops = 0;
            while let Some(next) = narrative.enter(target) {
                if next == target || !self.registry.contains(next) {
                    break;
                }
                hops += 1;
                if hops > self.registry.len() {
                    log::warn!("initializer redirect loop at {}, staying there", target);
                    break;
                }
                log::debug!("initializer of {} redirects to {}", target, next);
                target = next;
            }
            for (slot, html) in narrative.state.take_results() {
                match page.element_by_id(&slot) {
                    Some(element) => page.set_inner_html(&element, &html),
                    None => log::warn!("no output slot #{}", slot),
                }
            }
        }

        if self.mode == DisplayMode::Single {
            for chapter in self.registry.chapters() {
                let display = if chapter.id == target {
                    Display::Block
                } else {
                    Display::None
                };
                page.set_display(&chapter.container, display);
            }
            for (position, control) in self.registry.controls().enumerate() {
                let display = if ChapterRegistry::<N>::control_belongs_to(position, target) {
                    Display::Block
                } else {
                    Display::None
                };
                page.set_display(control, display);
            }
            if self.manage_toc {
                if let Some(toc) = &self.toc {
                    let display = if target == ChapterId::FIRST {
                        Display::Block
                    } else {
                        Display::None
                    };
                    page.set_display(toc, display);
                }
            }
        }

        if route == RoutePush::Push {
            page.set_fragment(&target.anchor());
        }
        log::debug!("showing {} ({:?}, {:?})", target, self.mode, route);
        Ok(target)
    }

    /// Flips between one chapter and the whole book. Leaving ALL always lands
    /// on the first chapter.
    pub fn switch_all<P>(&mut self, page: &mut P) -> Result<DisplayMode>
    where
        P: Page<Node = N>,
    {
        match self.mode {
            DisplayMode::Single => {
                self.mode = DisplayMode::All;
                for chapter in self.registry.chapters() {
                    page.set_display(&chapter.container, Display::Block);
                }
                for control in self.registry.controls() {
                    page.set_display(control, Display::None);
                }
                if let Some(toc) = &self.toc {
                    page.set_display(toc, Display::Block);
                }
                self.apply_face(page, DisplayMode::All);
            }
            DisplayMode::All => {
                self.mode = DisplayMode::Single;
                if !self.registry.is_empty() {
                    self.show_chapter(page, ChapterId::FIRST, RoutePush::Push)?;
                }
                self.apply_face(page, DisplayMode::Single);
            }
        }
        log::info!("display mode is now {:?}", self.mode);
        Ok(self.mode)
    }

    pub fn face(&self, mode: DisplayMode) -> &ToggleFace {
        match mode {
            DisplayMode::Single => &self.show_all_face,
            DisplayMode::All => &self.show_one_face,
        }
    }

    fn apply_face<P: Page<Node = N>>(&self, page: &mut P, mode: DisplayMode) {
        let Some(toggle) = &self.mode_toggle else {
            return;
        };
        let face = self.face(mode);
        page.set_attribute(toggle, "src", &face.icon);
        page.set_attribute(toggle, "alt", &face.label);
        page.set_attribute(toggle, "title", &face.label);
    }
}

fn face_with_base(face: &ToggleFace, base: &str) -> ToggleFace {
    ToggleFace {
        icon: crate::utils::resource_url(base, &face.icon),
        label: face.label.clone(),
    }
}
