// src/components/toolbar.rs
use std::rc::Rc;
use yew::prelude::*;

use crate::app::{self, with_reader, SharedReader};
use crate::navigation::DisplayMode;
use crate::page::Page;
use crate::reader::Reader;
use crate::reader_config::ToggleFace;

/// Shared reader passed down as a prop; equal when it is the same session.
#[derive(Clone)]
pub struct ReaderHandle(pub SharedReader);

impl PartialEq for ReaderHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Properties, PartialEq)]
pub struct ToolbarProps {
    pub reader: ReaderHandle,
}

/// What the toolbar shows, read back from the reader after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarState {
    pub mode: DisplayMode,
    pub menu_open: bool,
    pub face: ToggleFace,
}

impl ToolbarState {
    pub fn read<P: Page>(reader: &Reader<P>) -> Self {
        Self {
            mode: reader.mode(),
            menu_open: reader.menu_open(),
            face: reader.toggle_face().clone(),
        }
    }
}

pub enum ToolbarMsg {
    ToggleMenu,
    SwitchAll,
    /// The reader changed behind the toolbar's back (script exports).
    Refresh,
}

pub struct Toolbar {
    state: ToolbarState,
    book_button: String,
    show_menu: bool,
    show_toggle: bool,
}

impl Component for Toolbar {
    type Message = ToolbarMsg;
    type Properties = ToolbarProps;

    fn create(ctx: &Context<Self>) -> Self {
        app::register_toolbar(ctx.link().callback(|_| ToolbarMsg::Refresh));
        let reader = ctx.props().reader.0.borrow();
        let config = reader.config();
        Self {
            state: ToolbarState::read(&*reader),
            book_button: config.ids.book_button.clone(),
            show_menu: config.menu,
            show_toggle: config.variant.has_mode_toggle(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let reader = &ctx.props().reader.0;
        let read = match msg {
            ToolbarMsg::ToggleMenu => with_reader(reader, |r| {
                r.toggle_menu();
                ToolbarState::read(r)
            }),
            ToolbarMsg::SwitchAll => with_reader(reader, |r| {
                if let Err(e) = r.switch_all() {
                    log::warn!("switch display mode: {}", e);
                }
                ToolbarState::read(r)
            }),
            ToolbarMsg::Refresh => reader.try_borrow().ok().map(|r| ToolbarState::read(&*r)),
        };
        match read {
            Some(state) if state != self.state => {
                self.state = state;
                true
            }
            _ => false,
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let toggle_menu = ctx.link().callback(|_| ToolbarMsg::ToggleMenu);
        let switch_all = ctx.link().callback(|_| ToolbarMsg::SwitchAll);
        let state = &self.state;

        html! {
            <div class={classes!("reader-toolbar", (state.mode == DisplayMode::All).then_some("all-chapters"))}>
                if self.show_menu {
                    <button class={classes!("menu-button", state.menu_open.then_some("open"))} onclick={toggle_menu}>
                        { if state.menu_open { "✕" } else { "☰" } }
                    </button>
                }
                if self.show_toggle {
                    <img
                        id={self.book_button.clone()}
                        class="mode-toggle"
                        src={state.face.icon.clone()}
                        alt={state.face.label.clone()}
                        title={state.face.label.clone()}
                        onclick={switch_all}
                    />
                }
            </div>
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            // The controller only sees the toggle once it is in the DOM.
            with_reader(&ctx.props().reader.0, |r| r.refresh_mode_toggle());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::Story;
    use crate::page::MemoryPage;
    use crate::reader_config::ReaderConfig;

    #[test]
    fn test_state_follows_changes_made_outside_the_toolbar() {
        let page = MemoryPage::from_xhtml(
            r#"<body><img id="book-button"/><div id="chapter-0" class="chapter"/></body>"#,
        )
        .unwrap();
        let mut reader = Reader::new(page, ReaderConfig::default(), Story::default());
        let before = ToolbarState::read(&reader);
        assert_eq!(before.mode, DisplayMode::Single);
        assert!(!before.menu_open);
        assert_eq!(before.face.label, "Display the whole book");

        reader.toggle_menu();
        reader.switch_all().unwrap();

        let after = ToolbarState::read(&reader);
        assert_ne!(after, before);
        assert!(after.menu_open);
        assert_eq!(after.mode, DisplayMode::All);
        assert_eq!(after.face.label, "Display one chapter");
    }
}
