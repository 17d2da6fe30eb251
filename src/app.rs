// src/app.rs
//
// Browser wiring: one shared Reader, event listeners that drive it, and the
// optional yew toolbar.

use gloo::events::EventListener;
use yew::Callback;
use std::cell::RefCell;
use std::rc::Rc;

use crate::bindings;
use crate::components::toolbar::{ReaderHandle, Toolbar, ToolbarProps};
use crate::error::{ReaderError, Result};
use crate::page::WebPage;
use crate::reader::Reader;
use crate::reader_config::ReaderConfig;

pub type SharedReader = Rc<RefCell<Reader<WebPage>>>;

thread_local! {
    static LISTENERS: RefCell<Vec<EventListener>> = RefCell::new(Vec::new());
    static TOOLBAR: RefCell<Option<Callback<()>>> = RefCell::new(None);
}

pub(crate) fn register_toolbar(refresh: Callback<()>) {
    TOOLBAR.with(|slot| *slot.borrow_mut() = Some(refresh));
}

/// Tells the toolbar to re-read the reader. Call with the reader released.
pub(crate) fn refresh_toolbar() {
    let refresh = TOOLBAR.with(|slot| slot.borrow().clone());
    if let Some(refresh) = refresh {
        refresh.emit(());
    }
}

/// Runs `f` against the reader unless another handler is already inside it
/// (e.g. a story script calling back into the reader from an action).
pub fn with_reader<R>(reader: &SharedReader, f: impl FnOnce(&mut Reader<WebPage>) -> R) -> Option<R> {
    match reader.try_borrow_mut() {
        Ok(mut reader) => Some(f(&mut reader)),
        Err(_) => {
            log::warn!("{}", ReaderError::Busy);
            None
        }
    }
}

pub fn boot() -> Result<()> {
    let page = WebPage::new()?;
    let config = ReaderConfig::from_page(&page);
    let window = page.window().clone();
    let document = page.document().clone();
    let story = bindings::take_pending_story();
    let reader: SharedReader = Rc::new(RefCell::new(Reader::new(page, config.clone(), story)));

    let mut listeners = Vec::new();

    {
        let reader = reader.clone();
        listeners.push(EventListener::new(&window, "hashchange", move |_| {
            with_reader(&reader, |r| r.on_hash_change());
        }));
    }

    let references = reader.borrow().footnote_references();
    for reference in references {
        let enter = {
            let reader = reader.clone();
            let target = reference.clone();
            EventListener::new(&reference, "mouseenter", move |_| {
                with_reader(&reader, |r| r.show_footnote(&target));
            })
        };
        let leave = {
            let reader = reader.clone();
            EventListener::new(&reference, "mouseleave", move |_| {
                with_reader(&reader, |r| r.remove_footnotes());
            })
        };
        listeners.push(enter);
        listeners.push(leave);
    }

    if config.variant.is_interactive() {
        let links = reader.borrow().page().select_all("[data-action]");
        for link in links {
            let name = link.get_attribute("data-action").unwrap_or_default();
            let reader = reader.clone();
            listeners.push(EventListener::new(&link, "click", move |event| {
                event.prevent_default();
                if let Some(Err(e)) = with_reader(&reader, |r| r.follow_action(&name)) {
                    log::warn!("action {}: {}", name, e);
                }
            }));
        }
    }

    if let Some(host) = document.get_element_by_id(&config.ids.toolbar) {
        yew::Renderer::<Toolbar>::with_root_and_props(
            host,
            ToolbarProps {
                reader: ReaderHandle(reader.clone()),
            },
        )
        .render();
    }

    log::info!("bound {} listeners", listeners.len());
    LISTENERS.with(|slot| slot.borrow_mut().extend(listeners));

    bindings::install(reader.clone());
    with_reader(&reader, |r| r.on_load());
    Ok(())
}
