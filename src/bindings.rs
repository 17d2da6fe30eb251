// src/bindings.rs
//
// Functions exported to the page's own scripts. A story registers its actions
// and chapter initializers here, before or after the reader has booted.

use gloo_utils::format::JsValueSerdeExt;
use js_sys::Function;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::app::{refresh_toolbar, with_reader, SharedReader};
use crate::chapter::ChapterId;
use crate::narrative::{Action, Handler, NarrativeState, ScriptEdits, ScriptScope, Story};
use crate::navigation::RoutePush;

thread_local! {
    static READER: RefCell<Option<SharedReader>> = RefCell::new(None);
    static PENDING: RefCell<Story> = RefCell::new(Story::default());
    /// Set while a story handler runs, when the reader itself is borrowed.
    static SCOPE: RefCell<Option<ScriptScope>> = RefCell::new(None);
}

pub(crate) fn install(reader: SharedReader) {
    READER.with(|slot| *slot.borrow_mut() = Some(reader));
}

/// Story pieces registered before boot.
pub(crate) fn take_pending_story() -> Story {
    PENDING.with(|pending| pending.take())
}

fn installed() -> Option<SharedReader> {
    READER.with(|slot| slot.borrow().clone())
}

/// Wraps a JS function. It receives the narrative state as a plain object and
/// may return a chapter number to navigate to. Changes it makes to
/// `variables` on that object are kept. While it runs, `passageCount` and
/// `writeResult` are served from a scope instead of the busy reader.
fn js_handler(function: Function) -> Handler {
    Rc::new(move |state: &mut NarrativeState| {
        let argument = match JsValue::from_serde(&state.snapshot()) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("could not serialize narrative state: {}", e);
                JsValue::NULL
            }
        };
        let outer = SCOPE.with(|slot| slot.replace(Some(ScriptScope::open(state))));
        let returned = function.call1(&JsValue::NULL, &argument);
        let scope = SCOPE.with(|slot| slot.replace(outer));

        let edits = match argument.into_serde::<ScriptEdits>() {
            Ok(edits) => Some(edits),
            Err(e) => {
                log::warn!("story handler left unreadable state: {}", e);
                None
            }
        };
        if let Some(scope) = scope {
            scope.close(state, edits);
        }

        match returned {
            Ok(result) => result
                .as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| ChapterId(n as usize)),
            Err(e) => {
                log::error!("story handler threw: {:?}", e);
                None
            }
        }
    })
}

fn in_scope<R>(f: impl FnOnce(&mut ScriptScope) -> R) -> Option<R> {
    SCOPE.with(|slot| slot.borrow_mut().as_mut().map(f))
}

#[wasm_bindgen(js_name = registerAction)]
pub fn register_action(name: String, handler: Function) {
    let action = Action::Handler(js_handler(handler));
    match installed() {
        Some(reader) => {
            with_reader(&reader, |r| r.register_action(&name, action));
        }
        None => PENDING.with(|pending| {
            pending.borrow_mut().actions.insert(name, action);
        }),
    }
}

#[wasm_bindgen(js_name = registerInitializer)]
pub fn register_initializer(chapter: usize, handler: Function) {
    let init = js_handler(handler);
    match installed() {
        Some(reader) => {
            with_reader(&reader, |r| r.register_initializer(ChapterId(chapter), init));
        }
        None => PENDING.with(|pending| {
            pending
                .borrow_mut()
                .set_initializer(ChapterId(chapter), move |state| init(state));
        }),
    }
}

/// Returns the chapter the action asks for, or `undefined`.
#[wasm_bindgen(js_name = performAction)]
pub fn perform_action(name: &str) -> JsValue {
    installed()
        .and_then(|reader| with_reader(&reader, |r| r.perform(name)))
        .flatten()
        .map(|id| JsValue::from_f64(id.0 as f64))
        .unwrap_or(JsValue::UNDEFINED)
}

#[wasm_bindgen(js_name = passageCount)]
pub fn passage_count(chapter: usize) -> usize {
    if let Some(count) = in_scope(|scope| scope.passage_count(ChapterId(chapter))) {
        return count;
    }
    installed()
        .and_then(|reader| with_reader(&reader, |r| r.passage_count(ChapterId(chapter))))
        .unwrap_or(0)
}

/// Fills a `result_<n>` style slot. Inside a handler the write lands when the
/// transition that ran it finishes.
#[wasm_bindgen(js_name = writeResult)]
pub fn write_result(slot: String, html: String) {
    if in_scope(|scope| scope.write_result(slot.clone(), html.clone())).is_some() {
        return;
    }
    if let Some(reader) = installed() {
        with_reader(&reader, |r| r.write_result(&slot, &html));
    }
}

#[wasm_bindgen(js_name = showChapter)]
pub fn show_chapter(chapter: usize, noreset: Option<bool>) {
    let route = if noreset.unwrap_or(false) {
        RoutePush::Suppress
    } else {
        RoutePush::Push
    };
    let Some(reader) = installed() else {
        log::warn!("showChapter({}) called before the reader started", chapter);
        return;
    };
    if let Some(Err(e)) = with_reader(&reader, |r| r.show_chapter(ChapterId(chapter), route)) {
        log::warn!("showChapter: {}", e);
    }
    refresh_toolbar();
}

#[wasm_bindgen(js_name = switchAll)]
pub fn switch_all() {
    if let Some(reader) = installed() {
        if let Some(Err(e)) = with_reader(&reader, |r| r.switch_all()) {
            log::warn!("switchAll: {}", e);
        }
    }
    refresh_toolbar();
}

#[wasm_bindgen(js_name = toggleMenu)]
pub fn toggle_menu() -> bool {
    let open = installed()
        .and_then(|reader| with_reader(&reader, |r| r.toggle_menu()))
        .unwrap_or(false);
    refresh_toolbar();
    open
}
