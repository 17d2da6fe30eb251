// src/lib.rs
//
// Client-side reader for books exported as a single HTML page: one chapter
// at a time, hash routing, footnote popups, a slide-in menu and optional
// interactive-fiction state.

pub mod app;
pub mod bindings;
pub mod chapter;
pub mod components;
pub mod error;
pub mod footnote;
pub mod menu;
pub mod narrative;
pub mod navigation;
pub mod page;
pub mod reader;
pub mod reader_config;
pub mod router;
pub mod utils;

pub use chapter::{ChapterId, ChapterRegistry};
pub use error::{ReaderError, Result};
pub use narrative::{Action, ActionTable, NarrativeState, Story};
pub use navigation::{DisplayMode, RoutePush};
pub use page::{MemoryPage, Page, WebPage};
pub use reader::Reader;
pub use reader_config::{ReaderConfig, ReaderVariant};
