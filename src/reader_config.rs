// src/reader_config.rs
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::page::Page;

/// Id of the `<script type="application/json">` element holding the config.
pub const CONFIG_ELEMENT_ID: &str = "reader-config";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderVariant {
    /// One chapter at a time, nothing else.
    Static,
    /// Paged or full-book reading with a table of contents.
    Single,
    /// `Single` plus narrative state and actions.
    Interactive,
}

impl Default for ReaderVariant {
    fn default() -> Self {
        ReaderVariant::Single
    }
}

impl ReaderVariant {
    pub fn manages_toc(self) -> bool {
        !matches!(self, ReaderVariant::Static)
    }

    pub fn has_mode_toggle(self) -> bool {
        !matches!(self, ReaderVariant::Static)
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, ReaderVariant::Interactive)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    pub chapter: String,
    pub chapter_controls: String,
    pub footnote_reference: String,
    pub popup_footnote: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            chapter: String::from("chapter"),
            chapter_controls: String::from("chapterControls"),
            footnote_reference: String::from("footnote_reference"),
            popup_footnote: String::from("popup_footnote"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub toc: String,
    pub book_button: String,
    pub nav: String,
    pub content: String,
    pub menu: String,
    pub toolbar: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            toc: String::from("toc"),
            book_button: String::from("book-button"),
            nav: String::from("nav"),
            content: String::from("content"),
            menu: String::from("menu"),
            toolbar: String::from("reader-toolbar"),
        }
    }
}

/// What the mode-toggle affordance shows: an icon plus its alt/title label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleFace {
    pub icon: String,
    pub label: String,
}

impl ToggleFace {
    pub fn new(icon: &str, label: &str) -> Self {
        Self {
            icon: icon.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleFaces {
    /// Shown while reading one chapter at a time.
    pub show_all: ToggleFace,
    /// Shown while the whole book is displayed.
    pub show_one: ToggleFace,
}

impl Default for ToggleFaces {
    fn default() -> Self {
        Self {
            show_all: ToggleFace::new("icons/book.svg", "Display the whole book"),
            show_one: ToggleFace::new("icons/pages.svg", "Display one chapter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub variant: ReaderVariant,
    pub classes: ClassNames,
    pub ids: ElementIds,
    pub toggle: ToggleFaces,
    pub base_path: String,
    pub menu: bool,
}

impl ReaderConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads the embedded config element; absent or malformed config falls back
    /// to defaults.
    pub fn from_page<P: Page>(page: &P) -> Self {
        let Some(element) = page.element_by_id(CONFIG_ELEMENT_ID) else {
            log::info!("No #{} element, using default reader config", CONFIG_ELEMENT_ID);
            return Self::default();
        };
        match Self::from_json(&page.inner_html(&element)) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using default reader config", e);
                Self::default()
            }
        }
    }
}
