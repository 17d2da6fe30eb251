// src/chapter.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ReaderError, Result};
use crate::page::Page;

/// Prefix shared by chapter container ids and address fragments (`#chapter-3`).
pub const CHAPTER_ID_PREFIX: &str = "chapter-";

/// Zero-based position of a chapter in document order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChapterId(pub usize);

impl ChapterId {
    pub const FIRST: ChapterId = ChapterId(0);

    /// Element id / fragment body for this chapter, without the leading `#`.
    pub fn anchor(self) -> String {
        format!("{}{}", CHAPTER_ID_PREFIX, self.0)
    }

    /// Parses the numeric suffix of a chapter element id. Anything that is not
    /// `chapter-<integer>` falls back to the first chapter.
    pub fn from_element_id(id: &str) -> ChapterId {
        id.strip_prefix(CHAPTER_ID_PREFIX)
            .and_then(|suffix| suffix.trim().parse::<usize>().ok())
            .map(ChapterId)
            .unwrap_or(ChapterId::FIRST)
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.anchor())
    }
}

impl From<usize> for ChapterId {
    fn from(n: usize) -> Self {
        ChapterId(n)
    }
}

/// A chapter container and the navigation controls that belong to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter<N> {
    pub id: ChapterId,
    pub container: N,
}

/// Chapters and chapter controls, enumerated once from the rendered document.
///
/// Controls appear in document order, so the "previous" control of chapter `c`
/// sits at position `2c - 1` and its "next" control at `2c`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterRegistry<N> {
    chapters: Vec<Chapter<N>>,
    controls: Vec<N>,
}

impl<N: Clone + PartialEq> ChapterRegistry<N> {
    pub fn new(containers: Vec<N>, controls: Vec<N>) -> Self {
        let chapters = containers
            .into_iter()
            .enumerate()
            .map(|(i, container)| Chapter {
                id: ChapterId(i),
                container,
            })
            .collect();
        Self { chapters, controls }
    }

    pub fn scan<P>(page: &P, chapter_class: &str, controls_class: &str) -> Self
    where
        P: Page<Node = N>,
    {
        let registry = Self::new(
            page.elements_by_class(chapter_class),
            page.elements_by_class(controls_class),
        );
        log::debug!(
            "registered {} chapters and {} chapter controls",
            registry.len(),
            registry.controls.len()
        );
        registry
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn contains(&self, id: ChapterId) -> bool {
        id.0 < self.chapters.len()
    }

    pub fn check(&self, id: ChapterId) -> Result<ChapterId> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(ReaderError::UnknownChapter {
                id: id.0,
                count: self.len(),
            })
        }
    }

    pub fn get(&self, id: ChapterId) -> Option<&Chapter<N>> {
        self.chapters.get(id.0)
    }

    pub fn chapters(&self) -> impl Iterator<Item = &Chapter<N>> {
        self.chapters.iter()
    }

    pub fn controls(&self) -> impl Iterator<Item = &N> {
        self.controls.iter()
    }

    /// Whether the control at `position` belongs to chapter `id`.
    pub fn control_belongs_to(position: usize, id: ChapterId) -> bool {
        let last = id.0 * 2;
        let first = last.saturating_sub(1);
        (first..=last).contains(&position)
    }
}
