// src/error.rs
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReaderError {
    #[error("Invalid reader configuration: {0}")]
    Config(String),
    #[error("Malformed book markup: {0}")]
    Markup(String),
    #[error("Chapter {id} is not part of this book ({count} chapters)")]
    UnknownChapter { id: usize, count: usize },
    #[error("No browser window available")]
    NoWindow,
    #[error("Window has no document")]
    NoDocument,
    #[error("Reader is already handling an event")]
    Busy,
}

impl From<serde_json::Error> for ReaderError {
    fn from(err: serde_json::Error) -> Self {
        ReaderError::Config(err.to_string())
    }
}

impl From<quick_xml::Error> for ReaderError {
    fn from(err: quick_xml::Error) -> Self {
        ReaderError::Markup(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
