// ABOUTME: Error types for the stepdeck library
// ABOUTME: Provides structured error handling for deck building, reveal masks and rendering

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Invalid step mask: {0}")]
    MaskError(String),

    #[error("Step {step}: mask covers {actual} lines but the snippet has {expected}")]
    MaskLengthMismatch {
        step: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Step {step}: line {index} is out of range for a snippet of {line_count} lines")]
    LineOutOfRange {
        step: usize,
        index: i64,
        line_count: usize,
    },

    #[error("Invalid show specification {spec:?}: {reason}")]
    ShowSpecError { spec: String, reason: String },

    #[error("Unknown box id {0} in slide {1:?}")]
    UnknownBox(usize, String),

    #[error("Markdown error: {0}")]
    MarkdownError(String),

    #[error("Headless browser error: {message}")]
    BrowserError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to capture screenshot: {0}")]
    ScreenshotError(String),

    #[error("Image asset error for {path:?}: {message}")]
    ImageError { path: PathBuf, message: String },

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0:?}")]
    PathNotFoundError(PathBuf),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
