//! Error types for quire operations.
//!
//! Engine gestures (select, drag, drop, resize) never surface these across
//! their public boundary; they log and return `false`/`None` instead.
//! Loading configuration, catalogs and settings returns them directly.

use thiserror::Error;

/// Errors that can occur while loading configuration or preparing content.
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown element type: {0}")]
    UnknownElementType(String),

    #[error("Unsupported image data: {0}")]
    UnsupportedImage(String),

    #[error("Page index out of range: {0}")]
    PageOutOfRange(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
