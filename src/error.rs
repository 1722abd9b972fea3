//! Error types for quire operations.

use thiserror::Error;

/// Errors that can occur while loading inputs or merging documents.
///
/// Failures scoped to one document or one root are reported as
/// [`Diagnostic`](crate::Diagnostic)s by the builder instead of being returned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOC: {0}")]
    InvalidToc(String),

    #[error("URL cannot be encoded as a page token: {0:?}")]
    UrlEncoding(String),

    #[error("Malformed markup at byte {position}: {message}")]
    MalformedMarkup { position: u64, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
