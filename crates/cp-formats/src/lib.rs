//! Song document (de)serialization.
//!
//! The document store persists songs as JSON. Loading fails fast on
//! anything structurally invalid — unparseable JSON, missing fields,
//! negative durations — so the engine only ever sees well-formed
//! documents. Schema versioning is the storage layer's concern, not
//! handled here.

mod json_format;

pub use json_format::{load_song, save_song};

use thiserror::Error;

/// Error type for document parsing.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The payload is not valid JSON, or not a valid song document
    /// (unknown shape, wrong types, negative durations).
    #[error("malformed song document: {0}")]
    Malformed(#[from] serde_json::Error),
}
