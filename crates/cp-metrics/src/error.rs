//! Error type for the metrics engine.
//!
//! Only structural errors are checked, and always before any output is
//! built, so a failed operation leaves the input state untouched.
//! Arithmetic edge cases (zero tempo, zero-length items) are not
//! errors; they flow through as degenerate values.

use cp_ir::NoteLength;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum MetricsError {
    /// Two updates in one batch target the same item; intent is
    /// ambiguous, so last-writer-wins is not applied.
    #[error("duplicate duration update for item {index}")]
    DuplicateUpdate { index: usize },

    #[error("item index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("section index out of bounds: {index} >= {len}")]
    SectionOutOfBounds { index: usize, len: usize },

    #[error("item range {start}+{count} exceeds the {len} items in the song")]
    RangeOutOfBounds { start: usize, count: usize, len: usize },

    #[error("insertion point {section}:{item} does not exist")]
    BadInsertionPoint { section: usize, item: usize },

    #[error("no item at {instant_ms}ms (song spans {duration_ms}ms)")]
    TimeOutOfRange { instant_ms: f64, duration_ms: f64 },

    #[error("no item at position {position} (song spans {duration})")]
    PositionOutOfRange { position: NoteLength, duration: NoteLength },
}
