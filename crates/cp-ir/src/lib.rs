//! Core document types for the chordpad editor.
//!
//! This crate defines the user-edited song document: sections of timed
//! chord items plus the musical context (key, tempo, time signature)
//! they are interpreted under. The metrics engine consumes these types
//! and derives absolute timing from them; nothing in here is derived.
//!
//! The document is only ever mutated through whole-field replacement —
//! every operation is a pure `&Song -> Song` function, and sections are
//! `Arc`-shared so unchanged parts of the document are carried over
//! structurally rather than copied.

mod context;
mod duration;
mod instrument;
pub mod song;

pub use context::{ContextOverrides, SongContext};
pub use duration::{
    beat_length, duration_to_measures, duration_to_ms, measure_length, measures_to_duration,
    ms_per_beat, NoteLength, TimeSignature, DOTTED_EIGHTH_NOTE, DOTTED_HALF_NOTE,
    DOTTED_QUARTER_NOTE, EIGHTH_NOTE, EIGHTH_NOTE_TRIPLET, HALF_NOTE, HALF_NOTE_TRIPLET,
    NOTE_DENOMINATOR, QUARTER_NOTE, QUARTER_NOTE_TRIPLET, SIXTEENTH_NOTE,
    SIXTEENTH_NOTE_TRIPLET, WHOLE_NOTE,
};
pub use instrument::{
    instrument_library, pattern_library, resolve_instruments, strum_delays, Instrument,
    InstrumentKind, PlayMode, Rhythm, RhythmOverride, DEFAULT_STRUM_DELAY,
};
pub use song::{InsertionIndex, SectionItem, Song, SongSection};
