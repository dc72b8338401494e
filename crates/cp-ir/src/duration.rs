//! Symbolic note durations and their conversions.
//!
//! `NoteLength` measures musical time in 1/48ths of a whole note.
//! 48 is divisible by every practical subdivision (halves, quarters,
//! eighths, sixteenths, and their triplet and dotted variants), so all
//! duration arithmetic stays in exact integers; floating point only
//! appears once real time (milliseconds) is involved.

use serde::{Deserialize, Serialize};

/// A symbolic musical duration, in 1/48ths of a whole note.
pub type NoteLength = u64;

/// Subdivisions per whole note. Divisible by 2, 3, 4, 6, 8, 12, 16, 24.
pub const NOTE_DENOMINATOR: NoteLength = 48;

pub const WHOLE_NOTE: NoteLength = NOTE_DENOMINATOR;
pub const HALF_NOTE: NoteLength = NOTE_DENOMINATOR / 2;
pub const DOTTED_HALF_NOTE: NoteLength = HALF_NOTE * 3 / 2;
pub const HALF_NOTE_TRIPLET: NoteLength = NOTE_DENOMINATOR / 3;
pub const QUARTER_NOTE: NoteLength = NOTE_DENOMINATOR / 4;
pub const DOTTED_QUARTER_NOTE: NoteLength = QUARTER_NOTE * 3 / 2;
pub const QUARTER_NOTE_TRIPLET: NoteLength = NOTE_DENOMINATOR / 6;
pub const EIGHTH_NOTE: NoteLength = NOTE_DENOMINATOR / 8;
pub const DOTTED_EIGHTH_NOTE: NoteLength = EIGHTH_NOTE * 3 / 2;
pub const EIGHTH_NOTE_TRIPLET: NoteLength = NOTE_DENOMINATOR / 12;
pub const SIXTEENTH_NOTE: NoteLength = NOTE_DENOMINATOR / 16;
pub const SIXTEENTH_NOTE_TRIPLET: NoteLength = NOTE_DENOMINATOR / 24;

/// A time signature, e.g. 4/4 or 6/8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per measure (the numerator)
    pub per_measure: u32,
    /// Which note value is one beat, as its denominator: 4 = quarter, 8 = eighth
    pub note_value: u32,
}

impl TimeSignature {
    pub const fn new(per_measure: u32, note_value: u32) -> Self {
        Self { per_measure, note_value }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

/// Length of one measure in `NoteLength` units:
/// `NOTE_DENOMINATOR * per_measure / note_value`.
///
/// Returns `None` when the division is inexact (e.g. 7/32 against a
/// 48-unit whole note) rather than truncating; millisecond conversion
/// does not go through this and handles any signature.
pub fn measure_length(time_signature: &TimeSignature) -> Option<NoteLength> {
    let units = NOTE_DENOMINATOR * time_signature.per_measure as NoteLength;
    let note_value = time_signature.note_value as NoteLength;
    if note_value == 0 || units % note_value != 0 {
        return None;
    }
    Some(units / note_value)
}

/// Length of one beat in `NoteLength` units: `NOTE_DENOMINATOR / note_value`.
///
/// Same exactness policy as [`measure_length`].
pub fn beat_length(time_signature: &TimeSignature) -> Option<NoteLength> {
    let note_value = time_signature.note_value as NoteLength;
    if note_value == 0 || NOTE_DENOMINATOR % note_value != 0 {
        return None;
    }
    Some(NOTE_DENOMINATOR / note_value)
}

/// Milliseconds per beat at the given tempo.
pub fn ms_per_beat(bpm: f64) -> f64 {
    60_000.0 / bpm
}

/// Convert a symbolic duration to milliseconds under a tempo and time
/// signature.
///
/// The duration is measured in beats (`duration / beat_length`) and each
/// beat lasts `60000 / bpm` ms. Computed in `f64` so exotic signatures
/// still convert; degenerate tempos (zero, negative) propagate as
/// inf/NaN rather than being validated here.
pub fn duration_to_ms(duration: NoteLength, bpm: f64, time_signature: &TimeSignature) -> f64 {
    let beats =
        duration as f64 * time_signature.note_value as f64 / NOTE_DENOMINATOR as f64;
    beats * ms_per_beat(bpm)
}

/// Convert a whole number of measures to a symbolic duration.
///
/// `None` when one measure is not a whole number of units.
pub fn measures_to_duration(
    measures: u64,
    time_signature: &TimeSignature,
) -> Option<NoteLength> {
    measure_length(time_signature).map(|m| m * measures)
}

/// How many measures a symbolic duration spans. May be fractional.
pub fn duration_to_measures(duration: NoteLength, time_signature: &TimeSignature) -> f64 {
    duration as f64 * time_signature.note_value as f64
        / (NOTE_DENOMINATOR as f64 * time_signature.per_measure as f64)
}
