//! Backing-track instruments and their rhythm patterns.
//!
//! An instrument plays its rhythm pattern under every chord item; a
//! section can tweak or disable individual instruments via overrides.
//! Chord spelling (which notes a chord name contains) is a music-theory
//! concern and lives outside this crate.

use std::collections::BTreeMap;

use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};

use crate::context::SongContext;
use crate::duration::{duration_to_ms, NoteLength, EIGHTH_NOTE, QUARTER_NOTE, WHOLE_NOTE};

/// Strum delay, as a fraction of a quarter note, when an instrument
/// doesn't configure its own.
pub const DEFAULT_STRUM_DELAY: f64 = 0.5;

/// A rhythm pulse pattern: one character per `note_value` slot, `'x'`
/// marking slots that sound, repeating for as long as the item lasts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rhythm {
    /// Length of one pattern slot
    pub note_value: NoteLength,
    /// e.g. "x", "x..x", "..x."
    pub pattern: ArrayString<32>,
}

impl Rhythm {
    /// Create a rhythm; patterns longer than the backing store are
    /// truncated.
    pub fn new(note_value: NoteLength, pattern: &str) -> Self {
        let mut stored = ArrayString::new();
        let _ = stored.try_push_str(pattern);
        Self { note_value, pattern: stored }
    }

    /// Which pattern slots sound.
    pub fn pulses(&self) -> impl Iterator<Item = bool> + '_ {
        self.pattern.chars().map(|c| c == 'x')
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Drum,
    Guitar,
    Piano,
}

/// How an instrument renders the current chord.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Full chord voicing
    Chord,
    /// Root note only
    Root,
    /// Bass register root
    Bass,
    /// Arpeggiated, following `arp_pattern`
    Arp,
    /// Unpitched
    Drum,
}

/// A backing-track instrument definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub kind: InstrumentKind,
    pub play_mode: PlayMode,
    pub pattern: Rhythm,
    /// Sounding length of each pulse, as a fraction of a quarter note
    pub note_length: f64,
    /// Strum stagger as a fraction of a quarter note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strum_delay: Option<f64>,
    /// Strum directions, e.g. "DUUD"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strum_pattern: Option<ArrayString<8>>,
    /// Arpeggio voice order, e.g. "123436"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp_pattern: Option<ArrayString<8>>,
    /// Soundfont patch number
    pub patch_number: u16,
    pub muted: bool,
    pub volume: f64,
}

/// Per-section tweaks for one instrument.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RhythmOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Rhythm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

fn small(pattern: &str) -> ArrayString<8> {
    let mut stored = ArrayString::new();
    let _ = stored.try_push_str(pattern);
    stored
}

/// The named rhythm presets offered by the pattern picker.
pub fn pattern_library() -> Vec<(&'static str, Rhythm)> {
    vec![
        ("whole", Rhythm::new(WHOLE_NOTE, "x")),
        ("half", Rhythm::new(WHOLE_NOTE / 2, "x")),
        ("quarter", Rhythm::new(QUARTER_NOTE, "x")),
        ("three", Rhythm::new(QUARTER_NOTE, "..x.")),
        ("eighth", Rhythm::new(EIGHTH_NOTE, "x")),
        ("heartbeat", Rhythm::new(EIGHTH_NOTE, "x..x")),
    ]
}

fn preset(name: &str) -> Rhythm {
    pattern_library()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, r)| r)
        .unwrap_or_else(|| Rhythm::new(QUARTER_NOTE, "x"))
}

/// The stock instruments a new song starts with.
pub fn instrument_library() -> Vec<Instrument> {
    vec![
        Instrument {
            name: String::from("Kick"),
            kind: InstrumentKind::Drum,
            play_mode: PlayMode::Drum,
            pattern: preset("whole"),
            note_length: 0.0,
            strum_delay: None,
            strum_pattern: None,
            arp_pattern: None,
            patch_number: 1,
            muted: false,
            volume: 0.3,
        },
        Instrument {
            name: String::from("Snare"),
            kind: InstrumentKind::Drum,
            play_mode: PlayMode::Drum,
            pattern: preset("three"),
            note_length: 0.0,
            strum_delay: None,
            strum_pattern: None,
            arp_pattern: None,
            patch_number: 17,
            muted: false,
            volume: 0.3,
        },
        Instrument {
            name: String::from("Electric Bass"),
            kind: InstrumentKind::Guitar,
            play_mode: PlayMode::Bass,
            pattern: preset("heartbeat"),
            note_length: 0.2,
            strum_delay: None,
            strum_pattern: None,
            arp_pattern: None,
            patch_number: 379,
            muted: false,
            volume: 0.5,
        },
        Instrument {
            name: String::from("Acoustic Guitar"),
            kind: InstrumentKind::Guitar,
            play_mode: PlayMode::Chord,
            pattern: preset("quarter"),
            note_length: 0.4,
            strum_delay: Some(0.2),
            strum_pattern: Some(small("DUUD")),
            arp_pattern: None,
            patch_number: 265,
            muted: false,
            volume: 0.5,
        },
        Instrument {
            name: String::from("Grand Piano"),
            kind: InstrumentKind::Piano,
            play_mode: PlayMode::Chord,
            pattern: preset("quarter"),
            note_length: 0.4,
            strum_delay: Some(0.3),
            strum_pattern: Some(small("U")),
            arp_pattern: None,
            patch_number: 15,
            muted: false,
            volume: 0.5,
        },
        Instrument {
            name: String::from("Arp Synth"),
            kind: InstrumentKind::Piano,
            play_mode: PlayMode::Arp,
            pattern: preset("eighth"),
            note_length: 0.2,
            strum_delay: None,
            strum_pattern: None,
            arp_pattern: Some(small("123436")),
            patch_number: 926,
            muted: false,
            volume: 0.5,
        },
    ]
}

/// Merge a section's instrument overrides over the song's instruments.
/// A `None` override disables the instrument for that section.
pub fn resolve_instruments(
    instruments: &[Instrument],
    overrides: &BTreeMap<String, Option<RhythmOverride>>,
) -> Vec<Instrument> {
    instruments
        .iter()
        .filter_map(|instrument| match overrides.get(&instrument.name) {
            None => Some(instrument.clone()),
            Some(None) => None,
            Some(Some(over)) => {
                let mut resolved = instrument.clone();
                if let Some(pattern) = &over.pattern {
                    resolved.pattern = pattern.clone();
                }
                if let Some(muted) = over.muted {
                    resolved.muted = muted;
                }
                if let Some(volume) = over.volume {
                    resolved.volume = volume;
                }
                Some(resolved)
            }
        })
        .collect()
}

/// Per-voice onset delays for a strummed chord of `voices` notes.
///
/// The configured stagger is capped so the full strum never crosses
/// into the next item.
pub fn strum_delays(
    voices: usize,
    instrument: &Instrument,
    duration_to_next: NoteLength,
    context: &SongContext,
) -> Vec<f64> {
    if voices == 0 {
        return Vec::new();
    }
    let quarter_ms = duration_to_ms(QUARTER_NOTE, context.bpm, &context.time_signature);
    let configured = instrument.strum_delay.unwrap_or(DEFAULT_STRUM_DELAY) * quarter_ms;
    let max_delay =
        duration_to_ms(duration_to_next, context.bpm, &context.time_signature) / voices as f64;
    let delay = configured.min(max_delay);
    (0..voices).map(|i| i as f64 * delay).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rhythm_pulses() {
        let rhythm = Rhythm::new(EIGHTH_NOTE, "x..x");
        let pulses: Vec<bool> = rhythm.pulses().collect();
        assert_eq!(pulses, vec![true, false, false, true]);
    }

    #[test]
    fn library_has_stock_instruments() {
        let library = instrument_library();
        assert_eq!(library.len(), 6);
        assert!(library.iter().any(|i| i.name == "Kick"));
        assert!(library.iter().any(|i| i.name == "Grand Piano"));
    }

    #[test]
    fn resolve_passes_through_without_overrides() {
        let library = instrument_library();
        let resolved = resolve_instruments(&library, &BTreeMap::new());
        assert_eq!(resolved, library);
    }

    #[test]
    fn resolve_disables_on_null_override() {
        let library = instrument_library();
        let mut overrides = BTreeMap::new();
        overrides.insert(String::from("Kick"), None);
        let resolved = resolve_instruments(&library, &overrides);
        assert_eq!(resolved.len(), library.len() - 1);
        assert!(!resolved.iter().any(|i| i.name == "Kick"));
    }

    #[test]
    fn resolve_applies_partial_override() {
        let library = instrument_library();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            String::from("Snare"),
            Some(RhythmOverride { muted: Some(true), ..Default::default() }),
        );
        let resolved = resolve_instruments(&library, &overrides);
        let snare = resolved.iter().find(|i| i.name == "Snare").unwrap();
        assert!(snare.muted);
        // untouched fields survive
        assert_eq!(snare.patch_number, 17);
    }

    #[test]
    fn strum_stays_within_the_item() {
        let context = SongContext::default(); // 120 bpm, 4/4: quarter = 500ms
        let guitar = instrument_library()
            .into_iter()
            .find(|i| i.name == "Acoustic Guitar")
            .unwrap();

        // Plenty of room: configured delay (0.2 * 500 = 100ms) applies.
        let delays = strum_delays(4, &guitar, WHOLE_NOTE, &context);
        assert_eq!(delays, vec![0.0, 100.0, 200.0, 300.0]);

        // Tight: a sixteenth (125ms) across 4 voices caps at 31.25ms.
        let delays = strum_delays(4, &guitar, crate::duration::SIXTEENTH_NOTE, &context);
        assert_eq!(delays[1], 125.0 / 4.0);
    }
}
