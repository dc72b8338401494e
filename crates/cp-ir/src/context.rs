//! Musical context (key, tempo, time signature) and per-section overrides.

use serde::{Deserialize, Serialize};

use crate::duration::TimeSignature;

/// The musical context a run of items is interpreted under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongContext {
    /// Key name, e.g. "C major". Opaque to the timing engine.
    pub key: String,
    /// Tempo in beats per minute. Not validated; a zero or negative
    /// tempo yields degenerate (inf/NaN) millisecond metrics.
    pub bpm: f64,
    pub time_signature: TimeSignature,
    /// Swing amount for instrument rhythm playback. Ignored by metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_ratio: Option<f64>,
}

impl SongContext {
    /// Merge a section's overrides over this context, overrides winning
    /// per field. No validation: invalid values pass through.
    pub fn resolve(&self, overrides: &ContextOverrides) -> SongContext {
        SongContext {
            key: overrides.key.clone().unwrap_or_else(|| self.key.clone()),
            bpm: overrides.bpm.unwrap_or(self.bpm),
            time_signature: overrides.time_signature.unwrap_or(self.time_signature),
            swing_ratio: overrides.swing_ratio.or(self.swing_ratio),
        }
    }
}

impl Default for SongContext {
    fn default() -> Self {
        Self {
            key: String::from("C major"),
            bpm: 120.0,
            time_signature: TimeSignature::default(),
            swing_ratio: None,
        }
    }
}

/// Per-section overlay over the song's default context. A `None` field
/// defers to the default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_ratio: Option<f64>,
}

impl ContextOverrides {
    pub fn is_empty(&self) -> bool {
        self.key.is_none()
            && self.bpm.is_none()
            && self.time_signature.is_none()
            && self.swing_ratio.is_none()
    }

    /// Set or clear the key override. A value equal to the default
    /// context's clears the override instead of shadowing it.
    pub fn set_key(&mut self, default: &SongContext, key: Option<&str>) {
        self.key = key.filter(|k| *k != default.key).map(String::from);
    }

    /// Set or clear the tempo override. See [`ContextOverrides::set_key`].
    pub fn set_bpm(&mut self, default: &SongContext, bpm: Option<f64>) {
        self.bpm = bpm.filter(|b| *b != default.bpm);
    }

    /// Set or clear the time signature override. See [`ContextOverrides::set_key`].
    pub fn set_time_signature(
        &mut self,
        default: &SongContext,
        time_signature: Option<TimeSignature>,
    ) {
        self.time_signature = time_signature.filter(|ts| *ts != default.time_signature);
    }
}
