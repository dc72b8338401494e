//! Song structure: ordered sections of timed chord items.
//!
//! The document is edited through pure replacement operations — every
//! mutator returns a new `Song` and never aliases mutable state with
//! the old one. Sections are `Arc`-shared, so a replacement touching
//! one section carries every other section over by pointer. Derived
//! timing lives in the metrics engine, not here.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::{ContextOverrides, SongContext};
use crate::duration::{NoteLength, QUARTER_NOTE};
use crate::instrument::{instrument_library, Instrument, RhythmOverride};

/// One timed event in a section: a chord, or a rest when `chord` is
/// `None`, lasting `duration` symbolic units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionItem {
    pub chord: Option<String>,
    pub duration: NoteLength,
}

impl SectionItem {
    pub fn new(chord: &str, duration: NoteLength) -> Self {
        Self { chord: Some(String::from(chord)), duration }
    }

    pub fn rest(duration: NoteLength) -> Self {
        Self { chord: None, duration }
    }
}

/// A titled run of items sharing one resolved context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SongSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub context_overrides: ContextOverrides,
    /// Per-instrument tweaks; `None` disables the instrument here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub instrument_overrides: BTreeMap<String, Option<RhythmOverride>>,
    pub items: Vec<SectionItem>,
}

impl SongSection {
    /// An untitled section with no items and no overrides.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The whole song document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Default context for sections that don't override it
    pub context: SongContext,
    pub sections: Vec<Arc<SongSection>>,
    pub instruments: Vec<Instrument>,
}

impl Default for Song {
    /// The document a fresh editor starts with: one intro section of
    /// three one-measure chords at 120 BPM in C.
    fn default() -> Self {
        Self {
            title: Some(String::from("My song")),
            author: None,
            context: SongContext::default(),
            sections: vec![Arc::new(SongSection {
                title: Some(String::from("Intro")),
                context_overrides: ContextOverrides::default(),
                instrument_overrides: BTreeMap::new(),
                items: vec![
                    SectionItem::new("C major", 4 * QUARTER_NOTE),
                    SectionItem::new("F major", 4 * QUARTER_NOTE),
                    SectionItem::new("E minor", 4 * QUARTER_NOTE),
                ],
            })],
            instruments: instrument_library(),
        }
    }
}

impl Song {
    /// An empty song with the given title and the stock instruments.
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(String::from(title)),
            author: None,
            context: SongContext::default(),
            sections: Vec::new(),
            instruments: instrument_library(),
        }
    }

    /// Total item count across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    // --- Pure replacement operations ---

    pub fn with_title(&self, title: &str) -> Song {
        Song { title: Some(String::from(title)), ..self.clone() }
    }

    pub fn with_author(&self, author: &str) -> Song {
        Song { author: Some(String::from(author)), ..self.clone() }
    }

    /// Replace the default context wholesale.
    pub fn with_context(&self, context: SongContext) -> Song {
        Song { context, ..self.clone() }
    }

    /// Rebuild one section through `f`, sharing every other section.
    fn with_section(&self, index: usize, f: impl FnOnce(&SongSection) -> SongSection) -> Song {
        debug_assert!(index < self.sections.len());
        let mut sections = self.sections.clone();
        sections[index] = Arc::new(f(&self.sections[index]));
        Song { sections, ..self.clone() }
    }

    pub fn with_section_items(&self, index: usize, items: Vec<SectionItem>) -> Song {
        self.with_section(index, |section| SongSection { items, ..section.clone() })
    }

    pub fn with_section_context(&self, index: usize, overrides: ContextOverrides) -> Song {
        self.with_section(index, |section| SongSection {
            context_overrides: overrides,
            ..section.clone()
        })
    }

    pub fn with_section_title(&self, index: usize, title: &str) -> Song {
        self.with_section(index, |section| SongSection {
            title: Some(String::from(title)),
            ..section.clone()
        })
    }

    /// Set or clear one section's tempo override; a tempo equal to the
    /// song default clears it.
    pub fn with_section_bpm(&self, index: usize, bpm: Option<f64>) -> Song {
        let default = self.context.clone();
        self.with_section(index, |section| {
            let mut overrides = section.context_overrides.clone();
            overrides.set_bpm(&default, bpm);
            SongSection { context_overrides: overrides, ..section.clone() }
        })
    }

    pub fn with_section_instruments(
        &self,
        index: usize,
        overrides: BTreeMap<String, Option<RhythmOverride>>,
    ) -> Song {
        self.with_section(index, |section| SongSection {
            instrument_overrides: overrides,
            ..section.clone()
        })
    }

    /// Append an empty section.
    pub fn with_added_section(&self) -> Song {
        let mut sections = self.sections.clone();
        sections.push(Arc::new(SongSection::empty()));
        Song { sections, ..self.clone() }
    }

    pub fn with_removed_section(&self, index: usize) -> Song {
        debug_assert!(index < self.sections.len());
        let mut sections = self.sections.clone();
        sections.remove(index);
        Song { sections, ..self.clone() }
    }

    /// Append an instrument, or replace the existing one of the same name.
    pub fn with_instrument(&self, instrument: Instrument) -> Song {
        let mut instruments = self.instruments.clone();
        match instruments.iter_mut().find(|i| i.name == instrument.name) {
            Some(existing) => *existing = instrument,
            None => instruments.push(instrument),
        }
        Song { instruments, ..self.clone() }
    }
}

/// A section-boundary-precise insertion point.
///
/// A global item index can't distinguish "end of section N" from
/// "start of section N+1", so insertion targets carry both indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionIndex {
    pub section: usize,
    pub item: usize,
}
