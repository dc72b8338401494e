//! Derived metrics types.
//!
//! All of these are outputs of the engine, never hand-edited. Section
//! metrics are `Arc`-shared so an incremental update can carry the
//! unaffected sections of the previous snapshot over by pointer.

use std::sync::Arc;

use cp_ir::{NoteLength, SectionItem, Song};

use crate::builder::build_metrics;

/// Derived timing for one item. Positions are relative to the owning
/// section's start; add the section's `pos`/`pos_ms` for song-absolute
/// coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ItemMetrics {
    pub pos: NoteLength,
    pub duration: NoteLength,
    pub pos_ms: f64,
    pub duration_ms: f64,
}

/// Derived timing for one section. `pos`/`pos_ms` are song-absolute;
/// `start_index` is the global index of the section's first item.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionMetrics {
    pub start_index: usize,
    pub pos: NoteLength,
    pub duration: NoteLength,
    pub pos_ms: f64,
    pub duration_ms: f64,
    pub items: Arc<Vec<ItemMetrics>>,
}

impl SectionMetrics {
    /// Global index one past this section's last item.
    pub fn end_index(&self) -> usize {
        self.start_index + self.items.len()
    }
}

/// Derived timing for the whole song.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SongMetrics {
    pub sections: Vec<Arc<SectionMetrics>>,
    pub duration: NoteLength,
    pub duration_ms: f64,
}

impl SongMetrics {
    pub fn item_count(&self) -> usize {
        self.sections.last().map_or(0, |s| s.end_index())
    }
}

/// A song paired with metrics derived from exactly that song. The pair
/// is replaced atomically by the owning store; a metrics value never
/// outlives the document revision that produced it.
#[derive(Clone, Debug)]
pub struct SongAndMetrics {
    pub song: Song,
    pub metrics: SongMetrics,
}

impl SongAndMetrics {
    pub fn new(song: Song) -> Self {
        let metrics = build_metrics(&song);
        Self { song, metrics }
    }
}

/// One item's new duration, addressed by global item index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DurationUpdate {
    pub index: usize,
    pub duration: NoteLength,
}

/// An item joined with its metrics and location, as returned by the
/// lookup functions.
#[derive(Clone, Copy, Debug)]
pub struct CombinedItem<'a> {
    pub section_index: usize,
    pub item_index: usize,
    pub item: &'a SectionItem,
    pub metrics: ItemMetrics,
    /// Song-absolute position (section pos + item pos)
    pub abs_pos: NoteLength,
    /// Song-absolute position in milliseconds
    pub abs_pos_ms: f64,
}
