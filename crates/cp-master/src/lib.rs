//! Headless controller for the chordpad editor.
//!
//! Owns the live `(song, metrics)` pair behind a single-writer store
//! and exposes the mutation entry points the editor surfaces call.
//! Readers take immutable snapshots; every mutation derives the
//! complete next snapshot and swaps it in atomically, so no reader can
//! observe metrics computed from a different document revision.

pub mod player;

use std::collections::BTreeMap;
use std::sync::Arc;

use cp_ir::{
    ContextOverrides, InsertionIndex, Instrument, RhythmOverride, SectionItem, Song, SongContext,
    TimeSignature,
};
use cp_metrics::{DurationUpdate, MetricsError, SongAndMetrics};

pub use player::{ChordSink, Playback, Player, QueuedChord};

// Re-export the types callers need so they don't depend on the inner
// crates directly.
pub use cp_ir::song;
pub use cp_metrics::{find_item_by_index, find_item_by_time, CombinedItem, SongMetrics};

/// Single-writer store for the live song and its derived metrics.
///
/// Mutators take `&mut self`, which is the single-writer discipline in
/// type-system form; clones of the snapshot `Arc` stay valid and
/// unchanged while new revisions are swapped in.
pub struct SongStore {
    snapshot: Arc<SongAndMetrics>,
    version: u64,
}

impl SongStore {
    /// A store holding the default document.
    pub fn new() -> Self {
        Self::with_song(Song::default())
    }

    /// A store seeded from a loaded document.
    pub fn with_song(song: Song) -> Self {
        Self { snapshot: Arc::new(SongAndMetrics::new(song)), version: 0 }
    }

    /// The current snapshot; cheap, and immutable forever.
    pub fn snapshot(&self) -> Arc<SongAndMetrics> {
        Arc::clone(&self.snapshot)
    }

    pub fn song(&self) -> &Song {
        &self.snapshot.song
    }

    pub fn metrics(&self) -> &SongMetrics {
        &self.snapshot.metrics
    }

    /// Bumped on every successful mutation. A reader holding a stale
    /// snapshot can compare versions instead of documents.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn swap(&mut self, next: SongAndMetrics) {
        self.snapshot = Arc::new(next);
        self.version += 1;
    }

    /// Replace the document, repairing metrics incrementally where the
    /// engine can and rebuilding where it can't.
    fn replace_song(&mut self, song: Song) {
        let next = cp_metrics::refresh(&self.snapshot, song);
        self.swap(next);
    }

    // --- Whole-song operations ---

    pub fn reset(&mut self) {
        log::debug!("resetting song to the default document");
        self.swap(SongAndMetrics::new(Song::default()));
    }

    pub fn set_title(&mut self, title: &str) {
        self.replace_song(self.song().with_title(title));
    }

    pub fn set_author(&mut self, author: &str) {
        self.replace_song(self.song().with_author(author));
    }

    /// Replace the song-wide default context.
    pub fn set_default_context(&mut self, context: SongContext) {
        self.replace_song(self.song().with_context(context));
    }

    pub fn set_song_bpm(&mut self, bpm: f64) {
        let next = cp_metrics::change_song_bpm(&self.snapshot, bpm);
        self.swap(next);
    }

    pub fn set_song_key(&mut self, key: &str) {
        let context = SongContext { key: String::from(key), ..self.song().context.clone() };
        self.replace_song(self.song().with_context(context));
    }

    pub fn set_song_time_signature(&mut self, time_signature: TimeSignature) {
        let context = SongContext { time_signature, ..self.song().context.clone() };
        self.replace_song(self.song().with_context(context));
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.replace_song(self.song().with_instrument(instrument));
    }

    // --- Section operations ---

    pub fn add_section(&mut self) {
        self.replace_song(self.song().with_added_section());
    }

    pub fn remove_section(&mut self, index: usize) -> Result<(), MetricsError> {
        let len = self.song().sections.len();
        if index >= len {
            return Err(MetricsError::SectionOutOfBounds { index, len });
        }
        self.replace_song(self.song().with_removed_section(index));
        Ok(())
    }

    pub fn set_section_items(
        &mut self,
        index: usize,
        items: Vec<SectionItem>,
    ) -> Result<(), MetricsError> {
        self.check_section(index)?;
        self.replace_song(self.song().with_section_items(index, items));
        Ok(())
    }

    pub fn set_section_context(
        &mut self,
        index: usize,
        overrides: ContextOverrides,
    ) -> Result<(), MetricsError> {
        self.check_section(index)?;
        self.replace_song(self.song().with_section_context(index, overrides));
        Ok(())
    }

    pub fn set_section_title(&mut self, index: usize, title: &str) -> Result<(), MetricsError> {
        self.check_section(index)?;
        self.replace_song(self.song().with_section_title(index, title));
        Ok(())
    }

    pub fn set_section_bpm(
        &mut self,
        index: usize,
        bpm: Option<f64>,
    ) -> Result<(), MetricsError> {
        let next = cp_metrics::change_section_bpm(&self.snapshot, index, bpm)?;
        self.swap(next);
        Ok(())
    }

    pub fn set_section_instruments(
        &mut self,
        index: usize,
        overrides: BTreeMap<String, Option<RhythmOverride>>,
    ) -> Result<(), MetricsError> {
        self.check_section(index)?;
        self.replace_song(self.song().with_section_instruments(index, overrides));
        Ok(())
    }

    // --- Item operations ---

    /// The per-keystroke resize path: repairs only the affected suffix.
    pub fn update_durations(&mut self, updates: &[DurationUpdate]) -> Result<(), MetricsError> {
        let next = match cp_metrics::update_durations(&self.snapshot, updates) {
            Ok(next) => next,
            Err(err) => {
                log::warn!("rejected duration update batch: {err}");
                return Err(err);
            }
        };
        self.swap(next);
        Ok(())
    }

    pub fn insert_items(
        &mut self,
        items: &[SectionItem],
        at: InsertionIndex,
    ) -> Result<(), MetricsError> {
        let next = cp_metrics::insert_items(&self.snapshot, items, at)?;
        self.swap(next);
        Ok(())
    }

    pub fn delete_items(&mut self, start: usize, count: usize) -> Result<(), MetricsError> {
        let next = cp_metrics::delete_items(&self.snapshot, start, count)?;
        self.swap(next);
        Ok(())
    }

    pub fn move_items(
        &mut self,
        start: usize,
        count: usize,
        to: InsertionIndex,
    ) -> Result<(), MetricsError> {
        let next = cp_metrics::move_items(&self.snapshot, start, count, to)?;
        self.swap(next);
        Ok(())
    }

    fn check_section(&self, index: usize) -> Result<(), MetricsError> {
        let len = self.song().sections.len();
        if index >= len {
            return Err(MetricsError::SectionOutOfBounds { index, len });
        }
        Ok(())
    }
}

impl Default for SongStore {
    fn default() -> Self {
        Self::new()
    }
}
