//! Derived timing metrics for the chordpad editor.
//!
//! Converts the user-edited song document into absolute positions and
//! durations, in both symbolic units and milliseconds, for rendering
//! and playback scheduling. The full builder recomputes everything in
//! one pass; the incremental updater repairs only the suffix affected
//! by an edit, sharing the untouched prefix structurally.

mod builder;
mod error;
mod lookup;
mod metrics;
mod strategy;
pub mod update;

pub use builder::build_metrics;
pub use error::MetricsError;
pub use lookup::{find_item_by_index, find_item_by_position, find_item_by_time};
pub use metrics::{
    CombinedItem, DurationUpdate, ItemMetrics, SectionMetrics, SongAndMetrics, SongMetrics,
};
pub use strategy::{FullRebuild, Incremental, MetricsStrategy};
pub use update::{
    apply_duration_updates, change_section_bpm, change_song_bpm, delete_items, insert_items,
    move_items, refresh, update_durations,
};
