//! Pluggable metrics computation strategies.
//!
//! Both strategies compute the same values; `FullRebuild` is the
//! obviously-correct reference, `Incremental` the production path.
//! Keeping them behind one trait lets tests assert the two agree and
//! lets callers fall back to a rebuild wholesale.

use cp_ir::Song;

use crate::builder::build_metrics;
use crate::error::MetricsError;
use crate::metrics::{DurationUpdate, SongAndMetrics, SongMetrics};
use crate::update::{apply_duration_updates, update_durations};

pub trait MetricsStrategy {
    /// Derive metrics for a document from scratch.
    fn build(&self, song: &Song) -> SongMetrics;

    /// Apply a batch of duration updates to a snapshot.
    fn apply_updates(
        &self,
        state: &SongAndMetrics,
        updates: &[DurationUpdate],
    ) -> Result<SongAndMetrics, MetricsError>;
}

/// Recompute everything on every edit.
pub struct FullRebuild;

impl MetricsStrategy for FullRebuild {
    fn build(&self, song: &Song) -> SongMetrics {
        build_metrics(song)
    }

    fn apply_updates(
        &self,
        state: &SongAndMetrics,
        updates: &[DurationUpdate],
    ) -> Result<SongAndMetrics, MetricsError> {
        let song = apply_duration_updates(&state.song, updates)?;
        let metrics = build_metrics(&song);
        Ok(SongAndMetrics { song, metrics })
    }
}

/// Repair only the affected suffix.
pub struct Incremental;

impl MetricsStrategy for Incremental {
    fn build(&self, song: &Song) -> SongMetrics {
        build_metrics(song)
    }

    fn apply_updates(
        &self,
        state: &SongAndMetrics,
        updates: &[DurationUpdate],
    ) -> Result<SongAndMetrics, MetricsError> {
        update_durations(state, updates)
    }
}
