//! Locating items by global index, time, or musical position.

use cp_ir::NoteLength;

use crate::error::MetricsError;
use crate::metrics::{CombinedItem, SongAndMetrics};

/// Find an item by its global index: a linear scan over the sections'
/// `start_index` prefix sums, then a direct index into the owner.
pub fn find_item_by_index(
    state: &SongAndMetrics,
    index: usize,
) -> Result<CombinedItem<'_>, MetricsError> {
    for (section_index, (section, metrics)) in
        state.song.sections.iter().zip(&state.metrics.sections).enumerate()
    {
        if index < metrics.end_index() {
            let local = index - metrics.start_index;
            return Ok(combined(state, section_index, local));
        }
    }
    Err(MetricsError::IndexOutOfBounds { index, len: state.metrics.item_count() })
}

/// Find the item sounding at `instant_ms`.
///
/// Absolute positions are non-decreasing across the flattened item
/// sequence, so this is a binary search: first over section start
/// times, then over item offsets within the section. An instant at an
/// item boundary belongs to the later item; zero-length items never
/// contain an instant.
pub fn find_item_by_time(
    state: &SongAndMetrics,
    instant_ms: f64,
) -> Result<CombinedItem<'_>, MetricsError> {
    let out_of_range = MetricsError::TimeOutOfRange {
        instant_ms,
        duration_ms: state.metrics.duration_ms,
    };
    // NaN fails this guard too.
    if !(instant_ms >= 0.0 && instant_ms < state.metrics.duration_ms) {
        return Err(out_of_range);
    }

    let sections = &state.metrics.sections;
    let section_index = sections.partition_point(|s| s.pos_ms <= instant_ms) - 1;
    let metrics = &sections[section_index];

    let offset = instant_ms - metrics.pos_ms;
    let local = metrics.items.partition_point(|i| i.pos_ms <= offset) - 1;
    Ok(combined(state, section_index, local))
}

/// Find the item sounding at symbolic `position`. Same contract as
/// [`find_item_by_time`], in exact integer units.
pub fn find_item_by_position(
    state: &SongAndMetrics,
    position: NoteLength,
) -> Result<CombinedItem<'_>, MetricsError> {
    if position >= state.metrics.duration {
        return Err(MetricsError::PositionOutOfRange {
            position,
            duration: state.metrics.duration,
        });
    }

    let sections = &state.metrics.sections;
    let section_index = sections.partition_point(|s| s.pos <= position) - 1;
    let metrics = &sections[section_index];

    let offset = position - metrics.pos;
    let local = metrics.items.partition_point(|i| i.pos <= offset) - 1;
    Ok(combined(state, section_index, local))
}

fn combined(state: &SongAndMetrics, section_index: usize, local: usize) -> CombinedItem<'_> {
    let section = &state.song.sections[section_index];
    let metrics = &state.metrics.sections[section_index];
    let item = metrics.items[local];
    CombinedItem {
        section_index,
        item_index: local,
        item: &section.items[local],
        metrics: item,
        abs_pos: metrics.pos + item.pos,
        abs_pos_ms: metrics.pos_ms + item.pos_ms,
    }
}
