//! Incremental metrics repair.
//!
//! Every function here takes the previous `(song, metrics)` snapshot
//! and returns a new one whose metrics are field-for-field identical to
//! a full rebuild of the new document — but computed by touching only
//! the suffix at or after the first change. Sections before the first
//! change (and after the point where an edit's net effect cancels out)
//! are carried over by `Arc`, pointer-identical to the input.
//!
//! Validation happens before any output is constructed: a returned
//! error means the input state was never touched.

use std::sync::Arc;

use cp_ir::{
    duration_to_ms, InsertionIndex, NoteLength, SectionItem, Song, SongContext, SongSection,
};

use crate::builder::{build_metrics, build_section};
use crate::error::MetricsError;
use crate::metrics::{DurationUpdate, ItemMetrics, SectionMetrics, SongAndMetrics, SongMetrics};

/// Resize items in place, repairing only the affected metrics suffix.
///
/// Updates are addressed by global item index. Duplicate indices are
/// rejected (ambiguous intent), as are out-of-range indices; either
/// error leaves the input state untouched.
pub fn update_durations(
    state: &SongAndMetrics,
    updates: &[DurationUpdate],
) -> Result<SongAndMetrics, MetricsError> {
    let sorted = sorted_updates(updates, state.song.item_count())?;
    if sorted.is_empty() {
        return Ok(state.clone());
    }

    let mut pending = sorted.as_slice();
    let mut song_sections = Vec::with_capacity(state.song.sections.len());
    let mut metric_sections = Vec::with_capacity(state.song.sections.len());
    let mut pos: NoteLength = 0;
    let mut pos_ms = 0.0;

    for (section, old) in state.song.sections.iter().zip(&state.metrics.sections) {
        let end = old.end_index();
        let n_here = pending.iter().take_while(|u| u.index < end).count();

        if n_here == 0 {
            song_sections.push(Arc::clone(section));
            // Share outright while the running cursors still agree with
            // the old header; that covers the whole prefix, and resumes
            // if a batch's changes cancel out exactly.
            if pos == old.pos && pos_ms == old.pos_ms {
                metric_sections.push(Arc::clone(old));
            } else {
                metric_sections.push(Arc::new(SectionMetrics {
                    start_index: old.start_index,
                    pos,
                    duration: old.duration,
                    pos_ms,
                    duration_ms: old.duration_ms,
                    items: Arc::clone(&old.items),
                }));
            }
            pos += old.duration;
            pos_ms += old.duration_ms;
            continue;
        }

        let (here, rest) = pending.split_at(n_here);
        pending = rest;

        let context = state.song.context.resolve(&section.context_overrides);
        let mut new_section = (**section).clone();
        let mut items: Vec<ItemMetrics> = (*old.items).clone();

        // Items before the first update keep their metrics bit-for-bit;
        // from there on, re-accumulate with the same cursor walk the
        // full builder uses, so the two agree exactly.
        let first_local = here[0].index - old.start_index;
        let mut cursor_pos = items[first_local].pos;
        let mut cursor_ms = items[first_local].pos_ms;
        let mut here = here.iter().peekable();

        for local in first_local..items.len() {
            let global = old.start_index + local;
            if here.peek().is_some_and(|u| u.index == global) {
                new_section.items[local].duration = here.next().unwrap().duration;
            }
            let duration = new_section.items[local].duration;
            let duration_ms = duration_to_ms(duration, context.bpm, &context.time_signature);
            items[local] = ItemMetrics { pos: cursor_pos, duration, pos_ms: cursor_ms, duration_ms };
            cursor_pos += duration;
            cursor_ms += duration_ms;
        }

        metric_sections.push(Arc::new(SectionMetrics {
            start_index: old.start_index,
            pos,
            duration: cursor_pos,
            pos_ms,
            duration_ms: cursor_ms,
            items: Arc::new(items),
        }));
        song_sections.push(Arc::new(new_section));
        pos += cursor_pos;
        pos_ms += cursor_ms;
    }

    let mut song = state.song.clone();
    song.sections = song_sections;
    let metrics = SongMetrics { sections: metric_sections, duration: pos, duration_ms: pos_ms };
    Ok(SongAndMetrics { song, metrics })
}

/// Apply duration updates to the document alone, without metrics.
/// The full-rebuild strategy and the equivalence tests go through this.
pub fn apply_duration_updates(
    song: &Song,
    updates: &[DurationUpdate],
) -> Result<Song, MetricsError> {
    let sorted = sorted_updates(updates, song.item_count())?;
    let mut pending = sorted.as_slice();
    let mut result = song.clone();
    let mut start = 0;

    for (i, section) in song.sections.iter().enumerate() {
        let end = start + section.items.len();
        let n_here = pending.iter().take_while(|u| u.index < end).count();
        if n_here > 0 {
            let (here, rest) = pending.split_at(n_here);
            pending = rest;
            let mut items = section.items.clone();
            for update in here {
                items[update.index - start].duration = update.duration;
            }
            result = result.with_section_items(i, items);
        }
        start = end;
    }

    Ok(result)
}

fn sorted_updates(
    updates: &[DurationUpdate],
    item_count: usize,
) -> Result<Vec<DurationUpdate>, MetricsError> {
    let mut sorted = updates.to_vec();
    sorted.sort_by_key(|u| u.index);
    for pair in sorted.windows(2) {
        if pair[0].index == pair[1].index {
            return Err(MetricsError::DuplicateUpdate { index: pair[0].index });
        }
    }
    if let Some(last) = sorted.last() {
        if last.index >= item_count {
            return Err(MetricsError::IndexOutOfBounds { index: last.index, len: item_count });
        }
    }
    Ok(sorted)
}

/// Derive metrics for an edited document from the previous snapshot,
/// rebuilding as little as possible.
///
/// The new song is expected to share unchanged section `Arc`s with the
/// snapshot's (as every document replacement operation does); shared
/// sections whose timing context didn't change keep their metrics. A
/// default-context change that only moves the tempo still reuses every
/// section with a tempo override; anything more invasive falls back to
/// a full rebuild.
pub fn refresh(state: &SongAndMetrics, song: Song) -> SongAndMetrics {
    let old_context = &state.song.context;
    let metrics = if song.context.bpm == old_context.bpm
        && song.context.time_signature == old_context.time_signature
    {
        refresh_sections(state, &song, |_| true)
    } else if song.context.time_signature == old_context.time_signature {
        log::debug!("default tempo changed; rebuilding sections without a tempo override");
        refresh_sections(state, &song, |section| section.context_overrides.bpm.is_some())
    } else {
        log::debug!("default time signature changed; full metrics rebuild");
        build_metrics(&song)
    };
    SongAndMetrics { song, metrics }
}

/// Cursor walk shared by the [`refresh`] paths. A section is reused
/// when it is pointer-identical to the old document's and `reusable`
/// says its effective timing survived the context change.
fn refresh_sections(
    state: &SongAndMetrics,
    song: &Song,
    reusable: impl Fn(&SongSection) -> bool,
) -> SongMetrics {
    let mut sections = Vec::with_capacity(song.sections.len());
    let mut start_index = 0;
    let mut pos: NoteLength = 0;
    let mut pos_ms = 0.0;

    for (i, section) in song.sections.iter().enumerate() {
        let old = state.song.sections.get(i).zip(state.metrics.sections.get(i));
        let metrics = match old {
            Some((old_section, old_metrics))
                if Arc::ptr_eq(section, old_section) && reusable(section.as_ref()) =>
            {
                reuse_section(old_metrics, start_index, pos, pos_ms)
            }
            _ => Arc::new(build_section(song, section, start_index, pos, pos_ms)),
        };
        start_index += section.items.len();
        pos += metrics.duration;
        pos_ms += metrics.duration_ms;
        sections.push(metrics);
    }

    SongMetrics { sections, duration: pos, duration_ms: pos_ms }
}

/// Carry a section's metrics over: shared untouched when the cursors
/// line up, otherwise a new header over the same item array.
fn reuse_section(
    old: &Arc<SectionMetrics>,
    start_index: usize,
    pos: NoteLength,
    pos_ms: f64,
) -> Arc<SectionMetrics> {
    if old.start_index == start_index && old.pos == pos && old.pos_ms == pos_ms {
        Arc::clone(old)
    } else {
        Arc::new(SectionMetrics {
            start_index,
            pos,
            duration: old.duration,
            pos_ms,
            duration_ms: old.duration_ms,
            items: Arc::clone(&old.items),
        })
    }
}

/// Insert items at a section-boundary-precise insertion point.
pub fn insert_items(
    state: &SongAndMetrics,
    items: &[SectionItem],
    at: InsertionIndex,
) -> Result<SongAndMetrics, MetricsError> {
    let section = state
        .song
        .sections
        .get(at.section)
        .ok_or(MetricsError::BadInsertionPoint { section: at.section, item: at.item })?;
    if at.item > section.items.len() {
        return Err(MetricsError::BadInsertionPoint { section: at.section, item: at.item });
    }

    let mut new_items = section.items.clone();
    new_items.splice(at.item..at.item, items.iter().cloned());
    let song = state.song.with_section_items(at.section, new_items);
    Ok(refresh(state, song))
}

/// Delete a run of items addressed by global index; the run may span
/// section boundaries. Emptied sections remain in the document.
pub fn delete_items(
    state: &SongAndMetrics,
    start: usize,
    count: usize,
) -> Result<SongAndMetrics, MetricsError> {
    let total = state.song.item_count();
    if start + count > total {
        return Err(MetricsError::RangeOutOfBounds { start, count, len: total });
    }
    if count == 0 {
        return Ok(state.clone());
    }

    let song = remove_range(&state.song, start, count).0;
    Ok(refresh(state, song))
}

/// Move a run of items to an insertion point elsewhere in the song.
///
/// The insertion point addresses the document as it looks *before* the
/// move and may not fall inside the moved run itself.
pub fn move_items(
    state: &SongAndMetrics,
    start: usize,
    count: usize,
    to: InsertionIndex,
) -> Result<SongAndMetrics, MetricsError> {
    let total = state.song.item_count();
    if start + count > total {
        return Err(MetricsError::RangeOutOfBounds { start, count, len: total });
    }
    let target = state
        .song
        .sections
        .get(to.section)
        .ok_or(MetricsError::BadInsertionPoint { section: to.section, item: to.item })?;
    if to.item > target.items.len() {
        return Err(MetricsError::BadInsertionPoint { section: to.section, item: to.item });
    }
    let global_to = section_start(&state.song, to.section) + to.item;
    if global_to > start && global_to < start + count {
        return Err(MetricsError::BadInsertionPoint { section: to.section, item: to.item });
    }
    if count == 0 {
        return Ok(state.clone());
    }

    let (song, moved) = remove_range(&state.song, start, count);

    // Re-anchor the insertion point in the shrunk target section.
    let target_start = section_start(&state.song, to.section);
    let removed_before = overlap(start, count, target_start, to.item);
    let local = to.item - removed_before;

    let mut items = song.sections[to.section].items.clone();
    items.splice(local..local, moved);
    let song = song.with_section_items(to.section, items);
    Ok(refresh(state, song))
}

/// Change the song-wide default tempo. Sections with their own tempo
/// override keep their metrics; everything else is recomputed.
pub fn change_song_bpm(state: &SongAndMetrics, bpm: f64) -> SongAndMetrics {
    let song = state
        .song
        .with_context(SongContext { bpm, ..state.song.context.clone() });
    refresh(state, song)
}

/// Set or clear one section's tempo override; only that section's item
/// metrics are recomputed, later sections shift.
pub fn change_section_bpm(
    state: &SongAndMetrics,
    section: usize,
    bpm: Option<f64>,
) -> Result<SongAndMetrics, MetricsError> {
    let len = state.song.sections.len();
    if section >= len {
        return Err(MetricsError::SectionOutOfBounds { index: section, len });
    }
    let song = state.song.with_section_bpm(section, bpm);
    Ok(refresh(state, song))
}

/// Global item index of a section's first item, from the document alone.
fn section_start(song: &Song, section: usize) -> usize {
    song.sections[..section].iter().map(|s| s.items.len()).sum()
}

/// How many of the `count` items removed from `start` fall before local
/// index `before` of the section starting at `section_start`.
fn overlap(start: usize, count: usize, section_start: usize, before: usize) -> usize {
    let lo = start.max(section_start);
    let hi = (start + count).min(section_start + before);
    hi.saturating_sub(lo)
}

/// Remove `count` items starting at global `start`, returning the new
/// document and the removed items in order.
fn remove_range(song: &Song, start: usize, count: usize) -> (Song, Vec<SectionItem>) {
    let mut result = song.clone();
    let mut removed = Vec::with_capacity(count);
    let mut section_start = 0;

    for (i, section) in song.sections.iter().enumerate() {
        let section_end = section_start + section.items.len();
        let lo = start.max(section_start);
        let hi = (start + count).min(section_end);
        if lo < hi {
            let mut items = section.items.clone();
            removed.extend(items.drain(lo - section_start..hi - section_start));
            result = result.with_section_items(i, items);
        }
        section_start = section_end;
    }

    (result, removed)
}
