//! Full metrics rebuild.

use std::sync::Arc;

use cp_ir::{duration_to_ms, NoteLength, Song, SongSection};

use crate::metrics::{ItemMetrics, SectionMetrics, SongMetrics};

/// Build song metrics from scratch, O(total items).
///
/// Walks sections in order with running position cursors; each section
/// resolves its effective context once and walks its items the same
/// way. A pure function of the song: rebuilding an unchanged document
/// yields a structurally equal result.
pub fn build_metrics(song: &Song) -> SongMetrics {
    let mut sections = Vec::with_capacity(song.sections.len());
    let mut start_index = 0;
    let mut pos: NoteLength = 0;
    let mut pos_ms = 0.0;

    for section in &song.sections {
        let metrics = build_section(song, section, start_index, pos, pos_ms);
        start_index += section.items.len();
        pos += metrics.duration;
        pos_ms += metrics.duration_ms;
        sections.push(Arc::new(metrics));
    }

    SongMetrics { sections, duration: pos, duration_ms: pos_ms }
}

/// Build one section's metrics with the given seed cursors.
///
/// Item positions restart at zero inside each section; the section
/// header carries the song-absolute offsets.
pub(crate) fn build_section(
    song: &Song,
    section: &SongSection,
    start_index: usize,
    pos: NoteLength,
    pos_ms: f64,
) -> SectionMetrics {
    let context = song.context.resolve(&section.context_overrides);
    let mut items = Vec::with_capacity(section.items.len());
    let mut item_pos: NoteLength = 0;
    let mut item_pos_ms = 0.0;

    for item in &section.items {
        let duration_ms = duration_to_ms(item.duration, context.bpm, &context.time_signature);
        items.push(ItemMetrics {
            pos: item_pos,
            duration: item.duration,
            pos_ms: item_pos_ms,
            duration_ms,
        });
        item_pos += item.duration;
        item_pos_ms += duration_ms;
    }

    SectionMetrics {
        start_index,
        pos,
        duration: item_pos,
        pos_ms,
        duration_ms: item_pos_ms,
        items: Arc::new(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_ir::{ContextOverrides, SectionItem, TimeSignature, QUARTER_NOTE};

    #[test]
    fn default_song_metrics() {
        // Three one-measure chords at 120 BPM in 4/4: 2000ms each.
        let song = Song::default();
        let metrics = build_metrics(&song);

        assert_eq!(metrics.sections.len(), 1);
        assert_eq!(metrics.duration, 144);
        assert_eq!(metrics.duration_ms, 6000.0);

        let section = &metrics.sections[0];
        assert_eq!(section.start_index, 0);
        assert_eq!(section.pos, 0);
        assert_eq!(section.duration, 144);
        assert_eq!(section.duration_ms, 6000.0);

        let positions: Vec<_> = section.items.iter().map(|i| i.pos).collect();
        assert_eq!(positions, vec![0, 48, 96]);
        let positions_ms: Vec<_> = section.items.iter().map(|i| i.pos_ms).collect();
        assert_eq!(positions_ms, vec![0.0, 2000.0, 4000.0]);
        assert!(section.items.iter().all(|i| i.duration_ms == 2000.0));
    }

    #[test]
    fn empty_song() {
        let song = Song::new("empty");
        let metrics = build_metrics(&song);
        assert!(metrics.sections.is_empty());
        assert_eq!(metrics.duration, 0);
        assert_eq!(metrics.duration_ms, 0.0);
        assert_eq!(metrics.item_count(), 0);
    }

    #[test]
    fn empty_section_occupies_no_time() {
        let song = Song::default().with_added_section();
        let metrics = build_metrics(&song);
        assert_eq!(metrics.sections[1].start_index, 3);
        assert_eq!(metrics.sections[1].pos, 144);
        assert_eq!(metrics.sections[1].pos_ms, 6000.0);
        assert_eq!(metrics.sections[1].duration, 0);
        assert_eq!(metrics.duration_ms, 6000.0);
    }

    #[test]
    fn section_cursors_chain() {
        let song = Song::default()
            .with_added_section()
            .with_section_items(1, vec![SectionItem::new("G major", QUARTER_NOTE)]);
        let metrics = build_metrics(&song);

        let second = &metrics.sections[1];
        assert_eq!(second.start_index, 3);
        assert_eq!(second.pos, 144);
        assert_eq!(second.pos_ms, 6000.0);
        // item positions restart inside the section
        assert_eq!(second.items[0].pos, 0);
        assert_eq!(second.items[0].pos_ms, 0.0);
        assert_eq!(metrics.duration, 156);
        assert_eq!(metrics.duration_ms, 6500.0);
    }

    #[test]
    fn section_bpm_override_changes_only_that_section() {
        let song = Song::default()
            .with_added_section()
            .with_section_items(1, vec![SectionItem::new("A minor", 4 * QUARTER_NOTE)])
            .with_section_bpm(1, Some(60.0));
        let metrics = build_metrics(&song);

        assert_eq!(metrics.sections[0].items[0].duration_ms, 2000.0);
        // 4 beats at 60 BPM
        assert_eq!(metrics.sections[1].items[0].duration_ms, 4000.0);
        assert_eq!(metrics.duration_ms, 10_000.0);
    }

    #[test]
    fn time_signature_override_changes_beat_unit() {
        let overrides = ContextOverrides {
            time_signature: Some(TimeSignature::new(6, 8)),
            ..Default::default()
        };
        let song = Song::default()
            .with_added_section()
            .with_section_items(1, vec![SectionItem::new("D minor", QUARTER_NOTE)])
            .with_section_context(1, overrides);
        let metrics = build_metrics(&song);

        // a quarter note is two eighth-note beats in 6/8: 1000ms at 120 BPM
        assert_eq!(metrics.sections[1].items[0].duration_ms, 1000.0);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let song = Song::default().with_added_section().with_section_bpm(0, Some(90.0));
        assert_eq!(build_metrics(&song), build_metrics(&song));
    }

    #[test]
    fn rest_items_still_occupy_time() {
        let song = Song::default().with_section_items(
            0,
            vec![SectionItem::rest(QUARTER_NOTE), SectionItem::new("C major", QUARTER_NOTE)],
        );
        let metrics = build_metrics(&song);
        assert_eq!(metrics.sections[0].items[1].pos, 12);
        assert_eq!(metrics.sections[0].items[1].pos_ms, 500.0);
    }
}
