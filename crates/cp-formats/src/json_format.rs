//! JSON load/save for the song document.

use cp_ir::Song;

use crate::FormatError;

/// Parse a song document from JSON.
pub fn load_song(data: &str) -> Result<Song, FormatError> {
    let song: Song = serde_json::from_str(data)?;
    log::debug!(
        "loaded song {:?}: {} sections, {} items",
        song.title.as_deref().unwrap_or("(untitled)"),
        song.sections.len(),
        song.item_count(),
    );
    Ok(song)
}

/// Serialize a song document to JSON.
pub fn save_song(song: &Song) -> Result<String, FormatError> {
    Ok(serde_json::to_string(song)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_ir::{SectionItem, QUARTER_NOTE};

    #[test]
    fn round_trip_preserves_the_document() {
        let song = Song::default()
            .with_author("somebody")
            .with_added_section()
            .with_section_items(1, vec![SectionItem::rest(QUARTER_NOTE)])
            .with_section_bpm(1, Some(90.0));

        let json = save_song(&song).unwrap();
        let loaded = load_song(&json).unwrap();
        assert_eq!(loaded, song);
    }

    #[test]
    fn loads_a_handwritten_document() {
        let json = r#"{
            "context": {
                "key": "G major",
                "bpm": 96.5,
                "time_signature": { "per_measure": 3, "note_value": 4 }
            },
            "sections": [
                {
                    "title": "Verse",
                    "context_overrides": { "bpm": 120.0 },
                    "items": [
                        { "chord": "G major", "duration": 36 },
                        { "chord": null, "duration": 12 }
                    ]
                }
            ],
            "instruments": []
        }"#;

        let song = load_song(json).unwrap();
        assert_eq!(song.context.bpm, 96.5);
        assert_eq!(song.sections[0].context_overrides.bpm, Some(120.0));
        assert_eq!(song.sections[0].items[1].chord, None);
        assert_eq!(song.item_count(), 2);
    }

    #[test]
    fn rejects_garbage() {
        assert!(load_song("not json at all").is_err());
        assert!(load_song("{}").is_err());
    }

    #[test]
    fn rejects_negative_durations() {
        let json = r#"{
            "context": {
                "key": "C major",
                "bpm": 120.0,
                "time_signature": { "per_measure": 4, "note_value": 4 }
            },
            "sections": [
                { "items": [ { "chord": "C major", "duration": -4 } ] }
            ],
            "instruments": []
        }"#;
        assert!(load_song(json).is_err());
    }

    #[test]
    fn untitled_songs_survive() {
        let mut song = Song::default();
        song.title = None;
        let loaded = load_song(&save_song(&song).unwrap()).unwrap();
        assert_eq!(loaded.title, None);
    }
}
