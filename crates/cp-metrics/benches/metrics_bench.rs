use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cp_ir::{SectionItem, Song, QUARTER_NOTE};
use cp_metrics::{build_metrics, update_durations, DurationUpdate, SongAndMetrics};

/// A song large enough for the prefix skip to matter: 64 sections of
/// 16 one-beat chords.
fn big_song() -> Song {
    let mut song = Song::new("bench");
    for i in 0..64 {
        song = song.with_added_section().with_section_items(
            i,
            vec![SectionItem::new("C major", QUARTER_NOTE); 16],
        );
    }
    song
}

fn bench_full_rebuild(c: &mut Criterion) {
    let song = big_song();
    c.bench_function("build_metrics/64x16", |b| {
        b.iter(|| build_metrics(black_box(&song)))
    });
}

fn bench_incremental_update(c: &mut Criterion) {
    let state = SongAndMetrics::new(big_song());
    let updates = [DurationUpdate { index: 1000, duration: 2 * QUARTER_NOTE }];
    c.bench_function("update_durations/single", |b| {
        b.iter(|| update_durations(black_box(&state), black_box(&updates)).unwrap())
    });
}

criterion_group!(benches, bench_full_rebuild, bench_incremental_update);
criterion_main!(benches);
