//! Playback cursor and chord queueing.
//!
//! Pure time arithmetic: the caller supplies the wall clock and an
//! audio sink, and drives [`Player::tick`] on an interval. Each tick
//! re-derives its schedule from the snapshot it is handed, so edits
//! made while playing take effect at the next tick instead of playing
//! a stale schedule.

use cp_metrics::SongAndMetrics;

/// How often the owner is expected to tick the player. Informational;
/// the player works with any cadence.
pub const PLAYBACK_TICK_INTERVAL_MS: f64 = 100.0;

/// Always keep at least this much upcoming music queued in the sink.
pub const QUEUE_AHEAD_MS: f64 = 1500.0;

/// Where queued chords go. Implemented by the audio backend; tests use
/// a recording stub.
pub trait ChordSink {
    /// Schedule a chord to sound at `at_ms` on the song timeline.
    fn queue_chord(&mut self, chord: &str, at_ms: f64, duration_ms: f64);

    /// Drop everything queued but not yet sounded.
    fn cancel(&mut self);
}

/// A chord queued into a sink. Convenience for sinks that buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct QueuedChord {
    pub chord: String,
    pub at_ms: f64,
    pub duration_ms: f64,
}

impl ChordSink for Vec<QueuedChord> {
    fn queue_chord(&mut self, chord: &str, at_ms: f64, duration_ms: f64) {
        self.push(QueuedChord { chord: String::from(chord), at_ms, duration_ms });
    }

    fn cancel(&mut self) {
        self.clear();
    }
}

/// One live playback run.
#[derive(Clone, Copy, Debug)]
pub struct Playback {
    /// Wall-clock time playback started
    started_at_ms: f64,
    /// Song-time position of the cursor when playback started
    cursor_start_ms: f64,
    /// Song time up to which (exclusive) chords are already queued
    queued_to_ms: Option<f64>,
}

impl Playback {
    fn new(now_ms: f64, cursor_ms: f64) -> Self {
        Self { started_at_ms: now_ms, cursor_start_ms: cursor_ms, queued_to_ms: None }
    }

    /// Current song-time position of the cursor.
    pub fn cursor_ms(&self, now_ms: f64) -> f64 {
        self.cursor_start_ms + (now_ms - self.started_at_ms)
    }

    /// Advance the cursor and keep the sink buffered `QUEUE_AHEAD_MS`
    /// ahead of it. Returns the cursor position.
    fn tick(&mut self, now_ms: f64, state: &SongAndMetrics, sink: &mut dyn ChordSink) -> f64 {
        let cursor = self.cursor_ms(now_ms);
        if let Some(queued_to) = self.queued_to_ms {
            if cursor + QUEUE_AHEAD_MS < queued_to {
                return cursor;
            }
        }

        let from = self.queued_to_ms.unwrap_or(self.cursor_start_ms);
        let to = from + QUEUE_AHEAD_MS;
        // On the first fill, also sound the chord the cursor starts
        // inside of; later fills only pick up fresh starts.
        queue_range(state, from, to, self.queued_to_ms.is_none(), sink);
        self.queued_to_ms = Some(to);
        cursor
    }
}

/// Queue every chord starting in `[from_ms, to_ms)`; with
/// `include_sounding`, also the one already sounding at `from_ms`.
fn queue_range(
    state: &SongAndMetrics,
    from_ms: f64,
    to_ms: f64,
    include_sounding: bool,
    sink: &mut dyn ChordSink,
) {
    for (section, metrics) in state.song.sections.iter().zip(&state.metrics.sections) {
        if metrics.pos_ms >= to_ms {
            break;
        }
        if metrics.pos_ms + metrics.duration_ms <= from_ms && !include_sounding {
            continue;
        }
        for (item, item_metrics) in section.items.iter().zip(metrics.items.iter()) {
            let start = metrics.pos_ms + item_metrics.pos_ms;
            if start >= to_ms {
                break;
            }
            let sounding = start < from_ms && start + item_metrics.duration_ms > from_ms;
            if start >= from_ms || (include_sounding && sounding) {
                if let Some(chord) = &item.chord {
                    sink.queue_chord(chord, start, item_metrics.duration_ms);
                }
            }
        }
    }
}

/// Transport state: a paused cursor, or a live [`Playback`].
pub struct Player {
    playback: Option<Playback>,
    cursor_ms: f64,
    repeat: bool,
}

impl Player {
    pub fn new() -> Self {
        Self { playback: None, cursor_ms: 0.0, repeat: false }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    /// Last known cursor position, playing or not.
    pub fn cursor_ms(&self) -> f64 {
        self.cursor_ms
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// Start playing from the current cursor. No-op if already playing.
    pub fn play(&mut self, now_ms: f64) {
        if self.playback.is_none() {
            self.playback = Some(Playback::new(now_ms, self.cursor_ms));
        }
    }

    /// Stop, keeping the cursor where it is; pending audio is dropped.
    pub fn pause(&mut self, sink: &mut dyn ChordSink) {
        if self.playback.take().is_some() {
            sink.cancel();
        }
    }

    /// Jump the cursor. While playing, the queue is rebuilt from the
    /// new position.
    pub fn seek(&mut self, to_ms: f64, now_ms: f64, sink: &mut dyn ChordSink) {
        self.cursor_ms = to_ms;
        if self.playback.take().is_some() {
            sink.cancel();
            self.playback = Some(Playback::new(now_ms, to_ms));
        }
    }

    /// Back to a stopped cursor at zero.
    pub fn reset(&mut self, sink: &mut dyn ChordSink) {
        self.pause(sink);
        self.cursor_ms = 0.0;
    }

    /// Advance playback against the current snapshot. Call on an
    /// interval while playing; harmless while paused.
    pub fn tick(&mut self, now_ms: f64, state: &SongAndMetrics, sink: &mut dyn ChordSink) -> f64 {
        let Some(playback) = &mut self.playback else {
            return self.cursor_ms;
        };
        self.cursor_ms = playback.tick(now_ms, state, sink);

        if self.cursor_ms >= state.metrics.duration_ms {
            if self.repeat {
                log::debug!("playback wrapped; repeating from the top");
                self.cursor_ms = 0.0;
                self.playback = Some(Playback::new(now_ms, 0.0));
            } else {
                self.playback = None;
                self.cursor_ms = state.metrics.duration_ms;
            }
        }
        self.cursor_ms
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_ir::{Song, QUARTER_NOTE};
    use cp_metrics::DurationUpdate;

    fn state() -> SongAndMetrics {
        // C / F / Em, 2000ms each at 120 BPM.
        SongAndMetrics::new(Song::default())
    }

    #[test]
    fn first_tick_queues_the_lookahead_window() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();

        player.play(10_000.0);
        let cursor = player.tick(10_000.0, &state, &mut sink);

        assert_eq!(cursor, 0.0);
        // Only the chord starting inside [0, 1500) plus none ahead.
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0], QueuedChord {
            chord: String::from("C major"),
            at_ms: 0.0,
            duration_ms: 2000.0,
        });
    }

    #[test]
    fn later_ticks_extend_the_queue_without_requeueing() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();

        player.play(0.0);
        player.tick(0.0, &state, &mut sink);
        player.tick(600.0, &state, &mut sink);

        let starts: Vec<f64> = sink.iter().map(|c| c.at_ms).collect();
        assert_eq!(starts, vec![0.0, 2000.0]);
    }

    #[test]
    fn tick_while_buffered_ahead_only_moves_the_cursor() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();

        player.play(0.0);
        player.tick(0.0, &state, &mut sink); // queued to 1500
        player.tick(600.0, &state, &mut sink); // queued to 3000
        let queued = sink.len();

        let cursor = player.tick(700.0, &state, &mut sink); // 700+1500 < 3000
        assert_eq!(cursor, 700.0);
        assert_eq!(sink.len(), queued);
    }

    #[test]
    fn edits_mid_playback_reach_the_next_tick() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();

        player.play(0.0);
        player.tick(0.0, &state, &mut sink);

        // Halve item 0 while playing: F now starts at 1000ms. The owner
        // reacts to the document change by rebuffering from the cursor,
        // and the next tick schedules against the new timeline.
        let edited = cp_metrics::update_durations(
            &state,
            &[DurationUpdate { index: 0, duration: 2 * QUARTER_NOTE }],
        )
        .unwrap();
        player.seek(600.0, 600.0, &mut sink);
        player.tick(600.0, &edited, &mut sink);

        assert!(sink.iter().any(|c| c.chord == "F major" && c.at_ms == 1000.0));
    }

    #[test]
    fn seek_rebuilds_the_queue() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();

        player.play(0.0);
        player.tick(0.0, &state, &mut sink);

        player.seek(4100.0, 50.0, &mut sink);
        assert!(sink.is_empty(), "seek cancels the stale queue");

        player.tick(50.0, &state, &mut sink);
        // Em is sounding at 4100ms and gets queued at its own start.
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].chord, "E minor");
        assert_eq!(sink[0].at_ms, 4000.0);
    }

    #[test]
    fn playback_ends_at_the_song_end() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();

        player.play(0.0);
        player.tick(0.0, &state, &mut sink);
        let cursor = player.tick(7000.0, &state, &mut sink);

        assert!(!player.is_playing());
        assert_eq!(cursor, 6000.0);
    }

    #[test]
    fn repeat_wraps_instead_of_stopping() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();
        player.set_repeat(true);

        player.play(0.0);
        player.tick(0.0, &state, &mut sink);
        player.tick(7000.0, &state, &mut sink);

        assert!(player.is_playing());
        assert_eq!(player.cursor_ms(), 0.0);
    }

    #[test]
    fn pause_keeps_the_cursor() {
        let state = state();
        let mut sink: Vec<QueuedChord> = Vec::new();
        let mut player = Player::new();

        player.play(0.0);
        player.tick(500.0, &state, &mut sink);
        player.pause(&mut sink);

        assert!(!player.is_playing());
        assert_eq!(player.cursor_ms(), 500.0);
        assert!(sink.is_empty());

        // resuming continues from the paused cursor
        player.play(9000.0);
        let cursor = player.tick(9100.0, &state, &mut sink);
        assert_eq!(cursor, 600.0);
    }
}
