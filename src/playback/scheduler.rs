use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::output::{AudioBuffer, AudioOutput, PlaybackClock, SourceId};

/// Schedules streamed audio buffers back-to-back on the output clock.
///
/// Invariant: absent an interruption, buffer *i+1* starts exactly where
/// buffer *i* ends, so playback has no audible gap and no overlap.
pub struct PlaybackScheduler {
    clock: Arc<dyn PlaybackClock>,
    output: Arc<dyn AudioOutput>,
    next_start_time: f64,
    active: HashSet<SourceId>,
}

impl PlaybackScheduler {
    pub fn new(clock: Arc<dyn PlaybackClock>, output: Arc<dyn AudioOutput>) -> Self {
        Self {
            clock,
            output,
            next_start_time: 0.0,
            active: HashSet::new(),
        }
    }

    /// Schedule the next streamed buffer. Returns its start time.
    pub fn enqueue(&mut self, buffer: AudioBuffer) -> f64 {
        let start = self.next_start_time.max(self.clock.now());
        let duration = buffer.duration_secs();

        let id = self.output.play_at(buffer, start);
        self.active.insert(id);
        self.next_start_time = start + duration;

        debug!(
            "Scheduled audio buffer at {:.3}s for {:.3}s ({} active)",
            start,
            duration,
            self.active.len()
        );
        start
    }

    /// Play a buffer immediately, outside the streamed sequence.
    ///
    /// Used for the proactive greeting: the source joins the active set (so a
    /// barge-in still silences it) but the streamed cursor is left alone.
    pub fn play_oneshot(&mut self, buffer: AudioBuffer) -> f64 {
        let start = self.clock.now();
        let id = self.output.play_at(buffer, start);
        self.active.insert(id);
        start
    }

    /// Barge-in: stop and discard everything scheduled, reset the cursor.
    pub fn flush(&mut self) {
        if !self.active.is_empty() {
            debug!("Flushing {} scheduled audio sources", self.active.len());
        }
        for id in self.active.drain() {
            self.output.stop(id);
        }
        self.next_start_time = 0.0;
    }

    /// Current cursor: the clock time the next streamed buffer will start at
    /// (or earlier, if the clock has already passed it).
    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
