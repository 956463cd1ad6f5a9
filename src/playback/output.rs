use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Identifier of a scheduled playback source.
pub type SourceId = u64;

/// A decoded, playable audio buffer.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono 16-bit samples.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Build a buffer from little-endian pcm16 bytes. A trailing odd byte is
    /// ignored.
    pub fn from_pcm16(pcm: &[u8], sample_rate: u32) -> Self {
        let samples = pcm
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// The playback clock: monotonically increasing seconds since the output
/// context was created.
pub trait PlaybackClock: Send + Sync {
    fn now(&self) -> f64;
}

/// The platform audio output graph.
///
/// `play_at` schedules a buffer to begin at a clock time and returns a handle
/// for cancellation; stopping an already-finished source is a no-op.
pub trait AudioOutput: Send + Sync {
    fn play_at(&self, buffer: AudioBuffer, start: f64) -> SourceId;

    fn stop(&self, id: SourceId);

    /// Close the output context. Part of full teardown only.
    fn close(&self);
}

/// Wall-clock backed playback clock.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock for deterministic scheduling tests.
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            micros: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, secs: f64) {
        self.micros
            .fetch_add((secs * 1_000_000.0) as u64, Ordering::SeqCst);
    }

    pub fn set(&self, secs: f64) {
        self.micros
            .store((secs * 1_000_000.0) as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for ManualClock {
    fn now(&self) -> f64 {
        self.micros.load(Ordering::SeqCst) as f64 / 1_000_000.0
    }
}

/// A scheduled buffer as recorded by [`MemoryOutput`].
#[derive(Debug, Clone)]
pub struct ScheduledBuffer {
    pub id: SourceId,
    pub start: f64,
    pub duration: f64,
    pub stopped: bool,
}

/// Records scheduling calls instead of producing sound. The in-memory output
/// used by tests and the demo binary.
pub struct MemoryOutput {
    next_id: AtomicU64,
    scheduled: Mutex<Vec<ScheduledBuffer>>,
    closed: AtomicU64,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            scheduled: Mutex::new(Vec::new()),
            closed: AtomicU64::new(0),
        }
    }

    pub fn scheduled(&self) -> Vec<ScheduledBuffer> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> u64 {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for MemoryOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for MemoryOutput {
    fn play_at(&self, buffer: AudioBuffer, start: f64) -> SourceId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.scheduled.lock().unwrap().push(ScheduledBuffer {
            id,
            start,
            duration: buffer.duration_secs(),
            stopped: false,
        });
        id
    }

    fn stop(&self, id: SourceId) {
        let mut scheduled = self.scheduled.lock().unwrap();
        if let Some(entry) = scheduled.iter_mut().find(|entry| entry.id == id) {
            entry.stopped = true;
        }
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
