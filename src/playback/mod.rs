//! Gap-free scheduled playback of streamed audio with barge-in flushing.

pub mod output;
pub mod scheduler;

pub use output::{
    AudioBuffer, AudioOutput, ManualClock, MemoryOutput, PlaybackClock, ScheduledBuffer, SourceId,
    SystemClock,
};
pub use scheduler::PlaybackScheduler;
