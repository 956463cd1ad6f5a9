// Tests for the playback scheduler: gap/overlap-free scheduling, barge-in
// flushing, and the out-of-band greeting path.

use std::sync::Arc;

use iris_live::playback::{AudioBuffer, ManualClock, MemoryOutput, PlaybackScheduler};

fn buffer(duration_secs: f64) -> AudioBuffer {
    let sample_rate = 24000;
    AudioBuffer {
        samples: vec![0i16; (sample_rate as f64 * duration_secs) as usize],
        sample_rate,
    }
}

fn scheduler() -> (PlaybackScheduler, Arc<ManualClock>, Arc<MemoryOutput>) {
    let clock = Arc::new(ManualClock::new());
    let output = Arc::new(MemoryOutput::new());
    let scheduler = PlaybackScheduler::new(Arc::clone(&clock) as _, Arc::clone(&output) as _);
    (scheduler, clock, output)
}

#[test]
fn test_buffer_from_pcm16() {
    let pcm = [0x00, 0x01, 0xFF, 0x7F, 0x00, 0x80];
    let buffer = AudioBuffer::from_pcm16(&pcm, 24000);
    assert_eq!(buffer.samples, vec![256, 32767, -32768]);

    // A trailing odd byte is ignored.
    let buffer = AudioBuffer::from_pcm16(&[0x00, 0x01, 0xAB], 24000);
    assert_eq!(buffer.samples.len(), 1);
}

#[test]
fn test_buffer_duration() {
    assert!((buffer(0.5).duration_secs() - 0.5).abs() < 1e-9);
    assert!((buffer(2.0).duration_secs() - 2.0).abs() < 1e-9);
}

#[test]
fn test_buffers_schedule_back_to_back() {
    let (mut scheduler, _clock, output) = scheduler();

    for _ in 0..4 {
        scheduler.enqueue(buffer(0.5));
    }

    let scheduled = output.scheduled();
    assert_eq!(scheduled.len(), 4);
    for pair in scheduled.windows(2) {
        // Buffer i+1 starts exactly where buffer i ends.
        let end = pair[0].start + pair[0].duration;
        assert!(
            (pair[1].start - end).abs() < 1e-9,
            "gap or overlap between {:.3} and {:.3}",
            end,
            pair[1].start
        );
    }
}

#[test]
fn test_start_never_precedes_the_clock() {
    let (mut scheduler, clock, output) = scheduler();

    clock.set(2.0);
    let start = scheduler.enqueue(buffer(0.5));
    assert!((start - 2.0).abs() < 1e-9);

    // Cursor moved past the clock, so the next buffer chains instead.
    let start = scheduler.enqueue(buffer(0.5));
    assert!((start - 2.5).abs() < 1e-9);
    assert_eq!(output.scheduled().len(), 2);
}

#[test]
fn test_late_arrival_after_playback_caught_up() {
    let (mut scheduler, clock, _output) = scheduler();

    scheduler.enqueue(buffer(0.5));
    assert!((scheduler.next_start_time() - 0.5).abs() < 1e-9);

    // A long silence: the clock overtakes the cursor.
    clock.set(10.0);
    let start = scheduler.enqueue(buffer(0.5));
    assert!((start - 10.0).abs() < 1e-9);
}

#[test]
fn test_interruption_flushes_everything() {
    let (mut scheduler, clock, output) = scheduler();

    scheduler.enqueue(buffer(1.0));
    scheduler.enqueue(buffer(1.0));
    assert_eq!(scheduler.active_count(), 2);

    clock.set(0.25);
    scheduler.flush();

    assert_eq!(scheduler.active_count(), 0);
    assert!(output.scheduled().iter().all(|entry| entry.stopped));

    // The cursor resets, so the next turn starts at the current clock.
    assert_eq!(scheduler.next_start_time(), 0.0);
    let start = scheduler.enqueue(buffer(0.5));
    assert!((start - 0.25).abs() < 1e-9);
}

#[test]
fn test_oneshot_does_not_move_the_cursor() {
    let (mut scheduler, clock, output) = scheduler();

    clock.set(1.0);
    scheduler.play_oneshot(buffer(3.0));
    assert_eq!(scheduler.next_start_time(), 0.0);

    // The streamed sequence is unaffected by the greeting.
    let start = scheduler.enqueue(buffer(0.5));
    assert!((start - 1.0).abs() < 1e-9);

    // But a barge-in silences the greeting too.
    scheduler.flush();
    assert!(output.scheduled().iter().all(|entry| entry.stopped));
}
