use std::time::Duration;

use rand::Rng;

/// Maximum consecutive reconnect attempts before giving up.
pub const MAX_RETRIES: u32 = 5;

/// Exponential backoff with jitter for reconnect attempts.
///
/// Delay for attempt *n* (0-indexed) is
/// `min(base * 2^n, max_delay) + random(0..jitter)`, spreading retries so a
/// fleet of clients does not hammer the service in lockstep.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Compute the delay before the given attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let capped_ms = base_ms
            .saturating_mul(1u64 << attempt.min(32))
            .min(self.max_delay.as_millis() as u64);

        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };

        Duration::from_millis(capped_ms + jitter)
    }

    /// Upper bound on any delay this policy can produce.
    pub fn max_possible_delay(&self) -> Duration {
        self.max_delay + self.max_jitter
    }
}

/// Consecutive-failure counter compared against the policy ceiling.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    attempts: u32,
}

impl RetryState {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempts >= policy.max_attempts
    }

    /// Record the start of an attempt; returns its 0-indexed number.
    pub fn begin_attempt(&mut self) -> u32 {
        let attempt = self.attempts;
        self.attempts += 1;
        attempt
    }

    /// Any successful open resets the counter.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
