use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(500);

/// Bounded retry with a per-attempt deadline and a fixed wait between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_interval: Duration, timeout: Duration) -> Self {
        Self {
            max_retries,
            retry_interval,
            timeout,
        }
    }

    /// Whether another attempt follows once attempt number `attempt`
    /// (1-based) has failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// The wait before the next attempt. Fixed, independent of the attempt.
    pub fn backoff_delay(&self, _attempt: u32) -> Duration {
        self.retry_interval
    }
}
