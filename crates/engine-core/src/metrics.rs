use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    attempts_sent: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    attempt_failures: AtomicU64,
    retry_count: AtomicU64,
    timeout_count: AtomicU64,
    dry_skipped: AtomicU64,
}

/// Dispatcher counters. Cheap to clone; clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub attempts_sent: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub attempt_failures: u64,
    pub retry_count: u64,
    pub timeout_count: u64,
    pub dry_skipped: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_attempts(&self, count: u64) {
        self.inner.attempts_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_succeeded(&self, count: u64) {
        self.inner.succeeded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failed(&self, count: u64) {
        self.inner.failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_attempt_failures(&self, count: u64) {
        self.inner
            .attempt_failures
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_timeouts(&self, count: u64) {
        self.inner.timeout_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_dry_skipped(&self, count: u64) {
        self.inner.dry_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts_sent: self.inner.attempts_sent.load(Ordering::Relaxed),
            succeeded: self.inner.succeeded.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            attempt_failures: self.inner.attempt_failures.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
            timeout_count: self.inner.timeout_count.load(Ordering::Relaxed),
            dry_skipped: self.inner.dry_skipped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
