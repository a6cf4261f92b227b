//! Per-sink delivery counters
//!
//! Every response offered to a sink ends up in exactly one of: dropped
//! (queue full or worker gone), written, or failed.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Delivery counters for one sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    queue_len: AtomicUsize,
    accepted: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Response entered the queue
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            accepted: self.accepted(),
            written: self.written(),
            failed: self.failed(),
            dropped: self.dropped(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub accepted: u64,
    pub written: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl MetricsSnapshot {
    /// Accepted responses not yet written or failed
    pub fn pending(&self) -> u64 {
        self.accepted.saturating_sub(self.written + self.failed)
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "accepted={}, written={}, failed={}, dropped={}",
            self.accepted, self.written, self.failed, self.dropped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_pending() {
        let metrics = SinkMetrics::new();
        for _ in 0..4 {
            metrics.record_accepted();
        }
        metrics.record_written();
        metrics.record_failed();
        metrics.record_dropped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pending(), 2);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(
            snapshot.to_string(),
            "accepted=4, written=1, failed=1, dropped=1"
        );
    }
}
