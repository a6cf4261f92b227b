//! Per-sensor evaluation counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated from the tick thread
#[derive(Debug, Default)]
pub struct SensorStats {
    ticks: AtomicU64,
    evaluated: AtomicU64,
    skipped: AtomicU64,
    faulted: AtomicU64,
    emitted: AtomicU64,
}

impl SensorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_evaluated(&self) {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_faulted(&self) {
        self.faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            evaluated: self.evaluated.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sensor counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Ticks handled while listening
    pub ticks: u64,
    /// Checks that ran to completion
    pub evaluated: u64,
    /// Ticks dropped because a check was in flight
    pub skipped: u64,
    /// Checks that failed or panicked
    pub faulted: u64,
    /// Responses handed to the observer
    pub emitted: u64,
}
