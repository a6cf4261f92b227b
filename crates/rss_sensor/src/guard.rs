//! EvaluationGuard - single-flight, drop-if-busy lock
//!
//! A compare-and-swap flag instead of a blocking mutex: the tick thread must
//! never wait for a previous check to finish. Release happens when the
//! [`EvaluationPermit`] is dropped, so every exit path (including unwinding)
//! releases exactly once and an unmatched release cannot be expressed.

use std::sync::atomic::{AtomicBool, Ordering};

/// Non-blocking try-lock guarding the RSS check
#[derive(Debug, Default)]
pub struct EvaluationGuard {
    held: AtomicBool,
}

impl EvaluationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the guard without blocking
    ///
    /// Returns None if a check is already in flight.
    pub fn try_acquire(&self) -> Option<EvaluationPermit<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| EvaluationPermit { guard: self })
    }

    /// True while a permit is alive
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}

/// Proof of a successful [`EvaluationGuard::try_acquire`]
///
/// Releases the guard on drop.
#[derive(Debug)]
#[must_use = "dropping the permit releases the guard immediately"]
pub struct EvaluationPermit<'a> {
    guard: &'a EvaluationGuard,
}

impl Drop for EvaluationPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::AtomicU64;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let guard = EvaluationGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let guard = EvaluationGuard::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _permit = guard.try_acquire().unwrap();
            panic!("check exploded");
        }));
        assert!(result.is_err());
        assert!(!guard.is_held());
    }

    #[test]
    fn test_single_flight_across_threads() {
        let guard = Arc::new(EvaluationGuard::new());
        let winners = Arc::new(AtomicU64::new(0));
        let start = Arc::new(Barrier::new(8));
        let done = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let winners = Arc::clone(&winners);
                let start = Arc::clone(&start);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    start.wait();
                    let permit = guard.try_acquire();
                    if permit.is_some() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    // Hold the permit until every thread has tried
                    done.wait();
                    drop(permit);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(!guard.is_held());
    }
}
