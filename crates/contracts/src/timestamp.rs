//! Timestamp - per-tick simulation clock
//!
//! Supplied by the tick source with every world snapshot.

use serde::{Deserialize, Serialize};

/// CARLA simulation timestamp
///
/// `frame` and `elapsed_seconds` are the primary clock. `delta_seconds` and
/// `platform_timestamp` are informational and never drive ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    /// Frame index since the simulator started
    pub frame: u64,

    /// Simulated seconds elapsed since the episode began
    pub elapsed_seconds: f64,

    /// Simulated seconds since the previous tick
    #[serde(default)]
    pub delta_seconds: f64,

    /// Wall-clock time of the OS when the tick was produced (seconds)
    #[serde(default)]
    pub platform_timestamp: f64,
}

impl Timestamp {
    /// Create a timestamp from frame index and elapsed seconds
    pub fn new(frame: u64, elapsed_seconds: f64) -> Self {
        Self {
            frame,
            elapsed_seconds,
            delta_seconds: 0.0,
            platform_timestamp: 0.0,
        }
    }

    /// Builder: set delta seconds
    pub fn with_delta(mut self, delta_seconds: f64) -> Self {
        self.delta_seconds = delta_seconds;
        self
    }

    /// Timestamp of the following frame, `delta_seconds` later
    pub fn next(&self, delta_seconds: f64) -> Self {
        Self {
            frame: self.frame + 1,
            elapsed_seconds: self.elapsed_seconds + delta_seconds,
            delta_seconds,
            platform_timestamp: self.platform_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_advances_frame_and_time() {
        let ts = Timestamp::new(41, 1.35);
        let next = ts.next(0.05);
        assert_eq!(next.frame, 42);
        assert!((next.elapsed_seconds - 1.4).abs() < 1e-9);
        assert_eq!(next.delta_seconds, 0.05);
    }
}
