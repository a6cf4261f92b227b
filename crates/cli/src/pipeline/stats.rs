//! Session statistics.

use std::fmt;
use std::time::Duration;

use observability::MetricsSummary;
use rss_sensor::StatsSnapshot;
use sinks::MetricsSnapshot;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The configured number of ticks was fired
    TickLimit,
    /// The session timeout elapsed
    Timeout,
    /// Ctrl+C / SIGTERM
    Signal,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TickLimit => "tick limit reached",
            Self::Timeout => "timeout",
            Self::Signal => "shutdown signal",
        };
        f.write_str(text)
    }
}

/// Statistics from a session run
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Ticks fired by the simulated world
    pub ticks_fired: u64,

    /// Sensor counters at stop
    pub sensor: StatsSnapshot,

    /// Total duration of the session
    pub duration: Duration,

    pub end_reason: EndReason,

    /// Aggregated responses seen by the callback
    pub responses: MetricsSummary,

    /// Final counters per sink
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl SessionStats {
    /// Ticks per wall-clock second
    pub fn tick_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks_fired as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of handled ticks that found a check in flight, as percentage
    pub fn skip_rate(&self) -> f64 {
        if self.sensor.ticks > 0 {
            self.sensor.skipped as f64 / self.sensor.ticks as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== RSS Session Statistics ===\n");

        println!("Overview");
        println!("  Ended by: {}", self.end_reason);
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Ticks fired: {}", self.ticks_fired);
        println!("  Tick rate: {:.2}/s", self.tick_rate());

        println!("\nSensor");
        println!("  Ticks handled: {}", self.sensor.ticks);
        println!("  Checks completed: {}", self.sensor.evaluated);
        println!(
            "  Ticks skipped: {} ({:.2}%)",
            self.sensor.skipped,
            self.skip_rate()
        );
        println!("  Checks faulted: {}", self.sensor.faulted);
        println!("  Responses emitted: {}", self.sensor.emitted);

        println!("\n{}", self.responses);

        if !self.sinks.is_empty() {
            println!("Sinks");
            for (name, metrics) in &self.sinks {
                println!("  {name}: {metrics}");
            }
        }

        println!();
    }
}
