//! RSS session - wires world, tick source, sensor and sinks together.
//!
//! The world is simulated: actors come from the blueprint and move at their
//! configured velocity, a background ticker plays the simulator's tick thread
//! and the kinematic evaluator stands in for the RSS library.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use contracts::{RssResponse, RssSensorBlueprint};
use observability::ResponseMetricsAggregator;
use rss_sensor::{DynamicsStore, ResponseCallback, RssSensor, StatsSnapshot};
use sim::{KinematicEvaluator, ManualTickSource, MockWorld, TickerConfig, TickerHandle};
use sinks::SinkFanout;
use tokio::runtime::Handle;
use tracing::{info, warn};

use super::{EndReason, SessionStats};
use crate::error::CliError;

/// How often the session checks whether the ticker has finished
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The sensor blueprint (CLI overrides already applied)
    pub blueprint: RssSensorBlueprint,

    /// Number of world ticks to run (None = unlimited)
    pub max_ticks: Option<u64>,

    /// Session timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One listening session of the RSS sensor
pub struct RssSession {
    config: SessionConfig,
}

impl RssSession {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run until the tick limit, the timeout or `shutdown` resolves
    ///
    /// The sensor is stopped and every sink drained before returning,
    /// whichever way the session ends.
    pub async fn run<F>(self, shutdown: F) -> Result<SessionStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Simulated world
        let world = Arc::new(MockWorld::from_blueprint(blueprint));
        let ticks = Arc::new(ManualTickSource::with_episode(blueprint.world.episode_id));
        info!(
            map = %blueprint.world.map,
            actors = world.actor_count(),
            tick_interval_ms = blueprint.world.tick_interval_ms,
            "Simulated world ready"
        );

        // Sinks
        let fanout = Arc::new(
            SinkFanout::from_configs(&Handle::current(), &blueprint.sinks).map_err(CliError::from)?,
        );
        if fanout.is_empty() {
            warn!("No sinks configured - responses are only summarized");
        }

        // Sensor
        let sensor = RssSensor::with_dynamics(
            blueprint.sensor.clone(),
            DynamicsStore::from_config(&blueprint.dynamics),
            world.clone(),
            ticks.clone(),
            Arc::new(KinematicEvaluator::new()),
        );

        let aggregator = Arc::new(Mutex::new(ResponseMetricsAggregator::new()));
        let callback: ResponseCallback = {
            let fanout = Arc::clone(&fanout);
            let aggregator = Arc::clone(&aggregator);
            Arc::new(move |response: RssResponse| {
                aggregator
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .update(&response);
                fanout.publish(&response);
            })
        };
        sensor.listen(callback).map_err(CliError::from)?;

        let ticker = ticks.spawn_ticker_with(
            TickerConfig {
                interval: Duration::from_millis(blueprint.world.tick_interval_ms),
                delta_seconds: blueprint.tick_interval_secs(),
                max_ticks: self.config.max_ticks,
            },
            Some(Arc::clone(&world)),
        );

        let end_reason = self.wait_for_end(&ticker, shutdown).await;
        info!(reason = %end_reason, "Stopping RSS session");

        // sensor.stop() waits for an in-flight check, keep it off the runtime
        let (sensor_stats, ticks_fired) =
            tokio::task::spawn_blocking(move || stop_sensor_and_ticker(sensor, ticker))
                .await
                .map_err(|e| CliError::shutdown(format!("ticker thread failed: {e}")))?;

        let sinks = match Arc::try_unwrap(fanout) {
            Ok(fanout) => fanout.shutdown().await,
            Err(fanout) => {
                warn!("Sink fan-out still referenced, skipping drain");
                fanout.metrics()
            }
        };

        let responses = aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary();

        Ok(SessionStats {
            ticks_fired,
            sensor: sensor_stats,
            duration: start_time.elapsed(),
            end_reason,
            responses,
            sinks,
        })
    }

    async fn wait_for_end<F>(&self, ticker: &TickerHandle, shutdown: F) -> EndReason
    where
        F: Future<Output = ()>,
    {
        let ticker_done = async {
            let mut poll = tokio::time::interval(POLL_INTERVAL);
            while ticker.is_running() {
                poll.tick().await;
            }
        };

        let deadline = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = ticker_done => EndReason::TickLimit,
            _ = deadline => EndReason::Timeout,
            _ = shutdown => EndReason::Signal,
        }
    }
}

/// Stop the sensor, then the ticker
///
/// The sensor goes first so no evaluation starts once this begins.
/// Returns the final sensor stats and the number of ticks fired.
fn stop_sensor_and_ticker(sensor: RssSensor, ticker: TickerHandle) -> (StatsSnapshot, u64) {
    sensor.stop();
    let ticks_fired = ticker.stop();
    let stats = sensor.stats();
    (stats, ticks_fired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ActorConfig, SinkConfig, SinkType, Transform, Vector3};
    use sim::ScriptedEvaluator;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn blueprint(parent: Option<u32>) -> RssSensorBlueprint {
        let mut bp = RssSensorBlueprint::minimal("rss_cli_test", "Town04");
        bp.world.tick_interval_ms = 1;
        bp.sensor.parent_actor = parent;
        bp.actors = vec![
            ActorConfig {
                id: 1,
                type_id: "vehicle.tesla.model3".into(),
                transform: Transform::at(0.0, 0.0, 0.0),
                velocity: Vector3 {
                    x: 20.0,
                    y: 0.0,
                    z: 0.0,
                },
            },
            ActorConfig {
                id: 2,
                type_id: "vehicle.audi.tt".into(),
                transform: Transform::at(15.0, 0.0, 0.0),
                velocity: Vector3::default(),
            },
        ];
        bp
    }

    fn config(blueprint: RssSensorBlueprint, max_ticks: Option<u64>) -> SessionConfig {
        SessionConfig {
            blueprint,
            max_ticks,
            timeout: Some(Duration::from_secs(30)),
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_session_runs_to_tick_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("responses.jsonl");
        let mut bp = blueprint(Some(1));
        bp.sinks.push(SinkConfig {
            name: "file".into(),
            sink_type: SinkType::File,
            queue_capacity: 64,
            params: HashMap::from([("path".to_string(), path.display().to_string())]),
        });

        let stats = RssSession::new(config(bp, Some(5)))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.end_reason, EndReason::TickLimit);
        assert_eq!(stats.ticks_fired, 5);
        assert_eq!(stats.sensor.ticks, 5);
        assert_eq!(stats.sensor.emitted, 5);
        assert_eq!(stats.responses.total_responses, 5);
        // Ego closes in on a stopped vehicle 15 m ahead
        assert!(stats.responses.requiring_action > 0);

        assert_eq!(stats.sinks.len(), 1);
        assert_eq!(stats.sinks[0].1.written, 5);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 5);
    }

    #[tokio::test]
    async fn test_unattached_sensor_fails_to_start() {
        let err = RssSession::new(config(blueprint(None), Some(5)))
            .run(std::future::pending())
            .await
            .unwrap_err();

        let cli_error = err.downcast_ref::<CliError>().unwrap();
        assert!(matches!(cli_error, CliError::Sensor(_)));
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_session() {
        let stats = RssSession::new(config(blueprint(Some(1)), None))
            .run(tokio::time::sleep(Duration::from_millis(30)))
            .await
            .unwrap();

        assert_eq!(stats.end_reason, EndReason::Signal);
        // Ticks fired between sensor stop and ticker stop are not evaluated
        assert!(stats.sensor.ticks <= stats.ticks_fired);
        assert_eq!(stats.sensor.ticks, stats.responses.total_responses);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_stop_with_check_in_flight_leaves_runtime_free() {
        let bp = blueprint(Some(1));
        let world = Arc::new(MockWorld::from_blueprint(&bp));
        let ticks = Arc::new(ManualTickSource::new());
        let checker = Arc::new(ScriptedEvaluator::new());
        let gate = checker.hold_next();
        let sensor = RssSensor::new(bp.sensor.clone(), world, ticks.clone(), checker.clone());
        sensor.listen(Arc::new(|_response: RssResponse| {})).unwrap();
        let ticker = ticks.spawn_ticker(Duration::from_millis(1), 0.01);

        let entered = gate.clone();
        tokio::task::spawn_blocking(move || entered.wait_entered())
            .await
            .unwrap();

        let stopping =
            tokio::task::spawn_blocking(move || stop_sensor_and_ticker(sensor, ticker));
        // Timers still fire while stop waits for the held check
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!stopping.is_finished());
        gate.release();

        let (stats, ticks_fired) = stopping.await.unwrap();
        assert_eq!(checker.call_count(), 1);
        assert!(stats.ticks <= ticks_fired);
    }
}
