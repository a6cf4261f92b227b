//! TickEvaluator - one RSS check per tick
//!
//! Flow for a tick:
//! 1. try-acquire the [`EvaluationGuard`]; if busy, take the skip path
//! 2. gather the filtered actor snapshot and run the RSS check
//! 3. release the guard (permit drop), absorbing any fault or panic
//! 4. translate the verdict into an [`RssResponse`] stamped with the tick
//!
//! A fault yields no response. A skipped tick yields a response built from
//! the default verdict unless the skip policy suppresses it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    ActorId, DynamicsRole, EvaluationFault, EvaluationRequest, MapContext, RssResponse,
    RssSensorConfig, SafetyEvaluator, SafetyVerdict, SkipPolicy, Timestamp, WorldAccess,
};
use tracing::{error, trace};

use crate::dynamics::DynamicsStore;
use crate::guard::EvaluationGuard;
use crate::stats::SensorStats;
use crate::translator::ResponseTranslator;

/// Collaborators a sensor evaluates against
#[derive(Clone)]
pub struct EvaluationBackend {
    pub world: Arc<dyn WorldAccess>,
    pub checker: Arc<dyn SafetyEvaluator>,
    pub dynamics: Arc<DynamicsStore>,
    pub stats: Arc<SensorStats>,
}

/// Per-session evaluation state
pub struct TickEvaluator {
    sensor_id: String,
    ego: ActorId,
    actor_filter: String,
    visualize_results: bool,
    skip_policy: SkipPolicy,
    map: MapContext,
    backend: EvaluationBackend,
    guard: EvaluationGuard,
}

impl TickEvaluator {
    pub fn new(
        config: &RssSensorConfig,
        ego: ActorId,
        map: MapContext,
        backend: EvaluationBackend,
    ) -> Self {
        Self {
            sensor_id: config.id.clone(),
            ego,
            actor_filter: config.actor_filter.clone(),
            visualize_results: config.visualize_results,
            skip_policy: config.skip_policy,
            map,
            backend,
            guard: EvaluationGuard::new(),
        }
    }

    pub fn ego(&self) -> ActorId {
        self.ego
    }

    pub fn map(&self) -> &MapContext {
        &self.map
    }

    /// True while a check is in flight
    pub fn is_busy(&self) -> bool {
        self.guard.is_held()
    }

    /// Run (or skip) the RSS check for one tick
    pub fn evaluate(&self, timestamp: &Timestamp) -> Option<RssResponse> {
        let stats = &self.backend.stats;
        stats.inc_ticks();
        observability::record_tick_received(&self.sensor_id, timestamp.frame);

        let verdict = match self.guard.try_acquire() {
            Some(permit) => {
                let outcome = self.run_check(timestamp);
                drop(permit);

                match outcome {
                    Ok(verdict) => {
                        stats.inc_evaluated();
                        verdict
                    }
                    Err(fault) => {
                        stats.inc_faulted();
                        observability::record_evaluation_fault(&self.sensor_id, fault_kind(&fault));
                        error!(
                            sensor_id = %self.sensor_id,
                            frame = timestamp.frame,
                            error = %fault,
                            "RSS check failed, dropping tick"
                        );
                        return None;
                    }
                }
            }
            None => {
                stats.inc_skipped();
                observability::record_tick_skipped(&self.sensor_id);
                trace!(
                    sensor_id = %self.sensor_id,
                    frame = timestamp.frame,
                    policy = ?self.skip_policy,
                    "RSS check still in flight, skipping tick"
                );
                if self.skip_policy == SkipPolicy::Suppress {
                    return None;
                }
                SafetyVerdict::default()
            }
        };

        let pose = self
            .backend
            .world
            .actor_transform(self.ego)
            .unwrap_or_default();

        match ResponseTranslator::translate(&verdict, timestamp, pose) {
            Ok(response) => {
                observability::record_response(&self.sensor_id, &response);
                Some(response)
            }
            Err(e) => {
                stats.inc_faulted();
                observability::record_evaluation_fault(&self.sensor_id, "translation");
                error!(
                    sensor_id = %self.sensor_id,
                    frame = timestamp.frame,
                    error = %e,
                    "RSS verdict could not be translated"
                );
                None
            }
        }
    }

    /// Gather the actor snapshot and call the checker; caller holds the guard
    fn run_check(&self, timestamp: &Timestamp) -> Result<SafetyVerdict, EvaluationFault> {
        let started = Instant::now();
        let world = self.backend.world.as_ref();

        let actors = world.actors().filter(&self.actor_filter);
        let ego_dynamics = self.backend.dynamics.get(DynamicsRole::Ego);
        let other_dynamics = self.backend.dynamics.get(DynamicsRole::Other);

        let request = EvaluationRequest {
            timestamp: *timestamp,
            world,
            actors: &actors,
            ego: self.ego,
            map: &self.map,
            ego_dynamics: &ego_dynamics,
            other_dynamics: &other_dynamics,
            visualize_results: self.visualize_results,
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.backend.checker.check_objects(&request)
        }))
        .unwrap_or_else(|payload| {
            Err(EvaluationFault::Panicked {
                message: panic_message(payload.as_ref()),
            })
        });

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Ok(verdict) = &result {
            observability::record_evaluation(&self.sensor_id, duration_ms, verdict.success);
            trace!(
                sensor_id = %self.sensor_id,
                frame = timestamp.frame,
                actors = actors.len(),
                duration_ms,
                safe = verdict.proper_response.is_safe,
                "RSS check completed"
            );
        }

        result
    }
}

fn fault_kind(fault: &EvaluationFault) -> &'static str {
    match fault {
        EvaluationFault::CheckFailed { .. } => "check_failed",
        EvaluationFault::EgoNotFound { .. } => "ego_not_found",
        EvaluationFault::Panicked { .. } => "panicked",
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
