//! RssSensor - listen / stop lifecycle
//!
//! States: Idle -> Listening -> Idle.
//!
//! The listening session lives behind an `RwLock`. Ticks take a non-blocking
//! read lock for the duration of one evaluation; `listen` and `stop` take the
//! write lock. Once `stop` returns, no evaluation can start, and the observer
//! callback always runs with the lock released.

use std::sync::{Arc, PoisonError, RwLock, TryLockError};

use contracts::{
    DynamicsProfile, DynamicsRole, RssResponse, RssSensorConfig, SafetyEvaluator,
    SubscriptionId, TickSource, WorldAccess, WorldSnapshot,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::dispatcher::{TickDispatcher, TickTarget};
use crate::dynamics::DynamicsStore;
use crate::error::{Result, SensorError};
use crate::evaluator::{EvaluationBackend, TickEvaluator};
use crate::stats::{SensorStats, StatsSnapshot};

pub use crate::dispatcher::ResponseCallback;

/// Active listening session
struct Session {
    evaluator: TickEvaluator,
    subscription: SubscriptionId,
}

/// State shared between the sensor handle and its tick subscription
struct SensorShared {
    config: RssSensorConfig,
    tick_source: Arc<dyn TickSource>,
    backend: EvaluationBackend,
    session: RwLock<Option<Session>>,
}

impl TickTarget for SensorShared {
    fn on_tick(&self, snapshot: &WorldSnapshot) -> Option<RssResponse> {
        let session = match self.session.try_read() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                trace!(
                    sensor_id = %self.config.id,
                    frame = snapshot.timestamp.frame,
                    "lifecycle transition in progress, tick ignored"
                );
                return None;
            }
        };

        let response = session.as_ref()?.evaluator.evaluate(snapshot.timestamp());
        if response.is_some() {
            self.backend.stats.inc_emitted();
        }
        response
    }
}

impl Drop for SensorShared {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = session {
            self.tick_source.unregister_on_tick(session.subscription);
            debug!(
                sensor_id = %self.config.id,
                subscription = %session.subscription,
                "sensor dropped while listening, subscription removed"
            );
        }
    }
}

/// Tick-synchronized RSS sensor
pub struct RssSensor {
    shared: Arc<SensorShared>,
}

impl RssSensor {
    /// Sensor with default dynamics profiles
    pub fn new(
        config: RssSensorConfig,
        world: Arc<dyn WorldAccess>,
        tick_source: Arc<dyn TickSource>,
        checker: Arc<dyn SafetyEvaluator>,
    ) -> Self {
        Self::with_dynamics(config, DynamicsStore::default(), world, tick_source, checker)
    }

    pub fn with_dynamics(
        config: RssSensorConfig,
        dynamics: DynamicsStore,
        world: Arc<dyn WorldAccess>,
        tick_source: Arc<dyn TickSource>,
        checker: Arc<dyn SafetyEvaluator>,
    ) -> Self {
        let backend = EvaluationBackend {
            world,
            checker,
            dynamics: Arc::new(dynamics),
            stats: Arc::new(SensorStats::new()),
        };

        Self {
            shared: Arc::new(SensorShared {
                config,
                tick_source,
                backend,
                session: RwLock::new(None),
            }),
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.shared.config.id
    }

    pub fn config(&self) -> &RssSensorConfig {
        &self.shared.config
    }

    pub fn is_listening(&self) -> bool {
        self.shared
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Counters accumulated over the sensor's lifetime
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.backend.stats.snapshot()
    }

    /// Start evaluating on every world tick
    ///
    /// Fails with [`SensorError::AlreadyListening`] if a session is active
    /// (the session is left untouched) and with [`SensorError::NotAttached`]
    /// if the sensor has no parent actor.
    #[instrument(skip(self, callback), fields(sensor_id = %self.shared.config.id))]
    pub fn listen(&self, callback: ResponseCallback) -> Result<()> {
        let shared = &self.shared;
        let mut session = shared
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(active) = session.as_ref() {
            warn!(
                subscription = %active.subscription,
                "listen called while already listening"
            );
            return Err(SensorError::already_listening(&shared.config.id));
        }

        let Some(ego) = shared.config.parent_actor else {
            warn!("listen called on a sensor without parent actor");
            return Err(SensorError::not_attached(&shared.config.id));
        };

        let map = shared.backend.world.map();
        let evaluator = TickEvaluator::new(&shared.config, ego, map, shared.backend.clone());
        let subscription =
            TickDispatcher::attach(shared.tick_source.as_ref(), Arc::downgrade(shared), callback);

        info!(
            ego,
            map = %evaluator.map().name,
            subscription = %subscription,
            actor_filter = %shared.config.actor_filter,
            "RSS sensor listening"
        );
        *session = Some(Session {
            evaluator,
            subscription,
        });
        Ok(())
    }

    /// Stop listening and remove the tick subscription
    ///
    /// Blocks until an in-flight evaluation finishes. No-op when idle.
    #[instrument(skip(self), fields(sensor_id = %self.shared.config.id))]
    pub fn stop(&self) {
        let session = self
            .shared
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match session {
            Some(session) => {
                self.shared
                    .tick_source
                    .unregister_on_tick(session.subscription);
                let stats = self.stats();
                info!(
                    subscription = %session.subscription,
                    ticks = stats.ticks,
                    evaluated = stats.evaluated,
                    skipped = stats.skipped,
                    faulted = stats.faulted,
                    "RSS sensor stopped"
                );
            }
            None => debug!("stop called while idle"),
        }
    }

    pub fn dynamics(&self, role: DynamicsRole) -> DynamicsProfile {
        self.shared.backend.dynamics.get(role)
    }

    /// Replace a dynamics profile; the next evaluation sees it
    pub fn set_dynamics(&self, role: DynamicsRole, profile: DynamicsProfile) {
        debug!(sensor_id = %self.shared.config.id, ?role, "dynamics profile replaced");
        self.shared.backend.dynamics.set(role, profile);
    }

    pub fn ego_dynamics(&self) -> DynamicsProfile {
        self.dynamics(DynamicsRole::Ego)
    }

    pub fn set_ego_dynamics(&self, profile: DynamicsProfile) {
        self.set_dynamics(DynamicsRole::Ego, profile);
    }

    pub fn other_dynamics(&self) -> DynamicsProfile {
        self.dynamics(DynamicsRole::Other)
    }

    pub fn set_other_dynamics(&self, profile: DynamicsProfile) {
        self.set_dynamics(DynamicsRole::Other, profile);
    }
}

impl std::fmt::Debug for RssSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RssSensor")
            .field("id", &self.shared.config.id)
            .field("parent_actor", &self.shared.config.parent_actor)
            .field("listening", &self.is_listening())
            .finish()
    }
}
