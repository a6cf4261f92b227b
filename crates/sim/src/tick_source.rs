//! Manual tick source
//!
//! Implements `TickSource`. Ticks are fired explicitly with [`ManualTickSource::fire`]
//! or by a background ticker thread, consistent with the simulator invoking
//! handlers on its own thread.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{SubscriptionId, TickHandler, TickSource, Timestamp, WorldSnapshot};
use tracing::{debug, trace};

use crate::MockWorld;

/// Tick source driven by the caller
pub struct ManualTickSource {
    episode_id: u64,
    next_subscription: AtomicU64,
    handlers: Mutex<BTreeMap<SubscriptionId, TickHandler>>,
    last: Mutex<Timestamp>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::with_episode(0)
    }

    pub fn with_episode(episode_id: u64) -> Self {
        Self {
            episode_id,
            next_subscription: AtomicU64::new(1),
            handlers: Mutex::new(BTreeMap::new()),
            last: Mutex::new(Timestamp::default()),
        }
    }

    fn handler_map(&self) -> MutexGuard<'_, BTreeMap<SubscriptionId, TickHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registered handlers
    pub fn subscription_count(&self) -> usize {
        self.handler_map().len()
    }

    /// Clones of the registered handlers, in registration order
    ///
    /// A handler clone keeps working after it is unregistered, like a tick
    /// already in flight in the simulator.
    pub fn handlers(&self) -> Vec<TickHandler> {
        self.handler_map().values().cloned().collect()
    }

    /// Timestamp of the most recent tick
    pub fn last_timestamp(&self) -> Timestamp {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invoke every registered handler on the calling thread
    ///
    /// Handlers run outside the registry lock, so a handler may register or
    /// unregister subscriptions (its own included).
    pub fn fire(&self, timestamp: Timestamp) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = timestamp;
        let snapshot = WorldSnapshot::new(self.episode_id, timestamp);
        let handlers = self.handlers();

        trace!(frame = timestamp.frame, handlers = handlers.len(), "tick");
        for handler in handlers {
            handler(&snapshot);
        }
    }

    /// Fire the tick following the last one
    pub fn step(&self, delta_seconds: f64) -> Timestamp {
        let timestamp = self.last_timestamp().next(delta_seconds);
        self.fire(timestamp);
        timestamp
    }

    /// Fire ticks from a background thread every `interval`
    pub fn spawn_ticker(self: &Arc<Self>, interval: Duration, delta_seconds: f64) -> TickerHandle {
        self.spawn_ticker_with(
            TickerConfig {
                interval,
                delta_seconds,
                max_ticks: None,
            },
            None,
        )
    }

    /// Background ticker; advances `world` before each tick if given
    pub fn spawn_ticker_with(
        self: &Arc<Self>,
        config: TickerConfig,
        world: Option<Arc<MockWorld>>,
    ) -> TickerHandle {
        let running = Arc::new(AtomicBool::new(true));
        let source = Arc::clone(self);
        let flag = Arc::clone(&running);

        let join = thread::spawn(move || {
            debug!(
                interval_ms = config.interval.as_millis() as u64,
                delta_seconds = config.delta_seconds,
                max_ticks = ?config.max_ticks,
                "ticker started"
            );
            let mut fired = 0u64;

            while flag.load(Ordering::Relaxed) {
                if config.max_ticks.is_some_and(|max| fired >= max) {
                    break;
                }
                if let Some(world) = &world {
                    world.advance(config.delta_seconds);
                }
                source.step(config.delta_seconds);
                fired += 1;
                thread::sleep(config.interval);
            }

            flag.store(false, Ordering::SeqCst);
            debug!(fired, "ticker stopped");
            fired
        });

        TickerHandle {
            running,
            join: Some(join),
        }
    }
}

/// Background ticker settings
#[derive(Debug, Clone, Copy)]
pub struct TickerConfig {
    /// Wall-clock pause between ticks
    pub interval: Duration,
    /// Simulated seconds per tick
    pub delta_seconds: f64,
    /// Stop after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for ManualTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for ManualTickSource {
    fn register_on_tick(&self, handler: TickHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.handler_map().insert(id, handler);
        debug!(subscription = %id, "tick handler registered");
        id
    }

    fn unregister_on_tick(&self, id: SubscriptionId) {
        if self.handler_map().remove(&id).is_some() {
            debug!(subscription = %id, "tick handler unregistered");
        }
    }
}

/// Background ticker; stopped and joined on [`TickerHandle::stop`] or drop
pub struct TickerHandle {
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<u64>>,
}

impl TickerHandle {
    /// False once stopped or after reaching `max_ticks`
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the ticker and wait for it; returns the number of ticks fired
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.running.store(false, Ordering::SeqCst);
        self.join
            .take()
            .and_then(|join| join.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
