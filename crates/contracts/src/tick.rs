//! TickSource - per-frame world tick event
//!
//! The simulator invokes every registered handler once per tick, possibly on a
//! thread the sensor does not control.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// World state delivered with every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Episode the snapshot belongs to
    pub episode_id: u64,

    /// Tick timestamp
    pub timestamp: Timestamp,
}

impl WorldSnapshot {
    pub fn new(episode_id: u64, timestamp: Timestamp) -> Self {
        Self {
            episode_id,
            timestamp,
        }
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }
}

/// Handle returned by [`TickSource::register_on_tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick-sub-{}", self.0)
    }
}

/// Tick handler type
///
/// Uses `Arc` so the source can invoke handlers outside its own locks.
pub type TickHandler = Arc<dyn Fn(&WorldSnapshot) + Send + Sync>;

/// Per-frame tick event source
pub trait TickSource: Send + Sync {
    /// Register a handler, invoked once per tick until unregistered
    fn register_on_tick(&self, handler: TickHandler) -> SubscriptionId;

    /// Remove a handler
    ///
    /// Idempotent: unknown ids are ignored.
    fn unregister_on_tick(&self, id: SubscriptionId);
}
