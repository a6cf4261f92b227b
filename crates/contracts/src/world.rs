//! WorldAccess - actor and map lookups
//!
//! Cheap, synchronous and non-failing from the sensor's point of view.

use serde::{Deserialize, Serialize};

use crate::{ActorId, ActorList, Transform};

/// Map context captured when a session starts listening
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapContext {
    /// Map name, e.g. "Town04"
    pub name: String,
}

impl MapContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Read access to the simulated world
pub trait WorldAccess: Send + Sync {
    /// Map currently loaded in the world
    fn map(&self) -> MapContext;

    /// All actors currently alive
    fn actors(&self) -> ActorList;

    /// Current pose of an actor, None if it no longer exists
    fn actor_transform(&self, actor_id: ActorId) -> Option<Transform>;
}
