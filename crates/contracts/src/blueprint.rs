//! RssSensorBlueprint - Config Loader output
//!
//! Describes one RSS sensor session: sensor settings, world, dynamics profiles,
//! the simulated actor population and the response sinks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{ActorId, ActorSnapshot, DynamicsProfile, Transform, Vector3};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete sensor configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RssSensorBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sensor settings
    #[validate(nested)]
    pub sensor: RssSensorConfig,

    /// World settings
    #[validate(nested)]
    pub world: WorldConfig,

    /// Ego / other dynamics profiles
    #[serde(default)]
    #[validate(nested)]
    pub dynamics: DynamicsConfig,

    /// Actors populating the simulated world
    #[serde(default)]
    #[validate(nested)]
    pub actors: Vec<ActorConfig>,

    /// Response sinks
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

/// RSS sensor settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RssSensorConfig {
    /// Sensor identifier (logs, metrics)
    #[validate(length(min = 1))]
    pub id: String,

    /// Actor the sensor is attached to; None = unattached
    #[serde(default)]
    pub parent_actor: Option<ActorId>,

    /// Blueprint pattern selecting the actors to check against
    #[serde(default = "default_actor_filter")]
    #[validate(length(min = 1))]
    pub actor_filter: String,

    /// Ask the evaluator to draw debug output
    #[serde(default)]
    pub visualize_results: bool,

    /// What to emit when a tick arrives while a check is still running
    #[serde(default)]
    pub skip_policy: SkipPolicy,
}

pub fn default_actor_filter() -> String {
    "vehicle.*".to_string()
}

impl RssSensorConfig {
    /// Sensor settings with defaults, attached to `parent_actor`
    pub fn new(id: impl Into<String>, parent_actor: Option<ActorId>) -> Self {
        Self {
            id: id.into(),
            parent_actor,
            actor_filter: default_actor_filter(),
            visualize_results: false,
            skip_policy: SkipPolicy::default(),
        }
    }
}

/// Behaviour for ticks that arrive while a check is in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Emit an unsuccessful response built from the default verdict
    #[default]
    EmitDefault,
    /// Emit nothing for the skipped tick
    Suppress,
}

/// World settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorldConfig {
    /// Map name (e.g., "Town04")
    #[validate(length(min = 1))]
    pub map: String,

    /// Fixed simulation step, in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    #[validate(range(min = 1))]
    pub tick_interval_ms: u64,

    /// Episode identifier stamped on world snapshots
    #[serde(default)]
    pub episode_id: u64,
}

fn default_tick_interval_ms() -> u64 {
    50
}

/// Dynamics profiles for both roles
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DynamicsConfig {
    #[serde(default = "DynamicsProfile::default_ego")]
    #[validate(nested)]
    pub ego: DynamicsProfile,

    #[serde(default = "DynamicsProfile::default_other")]
    #[validate(nested)]
    pub other: DynamicsProfile,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            ego: DynamicsProfile::default_ego(),
            other: DynamicsProfile::default_other(),
        }
    }
}

/// One actor of the simulated world
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActorConfig {
    pub id: ActorId,

    /// Blueprint type, e.g. "vehicle.tesla.model3"
    #[validate(length(min = 1))]
    pub type_id: String,

    #[serde(default)]
    pub transform: Transform,

    /// Constant velocity (m/s) applied every tick
    #[serde(default)]
    pub velocity: Vector3,
}

impl ActorConfig {
    pub fn to_snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            id: self.id,
            type_id: self.type_id.clone(),
            transform: self.transform,
            velocity: self.velocity,
        }
    }
}

/// Sink output config
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Type specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Tracing output
    Log,
    /// JSON lines file
    File,
}

impl RssSensorBlueprint {
    /// Blueprint with defaults for everything but the sensor id and map
    pub fn minimal(sensor_id: impl Into<String>, map: impl Into<String>) -> Self {
        Self {
            version: ConfigVersion::V1,
            sensor: RssSensorConfig::new(sensor_id, None),
            world: WorldConfig {
                map: map.into(),
                tick_interval_ms: default_tick_interval_ms(),
                episode_id: 0,
            },
            dynamics: DynamicsConfig::default(),
            actors: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Actor configured as the sensor's parent, if any
    pub fn parent_actor(&self) -> Option<&ActorConfig> {
        let parent = self.sensor.parent_actor?;
        self.actors.iter().find(|actor| actor.id == parent)
    }

    /// Tick interval in seconds
    pub fn tick_interval_secs(&self) -> f64 {
        self.world.tick_interval_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_blueprint_defaults() {
        let bp = RssSensorBlueprint::minimal("rss", "Town04");
        assert_eq!(bp.sensor.actor_filter, "vehicle.*");
        assert_eq!(bp.sensor.skip_policy, SkipPolicy::EmitDefault);
        assert!(bp.parent_actor().is_none());
        assert!((bp.tick_interval_secs() - 0.05).abs() < 1e-9);
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn test_parent_actor_lookup() {
        let mut bp = RssSensorBlueprint::minimal("rss", "Town04");
        bp.actors.push(ActorConfig {
            id: 7,
            type_id: "vehicle.audi.tt".into(),
            transform: Transform::at(1.0, 2.0, 0.0),
            velocity: Vector3::default(),
        });
        bp.sensor.parent_actor = Some(7);
        assert_eq!(bp.parent_actor().map(|a| a.id), Some(7));

        bp.sensor.parent_actor = Some(8);
        assert!(bp.parent_actor().is_none());
    }

    #[test]
    fn test_skip_policy_deserialize() {
        let policy: SkipPolicy = serde_json::from_str("\"suppress\"").unwrap();
        assert_eq!(policy, SkipPolicy::Suppress);
    }

    #[test]
    fn test_empty_map_fails_validation() {
        let bp = RssSensorBlueprint::minimal("rss", "");
        assert!(bp.validate().is_err());
    }
}
