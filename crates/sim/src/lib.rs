//! # Sim
//!
//! In-process stand-ins for the simulator side of an RSS sensor:
//!
//! - [`MockWorld`]: actor population implementing `WorldAccess`
//! - [`ManualTickSource`]: tick event fired by hand or by a background ticker
//! - [`ScriptedEvaluator`]: RSS check with scripted verdicts, faults and gates
//! - [`KinematicEvaluator`]: simplified longitudinal / lateral safe-distance check
//!
//! Nothing here talks to a real CARLA server.

pub mod kinematic;
pub mod scripted;
pub mod tick_source;
pub mod world;

pub use kinematic::KinematicEvaluator;
pub use scripted::{EvaluationGate, RecordedCall, ScriptedEvaluator};
pub use tick_source::{ManualTickSource, TickerConfig, TickerHandle};
pub use world::MockWorld;
