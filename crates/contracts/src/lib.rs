//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the RSS sensor workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every tick carries a CARLA [`Timestamp`]: monotonically increasing frame
//!   index plus elapsed simulation seconds
//! - The RSS sensor never reorders or buffers ticks
//!
//! ## External Collaborators
//! - [`TickSource`]: per-frame world tick event registration
//! - [`WorldAccess`]: actor enumeration and pose lookup
//! - [`SafetyEvaluator`]: the opaque RSS check itself

mod actor;
mod blueprint;
mod error;
mod evaluator;
mod geometry;
mod response;
mod rss;
mod sink;
mod tick;
mod timestamp;
mod world;

pub use actor::*;
pub use blueprint::*;
pub use error::*;
pub use evaluator::*;
pub use geometry::*;
pub use response::*;
pub use rss::*;
pub use sink::{LocalResponseSink, ResponseSink};
pub use tick::*;
pub use timestamp::Timestamp;
pub use world::*;
