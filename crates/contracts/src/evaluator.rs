//! SafetyEvaluator - the opaque RSS check
//!
//! Inputs in, verdict or fault out. Not assumed to be reentrant for the same
//! sensor instance.

use thiserror::Error;

use crate::{ActorId, ActorList, DynamicsProfile, MapContext, SafetyVerdict, Timestamp, WorldAccess};

/// Everything one RSS check needs
pub struct EvaluationRequest<'a> {
    pub timestamp: Timestamp,
    pub world: &'a dyn WorldAccess,
    /// Actors matching the sensor's filter (ego included if it matches)
    pub actors: &'a ActorList,
    /// Actor the sensor is attached to
    pub ego: ActorId,
    pub map: &'a MapContext,
    pub ego_dynamics: &'a DynamicsProfile,
    pub other_dynamics: &'a DynamicsProfile,
    /// Ask the evaluator to draw debug output
    pub visualize_results: bool,
}

/// Failure raised by the RSS check
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationFault {
    /// The check itself reported an error
    #[error("rss check failed: {message}")]
    CheckFailed { message: String },

    /// The ego actor could not be resolved in the world
    #[error("ego actor {actor_id} not found")]
    EgoNotFound { actor_id: ActorId },

    /// The check panicked
    #[error("rss check panicked: {message}")]
    Panicked { message: String },
}

impl EvaluationFault {
    pub fn check_failed(message: impl Into<String>) -> Self {
        Self::CheckFailed {
            message: message.into(),
        }
    }
}

/// RSS check boundary
pub trait SafetyEvaluator: Send + Sync {
    /// Check all ego<->object pairs and compute the proper response
    fn check_objects(&self, request: &EvaluationRequest<'_>) -> Result<SafetyVerdict, EvaluationFault>;
}
