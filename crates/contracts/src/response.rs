//! RssResponse - RSS sensor output
//!
//! One response per completed evaluation, handed to the observer callback.

use serde::{Deserialize, Serialize};

use crate::{AccelerationRestriction, EgoVelocity, Timestamp, Transform};

/// Longitudinal response required from the ego vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongitudinalResponse {
    #[default]
    None,
    BrakeMinCorrect,
    BrakeMin,
}

/// Lateral response required from the ego vehicle (per side)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateralResponse {
    #[default]
    None,
    BrakeMin,
}

/// RSS sensor measurement
///
/// Immutable once built; ownership moves to the observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RssResponse {
    /// Frame index of the tick that produced this response
    pub frame: u64,

    /// Simulation seconds of the tick
    pub elapsed_seconds: f64,

    /// Ego pose at evaluation time
    pub pose: Transform,

    /// True if the RSS check ran to completion
    pub success: bool,

    pub longitudinal_response: LongitudinalResponse,
    pub lateral_response_right: LateralResponse,
    pub lateral_response_left: LateralResponse,
    pub acceleration_restriction: AccelerationRestriction,
    pub ego_velocity: EgoVelocity,
}

impl RssResponse {
    /// Timestamp view (frame + elapsed seconds)
    pub fn timestamp(&self) -> Timestamp {
        Timestamp::new(self.frame, self.elapsed_seconds)
    }

    /// True if any response other than `None` is required
    pub fn requires_action(&self) -> bool {
        self.longitudinal_response != LongitudinalResponse::None
            || self.lateral_response_right != LateralResponse::None
            || self.lateral_response_left != LateralResponse::None
    }
}
