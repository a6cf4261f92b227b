//! External RSS vocabulary
//!
//! Types produced and consumed by the opaque safety-check library. The RSS
//! sensor only reads these and re-encodes them into [`crate::RssResponse`].
//!
//! The response enums are `#[non_exhaustive]`: the library may grow its
//! vocabulary, and consumers must treat an unknown variant as a logic fault.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Longitudinal proper response as reported by the RSS library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RssLongitudinalResponse {
    /// No action required
    #[default]
    None,
    /// Brake with at least the "correct direction" minimum deceleration
    BrakeMinCorrect,
    /// Brake with at least the minimum deceleration
    BrakeMin,
}

/// Lateral proper response as reported by the RSS library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RssLateralResponse {
    #[default]
    None,
    BrakeMin,
}

/// Proper response over all checked object pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProperResponse {
    /// True if every checked pair was safe
    pub is_safe: bool,
    pub longitudinal_response: RssLongitudinalResponse,
    pub lateral_response_right: RssLateralResponse,
    pub lateral_response_left: RssLateralResponse,
}

/// Closed acceleration interval (m/s²)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelerationRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl AccelerationRange {
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }
}

/// Acceleration bounds the ego vehicle must respect
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelerationRestriction {
    pub longitudinal_range: AccelerationRange,
    pub lateral_left_range: AccelerationRange,
    pub lateral_right_range: AccelerationRange,
}

/// Ego velocity in road coordinates (m/s)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EgoVelocity {
    pub speed_lon: f64,
    pub speed_lat: f64,
}

/// Result of one RSS check
///
/// `Default` is the verdict used when a frame is skipped: not successful,
/// no response required, all physical quantities zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// True if the check ran to completion
    pub success: bool,
    pub proper_response: ProperResponse,
    pub acceleration_restriction: AccelerationRestriction,
    pub ego_velocity: EgoVelocity,
}

/// Longitudinal acceleration limits (m/s², magnitudes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct LongitudinalLimits {
    #[validate(range(min = 0.0))]
    pub accel_max: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub brake_max: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub brake_min: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub brake_min_correct: f64,
}

/// Lateral acceleration limits (m/s², magnitudes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct LateralLimits {
    #[validate(range(min = 0.0))]
    pub accel_max: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub brake_min: f64,
}

/// Vehicle dynamics consulted by the RSS check for one role (ego / other)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct DynamicsProfile {
    #[validate(nested)]
    pub alpha_lon: LongitudinalLimits,

    #[validate(nested)]
    pub alpha_lat: LateralLimits,

    /// Lateral fluctuation margin (m)
    #[validate(range(min = 0.0))]
    pub lateral_fluctuation_margin: f64,

    /// Response time (s)
    #[validate(range(exclusive_min = 0.0))]
    pub response_time: f64,
}

impl DynamicsProfile {
    /// Default dynamics for the ego vehicle
    ///
    /// Same limits as [`DynamicsProfile::default_other`] with a shorter
    /// response time, since the ego is an automated driver.
    pub fn default_ego() -> Self {
        Self {
            response_time: 0.2,
            ..Self::default_other()
        }
    }

    /// Default dynamics assumed for every other vehicle
    pub fn default_other() -> Self {
        Self {
            alpha_lon: LongitudinalLimits {
                accel_max: 3.5,
                brake_max: 8.0,
                brake_min: 4.0,
                brake_min_correct: 3.0,
            },
            alpha_lat: LateralLimits {
                accel_max: 0.2,
                brake_min: 0.8,
            },
            lateral_fluctuation_margin: 0.1,
            response_time: 1.0,
        }
    }

    /// Check the ordering brake_max >= brake_min >= brake_min_correct
    pub fn check_brake_ordering(&self) -> Result<(), String> {
        let lon = &self.alpha_lon;
        if lon.brake_max < lon.brake_min {
            return Err(format!(
                "brake_max ({}) must be >= brake_min ({})",
                lon.brake_max, lon.brake_min
            ));
        }
        if lon.brake_min < lon.brake_min_correct {
            return Err(format!(
                "brake_min ({}) must be >= brake_min_correct ({})",
                lon.brake_min, lon.brake_min_correct
            ));
        }
        Ok(())
    }
}

/// Which dynamics profile an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicsRole {
    Ego,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_verdict_is_skip_verdict() {
        let verdict = SafetyVerdict::default();
        assert!(!verdict.success);
        assert!(!verdict.proper_response.is_safe);
        assert_eq!(
            verdict.proper_response.longitudinal_response,
            RssLongitudinalResponse::None
        );
        assert_eq!(verdict.ego_velocity, EgoVelocity::default());
    }

    #[test]
    fn test_default_dynamics_are_valid() {
        for profile in [DynamicsProfile::default_ego(), DynamicsProfile::default_other()] {
            assert!(profile.validate().is_ok());
            assert!(profile.check_brake_ordering().is_ok());
        }
        assert!(DynamicsProfile::default_ego().response_time < DynamicsProfile::default_other().response_time);
    }

    #[test]
    fn test_brake_ordering_violation() {
        let mut profile = DynamicsProfile::default_other();
        profile.alpha_lon.brake_min_correct = 5.0;
        let err = profile.check_brake_ordering().unwrap_err();
        assert!(err.contains("brake_min_correct"), "got: {err}");
    }

    #[test]
    fn test_negative_response_time_rejected() {
        let mut profile = DynamicsProfile::default_ego();
        profile.response_time = -1.0;
        assert!(profile.validate().is_err());
    }
}
