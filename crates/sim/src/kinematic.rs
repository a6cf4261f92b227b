//! Kinematic RSS check
//!
//! A reduced RSS model for driving the sensor without the real library:
//! every other actor is assumed to travel along the ego heading, vehicles are
//! boxes of fixed size, and only the classic same-direction longitudinal
//! distance and a constant-margin lateral distance are checked.

use contracts::{
    AccelerationRange, AccelerationRestriction, ActorSnapshot, DynamicsProfile, EgoVelocity,
    EvaluationFault, EvaluationRequest, ProperResponse, RssLateralResponse,
    RssLongitudinalResponse, SafetyEvaluator, SafetyVerdict, Vector3,
};
use tracing::debug;

/// Vehicle footprint used for gaps (m)
const VEHICLE_LENGTH: f64 = 4.5;
const VEHICLE_WIDTH: f64 = 2.0;

/// Ego frame: forward / right unit vectors from the yaw angle
#[derive(Debug, Clone, Copy)]
struct Frame {
    forward: (f64, f64),
    right: (f64, f64),
}

impl Frame {
    fn from_yaw(yaw_degrees: f64) -> Self {
        let (sin, cos) = yaw_degrees.to_radians().sin_cos();
        Self {
            forward: (cos, sin),
            right: (-sin, cos),
        }
    }

    fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.forward.0 + y * self.forward.1,
            x * self.right.0 + y * self.right.1,
        )
    }

    fn velocity(&self, velocity: &Vector3) -> (f64, f64) {
        self.project(velocity.x, velocity.y)
    }
}

/// Minimum safe longitudinal distance, rear vehicle following front vehicle
///
/// `d = v_r ρ + ½ a_max ρ² + (v_r + ρ a_max)² / (2 b_min) - v_f² / (2 b_max)`
pub fn safe_longitudinal_distance(
    rear_speed: f64,
    front_speed: f64,
    rear: &DynamicsProfile,
    front: &DynamicsProfile,
) -> f64 {
    let rho = rear.response_time;
    let accel = rear.alpha_lon.accel_max;
    let rear_speed = rear_speed.max(0.0);
    let front_speed = front_speed.max(0.0);
    let speed_after_response = rear_speed + rho * accel;

    let distance = rear_speed * rho
        + 0.5 * accel * rho * rho
        + speed_after_response * speed_after_response / (2.0 * rear.alpha_lon.brake_min)
        - front_speed * front_speed / (2.0 * front.alpha_lon.brake_max);
    distance.max(0.0)
}

/// Minimum safe lateral distance between two side-by-side vehicles
pub fn safe_lateral_distance(ego: &DynamicsProfile, other: &DynamicsProfile) -> f64 {
    let drift = |profile: &DynamicsProfile| {
        let rho = profile.response_time;
        let accel = profile.alpha_lat.accel_max;
        let speed = rho * accel;
        0.5 * accel * rho * rho + speed * speed / (2.0 * profile.alpha_lat.brake_min)
    };
    ego.lateral_fluctuation_margin.max(other.lateral_fluctuation_margin) + drift(ego) + drift(other)
}

/// `SafetyEvaluator` backed by the reduced kinematic model
#[derive(Debug, Clone, Default)]
pub struct KinematicEvaluator;

impl KinematicEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn check_pair(
        frame: &Frame,
        ego: &ActorSnapshot,
        other: &ActorSnapshot,
        request: &EvaluationRequest<'_>,
        response: &mut ProperResponse,
    ) {
        let dx = other.transform.location.x - ego.transform.location.x;
        let dy = other.transform.location.y - ego.transform.location.y;
        let (lon, lat) = frame.project(dx, dy);
        let (ego_lon_speed, _) = frame.velocity(&ego.velocity);
        let (other_lon_speed, _) = frame.velocity(&other.velocity);

        let lateral_gap = lat.abs() - VEHICLE_WIDTH;
        let longitudinal_gap = lon.abs() - VEHICLE_LENGTH;

        if lateral_gap < 0.0 {
            // Same lane: longitudinal conflict only
            let (safe, gap) = if lon >= 0.0 {
                let min = safe_longitudinal_distance(
                    ego_lon_speed,
                    other_lon_speed,
                    request.ego_dynamics,
                    request.other_dynamics,
                );
                (longitudinal_gap >= min, longitudinal_gap)
            } else {
                let min = safe_longitudinal_distance(
                    other_lon_speed,
                    ego_lon_speed,
                    request.other_dynamics,
                    request.ego_dynamics,
                );
                (longitudinal_gap >= min, longitudinal_gap)
            };

            if !safe {
                response.is_safe = false;
                // Ego behind the other vehicle must brake; ego in front only corrects
                let needed = if lon >= 0.0 {
                    RssLongitudinalResponse::BrakeMin
                } else {
                    RssLongitudinalResponse::BrakeMinCorrect
                };
                response.longitudinal_response = stronger(response.longitudinal_response, needed);
                debug!(other = other.id, gap, "longitudinal distance unsafe");
            }
            return;
        }

        if longitudinal_gap < 0.0
            && lateral_gap < safe_lateral_distance(request.ego_dynamics, request.other_dynamics)
        {
            response.is_safe = false;
            if lat > 0.0 {
                response.lateral_response_right = RssLateralResponse::BrakeMin;
            } else {
                response.lateral_response_left = RssLateralResponse::BrakeMin;
            }
            debug!(other = other.id, lateral_gap, "lateral distance unsafe");
        }
    }

    fn restriction(response: &ProperResponse, ego: &DynamicsProfile) -> AccelerationRestriction {
        let lon = &ego.alpha_lon;
        let longitudinal_range = match response.longitudinal_response {
            RssLongitudinalResponse::BrakeMin => AccelerationRange::new(-lon.brake_max, -lon.brake_min),
            RssLongitudinalResponse::BrakeMinCorrect => {
                AccelerationRange::new(-lon.brake_max, -lon.brake_min_correct)
            }
            _ => AccelerationRange::new(-lon.brake_max, lon.accel_max),
        };

        // Lateral floor: hardest deceleration the ego can apply in any direction
        let lat = &ego.alpha_lat;
        let floor = -lon.brake_max.max(lat.brake_min);
        let lateral = |side: RssLateralResponse| match side {
            RssLateralResponse::BrakeMin => AccelerationRange::new(floor, -lat.brake_min),
            _ => AccelerationRange::new(floor, lat.accel_max),
        };

        AccelerationRestriction {
            longitudinal_range,
            lateral_left_range: lateral(response.lateral_response_left),
            lateral_right_range: lateral(response.lateral_response_right),
        }
    }
}

fn stronger(current: RssLongitudinalResponse, needed: RssLongitudinalResponse) -> RssLongitudinalResponse {
    let rank = |response: RssLongitudinalResponse| match response {
        RssLongitudinalResponse::BrakeMin => 2,
        RssLongitudinalResponse::BrakeMinCorrect => 1,
        _ => 0,
    };
    if rank(needed) > rank(current) {
        needed
    } else {
        current
    }
}

impl SafetyEvaluator for KinematicEvaluator {
    fn check_objects(&self, request: &EvaluationRequest<'_>) -> Result<SafetyVerdict, EvaluationFault> {
        let ego = request
            .actors
            .find(request.ego)
            .cloned()
            .or_else(|| {
                let transform = request.world.actor_transform(request.ego)?;
                Some(ActorSnapshot::new(request.ego, "", transform))
            })
            .ok_or(EvaluationFault::EgoNotFound {
                actor_id: request.ego,
            })?;

        let frame = Frame::from_yaw(ego.transform.rotation.yaw);
        let mut response = ProperResponse {
            is_safe: true,
            ..ProperResponse::default()
        };

        for other in request.actors.iter().filter(|actor| actor.id != ego.id) {
            Self::check_pair(&frame, &ego, other, request, &mut response);
        }

        let (speed_lon, speed_lat) = frame.velocity(&ego.velocity);
        Ok(SafetyVerdict {
            success: true,
            proper_response: response,
            acceleration_restriction: Self::restriction(&response, request.ego_dynamics),
            ego_velocity: EgoVelocity { speed_lon, speed_lat },
        })
    }
}
