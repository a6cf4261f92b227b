//! ResponseTranslator - RSS verdict to sensor response
//!
//! Exhaustive re-encoding of the library's response vocabulary. The library
//! enums are `#[non_exhaustive]`; a variant this table does not know is a
//! logic fault, never a silent pass-through.

use contracts::{
    LateralResponse, LongitudinalResponse, RssLateralResponse, RssLongitudinalResponse,
    RssResponse, SafetyVerdict, Timestamp, Transform,
};
use thiserror::Error;

/// Translation failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unknown {field} response variant: {variant}")]
    UnknownVariant { field: &'static str, variant: String },
}

impl TranslateError {
    fn unknown(field: &'static str, variant: impl std::fmt::Debug) -> Self {
        Self::UnknownVariant {
            field,
            variant: format!("{variant:?}"),
        }
    }
}

/// Stateless verdict translator
pub struct ResponseTranslator;

impl ResponseTranslator {
    pub fn longitudinal(
        response: RssLongitudinalResponse,
    ) -> Result<LongitudinalResponse, TranslateError> {
        match response {
            RssLongitudinalResponse::None => Ok(LongitudinalResponse::None),
            RssLongitudinalResponse::BrakeMinCorrect => Ok(LongitudinalResponse::BrakeMinCorrect),
            RssLongitudinalResponse::BrakeMin => Ok(LongitudinalResponse::BrakeMin),
            other => Err(TranslateError::unknown("longitudinal", other)),
        }
    }

    pub fn lateral(
        response: RssLateralResponse,
        side: &'static str,
    ) -> Result<LateralResponse, TranslateError> {
        match response {
            RssLateralResponse::None => Ok(LateralResponse::None),
            RssLateralResponse::BrakeMin => Ok(LateralResponse::BrakeMin),
            other => Err(TranslateError::unknown(side, other)),
        }
    }

    /// Build the sensor response for one tick
    pub fn translate(
        verdict: &SafetyVerdict,
        timestamp: &Timestamp,
        pose: Transform,
    ) -> Result<RssResponse, TranslateError> {
        let proper = &verdict.proper_response;

        Ok(RssResponse {
            frame: timestamp.frame,
            elapsed_seconds: timestamp.elapsed_seconds,
            pose,
            success: verdict.success,
            longitudinal_response: Self::longitudinal(proper.longitudinal_response)?,
            lateral_response_right: Self::lateral(proper.lateral_response_right, "lateral right")?,
            lateral_response_left: Self::lateral(proper.lateral_response_left, "lateral left")?,
            acceleration_restriction: verdict.acceleration_restriction,
            ego_velocity: verdict.ego_velocity,
        })
    }
}
