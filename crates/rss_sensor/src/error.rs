//! RSS sensor error types

use thiserror::Error;

/// Usage faults reported to the caller of `listen`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// `listen` called while a session is active
    #[error("sensor '{sensor_id}' is already listening")]
    AlreadyListening { sensor_id: String },

    /// `listen` called on a sensor without a parent actor
    #[error("sensor '{sensor_id}' is not attached to a vehicle")]
    NotAttached { sensor_id: String },
}

impl SensorError {
    pub fn already_listening(sensor_id: impl Into<String>) -> Self {
        Self::AlreadyListening {
            sensor_id: sensor_id.into(),
        }
    }

    pub fn not_attached(sensor_id: impl Into<String>) -> Self {
        Self::NotAttached {
            sensor_id: sensor_id.into(),
        }
    }

    /// True for faults that leave the session usable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AlreadyListening { .. })
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SensorError>;
