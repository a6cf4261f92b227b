//! LogSink - one tracing event per response

use contracts::{ContractError, ResponseSink, RssResponse};
use tracing::{debug, info, instrument, warn};

/// Sink that logs response summaries
pub struct LogSink {
    name: String,
    written: u64,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            written: 0,
        }
    }

    fn log_response(&self, response: &RssResponse) {
        if response.requires_action() {
            warn!(
                sink = %self.name,
                frame = response.frame,
                elapsed = response.elapsed_seconds,
                longitudinal = ?response.longitudinal_response,
                lateral_left = ?response.lateral_response_left,
                lateral_right = ?response.lateral_response_right,
                speed_lon = response.ego_velocity.speed_lon,
                "RSS proper response requires action"
            );
        } else {
            info!(
                sink = %self.name,
                frame = response.frame,
                elapsed = response.elapsed_seconds,
                success = response.success,
                speed_lon = response.ego_velocity.speed_lon,
                "RSS response"
            );
        }
    }
}

impl ResponseSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, response),
        fields(sink = %self.name, frame = response.frame)
    )]
    async fn write(&mut self, response: &RssResponse) -> Result<(), ContractError> {
        self.log_response(response);
        self.written += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, written = self.written, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        AccelerationRestriction, EgoVelocity, LateralResponse, LongitudinalResponse, Transform,
    };

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("log");
        let response = RssResponse {
            frame: 3,
            elapsed_seconds: 0.15,
            pose: Transform::default(),
            success: true,
            longitudinal_response: LongitudinalResponse::BrakeMin,
            lateral_response_right: LateralResponse::None,
            lateral_response_left: LateralResponse::None,
            acceleration_restriction: AccelerationRestriction::default(),
            ego_velocity: EgoVelocity::default(),
        };

        assert!(sink.write(&response).await.is_ok());
        assert_eq!(sink.written, 1);
        assert_eq!(sink.name(), "log");
        assert!(sink.close().await.is_ok());
    }
}
