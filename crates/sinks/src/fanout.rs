//! SinkFanout - delivers every response to all configured sinks

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, instrument};

use contracts::{RssResponse, SinkConfig, SinkType};

use crate::error::SinkError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Create a SinkHandle from configuration
#[instrument(
    name = "sinks_create_sink_handle",
    skip(runtime, config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink_handle(runtime: &Handle, config: &SinkConfig) -> Result<SinkHandle, SinkError> {
    match config.sink_type {
        SinkType::Log => Ok(SinkHandle::spawn_on(
            runtime,
            LogSink::new(&config.name),
            config.queue_capacity,
        )),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| SinkError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn_on(runtime, sink, config.queue_capacity))
        }
    }
}

/// Set of running sinks fed from the sensor callback
pub struct SinkFanout {
    handles: Vec<SinkHandle>,
}

impl SinkFanout {
    pub fn new(handles: Vec<SinkHandle>) -> Self {
        Self { handles }
    }

    /// Spawn one handle per config on `runtime`
    pub fn from_configs(runtime: &Handle, configs: &[SinkConfig]) -> Result<Self, SinkError> {
        let handles = configs
            .iter()
            .map(|config| create_sink_handle(runtime, config))
            .collect::<Result<Vec<_>, _>>()?;
        info!(sinks = handles.len(), "sinks started");
        Ok(Self { handles })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Offer a response to every sink; returns how many accepted it
    pub fn publish(&self, response: &RssResponse) -> usize {
        self.handles
            .iter()
            .filter(|handle| handle.try_send(response.clone()))
            .count()
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|handle| (handle.name().to_string(), handle.metrics().snapshot()))
            .collect()
    }

    /// Drain and close every sink; returns the final counters
    pub async fn shutdown(self) -> Vec<(String, MetricsSnapshot)> {
        let mut finals = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            let metrics = Arc::clone(handle.metrics());
            handle.shutdown().await;
            debug!(sink = %name, "sink stopped");
            finals.push((name, metrics.snapshot()));
        }
        finals
    }
}
