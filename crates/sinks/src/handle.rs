//! SinkHandle - one sink behind a bounded queue and its own worker task
//!
//! `try_send` never waits: it is called from the tick thread through the
//! sensor callback. A full queue drops the response.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{ResponseSink, RssResponse};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<RssResponse>,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn<S: ResponseSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        Self::spawn_on(&tokio::runtime::Handle::current(), sink, queue_capacity)
    }

    /// Spawn the worker on an explicit runtime
    ///
    /// Lets callers outside the runtime (e.g. a tick thread) create handles.
    pub fn spawn_on<S: ResponseSink + Send + 'static>(
        runtime: &tokio::runtime::Handle,
        sink: S,
        queue_capacity: usize,
    ) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker = runtime.spawn(sink_worker(sink, rx, Arc::clone(&metrics), name.clone()));

        Self {
            name,
            tx,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a response without blocking
    ///
    /// Returns false if the response was dropped.
    pub fn try_send(&self, response: RssResponse) -> bool {
        match self.tx.try_send(response) {
            Ok(()) => {
                self.metrics.record_accepted();
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                self.metrics.record_dropped();
                warn!(sink = %self.name, frame = dropped.frame, "queue full, response dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                self.metrics.record_dropped();
                error!(sink = %self.name, frame = dropped.frame, "sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Close the queue, drain it, then flush and close the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(sink = %self.name, error = ?e, "sink worker panicked");
        }
        debug!(sink = %self.name, "sink handle shut down");
    }
}

#[instrument(name = "sink_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: ResponseSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<RssResponse>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!("sink worker started");

    while let Some(response) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&response).await {
            Ok(()) => metrics.record_written(),
            Err(e) => {
                metrics.record_failed();
                error!(frame = response.frame, error = %e, "write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "close failed on shutdown");
    }

    debug!("sink worker stopped");
}
