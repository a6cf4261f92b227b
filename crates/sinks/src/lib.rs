//! # Sinks
//!
//! RSS response 输出模块。
//!
//! 负责：
//! - 消费传感器回调产生的 `RssResponse`
//! - Fan-out 到多个 sinks
//! - 隔离慢 sink，不阻塞 tick 线程

pub mod error;
pub mod fanout;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{ResponseSink, RssResponse};
pub use error::SinkError;
pub use fanout::{create_sink_handle, SinkFanout};
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
