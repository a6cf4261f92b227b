//! # RSS Sensor
//!
//! Tick-synchronized, non-blocking RSS safety-check sensor.
//!
//! Responsibilities:
//! - Subscribe to the world tick event while listening
//! - Run at most one RSS check at a time, dropping ticks that arrive while busy
//! - Translate the RSS verdict into an [`RssResponse`] for the observer
//! - Never keep the sensor alive through its tick subscription
//!
//! ```ignore
//! let sensor = RssSensor::new(config, world, tick_source, checker);
//! sensor.listen(Arc::new(|response| println!("{:?}", response.longitudinal_response)))?;
//! // ...
//! sensor.stop();
//! ```

pub mod dispatcher;
pub mod dynamics;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod sensor;
pub mod stats;
pub mod translator;

pub use contracts::{DynamicsProfile, DynamicsRole, RssResponse, SkipPolicy};
pub use dispatcher::{TickDispatcher, TickTarget};
pub use dynamics::DynamicsStore;
pub use error::{Result, SensorError};
pub use evaluator::{EvaluationBackend, TickEvaluator};
pub use guard::{EvaluationGuard, EvaluationPermit};
pub use sensor::{ResponseCallback, RssSensor};
pub use stats::{SensorStats, StatsSnapshot};
pub use translator::{ResponseTranslator, TranslateError};
