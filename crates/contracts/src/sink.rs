//! ResponseSink trait - observer-side output interface

use crate::{ContractError, RssResponse};

/// Response output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ResponseSink: Send)]
pub trait LocalResponseSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one RSS response
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, response: &RssResponse) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
