//! RSS session orchestration module.

mod session;
mod stats;

pub use session::{RssSession, SessionConfig};
pub use stats::{EndReason, SessionStats};
