//! TickDispatcher - routes world ticks into a sensor
//!
//! The registered handler owns only a [`Weak`] reference to its target, so a
//! subscription that outlives the sensor turns into a silent no-op.

use std::sync::{Arc, Weak};

use contracts::{RssResponse, SubscriptionId, TickHandler, TickSource, WorldSnapshot};
use tracing::trace;

/// Observer receiving one response per evaluated or skipped tick
pub type ResponseCallback = Arc<dyn Fn(RssResponse) + Send + Sync>;

/// Something that turns a tick into an optional response
pub trait TickTarget: Send + Sync + 'static {
    fn on_tick(&self, snapshot: &WorldSnapshot) -> Option<RssResponse>;
}

/// Tick subscription helper
pub struct TickDispatcher;

impl TickDispatcher {
    /// Subscribe `target` to `source`
    ///
    /// The handler resolves the target on every tick and forwards any
    /// response to `callback`.
    pub fn attach<T: TickTarget>(
        source: &dyn TickSource,
        target: Weak<T>,
        callback: ResponseCallback,
    ) -> SubscriptionId {
        let handler: TickHandler = Arc::new(move |snapshot: &WorldSnapshot| {
            let Some(target) = target.upgrade() else {
                trace!(frame = snapshot.timestamp.frame, "tick for dropped sensor ignored");
                observability::record_stale_tick();
                return;
            };

            let response = target.on_tick(snapshot);
            // Release the strong reference before handing control to the observer
            drop(target);

            if let Some(response) = response {
                callback(response);
            }
        });

        source.register_on_tick(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::ResponseTranslator;
    use contracts::{SafetyVerdict, Timestamp, Transform};
    use sim::ManualTickSource;
    use std::sync::Mutex;

    struct EchoTarget;

    impl TickTarget for EchoTarget {
        fn on_tick(&self, snapshot: &WorldSnapshot) -> Option<RssResponse> {
            ResponseTranslator::translate(
                &SafetyVerdict::default(),
                snapshot.timestamp(),
                Transform::default(),
            )
            .ok()
        }
    }

    fn collector() -> (ResponseCallback, Arc<Mutex<Vec<u64>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&frames);
        let callback: ResponseCallback = Arc::new(move |response: RssResponse| {
            sink.lock().unwrap().push(response.frame);
        });
        (callback, frames)
    }

    #[test]
    fn test_forwards_responses() {
        let source = ManualTickSource::new();
        let target = Arc::new(EchoTarget);
        let (callback, frames) = collector();

        TickDispatcher::attach(&source, Arc::downgrade(&target), callback);
        source.fire(Timestamp::new(1, 0.05));
        source.fire(Timestamp::new(2, 0.10));

        assert_eq!(*frames.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_subscription_does_not_keep_target_alive() {
        let source = ManualTickSource::new();
        let target = Arc::new(EchoTarget);
        let (callback, frames) = collector();

        TickDispatcher::attach(&source, Arc::downgrade(&target), callback);
        drop(target);

        source.fire(Timestamp::new(1, 0.05));
        assert!(frames.lock().unwrap().is_empty());
        assert_eq!(source.subscription_count(), 1);
    }
}
