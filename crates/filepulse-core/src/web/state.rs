//! Shared state for the web server.

use std::sync::Arc;
use std::time::Duration;

use crate::config::DeliveryConfig;
use crate::hub::BroadcastHub;
use crate::state::FileStateStore;
use crate::status::StatusReporter;

/// Delivery cadences used by the streaming handlers.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryOptions {
    /// Poll cadence of the push-stream transport
    pub stream_interval: Duration,
    /// Poll cadence of the long-poll transport
    pub live_interval: Duration,
    /// Hard wall-clock deadline of a long-poll connection
    pub live_deadline: Duration,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            stream_interval: crate::DEFAULT_STREAM_INTERVAL,
            live_interval: crate::DEFAULT_LIVE_INTERVAL,
            live_deadline: crate::DEFAULT_LIVE_DEADLINE,
        }
    }
}

impl From<&DeliveryConfig> for DeliveryOptions {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            stream_interval: config.stream_interval,
            live_interval: config.live_interval,
            live_deadline: config.live_deadline,
        }
    }
}

/// Cloneable handle to the core components, shared across handlers.
///
/// Handlers only ever call the components' defined operations; none of them
/// owns mutable state of its own.
#[derive(Clone)]
pub struct SharedState {
    /// Versioned snapshot store
    pub store: Arc<FileStateStore>,
    /// Subscriber registry
    pub hub: Arc<BroadcastHub>,
    /// Monitoring introspection
    pub reporter: Arc<StatusReporter>,
    /// Streaming cadences
    pub delivery: DeliveryOptions,
}

impl SharedState {
    /// Bundle the core components for the router.
    #[must_use]
    pub fn new(
        store: Arc<FileStateStore>,
        hub: Arc<BroadcastHub>,
        reporter: Arc<StatusReporter>,
        delivery: DeliveryOptions,
    ) -> Self {
        Self {
            store,
            hub,
            reporter,
            delivery,
        }
    }
}
