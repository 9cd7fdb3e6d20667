//! Delivery policies for the four transport styles.
//!
//! Everything in this module is protocol-agnostic: the concrete wire
//! framing (HTTP routes, SSE, WebSocket) lives in [`crate::web`] and only
//! drives the state machines defined here.
//!
//! - Pull: a single [`ContentPayload`] built from the current snapshot
//! - Push stream: a [`PollCursor`] polled on a fixed cadence
//! - Long poll: a [`LongPollSession`](longpoll::LongPollSession) with
//!   heartbeats and a hard deadline
//! - Publish/subscribe: a [`PubSubSession`](pubsub::PubSubSession) driven by
//!   hub events and client requests

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::FileState;

pub mod longpoll;
pub mod pubsub;

/// Which delivery style produced a payload. Serialized as the payload's
/// `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTag {
    /// One-shot pull of the current snapshot
    StandardRest,
    /// Push-stream change payload
    LiveStream,
    /// First payload delivered to a new subscriber
    InitialContent,
    /// Snapshot answered to an explicit client request
    RequestedContent,
    /// Change notification pushed to subscribers
    FileUpdate,
}

/// Content payload shared by all transports.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPayload {
    /// File content
    pub content: String,
    /// Version of the snapshot this payload was built from
    pub version: u64,
    /// When the content was last read from disk
    pub last_modified: Option<DateTime<Utc>>,
    /// When this payload was built
    pub timestamp: DateTime<Utc>,
    /// Delivery style tag
    #[serde(rename = "type")]
    pub delivery: DeliveryTag,
}

impl ContentPayload {
    /// Build a payload from a snapshot.
    #[must_use]
    pub fn new(state: &FileState, delivery: DeliveryTag) -> Self {
        Self {
            content: state.content.clone(),
            version: state.version,
            last_modified: state.modified_at,
            timestamp: Utc::now(),
            delivery,
        }
    }
}

/// Per-connection memory of the last delivered version.
///
/// Used by the polling transports (push stream, long poll) to detect change
/// without registering as a hub subscriber. An empty cursor treats the first
/// observation as a change, so a new connection always gets an initial
/// payload.
#[derive(Debug, Default)]
pub struct PollCursor {
    last_seen: Option<u64>,
}

impl PollCursor {
    /// Create an empty cursor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the snapshot against the cursor.
    ///
    /// Returns the snapshot (and advances the cursor) when its version
    /// differs from the last delivered one, `None` otherwise.
    pub fn observe(&mut self, state: &Arc<FileState>) -> Option<Arc<FileState>> {
        if self.last_seen == Some(state.version) {
            return None;
        }
        self.last_seen = Some(state.version);
        Some(Arc::clone(state))
    }

    /// Version last delivered through this cursor, if any.
    #[must_use]
    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FileStateStore;

    fn stored(content: &str, writes_before: u64) -> Arc<FileState> {
        let store = FileStateStore::new(FileState::uninitialized());
        for i in 0..writes_before {
            store.write(format!("filler {i}"), Utc::now());
        }
        store.write(content.into(), Utc::now())
    }

    #[test]
    fn test_cursor_first_observation_delivers() {
        let state = stored("hello", 0);
        let mut cursor = PollCursor::new();

        let delivered = cursor.observe(&state);
        assert!(delivered.is_some());
        assert_eq!(cursor.last_seen(), Some(0));
    }

    #[test]
    fn test_cursor_suppresses_same_version() {
        let state = stored("hello", 0);
        let mut cursor = PollCursor::new();

        assert!(cursor.observe(&state).is_some());
        assert!(cursor.observe(&state).is_none());
        assert!(cursor.observe(&state).is_none());
    }

    #[test]
    fn test_cursor_delivers_each_new_version_once() {
        let store = FileStateStore::new(FileState::uninitialized());
        let mut cursor = PollCursor::new();

        let v0 = store.write("a".into(), Utc::now());
        assert!(cursor.observe(&v0).is_some());

        let v1 = store.write("b".into(), Utc::now());
        let delivered = cursor.observe(&v1).expect("new version delivers");
        assert_eq!(delivered.content, "b");
        assert!(cursor.observe(&v1).is_none(), "no duplicate for same version");
    }

    #[test]
    fn test_payload_carries_snapshot_fields() {
        let state = stored("payload body", 2);
        let payload = ContentPayload::new(&state, DeliveryTag::StandardRest);

        assert_eq!(payload.content, "payload body");
        assert_eq!(payload.version, 2);
        assert_eq!(payload.last_modified, state.modified_at);
    }

    #[test]
    fn test_payload_type_tags() {
        let state = stored("x", 0);

        let json = serde_json::to_string(&ContentPayload::new(&state, DeliveryTag::StandardRest))
            .unwrap();
        assert!(json.contains("\"type\":\"standard_rest\""));

        let json =
            serde_json::to_string(&ContentPayload::new(&state, DeliveryTag::LiveStream)).unwrap();
        assert!(json.contains("\"type\":\"live_stream\""));

        let json =
            serde_json::to_string(&ContentPayload::new(&state, DeliveryTag::FileUpdate)).unwrap();
        assert!(json.contains("\"type\":\"file_update\""));
    }
}
