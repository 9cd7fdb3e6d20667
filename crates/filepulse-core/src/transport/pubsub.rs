//! Publish/subscribe delivery state machine.
//!
//! A pub/sub session is the only transport that registers with the
//! [`BroadcastHub`]: change notifications wake it through its event channel
//! instead of a poll loop. The session also answers ad-hoc client requests
//! (current content, status, echo, manual broadcast) from the store and
//! reporter directly.
//!
//! Dropping the session unsubscribes it, so every exit path of the driving
//! connection (clean close, protocol error, task abort) releases the
//! subscriber record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{ContentPayload, DeliveryTag};
use crate::hub::{BroadcastHub, HubEvent, SubscriberId, Subscription};
use crate::state::FileStateStore;
use crate::status::{StatusReport, StatusReporter};

/// Message sent on a manual `broadcast_test` fan-out.
pub const BROADCAST_TEST_MESSAGE: &str = "This is a test broadcast to all connected clients";

/// Request sent by a connected client, tagged by `event`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Ask for the current content
    GetFileContent,
    /// Ask for a status report
    GetStatus,
    /// Arbitrary payload, echoed back
    Message {
        /// Client-supplied payload
        #[serde(default)]
        data: serde_json::Value,
    },
    /// Trigger a manual fan-out to every subscriber
    BroadcastTest,
    /// Close the session
    Disconnect,
}

/// Event sent to a connected client, tagged by `event`.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection greeting with the assigned subscriber id
    Connected {
        /// Human-readable greeting
        message: String,
        /// Assigned subscriber id
        client_id: SubscriberId,
        /// When the session was opened
        timestamp: DateTime<Utc>,
    },
    /// Snapshot delivery (initial or on request)
    FileContent {
        /// Content payload
        #[serde(flatten)]
        payload: ContentPayload,
    },
    /// Change notification
    FileChanged {
        /// Content payload
        #[serde(flatten)]
        payload: ContentPayload,
    },
    /// Status report
    Status {
        /// Report body
        #[serde(flatten)]
        report: StatusReport,
    },
    /// Something went wrong with the client's request
    Error {
        /// What happened
        message: String,
    },
    /// Echo of a client message
    MessageReceived {
        /// Echoed text
        message: String,
        /// When the echo was built
        timestamp: DateTime<Utc>,
    },
    /// Manual fan-out payload
    BroadcastMessage {
        /// Relayed message
        message: String,
        /// When the relay was built
        timestamp: DateTime<Utc>,
        /// Originator tag
        sender: String,
    },
}

/// Outcome of handling one client request.
#[derive(Debug)]
pub enum Reply {
    /// Send this event back to the requesting client
    Event(ServerEvent),
    /// Nothing to send directly (e.g. the effect arrives via the hub)
    Silent,
    /// Close the session
    Close,
}

/// One event-driven connection, registered with the hub for its lifetime.
pub struct PubSubSession {
    id: SubscriberId,
    events: mpsc::UnboundedReceiver<HubEvent>,
    hub: Arc<BroadcastHub>,
    store: Arc<FileStateStore>,
    reporter: Arc<StatusReporter>,
}

impl PubSubSession {
    /// Register with the hub and produce the greeting events: `connected`
    /// with the assigned id, then the current content as `initial_content`.
    pub fn open(
        hub: Arc<BroadcastHub>,
        store: Arc<FileStateStore>,
        reporter: Arc<StatusReporter>,
    ) -> (Self, Vec<ServerEvent>) {
        let Subscription {
            id,
            initial,
            events,
        } = hub.subscribe();

        let greetings = vec![
            ServerEvent::Connected {
                message: format!("Connected as {id}"),
                client_id: id,
                timestamp: Utc::now(),
            },
            ServerEvent::FileContent {
                payload: ContentPayload::new(&initial, DeliveryTag::InitialContent),
            },
        ];

        let session = Self {
            id,
            events,
            hub,
            store,
            reporter,
        };
        (session, greetings)
    }

    /// The subscriber id assigned to this session.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Handle one inbound client request.
    pub fn handle_request(&self, request: &ClientRequest) -> Reply {
        match request {
            ClientRequest::GetFileContent => Reply::Event(ServerEvent::FileContent {
                payload: ContentPayload::new(&self.store.read(), DeliveryTag::RequestedContent),
            }),
            ClientRequest::GetStatus => Reply::Event(ServerEvent::Status {
                report: self.reporter.report(),
            }),
            ClientRequest::Message { data } => Reply::Event(ServerEvent::MessageReceived {
                message: format!("Server received: {data}"),
                timestamp: Utc::now(),
            }),
            ClientRequest::BroadcastTest => {
                // Delivered back to this session too, through its own channel.
                self.hub.broadcast(BROADCAST_TEST_MESSAGE);
                Reply::Silent
            }
            ClientRequest::Disconnect => Reply::Close,
        }
    }

    /// Wait for the next hub-delivered event.
    ///
    /// Returns `None` when the hub dropped this subscriber's channel.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.events.recv().await.map(|event| match event {
            HubEvent::FileChanged(state) => ServerEvent::FileChanged {
                payload: ContentPayload::new(&state, DeliveryTag::FileUpdate),
            },
            HubEvent::Broadcast { message } => ServerEvent::BroadcastMessage {
                message,
                timestamp: Utc::now(),
                sender: "server".to_string(),
            },
        })
    }
}

impl Drop for PubSubSession {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FileState;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: Arc<FileStateStore>,
        hub: Arc<BroadcastHub>,
        reporter: Arc<StatusReporter>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("file.txt");
            std::fs::write(&path, "fixture content").unwrap();

            let store = Arc::new(FileStateStore::new(FileState::uninitialized()));
            let hub = Arc::new(BroadcastHub::new(Arc::clone(&store)));
            let reporter = Arc::new(StatusReporter::new(
                path,
                Arc::clone(&store),
                Arc::clone(&hub),
                Arc::new(AtomicBool::new(true)),
            ));
            Self {
                _dir: dir,
                store,
                hub,
                reporter,
            }
        }

        fn open(&self) -> (PubSubSession, Vec<ServerEvent>) {
            PubSubSession::open(
                Arc::clone(&self.hub),
                Arc::clone(&self.store),
                Arc::clone(&self.reporter),
            )
        }
    }

    #[test]
    fn test_client_request_wire_format() {
        let req: ClientRequest = serde_json::from_str(r#"{"event":"get_file_content"}"#).unwrap();
        assert!(matches!(req, ClientRequest::GetFileContent));

        let req: ClientRequest =
            serde_json::from_str(r#"{"event":"message","data":"Hello from client!"}"#).unwrap();
        match req {
            ClientRequest::Message { data } => assert_eq!(data, "Hello from client!"),
            other => panic!("expected Message, got {other:?}"),
        }

        let req: ClientRequest = serde_json::from_str(r#"{"event":"disconnect"}"#).unwrap();
        assert!(matches!(req, ClientRequest::Disconnect));

        assert!(serde_json::from_str::<ClientRequest>(r#"{"event":"no_such_event"}"#).is_err());
    }

    #[test]
    fn test_open_greets_with_id_and_initial_content() {
        let fx = Fixture::new();
        fx.store.write("current".into(), Utc::now());

        let (session, greetings) = fx.open();

        assert_eq!(greetings.len(), 2);
        match &greetings[0] {
            ServerEvent::Connected { client_id, .. } => assert_eq!(*client_id, session.id()),
            other => panic!("expected Connected, got {other:?}"),
        }
        match &greetings[1] {
            ServerEvent::FileContent { payload } => {
                assert_eq!(payload.content, "current");
                assert_eq!(payload.delivery, DeliveryTag::InitialContent);
            }
            other => panic!("expected FileContent, got {other:?}"),
        }
        assert_eq!(fx.hub.subscriber_count(), 1);
    }

    #[test]
    fn test_get_file_content_reads_latest() {
        let fx = Fixture::new();
        fx.store.write("old".into(), Utc::now());
        let (session, _) = fx.open();
        fx.store.write("new".into(), Utc::now());

        match session.handle_request(&ClientRequest::GetFileContent) {
            Reply::Event(ServerEvent::FileContent { payload }) => {
                assert_eq!(payload.content, "new");
                assert_eq!(payload.delivery, DeliveryTag::RequestedContent);
            }
            other => panic!("expected FileContent, got {other:?}"),
        }
    }

    #[test]
    fn test_get_status_includes_this_session() {
        let fx = Fixture::new();
        let (session, _) = fx.open();

        match session.handle_request(&ClientRequest::GetStatus) {
            Reply::Event(ServerEvent::Status { report }) => {
                assert_eq!(report.connected_clients, 1);
                assert!(report.file_exists);
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn test_message_is_echoed() {
        let fx = Fixture::new();
        let (session, _) = fx.open();

        let request = ClientRequest::Message {
            data: serde_json::json!("Hello from client!"),
        };
        match session.handle_request(&request) {
            Reply::Event(ServerEvent::MessageReceived { message, .. }) => {
                assert!(message.starts_with("Server received: "));
                assert!(message.contains("Hello from client!"));
            }
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_broadcast_test_reaches_all_sessions() {
        let fx = Fixture::new();
        let (sender, _) = fx.open();
        let (mut other, _) = fx.open();

        assert!(matches!(
            sender.handle_request(&ClientRequest::BroadcastTest),
            Reply::Silent
        ));

        match other.next_event().await {
            Some(ServerEvent::BroadcastMessage {
                message, sender, ..
            }) => {
                assert_eq!(message, BROADCAST_TEST_MESSAGE);
                assert_eq!(sender, "server");
            }
            other => panic!("expected BroadcastMessage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_file_change_arrives_as_file_update() {
        let fx = Fixture::new();
        let (mut session, _) = fx.open();

        let state = fx.store.write("changed".into(), Utc::now());
        fx.hub.notify(&state);

        match session.next_event().await {
            Some(ServerEvent::FileChanged { payload }) => {
                assert_eq!(payload.content, "changed");
                assert_eq!(payload.delivery, DeliveryTag::FileUpdate);
            }
            other => panic!("expected FileChanged, got {other:?}"),
        }
    }

    #[test]
    fn test_disconnect_closes() {
        let fx = Fixture::new();
        let (session, _) = fx.open();
        assert!(matches!(
            session.handle_request(&ClientRequest::Disconnect),
            Reply::Close
        ));
    }

    #[test]
    fn test_drop_unsubscribes_unconditionally() {
        let fx = Fixture::new();
        let (session, _) = fx.open();
        assert_eq!(fx.hub.subscriber_count(), 1);

        drop(session);
        assert_eq!(fx.hub.subscriber_count(), 0);
    }

    #[test]
    fn test_server_event_wire_format() {
        let fx = Fixture::new();
        let state = fx.store.write("wire".into(), Utc::now());

        let event = ServerEvent::FileChanged {
            payload: ContentPayload::new(&state, DeliveryTag::FileUpdate),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"file_changed\""));
        assert!(json.contains("\"type\":\"file_update\""));

        let event = ServerEvent::Error {
            message: "bad request".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"error\""));
    }
}
