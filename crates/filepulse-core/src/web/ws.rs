//! WebSocket publish/subscribe endpoint.
//!
//! `GET /ws` upgrades the connection and hands it to a
//! [`PubSubSession`]: greetings first, then a select loop over
//! hub-delivered events and inbound client requests. The session
//! unsubscribes itself on drop, so every exit path of this handler
//! releases the subscriber record.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};

use crate::transport::pubsub::{ClientRequest, PubSubSession, Reply, ServerEvent};

use super::state::SharedState;

/// GET /ws - upgrade to a publish/subscribe connection.
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    let (mut session, greetings) = PubSubSession::open(
        state.hub.clone(),
        state.store.clone(),
        state.reporter.clone(),
    );
    tracing::debug!("client {} connected", session.id());

    for event in greetings {
        if send_event(&mut sender, &event).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = session.next_event() => {
                let Some(event) = event else { break };
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientRequest>(&text) {
                            Ok(request) => session.handle_request(&request),
                            Err(e) => Reply::Event(ServerEvent::Error {
                                message: format!("unrecognized request: {e}"),
                            }),
                        };
                        match reply {
                            Reply::Event(event) => {
                                if send_event(&mut sender, &event).await.is_err() {
                                    break;
                                }
                            }
                            Reply::Silent => {}
                            Reply::Close => break,
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Ping/pong are answered by axum; binary frames carry
                    // nothing in this protocol.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("websocket error: {e}");
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("client {} disconnected", session.id());
    // Dropping the session unsubscribes it from the hub.
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let data = serde_json::to_string(event).unwrap_or_default();
    sender.send(Message::Text(data.into())).await
}
