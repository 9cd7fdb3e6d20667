//! Long-poll endpoint with heartbeats and a hard deadline.
//!
//! `GET /api/hello/live` answers every tick with one JSON object per line:
//! a change payload when the version moved, a heartbeat otherwise, and a
//! single terminal `connection_timeout` once the deadline passes. The
//! deadline is enforced by [`LongPollSession`] itself, independent of
//! client behavior.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use futures::stream::Stream;

use crate::state::FileStateStore;
use crate::transport::longpoll::{LiveEvent, LongPollSession};

use super::state::SharedState;

/// GET /api/hello/live - bounded long-poll stream.
pub async fn live_content(State(state): State<SharedState>) -> Response {
    let stream = live_stream(
        Arc::clone(&state.store),
        state.delivery.live_interval,
        state.delivery.live_deadline,
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .unwrap()
}

/// One serialized [`LiveEvent`] per tick, newline-delimited, ending with
/// the terminal timeout event.
fn live_stream(
    store: Arc<FileStateStore>,
    interval: Duration,
    deadline: Duration,
) -> impl Stream<Item = Result<String, Infallible>> {
    async_stream::stream! {
        let mut session = LongPollSession::new(deadline);
        loop {
            let tick = session.tick(Instant::now(), &store.read());
            let event = LiveEvent::from_tick(&tick, deadline);
            let line = serde_json::to_string(&event).unwrap_or_default();
            yield Ok::<String, Infallible>(format!("{line}\n"));

            if session.is_finished() {
                break;
            }
            tokio::time::sleep(interval).await;
        }
    }
}
