//! Server-Sent Events push stream.
//!
//! `GET /api/hello/stream` keeps the connection open and emits one payload
//! per detected change, checking the store on a fixed cadence through a
//! [`PollCursor`]. The stream never times out; it ends when the client
//! closes the connection and the stream is dropped. No hub registration is
//! involved, so there is nothing to release.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};

use crate::state::FileStateStore;
use crate::transport::{ContentPayload, DeliveryTag, PollCursor};

use super::state::SharedState;

/// GET /api/hello/stream - SSE stream of change payloads.
pub async fn stream_content(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = change_stream(Arc::clone(&state.store), state.delivery.stream_interval)
        .map(|data| Ok::<_, Infallible>(Event::default().data(data)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Serialized `live_stream` payloads, one per version change.
///
/// The first item is the current snapshot (an empty cursor treats it as a
/// change); afterwards the store is checked every `interval`.
fn change_stream(store: Arc<FileStateStore>, interval: Duration) -> impl Stream<Item = String> {
    futures::stream::unfold(PollCursor::new(), move |mut cursor| {
        let store = Arc::clone(&store);
        async move {
            loop {
                if let Some(snapshot) = cursor.observe(&store.read()) {
                    let payload = ContentPayload::new(&snapshot, DeliveryTag::LiveStream);
                    let data = serde_json::to_string(&payload).unwrap_or_default();
                    return Some((data, cursor));
                }
                tokio::time::sleep(interval).await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FileState;
    use chrono::Utc;

    #[tokio::test]
    async fn test_first_item_is_current_snapshot() {
        let store = Arc::new(FileStateStore::new(FileState::uninitialized()));
        store.write("streamed".into(), Utc::now());

        let mut stream =
            Box::pin(change_stream(Arc::clone(&store), Duration::from_millis(10)));

        let item = stream.next().await.expect("initial payload");
        let value: serde_json::Value = serde_json::from_str(&item).unwrap();
        assert_eq!(value["content"], "streamed");
        assert_eq!(value["type"], "live_stream");
    }

    #[tokio::test]
    async fn test_change_emits_exactly_one_payload() {
        let store = Arc::new(FileStateStore::new(FileState::uninitialized()));
        store.write("before".into(), Utc::now());

        let mut stream =
            Box::pin(change_stream(Arc::clone(&store), Duration::from_millis(10)));
        let _initial = stream.next().await;

        store.write("after".into(), Utc::now());

        let item = stream.next().await.expect("change payload");
        let value: serde_json::Value = serde_json::from_str(&item).unwrap();
        assert_eq!(value["content"], "after");
        assert_eq!(value["version"], 1);

        // No further change: the stream stays pending past several ticks.
        let pending =
            tokio::time::timeout(Duration::from_millis(100), stream.next()).await;
        assert!(pending.is_err(), "no duplicate payload for an unchanged version");
    }
}
