//! Read-only monitoring introspection.
//!
//! [`StatusReporter`] aggregates ground truth about the watched file and
//! the live broadcast state. Nothing is cached: every [`report`] call
//! recomputes from the file system, the store, and the hub, so the answer
//! reflects reality even when the in-memory state has gone stale.
//!
//! [`report`]: StatusReporter::report

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hub::BroadcastHub;
use crate::state::FileStateStore;

/// Point-in-time monitoring snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Whether the watched file currently exists on disk
    pub file_exists: bool,
    /// File size in bytes (0 when missing)
    pub file_size: u64,
    /// Version of the current in-memory snapshot
    pub version: u64,
    /// When the content was last read from disk
    pub last_modified: Option<DateTime<Utc>>,
    /// Number of registered subscribers
    pub connected_clients: usize,
    /// Bounded preview of the current content
    pub current_content_preview: String,
    /// Whether the watch subsystem is believed alive
    pub watcher_alive: bool,
    /// When this report was built
    pub server_time: DateTime<Utc>,
}

/// Builds [`StatusReport`]s from live sources.
pub struct StatusReporter {
    path: PathBuf,
    store: Arc<FileStateStore>,
    hub: Arc<BroadcastHub>,
    watcher_alive: Arc<AtomicBool>,
}

impl StatusReporter {
    /// Create a reporter over the given sources.
    ///
    /// `watcher_alive` is the health flag shared with the file monitor.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        store: Arc<FileStateStore>,
        hub: Arc<BroadcastHub>,
        watcher_alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            path: path.into(),
            store,
            hub,
            watcher_alive,
        }
    }

    /// Build a fresh report.
    ///
    /// File existence and size come from a live stat rather than the
    /// in-memory state, since the disk is ground truth independent of
    /// watcher health. A missing file is reported, never an error.
    #[must_use]
    pub fn report(&self) -> StatusReport {
        let (file_exists, file_size) = match std::fs::metadata(&self.path) {
            Ok(meta) => (true, meta.len()),
            Err(_) => (false, 0),
        };

        let state = self.store.read();

        StatusReport {
            file_exists,
            file_size,
            version: state.version,
            last_modified: state.modified_at,
            connected_clients: self.hub.subscriber_count(),
            current_content_preview: preview(&state.content),
            watcher_alive: self.watcher_alive.load(Ordering::Relaxed),
            server_time: Utc::now(),
        }
    }
}

/// First [`crate::PREVIEW_MAX_CHARS`] characters, with a truncation marker.
///
/// Char-based so multi-byte content never splits mid-character.
fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(crate::PREVIEW_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
