//! Versioned snapshot of the watched file.
//!
//! [`FileStateStore`] holds the single current `(content, version,
//! modified_at)` tuple. The watcher is the only writer; every transport
//! reads through [`FileStateStore::read`], which hands out the whole
//! snapshot as one [`Arc`] so a reader can never observe content from one
//! version and a timestamp from another.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Immutable snapshot of the watched file at one version.
#[derive(Debug, Clone, Serialize)]
pub struct FileState {
    /// File content at this version
    pub content: String,
    /// Monotonic version, starting at 0 for the initial load
    pub version: u64,
    /// When the content was read from disk; `None` only in the
    /// uninitialized sentinel
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileState {
    /// The sentinel state returned by [`FileStateStore::read`] before the
    /// first write: empty content, version 0, no modification time.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            content: String::new(),
            version: 0,
            modified_at: None,
        }
    }
}

struct Inner {
    current: Arc<FileState>,
    next_version: u64,
}

/// Holds the current [`FileState`] and hands out race-free snapshots.
///
/// Reads and writes swap the snapshot as a whole `Arc`; the tuple is never
/// updated field-by-field, and the lock is never held across an await.
pub struct FileStateStore {
    inner: RwLock<Inner>,
}

impl FileStateStore {
    /// Create a store seeded with the given sentinel state.
    ///
    /// The sentinel is what `read` returns until the first `write`; its
    /// version is not consumed, so the first published state is version 0.
    #[must_use]
    pub fn new(sentinel: FileState) -> Self {
        Self {
            inner: RwLock::new(Inner {
                current: Arc::new(sentinel),
                next_version: 0,
            }),
        }
    }

    /// Publish new content, assigning the next version.
    ///
    /// Returns the newly installed state so the caller can fan it out
    /// without re-reading (notifications carry the exact published state).
    pub fn write(&self, content: String, modified_at: DateTime<Utc>) -> Arc<FileState> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let state = Arc::new(FileState {
            content,
            version: inner.next_version,
            modified_at: Some(modified_at),
        });
        inner.next_version += 1;
        inner.current = Arc::clone(&state);
        state
    }

    /// Snapshot of the most recent published state.
    ///
    /// Never blocks beyond the brief swap and always returns a consistent
    /// tuple. Before the first write this is the sentinel passed to `new`.
    #[must_use]
    pub fn read(&self) -> Arc<FileState> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&inner.current)
    }

    /// Version of the current snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.read().version
    }
}
