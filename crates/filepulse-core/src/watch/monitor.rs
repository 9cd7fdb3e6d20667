//! Read/compare/publish loop over the watched file.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::FileWatcher;
use crate::hub::BroadcastHub;
use crate::state::{FileState, FileStateStore};
use crate::{Error, Result};

/// Owns the watched file: detects changes, suppresses no-ops, and publishes
/// each genuine content change into the store exactly once.
///
/// The monitor is the store's only writer. Transient read failures are
/// logged and leave the previous state untouched; a failure of the watch
/// subsystem itself flips the shared health flag and is returned to the
/// supervising task.
pub struct FileMonitor {
    path: PathBuf,
    store: Arc<FileStateStore>,
    hub: Arc<BroadcastHub>,
    health: Arc<AtomicBool>,
    debounce_ms: u64,
}

impl FileMonitor {
    /// Create a monitor for the given file.
    ///
    /// `health` is shared with the status reporter: `true` while the watch
    /// subsystem is believed alive, flipped to `false` when it dies.
    pub fn new(
        path: impl Into<PathBuf>,
        store: Arc<FileStateStore>,
        hub: Arc<BroadcastHub>,
        health: Arc<AtomicBool>,
        debounce_ms: u64,
    ) -> Self {
        Self {
            path: path.into(),
            store,
            hub,
            health,
            debounce_ms,
        }
    }

    /// Path of the watched file.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the initial state, creating the file if it does not exist.
    ///
    /// Must be called before [`run`](Self::run) so the store is never read
    /// before any state exists. The initial load is version 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the initial read
    /// fails; at startup there is no previous state to fall back to.
    pub fn initialize(&self) -> Result<Arc<FileState>> {
        if !self.path.exists() {
            std::fs::write(&self.path, crate::PLACEHOLDER_CONTENT)?;
            tracing::info!("created {} with placeholder content", self.path.display());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::FileRead {
            path: self.path.display().to_string(),
            source: e,
        })?;

        let state = self.store.write(content, Utc::now());
        tracing::info!(
            "loaded {} ({} bytes, version {})",
            self.path.display(),
            state.content.len(),
            state.version
        );
        Ok(state)
    }

    /// Watch the file until the watch subsystem fails.
    ///
    /// Runs on its own task, blocking on file system event delivery. Only
    /// returns on watch-subsystem failure, which is fatal to this component
    /// and must be handled by the caller; read failures are recovered
    /// locally and never end the loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] when the watcher cannot be created or
    /// started, or when event delivery stops.
    pub async fn run(self) -> Result<()> {
        let result = self.watch_loop().await;
        self.health.store(false, Ordering::Relaxed);
        if let Err(ref e) = result {
            tracing::error!("file watcher failed: {e}");
        }
        result
    }

    async fn watch_loop(&self) -> Result<()> {
        let mut watcher = FileWatcher::new(&self.path, self.debounce_ms)?;
        watcher.start()?;
        self.health.store(true, Ordering::Relaxed);
        tracing::info!("watching {}", self.path.display());

        while watcher.next_event().await.is_some() {
            self.refresh();
        }

        Err(Error::Watch("file system event channel closed".into()))
    }

    /// Re-read the file and publish if the content genuinely changed.
    fn refresh(&self) {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let current = self.store.read();
                if current.modified_at.is_some() && current.content == content {
                    // Metadata-only touch or identical rewrite
                    tracing::trace!("no-op change discarded");
                    return;
                }
                let state = self.store.write(content, Utc::now());
                tracing::info!("file updated (version {})", state.version);
                self.hub.notify(&state);
            }
            Err(e) => {
                tracing::warn!(
                    "failed to read {}, retaining previous state: {e}",
                    self.path.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn monitor_in(dir: &TempDir) -> (FileMonitor, Arc<FileStateStore>, Arc<BroadcastHub>) {
        let store = Arc::new(FileStateStore::new(FileState::uninitialized()));
        let hub = Arc::new(BroadcastHub::new(Arc::clone(&store)));
        let health = Arc::new(AtomicBool::new(true));
        let monitor = FileMonitor::new(
            dir.path().join("file.txt"),
            Arc::clone(&store),
            Arc::clone(&hub),
            health,
            50,
        );
        (monitor, store, hub)
    }

    #[test]
    fn test_initialize_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let (monitor, store, _hub) = monitor_in(&dir);

        let state = monitor.initialize().unwrap();

        assert_eq!(state.content, crate::PLACEHOLDER_CONTENT);
        assert_eq!(state.version, 0);
        assert_eq!(
            std::fs::read_to_string(monitor.path()).unwrap(),
            crate::PLACEHOLDER_CONTENT
        );
        assert_eq!(store.read().version, 0);
    }

    #[test]
    fn test_initialize_reads_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file.txt"), "already here").unwrap();
        let (monitor, store, _hub) = monitor_in(&dir);

        let state = monitor.initialize().unwrap();

        assert_eq!(state.content, "already here");
        assert_eq!(store.read().content, "already here");
    }

    #[test]
    fn test_refresh_publishes_genuine_change() {
        let dir = TempDir::new().unwrap();
        let (monitor, store, hub) = monitor_in(&dir);
        monitor.initialize().unwrap();

        let mut sub = hub.subscribe();
        std::fs::write(monitor.path(), "changed").unwrap();
        monitor.refresh();

        assert_eq!(store.read().content, "changed");
        assert_eq!(store.read().version, 1);
        match sub.events.try_recv() {
            Ok(crate::hub::HubEvent::FileChanged(state)) => {
                assert_eq!(state.content, "changed");
                assert_eq!(state.version, 1);
            }
            other => panic!("expected FileChanged, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_suppresses_noop() {
        let dir = TempDir::new().unwrap();
        let (monitor, store, hub) = monitor_in(&dir);
        monitor.initialize().unwrap();

        let mut sub = hub.subscribe();
        // Rewrite identical bytes: the raw event fires but nothing changed.
        std::fs::write(monitor.path(), crate::PLACEHOLDER_CONTENT).unwrap();
        monitor.refresh();

        assert_eq!(store.read().version, 0, "version must not bump");
        assert!(sub.events.try_recv().is_err(), "no notification expected");
    }

    #[test]
    fn test_refresh_retains_state_on_read_failure() {
        let dir = TempDir::new().unwrap();
        let (monitor, store, _hub) = monitor_in(&dir);
        monitor.initialize().unwrap();

        std::fs::remove_file(monitor.path()).unwrap();
        monitor.refresh();

        // Deleted mid-watch: previous state stays visible.
        assert_eq!(store.read().content, crate::PLACEHOLDER_CONTENT);
        assert_eq!(store.read().version, 0);
    }
}
