//! File system watching for the monitored file.
//!
//! This module provides cross-platform file system watching using the
//! `notify` crate. It handles:
//! - Real-time file system event detection
//! - Event debouncing to coalesce rapid changes (editor save artifacts)
//! - Filtering events down to the single watched file
//!
//! [`FileWatcher`] is the low-level event source; [`FileMonitor`] layers the
//! read/compare/publish loop on top of it.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::{Error, Result};

mod monitor;

pub use monitor::FileMonitor;

/// A debounced "the watched file was touched" signal.
#[derive(Debug, Clone, Copy)]
pub struct ChangeSignal {
    /// When the last raw event in the coalesced burst was seen
    pub detected_at: Instant,
}

/// Watches a single file for modifications.
///
/// The watcher registers on the file's parent directory (non-recursive) and
/// filters events down to the watched file name; watching the file handle
/// itself breaks under the rename-and-replace save strategy most editors
/// use. Bursts of raw events are coalesced by a quiet-window debouncer.
///
/// # Example
///
/// ```rust,ignore
/// let mut watcher = FileWatcher::new(Path::new("file.txt"), 200)?;
/// watcher.start()?;
///
/// while let Some(signal) = watcher.next_event().await {
///     println!("change detected at {:?}", signal.detected_at);
/// }
/// ```
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<Instant>,
    watch_dir: PathBuf,
    debouncer: Debouncer,
}

impl FileWatcher {
    /// Create a new watcher for the given file.
    ///
    /// The watcher is created but not started. Call `start()` to begin
    /// watching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] if the path has no file name component or
    /// the platform watch handle cannot be created.
    pub fn new(path: &Path, debounce_ms: u64) -> Result<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Watch(format!("not a file path: {}", path.display())))?
            .to_os_string();

        let watch_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                if event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()))
                {
                    let _ = event_tx.send(Instant::now());
                }
            }
            Err(e) => tracing::warn!("file system event error: {e}"),
        })
        .map_err(|e| Error::Watch(e.to_string()))?;

        let debouncer = Debouncer::new(debounce_ms);

        Ok(Self {
            _watcher: watcher,
            event_rx,
            watch_dir,
            debouncer,
        })
    }

    /// Start watching the parent directory of the configured file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] if the platform watcher cannot register the
    /// directory (e.g. watch-handle exhaustion). This is fatal to the
    /// watching component, not a transient condition.
    pub fn start(&mut self) -> Result<()> {
        self._watcher
            .watch(&self.watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch(e.to_string()))
    }

    /// Stop watching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] if the watch registration cannot be removed.
    pub fn stop(&mut self) -> Result<()> {
        self._watcher
            .unwatch(&self.watch_dir)
            .map_err(|e| Error::Watch(e.to_string()))
    }

    /// Receive the next debounced change signal.
    ///
    /// Returns `None` when the event channel is closed, which means the
    /// watch subsystem itself is gone.
    pub async fn next_event(&mut self) -> Option<ChangeSignal> {
        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(at) => self.debouncer.add(at),
                        None => return self.debouncer.take(),
                    }
                }
                () = tokio::time::sleep(self.debouncer.window()) => {
                    if let Some(signal) = self.debouncer.flush() {
                        return Some(signal);
                    }
                }
            }
        }
    }
}

/// Debouncer coalescing rapid file system events for one file.
///
/// Editors generate multiple events per save (truncate, write, flush,
/// rename). The debouncer keeps only the most recent event and emits it
/// once the file has been quiet for the configured window.
struct Debouncer {
    pending: Option<(Instant, Instant)>,
    window_ms: u64,
}

impl Debouncer {
    fn new(window_ms: u64) -> Self {
        Self {
            pending: None,
            window_ms,
        }
    }

    fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Record an event. Later events replace earlier ones.
    fn add(&mut self, at: Instant) {
        self.pending = Some((at, Instant::now()));
    }

    /// Emit the pending event if it has been quiet long enough.
    fn flush(&mut self) -> Option<ChangeSignal> {
        let (_, last_seen) = self.pending.as_ref()?;
        if last_seen.elapsed() >= self.window() {
            self.take()
        } else {
            None
        }
    }

    /// Emit the pending event regardless of the quiet window.
    ///
    /// Used when shutting down so the final change is not lost.
    fn take(&mut self) -> Option<ChangeSignal> {
        self.pending
            .take()
            .map(|(detected_at, _)| ChangeSignal { detected_at })
    }
}
