//! # FilePulse Core Library
//!
//! `filepulse-core` provides the core functionality for FilePulse, a server
//! that watches a single text file and broadcasts its latest content to
//! connected observers.
//!
//! ## Delivery styles
//!
//! - **Pull**: one-shot snapshot of the current content
//! - **Push stream**: Server-Sent Events, one payload per detected change
//! - **Long poll**: bounded connection with heartbeats and a hard deadline
//! - **Publish/subscribe**: WebSocket clients notified on every change
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`hub`] - Subscriber registry and change fan-out
//! - [`state`] - Versioned snapshot of the watched file
//! - [`status`] - Read-only monitoring introspection
//! - [`transport`] - Delivery policies for the four transport styles
//! - [`watch`] - File system watching and change publishing
//! - [`web`] - Embedded web server exposing the HTTP/WebSocket surface
//!
//! ## Example
//!
//! ```rust,ignore
//! use filepulse_core::hub::BroadcastHub;
//! use filepulse_core::state::{FileState, FileStateStore};
//! use filepulse_core::watch::FileMonitor;
//!
//! let store = Arc::new(FileStateStore::new(FileState::uninitialized()));
//! let hub = Arc::new(BroadcastHub::new(Arc::clone(&store)));
//! let monitor = FileMonitor::new("file.txt", store, hub, health, 200);
//! monitor.initialize()?;
//! tokio::spawn(monitor.run());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::must_use_candidate)]

use std::time::Duration;

pub mod config;
pub mod error;
pub mod hub;
pub mod state;
pub mod status;
pub mod transport;
pub mod watch;
pub mod web;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP server port
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Default watched file path (relative to the working directory)
pub const DEFAULT_WATCH_FILE: &str = "file.txt";

/// Content written when the watched file has to be created at startup
pub const PLACEHOLDER_CONTENT: &str = "Hello World! This is initial content.";

/// Default quiet window for coalescing file system events
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Poll cadence of the push-stream transport
pub const DEFAULT_STREAM_INTERVAL: Duration = Duration::from_secs(1);

/// Poll cadence of the long-poll transport
pub const DEFAULT_LIVE_INTERVAL: Duration = Duration::from_secs(2);

/// Hard wall-clock deadline of a long-poll connection
pub const DEFAULT_LIVE_DEADLINE: Duration = Duration::from_secs(60);

/// Maximum number of characters in a status content preview
pub const PREVIEW_MAX_CHARS: usize = 100;
