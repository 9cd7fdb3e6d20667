//! Long-poll delivery state machine.
//!
//! A long-poll connection checks the store on a fixed cadence and answers
//! every tick: a change payload when the version moved, a heartbeat when it
//! did not, and exactly one terminal timeout event once the hard deadline
//! passes. The deadline wins over a pending change: the terminal event is
//! always content-free.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PollCursor;
use crate::state::FileState;

/// What one long-poll tick produced.
#[derive(Debug)]
pub enum LongPollTick {
    /// The version moved; carries the new snapshot
    Change(Arc<FileState>),
    /// No change this tick
    Heartbeat,
    /// The deadline passed; terminal
    Timeout,
}

/// Wire event emitted for each long-poll tick, one JSON object per line.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Change payload
    LongPolling {
        /// File content
        content: String,
        /// Snapshot version
        version: u64,
        /// When the content was last read from disk
        last_modified: Option<DateTime<Utc>>,
        /// When this event was built
        timestamp: DateTime<Utc>,
        /// Always `true`; distinguishes change events from heartbeats
        change_detected: bool,
    },
    /// Keep-alive tick with no new version
    Heartbeat {
        /// When this event was built
        timestamp: DateTime<Utc>,
    },
    /// Terminal event after the deadline
    ConnectionTimeout {
        /// Human-readable reason
        message: String,
    },
}

impl LiveEvent {
    /// Build the wire event for a tick outcome.
    #[must_use]
    pub fn from_tick(tick: &LongPollTick, deadline: Duration) -> Self {
        match tick {
            LongPollTick::Change(state) => Self::LongPolling {
                content: state.content.clone(),
                version: state.version,
                last_modified: state.modified_at,
                timestamp: Utc::now(),
                change_detected: true,
            },
            LongPollTick::Heartbeat => Self::Heartbeat {
                timestamp: Utc::now(),
            },
            LongPollTick::Timeout => Self::ConnectionTimeout {
                message: format!("Connection closed after {} seconds", deadline.as_secs()),
            },
        }
    }
}

/// State of one long-poll connection.
///
/// The caller drives the session: `tick` once per cadence interval, stop
/// after it reports the timeout. Taking `now` as a parameter keeps the
/// deadline logic testable without wall-clock waits.
pub struct LongPollSession {
    cursor: PollCursor,
    started_at: Instant,
    deadline: Duration,
    finished: bool,
}

impl LongPollSession {
    /// Open a session starting now.
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        Self::starting_at(deadline, Instant::now())
    }

    /// Open a session with an explicit start instant.
    #[must_use]
    pub fn starting_at(deadline: Duration, started_at: Instant) -> Self {
        Self {
            cursor: PollCursor::new(),
            started_at,
            deadline,
            finished: false,
        }
    }

    /// Evaluate one tick.
    ///
    /// The deadline is checked before the cursor, so a change pending on
    /// the final tick is dropped in favor of the terminal timeout.
    pub fn tick(&mut self, now: Instant, state: &Arc<FileState>) -> LongPollTick {
        if now.duration_since(self.started_at) >= self.deadline {
            self.finished = true;
            return LongPollTick::Timeout;
        }
        match self.cursor.observe(state) {
            Some(changed) => LongPollTick::Change(changed),
            None => LongPollTick::Heartbeat,
        }
    }

    /// Whether the terminal timeout has been emitted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
