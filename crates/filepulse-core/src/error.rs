//! Error types for FilePulse.
//!
//! This module provides a unified error type for all FilePulse operations,
//! with specific error variants for different failure modes.

use std::io;

use thiserror::Error;

/// A specialized `Result` type for FilePulse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for FilePulse.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the watched file failed (transient, prior state is retained)
    #[error("cannot read watched file '{path}': {source}")]
    FileRead {
        /// The file that could not be read
        path: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The file system watch subsystem failed (fatal to the watcher)
    #[error("file watcher error: {0}")]
    Watch(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// The server could not bind its listen address
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Address the server tried to bind
        addr: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The server failed while running
    #[error("server error: {0}")]
    Server(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns whether this error is recoverable.
    ///
    /// Transient read failures are recovered locally: observers keep seeing
    /// the last good state. Everything else is surfaced to the caller.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::FileRead { .. })
    }
}
