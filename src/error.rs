//! Error types for the serial session and its transport.
//!
//! Every variant renders as a sentence fit for a log entry: the panel shows
//! `to_string()` verbatim.

use thiserror::Error;

/// The host cannot enumerate serial ports at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Serial ports are not available on this host: {reason}")]
pub struct CapabilityUnsupported {
    pub reason: String,
}

/// Why a connection attempt did not produce a live session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Already connected to {port}")]
    AlreadyConnected { port: String },

    #[error("Connection cancelled: no port selected")]
    Cancelled,

    #[error("Connection failed: permission denied on {port} ({reason})")]
    PermissionDenied { port: String, reason: String },

    #[error("Connection failed: {port} not found")]
    NotFound { port: String },

    #[error("Connection failed: could not open {port} ({reason})")]
    Open { port: String, reason: String },

    #[error("Connection failed: could not list serial ports ({reason})")]
    Enumerate { reason: String },

    #[error("Connection failed: could not start reader ({reason})")]
    Spawn { reason: String },
}

/// Failure writing an outgoing line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Not connected! Connect first")]
    NotConnected,

    #[error("Send failed: {0}")]
    WriteFailed(String),
}

/// Failure of the background reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("Read failed: {0}")]
    Io(String),

    #[error("Read failed: device closed the stream")]
    EndOfStream,
}

/// One teardown step that did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeardownFailure {
    #[error("reader thread panicked")]
    Reader,

    #[error("closing writer: {0}")]
    Writer(String),

    #[error("closing port: {0}")]
    Port(String),
}

/// Aggregate of teardown steps that failed during `disconnect`.
///
/// Informational only: the session is `Disconnected` regardless.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("disconnect completed with {} failed step(s)", failures.len())]
pub struct DisconnectError {
    pub failures: Vec<TeardownFailure>,
}
