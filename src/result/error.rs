//! Error types for nioscon

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single expect/send step on a session.
///
/// The state machine never sees `Timeout` or `Eof` here in practice, because
/// every state it reads in lists both pseudo-patterns. They remain for callers
/// that drive a [`Session`](crate::Session) by hand.
#[derive(Error, Debug)]
pub enum ExpectError {
    /// Nothing matched within the session timeout.
    #[error("Timeout waiting for pattern (after {duration:?})")]
    Timeout {
        /// Duration that was waited before timeout
        duration: Duration,
    },

    /// The remote side closed its output before anything matched.
    #[error("EOF reached before pattern matched")]
    Eof,

    /// Invalid pattern.
    #[error("Invalid pattern: {0}")]
    PatternError(#[from] PatternError),

    /// I/O error on the transport.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// PTY creation or manipulation failed.
    #[error("PTY error: {0}")]
    PtyError(String),

    /// The transport command could not be spawned.
    #[error("Failed to spawn process: {0}")]
    SpawnError(String),

    /// The transport was used after it was closed.
    #[error("Transport is closed")]
    Closed,
}

/// Errors related to pattern creation.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Invalid regex pattern.
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Invalid glob pattern.
    #[error("Invalid glob: {0}")]
    InvalidGlob(String),

    /// Empty pattern.
    #[error("Pattern cannot be empty")]
    EmptyPattern,
}

/// Errors surfaced to callers of [`Console`](crate::Console).
///
/// Wrong credentials and rejected promotions are *not* errors; they come back
/// as an [`Outcome`](crate::Outcome) with a failure status.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// The SSH session could not be established, or the login handshake ended
    /// before reaching either a password prompt or a known continuation.
    #[error("ssh connection issue with {host}: {detail}")]
    Connect {
        /// Target host
        host: String,
        /// What went wrong, including any output seen
        detail: String,
    },

    /// The stream ended or timed out after authentication succeeded.
    ///
    /// The remote state is unknown when this is returned.
    #[error("session with {host} broke off while {state}: {detail}")]
    Session {
        /// Target host
        host: String,
        /// State the session was in
        state: String,
        /// What went wrong, including any output seen
        detail: String,
    },

    /// Reading from or writing to the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] ExpectError),

    /// The configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
