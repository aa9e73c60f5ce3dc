//! Transports carrying a console session
//!
//! A [`Transport`] is the byte pipe to the remote console: write input, read
//! output with a deadline, close. A [`Connector`] opens one for a host and
//! user. The production pair is [`SshConnector`] / [`PtyTransport`], which run
//! `ssh user@host` under a pseudo-terminal. [`scripted`] holds an in-memory
//! pair that replays canned console output.

mod pty;
pub mod scripted;

pub use pty::{PtyTransport, SshConnector};

use crate::result::ExpectError;
use std::future::Future;
use std::time::Duration;

/// What a single read from a transport produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Some output bytes.
    Data(Vec<u8>),
    /// The remote side closed its output.
    Eof,
    /// Nothing arrived before the deadline.
    TimedOut,
}

/// A byte stream to and from the remote console.
pub trait Transport: Send {
    /// Wait for the next piece of output, at most `timeout` (forever if `None`).
    fn read(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Chunk, ExpectError>> + Send;

    /// Send raw bytes. No newline is added.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), ExpectError>> + Send;

    /// Release the transport.
    ///
    /// Must be idempotent: closing an already closed transport returns `Ok(())`
    /// and has no further side effect.
    fn close(&mut self) -> impl Future<Output = Result<(), ExpectError>> + Send;

    /// Whether [`close`](Transport::close) has run
    fn is_closed(&self) -> bool;
}

/// Opens transports to console hosts.
pub trait Connector: Send + Sync {
    /// Transport produced by this connector
    type Transport: Transport;

    /// Start a remote session to `host` as `user`.
    fn connect(&self, host: &str, user: &str) -> Result<Self::Transport, ExpectError>;
}
