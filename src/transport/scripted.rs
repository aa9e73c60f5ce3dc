//! In-memory transport replaying a canned console conversation.
//!
//! Useful for exercising workflows without a NIOS appliance. The script is a
//! list of steps: output to emit, a point where the console waits for the next
//! line of input, end of stream, or silence.
//!
//! ```
//! use nioscon::transport::scripted::ScriptedTransport;
//!
//! let transport = ScriptedTransport::new()
//!     .output("admin@gm's password: ")
//!     .await_input()
//!     .output("Infoblox > ");
//! let handle = transport.handle();
//! assert_eq!(handle.close_calls(), 0);
//! ```

use super::{Chunk, Connector, Transport};
use crate::result::ExpectError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Step {
    Output(Vec<u8>),
    AwaitInput,
    Eof,
    Silence,
}

#[derive(Debug, Default)]
struct Shared {
    sent: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
}

/// Observer for a [`ScriptedTransport`] that stays valid after the transport
/// has been handed to a session.
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    shared: Arc<Shared>,
}

impl ScriptHandle {
    /// Every write, in order, as lossy UTF-8
    pub fn sent(&self) -> Vec<String> {
        self.shared
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Writes with a trailing newline stripped, i.e. the lines the engine answered
    pub fn sent_lines(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|s| s.strip_suffix('\n').map(str::to_string).unwrap_or(s))
            .collect()
    }

    /// How many times `close` was called, including no-op repeats
    pub fn close_calls(&self) -> usize {
        self.shared.close_calls.load(Ordering::SeqCst)
    }
}

/// Transport that plays back a fixed script.
#[derive(Debug)]
pub struct ScriptedTransport {
    steps: VecDeque<Step>,
    shared: Arc<Shared>,
    closed: bool,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Empty script; reads report end of stream once it is exhausted
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            shared: Arc::new(Shared::default()),
            closed: false,
        }
    }

    /// Emit `text` as console output
    pub fn output(mut self, text: impl AsRef<[u8]>) -> Self {
        self.steps.push_back(Step::Output(text.as_ref().to_vec()));
        self
    }

    /// Hold back the remaining output until the engine writes something
    pub fn await_input(mut self) -> Self {
        self.steps.push_back(Step::AwaitInput);
        self
    }

    /// Close the output stream
    pub fn eof(mut self) -> Self {
        self.steps.push_back(Step::Eof);
        self
    }

    /// Stop producing output without closing, so every read times out
    pub fn silence(mut self) -> Self {
        self.steps.push_back(Step::Silence);
        self
    }

    /// Observer for writes and closes
    pub fn handle(&self) -> ScriptHandle {
        ScriptHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Transport for ScriptedTransport {
    async fn read(&mut self, _timeout: Option<Duration>) -> Result<Chunk, ExpectError> {
        if self.closed {
            return Err(ExpectError::Closed);
        }

        match self.steps.front() {
            None | Some(Step::Eof) => Ok(Chunk::Eof),
            // Waiting on input that never came looks like a hung console
            Some(Step::AwaitInput) | Some(Step::Silence) => Ok(Chunk::TimedOut),
            Some(Step::Output(_)) => match self.steps.pop_front() {
                Some(Step::Output(data)) => Ok(Chunk::Data(data)),
                _ => Ok(Chunk::Eof),
            },
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), ExpectError> {
        if self.closed {
            return Err(ExpectError::Closed);
        }

        self.shared
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(String::from_utf8_lossy(data).into_owned());

        if matches!(self.steps.front(), Some(Step::AwaitInput)) {
            self.steps.pop_front();
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ExpectError> {
        self.shared.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Connector handing out one prepared [`ScriptedTransport`].
#[derive(Debug)]
pub struct ScriptedConnector {
    transport: Mutex<Option<ScriptedTransport>>,
    refuse: Option<String>,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    /// Connector that returns `transport` on the first connect
    pub fn new(transport: ScriptedTransport) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
            refuse: None,
            connects: AtomicUsize::new(0),
        }
    }

    /// Connector whose every connect fails with `reason`
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            transport: Mutex::new(None),
            refuse: Some(reason.into()),
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of connect attempts so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(&self, _host: &str, _user: &str) -> Result<ScriptedTransport, ExpectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.refuse {
            return Err(ExpectError::SpawnError(reason.clone()));
        }

        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| ExpectError::SpawnError("script already used".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_output_is_held_until_input() {
        let mut transport = ScriptedTransport::new()
            .output("password: ")
            .await_input()
            .output("Infoblox > ");

        assert_eq!(
            transport.read(None).await.unwrap(),
            Chunk::Data(b"password: ".to_vec())
        );
        assert_eq!(transport.read(None).await.unwrap(), Chunk::TimedOut);

        assert_ok!(transport.write(b"secret\n").await);
        assert_eq!(
            transport.read(None).await.unwrap(),
            Chunk::Data(b"Infoblox > ".to_vec())
        );
        assert_eq!(transport.read(None).await.unwrap(), Chunk::Eof);
    }

    #[tokio::test]
    async fn test_records_writes() {
        let mut transport = ScriptedTransport::new();
        let handle = transport.handle();

        assert_ok!(transport.write(b"yes\n").await);
        assert_ok!(transport.write(b"show status\n").await);

        assert_eq!(handle.sent_lines(), vec!["yes", "show status"]);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut transport = ScriptedTransport::new().output("ignored");
        let handle = transport.handle();

        assert_ok!(transport.close().await);
        assert_ok!(transport.close().await);

        assert!(transport.is_closed());
        assert_eq!(handle.close_calls(), 2);
        assert_err!(transport.read(None).await);
        assert_err!(transport.write(b"late\n").await);
        assert!(handle.sent().is_empty());
    }

    #[test]
    fn test_connector_hands_out_once() {
        let connector = ScriptedConnector::new(ScriptedTransport::new());

        assert_ok!(connector.connect("gm", "admin"));
        assert_err!(connector.connect("gm", "admin"));
        assert_eq!(connector.connects(), 2);
    }

    #[test]
    fn test_refusing_connector() {
        let connector = ScriptedConnector::refusing("ssh: not found");
        let err = connector.connect("gm", "admin").unwrap_err();
        assert!(err.to_string().contains("ssh: not found"));
    }
}
