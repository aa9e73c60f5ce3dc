//! One live connection to one console host

mod builder;

pub use builder::SessionBuilder;

use crate::buffer::OutputBuffer;
use crate::pattern::{Pattern, PatternSet};
use crate::result::{ExpectError, MatchResult};
use crate::transport::{Chunk, Transport};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A console session over some [`Transport`].
///
/// The session owns its transport exclusively. It keeps the output that has not
/// been consumed by a match yet and offers the single read primitive the
/// engine needs, [`read_until`](Session::read_until).
///
/// # Examples
///
/// ```no_run
/// use nioscon::{Pattern, SessionBuilder, SshConnector};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = SessionBuilder::new()
///     .timeout(Duration::from_secs(10))
///     .open(&SshConnector::default(), "gm.example.com", "admin")?;
///
/// session.read_until(&[Pattern::exact("password:")]).await?;
/// session.send_line("infoblox").await?;
/// session.read_until(&[Pattern::exact(">")]).await?;
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session<T: Transport> {
    host: String,
    user: String,
    transport: T,
    buffer: OutputBuffer,
    timeout: Option<Duration>,
    eof_reached: bool,
}

impl<T: Transport> Session<T> {
    pub(crate) fn new(
        host: &str,
        user: &str,
        transport: T,
        max_buffer_size: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            transport,
            buffer: OutputBuffer::new(max_buffer_size),
            timeout,
            eof_reached: false,
        }
    }

    /// Host this session is connected to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// User the session logs in as
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Wait, with the session timeout, for the first listed pattern to appear.
    ///
    /// Text patterns are tried in list order against everything seen since the
    /// previous match. The match and all text before it are consumed.
    ///
    /// # Errors
    ///
    /// - [`ExpectError::Timeout`] if nothing matched in time and
    ///   [`Pattern::Timeout`] is not listed
    /// - [`ExpectError::Eof`] if the stream ended first and [`Pattern::Eof`] is
    ///   not listed
    /// - pattern compilation and transport errors
    pub async fn read_until(&mut self, patterns: &[Pattern]) -> Result<MatchResult, ExpectError> {
        self.read_until_within(patterns, self.timeout).await
    }

    /// Like [`read_until`](Session::read_until) with an explicit timeout
    /// (`None` waits forever).
    pub async fn read_until_within(
        &mut self,
        patterns: &[Pattern],
        timeout: Option<Duration>,
    ) -> Result<MatchResult, ExpectError> {
        let set = PatternSet::compile(patterns)?;
        let start_time = Instant::now();

        loop {
            if let Some((pattern_index, m)) = set.find(self.buffer.unread()) {
                let (before, matched) = self.buffer.take_match(m.start, m.end);
                trace!(pattern_index, %matched, "pattern matched");
                return Ok(MatchResult {
                    pattern_index,
                    matched,
                    before,
                });
            }

            if self.eof_reached {
                return match set.eof_index() {
                    Some(pattern_index) => Ok(self.pseudo_match(pattern_index)),
                    None => Err(ExpectError::Eof),
                };
            }

            let remaining = match timeout {
                Some(timeout) => {
                    let elapsed = start_time.elapsed();
                    if elapsed >= timeout {
                        return self.timed_out(&set, timeout);
                    }
                    Some(timeout - elapsed)
                }
                None => None,
            };

            match self.transport.read(remaining).await? {
                Chunk::Data(data) => {
                    self.buffer.append(&data);
                    trace!(
                        bytes = data.len(),
                        window = self.buffer.len(),
                        spilled = self.buffer.spilled(),
                        "read output"
                    );
                }
                Chunk::Eof => {
                    debug!(host = %self.host, "end of stream");
                    self.eof_reached = true;
                }
                Chunk::TimedOut => return self.timed_out(&set, timeout.unwrap_or_default()),
            }
        }
    }

    fn timed_out(&mut self, set: &PatternSet, duration: Duration) -> Result<MatchResult, ExpectError> {
        debug!(host = %self.host, ?duration, "timed out waiting for output");
        match set.timeout_index() {
            Some(pattern_index) => Ok(self.pseudo_match(pattern_index)),
            None => Err(ExpectError::Timeout { duration }),
        }
    }

    fn pseudo_match(&mut self, pattern_index: usize) -> MatchResult {
        MatchResult {
            pattern_index,
            matched: String::new(),
            before: self.buffer.take_all(),
        }
    }

    /// Send raw bytes to the console
    pub async fn send(&mut self, data: &[u8]) -> Result<(), ExpectError> {
        self.transport.write(data).await
    }

    /// Send one line of input (a newline is appended).
    ///
    /// The line content is not logged, since it may be a password.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ExpectError> {
        debug!(host = %self.host, bytes = line.len(), "sending line");
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.send(&data).await
    }

    /// Close the transport. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), ExpectError> {
        if !self.transport.is_closed() {
            debug!(host = %self.host, "closing session");
        }
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::ScriptedTransport;
    use tokio_test::assert_ok;

    fn session(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        Session::new("gm", "admin", transport, 8192, Some(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn test_before_is_text_since_previous_match() {
        let mut session = session(
            ScriptedTransport::new()
                .output("Infoblox > ")
                .output("show status\r\nGrid Master\r\n")
                .output("Infoblox > "),
        );

        let first = session.read_until(&[Pattern::exact(">")]).await.unwrap();
        assert_eq!(first.before, "Infoblox ");

        let second = session.read_until(&[Pattern::exact(">")]).await.unwrap();
        assert_eq!(second.before, " show status\r\nGrid Master\r\nInfoblox ");
        assert_eq!(second.matched, ">");
    }

    #[tokio::test]
    async fn test_match_split_across_reads() {
        let mut session = session(ScriptedTransport::new().output("pass").output("word: "));

        let result = session
            .read_until(&[Pattern::exact("password:"), Pattern::Eof])
            .await
            .unwrap();
        assert_eq!(result.pattern_index, 0);
    }

    #[tokio::test]
    async fn test_eof_pattern() {
        let mut session = session(ScriptedTransport::new().output("Connection closed").eof());

        let result = session
            .read_until(&[Pattern::exact(">"), Pattern::Eof, Pattern::Timeout])
            .await
            .unwrap();
        assert_eq!(result.pattern_index, 1);
        assert_eq!(result.before, "Connection closed");
    }

    #[tokio::test]
    async fn test_eof_without_pattern_is_error() {
        let mut session = session(ScriptedTransport::new().eof());

        let result = session.read_until(&[Pattern::exact(">")]).await;
        assert!(matches!(result, Err(ExpectError::Eof)));
    }

    #[tokio::test]
    async fn test_timeout_pattern() {
        let mut session = session(ScriptedTransport::new().output("Welcome").silence());

        let result = session
            .read_until(&[Pattern::exact(">"), Pattern::Eof, Pattern::Timeout])
            .await
            .unwrap();
        assert_eq!(result.pattern_index, 2);
        assert_eq!(result.before, "Welcome");
    }

    #[tokio::test]
    async fn test_timeout_without_pattern_is_error() {
        let mut session = session(ScriptedTransport::new().silence());

        let result = session.read_until(&[Pattern::exact(">")]).await;
        assert!(matches!(result, Err(ExpectError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_send_line_appends_newline() {
        let transport = ScriptedTransport::new();
        let handle = transport.handle();
        let mut session = session(transport);

        assert_ok!(session.send_line("set promote_master").await);
        assert_eq!(handle.sent(), vec!["set promote_master\n"]);
    }

    #[tokio::test]
    async fn test_close_reaches_transport() {
        let transport = ScriptedTransport::new();
        let handle = transport.handle();
        let mut session = session(transport);

        assert_ok!(session.close().await);
        assert!(session.transport().is_closed());
        assert_eq!(handle.close_calls(), 1);
    }
}
