//! Session builder for configuration

use crate::result::ExpectError;
use crate::session::Session;
use crate::transport::Connector;
use std::time::Duration;
use tracing::debug;

/// Default timeout for each expect step (in seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default pattern search window (in bytes)
const DEFAULT_MAX_BUFFER_SIZE: usize = 8192;

/// Builder for configuring and opening sessions.
///
/// # Defaults
///
/// - Timeout: 30 seconds per expect step
/// - Search window: 8192 bytes
///
/// # Examples
///
/// ```no_run
/// use nioscon::{SessionBuilder, SshConnector};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = SessionBuilder::new()
///     .timeout(Duration::from_secs(60))
///     .max_buffer_size(16384)
///     .open(&SshConnector::default(), "gmc.example.com", "admin")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    timeout: Option<Duration>,
    max_buffer_size: usize,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a new session builder with default configuration
    pub fn new() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    /// Set the timeout for each expect step.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the timeout (wait indefinitely).
    ///
    /// A hung console then blocks the operation until the stream ends.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the pattern search window, in bytes.
    ///
    /// Patterns are searched in the last `size` bytes of unread output. Older
    /// output is not searched but still ends up in the before-text.
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// Configured per-step timeout
    pub fn configured_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Open a session to `host` as `user` through `connector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connector cannot start the transport.
    pub fn open<C: Connector>(
        &self,
        connector: &C,
        host: &str,
        user: &str,
    ) -> Result<Session<C::Transport>, ExpectError> {
        debug!(host, user, "opening session");
        let transport = connector.connect(host, user)?;

        Ok(Session::new(
            host,
            user,
            transport,
            self.max_buffer_size,
            self.timeout,
        ))
    }
}
