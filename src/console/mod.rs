//! Caller-facing console operations

mod command;

pub use command::ConsoleCommand;

use crate::machine;
use crate::result::{ConsoleError, Outcome, Status};
use crate::session::SessionBuilder;
use crate::transport::{Connector, SshConnector};
use crate::workflow::{Inputs, Workflow, PROMOTE_MASTER, RUN_COMMAND};
use std::fmt;
use std::time::Duration;
use tracing::{info_span, warn, Instrument};

/// Transcript returned when `run_command` is given nothing to run
pub const NO_COMMAND_MESSAGE: &str = "No command specified, run aborted.";

/// Login for a NIOS console.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Administrator user name
    pub user: String,
    password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// The password
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Runs console workflows against NIOS hosts.
///
/// Every operation opens its own session, drives one workflow and closes the
/// session again, whatever the result. A `Console` holds no per-operation
/// state, so independent operations may run from separate tasks.
///
/// # Examples
///
/// ```no_run
/// use nioscon::{Console, Credentials};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let console = Console::builder().timeout(Duration::from_secs(60)).build();
/// let credentials = Credentials::new("admin", "infoblox");
///
/// let outcome = console.run_command("gm.example.com", &credentials, "show status").await?;
/// println!("{}", outcome.transcript);
///
/// let outcome = console.promote_master("gmc.example.com", &credentials, 0).await?;
/// assert!(outcome.is_success());
/// # Ok(())
/// # }
/// ```
pub struct Console<C: Connector = SshConnector> {
    connector: C,
    session: SessionBuilder,
}

impl Console {
    /// Console using `ssh` with default settings
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a console builder
    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::new()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Console<C> {
    /// Console opening sessions through `connector` with default session settings
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            session: SessionBuilder::new(),
        }
    }

    /// The connector in use
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Log in to `host` and run `command`, returning its output.
    ///
    /// The transcript of a successful outcome is everything the console printed
    /// between sending the command and the next prompt. An empty command is
    /// refused without connecting and yields status
    /// [`Aborted`](Status::Aborted) with [`NO_COMMAND_MESSAGE`].
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Connect`] if the login handshake fails,
    /// [`ConsoleError::Session`] if the console goes away after login.
    pub async fn run_command(
        &self,
        host: &str,
        credentials: &Credentials,
        command: &str,
    ) -> Result<Outcome, ConsoleError> {
        if command.trim().is_empty() {
            warn!("{}", NO_COMMAND_MESSAGE);
            return Ok(Outcome::new(
                RUN_COMMAND.name,
                Status::Aborted,
                NO_COMMAND_MESSAGE,
            ));
        }

        let inputs = Inputs {
            password: credentials.password(),
            command,
            delay: 0,
        };
        self.execute(&RUN_COMMAND, host, credentials, &inputs).await
    }

    /// Log in to a grid master candidate and run `set promote_master`.
    ///
    /// A `delay_seconds` of zero declines the member notification delay;
    /// anything else accepts it and sends the value. Both confirmations are
    /// answered with yes.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Connect`] if the login handshake fails,
    /// [`ConsoleError::Session`] if the console goes away mid-dialog.
    pub async fn promote_master(
        &self,
        host: &str,
        credentials: &Credentials,
        delay_seconds: u32,
    ) -> Result<Outcome, ConsoleError> {
        let inputs = Inputs {
            password: credentials.password(),
            command: "",
            delay: delay_seconds,
        };
        self.execute(&PROMOTE_MASTER, host, credentials, &inputs).await
    }

    async fn execute(
        &self,
        workflow: &Workflow,
        host: &str,
        credentials: &Credentials,
        inputs: &Inputs<'_>,
    ) -> Result<Outcome, ConsoleError> {
        let span = info_span!("console", workflow = workflow.name, host);

        async {
            let mut session = self
                .session
                .open(&self.connector, host, &credentials.user)
                .map_err(|e| ConsoleError::Connect {
                    host: host.to_string(),
                    detail: e.to_string(),
                })?;

            let result = machine::drive(&mut session, workflow, inputs).await;

            if let Err(e) = session.close().await {
                warn!(error = %e, "failed to close session");
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Builder for [`Console`].
#[derive(Debug, Clone, Default)]
pub struct ConsoleBuilder {
    session: SessionBuilder,
    ssh: SshConnector,
}

impl ConsoleBuilder {
    /// Builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout for each expect step (default 30 seconds)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.session = self.session.timeout(timeout);
        self
    }

    /// Pattern search window over unread output, in bytes (default 8192)
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.session = self.session.max_buffer_size(size);
        self
    }

    /// PTY size for the ssh child (default 24 × 80)
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.ssh = self.ssh.pty_size(rows, cols);
        self
    }

    /// ssh executable (default `ssh`)
    pub fn ssh_program(mut self, program: impl Into<String>) -> Self {
        self.ssh = self.ssh.program(program);
        self
    }

    /// Extra ssh argument, e.g. `-p 2222` as two calls
    pub fn ssh_arg(mut self, arg: impl Into<String>) -> Self {
        self.ssh = self.ssh.arg(arg);
        self
    }

    /// Console over ssh
    pub fn build(self) -> Console {
        Console {
            connector: self.ssh,
            session: self.session,
        }
    }

    /// Console over a different transport, keeping the session settings
    pub fn build_with<C: Connector>(self, connector: C) -> Console<C> {
        Console {
            connector,
            session: self.session,
        }
    }
}
