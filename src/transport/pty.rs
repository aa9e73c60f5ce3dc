//! SSH under a pseudo-terminal

use super::{Chunk, Connector, Transport};
use crate::result::ExpectError;
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Size of each read from the PTY master
const READ_CHUNK: usize = 4096;

/// A child process attached to a pseudo-terminal.
///
/// Output is pumped off the PTY by a dedicated reader thread into a channel, so
/// a read that times out never loses bytes that arrive later.
pub struct PtyTransport {
    master: Option<Box<dyn MasterPty + Send>>,
    child: Option<Box<dyn Child + Send + Sync>>,
    writer: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
    output: mpsc::UnboundedReceiver<Vec<u8>>,
    closed: bool,
}

impl PtyTransport {
    /// Spawn `command` in a new PTY of the given size
    pub fn spawn(command: CommandBuilder, size: PtySize) -> Result<Self, ExpectError> {
        let pty_pair = native_pty_system()
            .openpty(size)
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let child = pty_pair
            .slave
            .spawn_command(command)
            .map_err(|e| ExpectError::SpawnError(e.to_string()))?;
        // Only the child may hold the slave, otherwise EOF never arrives
        drop(pty_pair.slave);

        let reader = pty_pair
            .master
            .try_clone_reader()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;
        let writer = pty_pair
            .master
            .take_writer()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let (tx, output) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("nioscon-pty-reader".to_string())
            .spawn(move || pump(reader, tx))?;

        debug!(pid = ?child.process_id(), "spawned pty child");

        Ok(Self {
            master: Some(pty_pair.master),
            child: Some(child),
            writer: Some(Arc::new(Mutex::new(writer))),
            output,
            closed: false,
        })
    }

    /// Process id of the child, while it is attached
    pub fn process_id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.process_id())
    }

    /// Check if the child process is still running
    pub fn is_alive(&mut self) -> Result<bool, ExpectError> {
        match &mut self.child {
            Some(child) => Ok(child.try_wait()?.is_none()),
            None => Ok(false),
        }
    }
}

fn pump(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                // Linux reports EIO on the master once the child side is gone
                debug!(error = %e, "pty reader stopped");
                break;
            }
        }
    }
}

impl Transport for PtyTransport {
    async fn read(&mut self, timeout: Option<Duration>) -> Result<Chunk, ExpectError> {
        if self.closed {
            return Err(ExpectError::Closed);
        }

        let next = match timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.output.recv()).await {
                Ok(next) => next,
                Err(_) => return Ok(Chunk::TimedOut),
            },
            None => self.output.recv().await,
        };

        Ok(match next {
            Some(data) => Chunk::Data(data),
            None => Chunk::Eof,
        })
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), ExpectError> {
        let writer = self.writer.clone().ok_or(ExpectError::Closed)?;
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut writer = writer.blocking_lock();
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(|e| ExpectError::IoError(std::io::Error::other(e)))??;

        Ok(())
    }

    async fn close(&mut self) -> Result<(), ExpectError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer = None;
        self.output.close();

        if let Some(mut child) = self.child.take() {
            if child.try_wait()?.is_none() {
                if let Err(e) = child.kill() {
                    // Lost the race with a normal exit
                    debug!(error = %e, "kill failed");
                }
            }

            let status = tokio::task::spawn_blocking(move || child.wait())
                .await
                .map_err(|e| ExpectError::IoError(std::io::Error::other(e)))??;
            debug!(exit_code = status.exit_code(), "pty child reaped");
        }

        self.master = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for PtyTransport {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Some(mut child) = self.child.take() else {
            return;
        };

        warn!("pty transport dropped without close, killing child");
        if let Err(e) = child.kill() {
            debug!(error = %e, "kill failed");
        }

        match child.try_wait() {
            Ok(Some(status)) => debug!(exit_code = status.exit_code(), "pty child reaped"),
            Ok(None) => {
                // Not gone yet; reap off-thread so drop never blocks
                let reaper = std::thread::Builder::new()
                    .name("nioscon-pty-reaper".to_string())
                    .spawn(move || {
                        if let Err(e) = child.wait() {
                            debug!(error = %e, "failed to reap pty child");
                        }
                    });
                if let Err(e) = reaper {
                    warn!(error = %e, "could not start reaper thread");
                }
            }
            Err(e) => debug!(error = %e, "failed to reap pty child"),
        }
    }
}

/// Opens console sessions by running `ssh user@host` in a PTY.
///
/// # Examples
///
/// ```
/// use nioscon::SshConnector;
///
/// let connector = SshConnector::default()
///     .arg("-p")
///     .arg("2222")
///     .pty_size(40, 132);
/// assert_eq!(connector.command_line("gm.example.com", "admin"), "ssh -p 2222 admin@gm.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct SshConnector {
    program: String,
    args: Vec<String>,
    pty_size: PtySize,
}

impl Default for SshConnector {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            args: Vec::new(),
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
        }
    }
}

impl SshConnector {
    /// Use a different ssh executable
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Pass an extra argument to ssh, before the destination
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set PTY (terminal) size
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    fn destination(host: &str, user: &str) -> String {
        if user.is_empty() {
            host.to_string()
        } else {
            format!("{user}@{host}")
        }
    }

    /// The command line that [`connect`](Connector::connect) runs
    pub fn command_line(&self, host: &str, user: &str) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(Self::destination(host, user));
        parts.join(" ")
    }
}

impl Connector for SshConnector {
    type Transport = PtyTransport;

    fn connect(&self, host: &str, user: &str) -> Result<PtyTransport, ExpectError> {
        if host.is_empty() {
            return Err(ExpectError::SpawnError("no host given".to_string()));
        }

        debug!(command = %self.command_line(host, user), "executing ssh command");

        let mut command = CommandBuilder::new(&self.program);
        for arg in &self.args {
            command.arg(arg);
        }
        command.arg(Self::destination(host, user));

        PtyTransport::spawn(command, self.pty_size)
    }
}
