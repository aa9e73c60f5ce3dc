//! Result types for expect steps and console operations

mod error;

pub use error::{ConsoleError, ExpectError, PatternError};

use std::fmt;

/// Result of a successful `read_until`.
///
/// # Examples
///
/// ```no_run
/// use nioscon::{Pattern, SessionBuilder, SshConnector};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = SessionBuilder::new().open(&SshConnector::default(), "gm.example.com", "admin")?;
/// session.send_line("show status").await?;
///
/// let result = session.read_until(&[Pattern::exact(">"), Pattern::Eof]).await?;
/// println!("Output: {}", result.before);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Index into the pattern list of the pattern that matched.
    pub pattern_index: usize,

    /// The matched text. Empty for `Eof` and `Timeout`.
    pub matched: String,

    /// Everything seen since the previous match and before this one.
    ///
    /// For `Eof` and `Timeout` this is all unread output.
    pub before: String,
}

/// How an operation ended, when it ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The workflow reached its success state.
    Success,
    /// The console refused the request (e.g. promotion answered with a prompt).
    Rejected,
    /// The console answered the password with "Permission denied".
    LoginFailed,
    /// Input validation stopped the operation before anything was opened.
    Aborted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Success => "success",
            Status::Rejected => "rejected",
            Status::LoginFailed => "login failed",
            Status::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Terminal result of one console operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Name of the workflow that produced it
    pub workflow: &'static str,
    /// How the workflow ended
    pub status: Status,
    /// Captured console text: command output, promotion transcript or diagnostic
    pub transcript: String,
}

impl Outcome {
    pub(crate) fn new(workflow: &'static str, status: Status, transcript: impl Into<String>) -> Self {
        Self {
            workflow,
            status,
            transcript: transcript.into(),
        }
    }

    /// Whether the workflow succeeded
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
