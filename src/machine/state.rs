//! Session states

use std::fmt;

/// Where a console session is in its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Transport opened, nothing read yet
    Connecting,
    /// Waiting for ssh to ask about the host key or for the password
    AwaitingHostKeyOrPassword,
    /// Host key accepted once; waiting for the password prompt
    HostKeyAccepted,
    /// Password sent; waiting for the console prompt or a denial
    AwaitingPrompt,
    /// Logged in, console prompt seen
    Authenticated,
    /// Command sent; waiting for the prompt that ends its output
    AwaitingOutput,
    /// `set promote_master` sent; waiting for the member delay question
    AwaitingDelayQuestion,
    /// Delay accepted; waiting for the delay time prompt
    AwaitingDelayTime,
    /// Waiting for the first promotion confirmation
    AwaitingConfirmation,
    /// Waiting for the second promotion confirmation
    AwaitingFinalConfirmation,
    /// Workflow completed
    Success,
    /// Console refused the request
    Failure,
    /// Password rejected
    LoginFailed,
    /// Handshake could not be completed
    ConnectionError,
    /// Stream ended or hung after login
    SessionError,
}

impl State {
    /// Whether the machine stops in this state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            State::Success
                | State::Failure
                | State::LoginFailed
                | State::ConnectionError
                | State::SessionError
        )
    }

    /// Whether login has completed by the time this state is reached.
    ///
    /// Decides if an unexpected end is a connection or a session error.
    pub fn is_authenticated(self) -> bool {
        !matches!(
            self,
            State::Connecting
                | State::AwaitingHostKeyOrPassword
                | State::HostKeyAccepted
                | State::AwaitingPrompt
                | State::LoginFailed
                | State::ConnectionError
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Connecting => "connecting",
            State::AwaitingHostKeyOrPassword => "awaiting host key or password prompt",
            State::HostKeyAccepted => "awaiting password prompt after accepting host key",
            State::AwaitingPrompt => "awaiting console prompt",
            State::Authenticated => "authenticated",
            State::AwaitingOutput => "awaiting command output",
            State::AwaitingDelayQuestion => "awaiting member delay question",
            State::AwaitingDelayTime => "awaiting delay time prompt",
            State::AwaitingConfirmation => "awaiting confirmation",
            State::AwaitingFinalConfirmation => "awaiting final confirmation",
            State::Success => "success",
            State::Failure => "failure",
            State::LoginFailed => "login failed",
            State::ConnectionError => "connection error",
            State::SessionError => "session error",
        };
        f.write_str(s)
    }
}
