//! Prompt texts of the NIOS console.
//!
//! These literals are the compatibility contract with the appliance and must
//! match its output byte for byte.

use crate::pattern::Pattern;
use std::fmt;

/// ssh asking to trust an unknown host key
pub const HOST_KEY: &str = "Are you sure you want to continue connecting (yes/no/[fingerprint])?";
/// ssh password prompt
pub const PASSWORD: &str = "password:";
/// sshd rejecting the password
pub const PERMISSION_DENIED: &str = "Permission denied, please try again.";
/// Console command prompt
pub const COMMAND_PROMPT: &str = ">";
/// `set promote_master`: notify members with a delay?
pub const MEMBER_DELAY: &str =
    "Do you want a delay between notification to grid members? (y or n):";
/// `set promote_master`: how long a delay
pub const DELAY_TIME: &str = "Set delay time for notification to grid member? [Default: 30s]";
/// `set promote_master`: first confirmation
pub const CONFIRM: &str = "Are you sure you want to do this? (y or n):";
/// `set promote_master`: second confirmation
pub const CONFIRM_AGAIN: &str = "(y or n):";

/// Symbolic meaning of something the engine waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    /// Unknown host key question
    HostKey,
    /// Password prompt
    Password,
    /// Login rejected
    PermissionDenied,
    /// Console ready for a command
    CommandPrompt,
    /// Member notification delay question
    MemberDelay,
    /// Delay duration prompt
    DelayTime,
    /// First promotion confirmation
    Confirm,
    /// Second promotion confirmation
    ConfirmAgain,
    /// Stream closed
    EndOfStream,
    /// Nothing recognisable arrived in time
    Timeout,
}

impl Prompt {
    /// Literal console text, `None` for the pseudo-prompts
    pub fn text(self) -> Option<&'static str> {
        match self {
            Prompt::HostKey => Some(HOST_KEY),
            Prompt::Password => Some(PASSWORD),
            Prompt::PermissionDenied => Some(PERMISSION_DENIED),
            Prompt::CommandPrompt => Some(COMMAND_PROMPT),
            Prompt::MemberDelay => Some(MEMBER_DELAY),
            Prompt::DelayTime => Some(DELAY_TIME),
            Prompt::Confirm => Some(CONFIRM),
            Prompt::ConfirmAgain => Some(CONFIRM_AGAIN),
            Prompt::EndOfStream | Prompt::Timeout => None,
        }
    }

    /// Pattern handed to the matcher
    pub fn pattern(self) -> Pattern {
        match self {
            Prompt::EndOfStream => Pattern::Eof,
            Prompt::Timeout => Pattern::Timeout,
            other => Pattern::exact(other.text().unwrap_or_default()),
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Prompt::HostKey => "host key prompt",
            Prompt::Password => "password prompt",
            Prompt::PermissionDenied => "permission denied",
            Prompt::CommandPrompt => "command prompt",
            Prompt::MemberDelay => "member delay question",
            Prompt::DelayTime => "delay time prompt",
            Prompt::Confirm => "confirmation prompt",
            Prompt::ConfirmAgain => "second confirmation prompt",
            Prompt::EndOfStream => "end of stream",
            Prompt::Timeout => "timeout",
        };
        f.write_str(s)
    }
}
