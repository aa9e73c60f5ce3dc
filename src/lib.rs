//! nioscon: NIOS console automation over SSH
//!
//! nioscon drives the interactive console of an Infoblox NIOS appliance the
//! way an operator would: it opens an `ssh` session in a pseudo-terminal,
//! waits for the prompts the console prints and answers them. Each dialog is
//! a table of transition rules, so the login handshake and every workflow
//! built on top of it are data rather than nested prompt handling.
//!
//! # Features
//!
//! - **Login handshake**: accepts a first-time host key, sends the password and
//!   reports a rejected login as an outcome rather than a crash
//! - **Run command**: captures everything printed before the next prompt
//! - **Promote master**: answers the delay and confirmation questions of
//!   `set promote_master`
//! - **Pluggable transport**: a PTY-backed `ssh` child by default, or any
//!   [`Connector`] such as the scripted one used in tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nioscon::{Console, Credentials, Status};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let console = Console::new();
//!     let credentials = Credentials::new("admin", "infoblox");
//!
//!     let outcome = console
//!         .run_command("gm.example.com", &credentials, "show status")
//!         .await?;
//!
//!     match outcome.status {
//!         Status::Success => println!("{}", outcome.transcript),
//!         status => eprintln!("command did not run: {status}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Sessions
//!
//! [`Session`] is the expect layer underneath the workflows and can be used
//! on its own:
//!
//! ```rust,no_run
//! use nioscon::{Pattern, SessionBuilder, SshConnector};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = SessionBuilder::new()
//!     .timeout(Duration::from_secs(10))
//!     .open(&SshConnector::default(), "gm.example.com", "admin")?;
//!
//! let patterns = [Pattern::exact("password:"), Pattern::Eof];
//! let result = session.read_until(&patterns).await?;
//! if result.pattern_index == 0 {
//!     session.send_line("infoblox").await?;
//! }
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod buffer;
mod config;
mod console;
mod pattern;
mod result;
mod session;

pub mod machine;
pub mod transport;
pub mod workflow;

// Public API exports
pub use config::ConsoleConfig;
pub use console::{Console, ConsoleBuilder, ConsoleCommand, Credentials, NO_COMMAND_MESSAGE};
pub use pattern::{Match, Matcher, Pattern};
pub use result::{ConsoleError, ExpectError, MatchResult, Outcome, PatternError, Status};
pub use session::{Session, SessionBuilder};
pub use transport::{Chunk, Connector, PtyTransport, SshConnector, Transport};
