//! Which console commands the CLI accepts

/// A console command as requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `promote_master`
    PromoteMaster,
    /// A read-only `show ...` command or one of the allowed actions
    Run(String),
    /// Anything else
    Unsupported(String),
}

/// Commands other than `show ...` that may be run
const ALLOWED_ACTIONS: [&str; 2] = ["shutdown", "reboot"];

impl ConsoleCommand {
    /// Classify a command string
    pub fn classify(command: &str) -> Self {
        if command == "promote_master" {
            ConsoleCommand::PromoteMaster
        } else if command.contains("show") || ALLOWED_ACTIONS.contains(&command) {
            ConsoleCommand::Run(command.to_string())
        } else {
            ConsoleCommand::Unsupported(command.to_string())
        }
    }
}
