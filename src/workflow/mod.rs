//! Declarative console workflows
//!
//! A [`Workflow`] is a table of [`Rule`]s. Each rule says: in this state, when
//! this prompt shows up (and the guard holds), send this reply and move to that
//! state. The login handshake is a shared prefix of every workflow.

pub mod prompts;

pub use prompts::Prompt;

use crate::machine::State;

/// Command that starts a grid master promotion
pub const PROMOTE_MASTER_COMMAND: &str = "set promote_master";

/// What makes a rule fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fires as soon as the state is entered, without reading
    Enter,
    /// Fires when the prompt is matched
    Seen(Prompt),
}

/// Extra condition on the caller's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// No condition
    Always,
    /// Promotion delay is zero
    NoDelay,
    /// Promotion delay is positive
    WithDelay,
}

impl Guard {
    fn admits(self, inputs: &Inputs<'_>) -> bool {
        match self {
            Guard::Always => true,
            Guard::NoDelay => inputs.delay == 0,
            Guard::WithDelay => inputs.delay > 0,
        }
    }
}

/// Line sent back to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Fixed text
    Text(&'static str),
    /// The login password
    Password,
    /// The caller's command
    Command,
    /// The promotion delay in seconds
    Delay,
}

impl Reply {
    /// Text to send for this reply
    pub fn render(self, inputs: &Inputs<'_>) -> String {
        match self {
            Reply::Text(text) => text.to_string(),
            Reply::Password => inputs.password.to_string(),
            Reply::Command => inputs.command.to_string(),
            Reply::Delay => inputs.delay.to_string(),
        }
    }

    /// Whether the rendered text must stay out of logs
    pub fn is_secret(self) -> bool {
        matches!(self, Reply::Password)
    }
}

/// What a rule keeps of the text preceding its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Keep the current transcript
    Skip,
    /// Keep the text as it came
    Raw,
    /// Command output: the text without the line break ending it
    Output,
}

impl Capture {
    /// Transcript text for `before`, `None` when nothing is kept
    pub fn apply(self, before: String) -> Option<String> {
        match self {
            Capture::Skip => None,
            Capture::Raw => Some(before),
            Capture::Output => {
                let trimmed = before
                    .strip_suffix("\r\n")
                    .or_else(|| before.strip_suffix('\n'))
                    .map(str::to_string);
                Some(trimmed.unwrap_or(before))
            }
        }
    }
}

/// Caller-supplied values a workflow draws its replies from.
#[derive(Clone, Copy)]
pub struct Inputs<'a> {
    /// Login password
    pub password: &'a str,
    /// Command for "run command"
    pub command: &'a str,
    /// Member notification delay for "promote master", in seconds
    pub delay: u32,
}

/// One transition: (state, trigger, guard) → (reply, capture, next state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// State the rule applies in
    pub state: State,
    /// What makes it fire
    pub trigger: Trigger,
    /// Condition on the inputs
    pub guard: Guard,
    /// Line to send, if any
    pub reply: Option<Reply>,
    /// What to keep of the text preceding the match
    pub capture: Capture,
    /// State to move to
    pub next: State,
}

impl Rule {
    /// Rule firing when `prompt` is seen in `state`
    pub const fn on(state: State, prompt: Prompt, next: State) -> Self {
        Self {
            state,
            trigger: Trigger::Seen(prompt),
            guard: Guard::Always,
            reply: None,
            capture: Capture::Skip,
            next,
        }
    }

    /// Rule firing on entry to `state`
    pub const fn enter(state: State, next: State) -> Self {
        Self {
            state,
            trigger: Trigger::Enter,
            guard: Guard::Always,
            reply: None,
            capture: Capture::Skip,
            next,
        }
    }

    /// Send `reply` when the rule fires
    pub const fn reply(self, reply: Reply) -> Self {
        Self {
            reply: Some(reply),
            ..self
        }
    }

    /// Keep the text before the match
    pub const fn capture(self) -> Self {
        Self {
            capture: Capture::Raw,
            ..self
        }
    }

    /// Keep the text before the match as command output
    pub const fn capture_output(self) -> Self {
        Self {
            capture: Capture::Output,
            ..self
        }
    }

    /// Only fire when `guard` holds
    pub const fn when(self, guard: Guard) -> Self {
        Self { guard, ..self }
    }
}

/// A named protocol run against one console session.
#[derive(Debug)]
pub struct Workflow {
    /// Workflow name
    pub name: &'static str,
    stages: &'static [&'static [Rule]],
}

impl Workflow {
    /// All rules, login prefix first
    pub fn rules(&self) -> impl Iterator<Item = &'static Rule> {
        let stages = self.stages;
        stages.iter().flat_map(|stage| stage.iter())
    }

    /// Prompts to wait for in `state`, in the order they are tried
    pub fn expected(&self, state: State) -> Vec<Prompt> {
        let mut prompts = Vec::new();
        for rule in self.rules().filter(|r| r.state == state) {
            if let Trigger::Seen(prompt) = rule.trigger {
                if !prompts.contains(&prompt) {
                    prompts.push(prompt);
                }
            }
        }
        prompts
    }

    /// Rule that fires on entering `state`, if any
    pub fn on_entry(&self, state: State, inputs: &Inputs<'_>) -> Option<&'static Rule> {
        self.rules().find(|r| {
            r.state == state && r.trigger == Trigger::Enter && r.guard.admits(inputs)
        })
    }

    /// Rule for `prompt` seen in `state`
    pub fn transition(
        &self,
        state: State,
        prompt: Prompt,
        inputs: &Inputs<'_>,
    ) -> Option<&'static Rule> {
        self.rules().find(|r| {
            r.state == state && r.trigger == Trigger::Seen(prompt) && r.guard.admits(inputs)
        })
    }

    /// Every state some rule applies in
    pub fn states(&self) -> Vec<State> {
        let mut states = Vec::new();
        for rule in self.rules() {
            if !states.contains(&rule.state) {
                states.push(rule.state);
            }
        }
        states
    }
}

use Prompt::*;
use State::*;

/// ssh login up to the first console prompt
const LOGIN: &[Rule] = &[
    Rule::enter(Connecting, AwaitingHostKeyOrPassword),
    Rule::on(AwaitingHostKeyOrPassword, HostKey, HostKeyAccepted).reply(Reply::Text("yes")),
    Rule::on(AwaitingHostKeyOrPassword, Password, AwaitingPrompt).reply(Reply::Password),
    Rule::on(AwaitingHostKeyOrPassword, EndOfStream, ConnectionError).capture(),
    Rule::on(AwaitingHostKeyOrPassword, Timeout, ConnectionError).capture(),
    // The host key is only ever asked about once
    Rule::on(HostKeyAccepted, HostKey, ConnectionError).capture(),
    Rule::on(HostKeyAccepted, Password, AwaitingPrompt).reply(Reply::Password),
    Rule::on(HostKeyAccepted, EndOfStream, ConnectionError).capture(),
    Rule::on(HostKeyAccepted, Timeout, ConnectionError).capture(),
    Rule::on(AwaitingPrompt, PermissionDenied, LoginFailed).capture(),
    Rule::on(AwaitingPrompt, CommandPrompt, Authenticated),
    Rule::on(AwaitingPrompt, EndOfStream, ConnectionError).capture(),
    Rule::on(AwaitingPrompt, Timeout, ConnectionError).capture(),
];

const RUN_COMMAND_RULES: &[Rule] = &[
    Rule::enter(Authenticated, AwaitingOutput).reply(Reply::Command),
    Rule::on(AwaitingOutput, PermissionDenied, LoginFailed).capture(),
    Rule::on(AwaitingOutput, CommandPrompt, Success).capture_output(),
    Rule::on(AwaitingOutput, EndOfStream, SessionError).capture(),
    Rule::on(AwaitingOutput, Timeout, SessionError).capture(),
];

const PROMOTE_MASTER_RULES: &[Rule] = &[
    Rule::enter(Authenticated, AwaitingDelayQuestion).reply(Reply::Text(PROMOTE_MASTER_COMMAND)),
    Rule::on(AwaitingDelayQuestion, MemberDelay, AwaitingConfirmation)
        .when(Guard::NoDelay)
        .reply(Reply::Text("n")),
    Rule::on(AwaitingDelayQuestion, MemberDelay, AwaitingDelayTime)
        .when(Guard::WithDelay)
        .reply(Reply::Text("y")),
    // A bare prompt means the console refused to promote
    Rule::on(AwaitingDelayQuestion, CommandPrompt, Failure).capture(),
    Rule::on(AwaitingDelayQuestion, EndOfStream, SessionError).capture(),
    Rule::on(AwaitingDelayQuestion, Timeout, SessionError).capture(),
    Rule::on(AwaitingDelayTime, DelayTime, AwaitingConfirmation).reply(Reply::Delay),
    Rule::on(AwaitingDelayTime, EndOfStream, SessionError).capture(),
    Rule::on(AwaitingDelayTime, Timeout, SessionError).capture(),
    Rule::on(AwaitingConfirmation, Confirm, AwaitingFinalConfirmation).reply(Reply::Text("y")),
    Rule::on(AwaitingConfirmation, EndOfStream, SessionError).capture(),
    Rule::on(AwaitingConfirmation, Timeout, SessionError).capture(),
    Rule::on(AwaitingFinalConfirmation, ConfirmAgain, Success)
        .reply(Reply::Text("y"))
        .capture(),
    Rule::on(AwaitingFinalConfirmation, EndOfStream, SessionError).capture(),
    Rule::on(AwaitingFinalConfirmation, Timeout, SessionError).capture(),
];

/// Log in, run one command, return its output
pub static RUN_COMMAND: Workflow = Workflow {
    name: "run command",
    stages: &[LOGIN, RUN_COMMAND_RULES],
};

/// Log in and promote this grid master candidate to grid master
pub static PROMOTE_MASTER: Workflow = Workflow {
    name: "promote master",
    stages: &[LOGIN, PROMOTE_MASTER_RULES],
};
