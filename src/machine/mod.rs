//! The session state machine
//!
//! [`drive`] runs a [`Workflow`] against an open [`Session`]: in each state it
//! either fires the state's entry rule or waits for one of the state's prompts,
//! looks up the matching rule, sends its reply and moves on, until a terminal
//! state turns into an [`Outcome`] or a [`ConsoleError`].

mod state;

pub use state::State;

use crate::result::{ConsoleError, Outcome, Status};
use crate::session::Session;
use crate::transport::Transport;
use crate::workflow::{Inputs, Prompt, Rule, Workflow};
use crate::Pattern;
use tracing::{debug, error, info};

/// Run `workflow` on `session` from the start of the login handshake.
///
/// The session is left open; closing it is the caller's job on every path.
pub async fn drive<T: Transport>(
    session: &mut Session<T>,
    workflow: &Workflow,
    inputs: &Inputs<'_>,
) -> Result<Outcome, ConsoleError> {
    let mut state = State::Connecting;
    let mut transcript = String::new();

    loop {
        let (rule, seen, before) = step(session, workflow, state, inputs).await?;

        match seen {
            Some(prompt) => debug!(%state, %prompt, next = %rule.next, "transition"),
            None => debug!(%state, next = %rule.next, "transition on entry"),
        }

        if let Some(text) = rule.capture.apply(before) {
            transcript = text;
        }

        if let Some(reply) = rule.reply {
            if !reply.is_secret() {
                debug!(reply = %reply.render(inputs), "replying");
            }
            session.send_line(&reply.render(inputs)).await?;
        }

        let reason = seen.map(|p| p.to_string()).unwrap_or_default();
        match rule.next {
            State::Success => {
                info!(workflow = workflow.name, "workflow completed");
                return Ok(Outcome::new(workflow.name, Status::Success, transcript));
            }
            State::Failure => {
                error!(workflow = workflow.name, "console rejected the request");
                return Ok(Outcome::new(workflow.name, Status::Rejected, transcript));
            }
            State::LoginFailed => {
                error!(host = session.host(), "Login failed");
                return Ok(Outcome::new(workflow.name, Status::LoginFailed, transcript));
            }
            State::ConnectionError => {
                return Err(ConsoleError::Connect {
                    host: session.host().to_string(),
                    detail: describe(&reason, state, &transcript),
                });
            }
            State::SessionError => {
                return Err(ConsoleError::Session {
                    host: session.host().to_string(),
                    state: state.to_string(),
                    detail: describe(&reason, state, &transcript),
                });
            }
            next => {
                if next == State::Authenticated {
                    debug!(host = session.host(), "Login successful");
                }
                state = next;
            }
        }
    }
}

/// Pick the rule to fire in `state`, reading from the session if needed.
async fn step<T: Transport>(
    session: &mut Session<T>,
    workflow: &Workflow,
    state: State,
    inputs: &Inputs<'_>,
) -> Result<(&'static Rule, Option<Prompt>, String), ConsoleError> {
    if let Some(rule) = workflow.on_entry(state, inputs) {
        return Ok((rule, None, String::new()));
    }

    let expected = workflow.expected(state);
    if expected.is_empty() {
        return Err(stuck(session, state, "no prompts to wait for"));
    }

    let patterns: Vec<Pattern> = expected.iter().map(|p| p.pattern()).collect();
    let result = session.read_until(&patterns).await?;
    let prompt = expected[result.pattern_index];

    match workflow.transition(state, prompt, inputs) {
        Some(rule) => Ok((rule, Some(prompt), result.before)),
        None => Err(stuck(session, state, &format!("no rule for {prompt}"))),
    }
}

fn stuck<T: Transport>(session: &Session<T>, state: State, detail: &str) -> ConsoleError {
    if state.is_authenticated() {
        ConsoleError::Session {
            host: session.host().to_string(),
            state: state.to_string(),
            detail: detail.to_string(),
        }
    } else {
        ConsoleError::Connect {
            host: session.host().to_string(),
            detail: detail.to_string(),
        }
    }
}

fn describe(reason: &str, state: State, output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        format!("{reason} while {state}")
    } else {
        format!("{reason} while {state}; output: {output}")
    }
}
