//! End-to-end workflow tests against a scripted console

use nioscon::transport::scripted::{ScriptHandle, ScriptedConnector, ScriptedTransport};
use nioscon::workflow::prompts::{
    CONFIRM, CONFIRM_AGAIN, DELAY_TIME, HOST_KEY, MEMBER_DELAY, PERMISSION_DENIED,
};
use nioscon::{Console, ConsoleError, Credentials, Outcome, Status, NO_COMMAND_MESSAGE};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const HOST: &str = "gmc.example.com";

fn credentials() -> Credentials {
    Credentials::new("admin", "infoblox")
}

fn console(transport: ScriptedTransport) -> (Console<ScriptedConnector>, ScriptHandle) {
    let handle = transport.handle();
    let console = Console::builder()
        .timeout(Duration::from_secs(5))
        .build_with(ScriptedConnector::new(transport));
    (console, handle)
}

/// Console output up to a logged-in prompt
fn logged_in() -> ScriptedTransport {
    ScriptedTransport::new()
        .output("admin@gmc.example.com's password: ")
        .await_input()
        .output("\r\nInfoblox >")
}

fn promotion_dialog(delay: bool) -> ScriptedTransport {
    let transport = logged_in()
        .await_input()
        .output("set promote_master\r\n")
        .output(MEMBER_DELAY)
        .await_input();

    let transport = if delay {
        transport.output(DELAY_TIME).await_input()
    } else {
        transport
    };

    transport
        .output(CONFIRM)
        .await_input()
        .output("\r\nThe grid master will be changed.\r\n")
        .output(CONFIRM_AGAIN)
        .await_input()
}

async fn promote(transport: ScriptedTransport, delay: u32) -> (Outcome, ScriptHandle) {
    let (console, handle) = console(transport);
    let outcome = assert_ok!(console.promote_master(HOST, &credentials(), delay).await);
    (outcome, handle)
}

#[tokio::test]
async fn test_run_command_captures_output_before_prompt() {
    let preamble = "show status\r\nGrid Status: ID Grid Master\r\nHA Status: Not Configured";
    let transport = logged_in().await_input().output(format!("{preamble}\r\n>"));
    let (console, handle) = console(transport);

    let outcome = assert_ok!(console.run_command(HOST, &credentials(), "show status").await);

    assert_eq!(outcome.workflow, "run command");
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(outcome.transcript, preamble);
    assert!(!outcome.transcript.contains('>'));
    assert_eq!(handle.sent_lines(), vec!["infoblox", "show status"]);
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_run_command_drops_line_feed_before_prompt() {
    let transport = logged_in()
        .await_input()
        .output("Grid Status: OK\n>");
    let (console, _handle) = console(transport);

    let outcome = assert_ok!(console.run_command(HOST, &credentials(), "show status").await);

    assert_eq!(outcome.transcript, "Grid Status: OK");
}

#[tokio::test]
async fn test_run_command_keeps_long_output_whole() {
    let body: String = (0..200)
        .map(|i| format!("line {i:04} of show config output, padded to a realistic width\r\n"))
        .collect();
    assert!(body.len() > 8192);

    let mut transport = logged_in().await_input().output("show config\r\n");
    for chunk in body.as_bytes().chunks(1024) {
        transport = transport.output(chunk);
    }
    let transport = transport.output("Infoblox >");
    let (console, handle) = console(transport);

    let outcome = assert_ok!(console.run_command(HOST, &credentials(), "show config").await);

    assert_eq!(outcome.status, Status::Success);
    assert!(outcome.transcript.contains("line 0000"));
    assert!(outcome.transcript.contains("line 0199"));
    assert_eq!(outcome.transcript, format!("show config\r\n{body}Infoblox "));
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_host_key_accepted_before_password() {
    let transport = ScriptedTransport::new()
        .output(format!(
            "The authenticity of host '{HOST}' can't be established.\r\n{HOST_KEY} "
        ))
        .await_input()
        .output("\r\nWarning: Permanently added to the list of known hosts.\r\n")
        .output("admin@gmc.example.com's password: ")
        .await_input()
        .output("\r\nInfoblox >")
        .await_input()
        .output("show upgrade_history\r\nNo upgrade history\r\n>");
    let (console, handle) = console(transport);

    let outcome = assert_ok!(
        console
            .run_command(HOST, &credentials(), "show upgrade_history")
            .await
    );

    assert!(outcome.is_success());
    assert_eq!(
        handle.sent_lines(),
        vec!["yes", "infoblox", "show upgrade_history"]
    );
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_second_host_key_question_is_connect_error() {
    let transport = ScriptedTransport::new()
        .output(HOST_KEY)
        .await_input()
        .output(format!("\r\nPlease type 'yes', 'no' or the fingerprint: {HOST_KEY}"));
    let (console, handle) = console(transport);

    let err = assert_err!(console.run_command(HOST, &credentials(), "show status").await);

    assert!(matches!(err, ConsoleError::Connect { ref host, .. } if host == HOST));
    assert_eq!(handle.sent_lines(), vec!["yes"]);
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_promote_without_delay_declines_and_sends_no_number() {
    let (outcome, handle) = promote(promotion_dialog(false), 0).await;

    assert_eq!(outcome.workflow, "promote master");
    assert_eq!(outcome.status, Status::Success);

    let sent = handle.sent_lines();
    assert_eq!(sent, vec!["infoblox", "set promote_master", "n", "y", "y"]);
    assert!(sent.iter().all(|line| line.parse::<u32>().is_err()));
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_promote_with_delay_sends_delay_then_confirms() {
    let (outcome, handle) = promote(promotion_dialog(true), 45).await;

    assert_eq!(outcome.status, Status::Success);
    assert_eq!(
        handle.sent_lines(),
        vec!["infoblox", "set promote_master", "y", "45", "y", "y"]
    );
    assert!(outcome.transcript.contains("The grid master will be changed."));
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_promote_refused_by_console_is_rejected() {
    let transport = logged_in()
        .await_input()
        .output("set promote_master\r\nThis member is not a Grid Master Candidate.\r\n")
        .output("Infoblox >");

    let (outcome, handle) = promote(transport, 0).await;

    assert_eq!(outcome.status, Status::Rejected);
    assert!(outcome.transcript.contains("not a Grid Master Candidate"));
    assert_eq!(handle.sent_lines(), vec!["infoblox", "set promote_master"]);
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_rejected_password_is_login_failure() {
    let transport = ScriptedTransport::new()
        .output("admin@gmc.example.com's password: ")
        .await_input()
        .output(format!("\r\n{PERMISSION_DENIED}\r\nadmin@gmc.example.com's password: "));
    let (console, handle) = console(transport);

    let outcome = assert_ok!(console.run_command(HOST, &credentials(), "show status").await);

    assert_eq!(outcome.status, Status::LoginFailed);
    assert_eq!(handle.sent_lines(), vec!["infoblox"]);
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_rejected_password_fails_promotion() {
    let transport = ScriptedTransport::new()
        .output("admin@gmc.example.com's password: ")
        .await_input()
        .output(format!("\r\n{PERMISSION_DENIED}\r\n"));

    let (outcome, handle) = promote(transport, 45).await;

    assert_eq!(outcome.workflow, "promote master");
    assert_eq!(outcome.status, Status::LoginFailed);
    assert_eq!(handle.sent_lines(), vec!["infoblox"]);
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_silent_login_is_connect_error() {
    let transport = ScriptedTransport::new()
        .output("Last login attempt from 10.0.0.5\r\n")
        .silence();
    let (console, handle) = console(transport);

    let err = assert_err!(console.run_command(HOST, &credentials(), "show status").await);

    match err {
        ConsoleError::Connect { host, detail } => {
            assert_eq!(host, HOST);
            assert!(detail.starts_with("timeout"));
            assert!(detail.contains("Last login attempt"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(handle.sent().is_empty());
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_stream_closed_during_login_is_connect_error() {
    let transport = ScriptedTransport::new()
        .output("ssh: Could not resolve hostname gmc.example.com: Name or service not known\r\n")
        .eof();
    let (console, handle) = console(transport);

    let err = assert_err!(console.promote_master(HOST, &credentials(), 0).await);

    match err {
        ConsoleError::Connect { detail, .. } => assert!(detail.contains("Could not resolve")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(handle.sent().is_empty());
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_silent_console_after_login_is_session_error() {
    let transport = logged_in()
        .await_input()
        .output("show status\r\n")
        .silence();
    let (console, handle) = console(transport);

    let err = assert_err!(console.run_command(HOST, &credentials(), "show status").await);

    assert!(matches!(err, ConsoleError::Session { .. }));
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_stream_closed_mid_promotion_is_session_error() {
    let transport = logged_in()
        .await_input()
        .output("set promote_master\r\n")
        .output(MEMBER_DELAY)
        .await_input()
        .output("\r\nConnection to gmc.example.com closed.\r\n")
        .eof();
    let (console, handle) = console(transport);

    let err = assert_err!(console.promote_master(HOST, &credentials(), 0).await);

    match err {
        ConsoleError::Session { host, detail, .. } => {
            assert_eq!(host, HOST);
            assert!(detail.contains("closed"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(handle.close_calls(), 1);
}

#[tokio::test]
async fn test_empty_command_never_connects() {
    let (console, handle) = console(logged_in());

    let outcome = assert_ok!(console.run_command(HOST, &credentials(), "").await);

    assert_eq!(outcome.status, Status::Aborted);
    assert_eq!(outcome.transcript, NO_COMMAND_MESSAGE);
    assert_eq!(console.connector().connects(), 0);
    assert_eq!(handle.close_calls(), 0);
}

#[tokio::test]
async fn test_refused_connection_is_connect_error() {
    let console = Console::builder().build_with(ScriptedConnector::refusing("ssh: not found"));

    let err = assert_err!(console.run_command(HOST, &credentials(), "show status").await);

    assert_eq!(
        err.to_string(),
        format!("ssh connection issue with {HOST}: Failed to spawn process: ssh: not found")
    );
}
