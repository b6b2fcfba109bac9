//! Error taxonomy tests
//!
//! Verifies the wrap-at-the-call-site policy: every host failure reaches
//! callers as one of the four taxonomy kinds with the diagnostic quad in
//! the details, and the two diagnostic queries keep their error-string
//! shape instead.

use std::time::Duration;

use tnpilot::config::SessionConfig;
use tnpilot::scripted::ScriptedHost;
use tnpilot::{ErrorKind, TerminalKind, TerminalSession};

fn fast_config() -> SessionConfig {
    SessionConfig {
        poll_interval_ms: 5,
        ready_timeout_secs: 2,
        ..SessionConfig::default()
    }
}

#[test]
fn test_stable_codes() {
    assert_eq!(ErrorKind::Connection.code(), 1001);
    assert_eq!(ErrorKind::Session.code(), 1002);
    assert_eq!(ErrorKind::Busy.code(), 1003);
    assert_eq!(ErrorKind::Command.code(), 1004);
}

#[test]
fn test_session_lookup_failure_shape() {
    let host = ScriptedHost::new("v1");
    host.add_session("A", true);
    host.add_session("B", false);

    let err = TerminalSession::with_host(
        host.boxed(),
        TerminalKind::Extra,
        "NonexistentSession",
        fast_config(),
    )
    .unwrap_err();

    assert_eq!(err.code(), 1002);
    assert_eq!(err.message(), "Session not found");
    assert_eq!(err.detail("name"), Some("NonexistentSession"));
    assert_eq!(err.detail("available"), Some("A, B"));

    let rendered = err.to_string();
    assert!(rendered.starts_with("[Error 1002] Session not found"));
    assert!(rendered.contains("- available: A, B"));
}

#[test]
fn test_empty_collection_is_session_error() {
    let host = ScriptedHost::new("v1");
    let err =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "1", fast_config())
            .unwrap_err();
    assert_eq!(err.code(), 1002);
    assert_eq!(err.message(), "No sessions available");
}

#[test]
fn test_host_failure_at_construction_is_connection_error() {
    let host = ScriptedHost::new("v1");
    host.add_session("A", true);
    host.fail_enumeration();

    let err =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", fast_config())
            .unwrap_err();
    assert_eq!(err.code(), 1001);
    // the diagnostic quad never leaks as a raw error, it rides in details
    assert!(err.detail("hr").is_some());
    assert!(err.detail("msg").is_some());
}

#[test]
fn test_injection_failure_is_command_error_with_keys() {
    let host = ScriptedHost::new("v1");
    let session = host.add_session("A", true);
    session.fail_send_keys();

    let mut terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", fast_config())
            .unwrap();
    let err = terminal.send_command("probe").unwrap_err();
    assert_eq!(err.code(), 1004);
    assert_eq!(err.message(), "Failed to send keys");
    assert_eq!(err.detail("keys"), Some("probe <ENTER>"));
    assert!(err.detail("hr").is_some());
}

#[test]
fn test_busy_timeout_carries_budget_and_last_status() {
    let host = ScriptedHost::new("v1");
    let session = host.add_session("A", true);
    session.set_idle_status(5);

    let terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", fast_config())
            .unwrap();
    let err = terminal.wait_for_ready(Duration::from_millis(30)).unwrap_err();
    assert_eq!(err.code(), 1003);
    assert_eq!(err.message(), "Terminal busy timeout");
    assert!(err.detail("timeout").is_some());
    assert_eq!(err.detail("last_status"), Some("5"));
}

#[test]
fn test_status_read_failure_reclassified_as_busy() {
    let host = ScriptedHost::new("v1");
    let session = host.add_session("A", true);
    session.fail_status_reads();

    let terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", fast_config())
            .unwrap();
    let err = terminal.wait_for_ready(Duration::from_secs(1)).unwrap_err();
    assert_eq!(err.code(), 1003, "status-check failure is busy, not connection");
    assert!(err.detail("error").is_some());
    assert!(err.detail("elapsed").is_some());
}

#[test]
fn test_read_failure_is_command_error() {
    let host = ScriptedHost::new("v1");
    let session = host.add_session("A", true);
    session.fail_block_reads();

    let terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", fast_config())
            .unwrap();
    let err = terminal.read_screen(true).unwrap_err();
    assert_eq!(err.code(), 1004);
    assert_eq!(err.message(), "Read screen failed");
}

#[test]
fn test_diagnostic_queries_keep_error_string_shape() {
    let host = ScriptedHost::new("v1");
    host.add_session("A", true);

    let terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", fast_config())
            .unwrap();
    host.fail_enumeration();

    // strict lookup raises, diagnostics degrade to a string; the asymmetry
    // is part of the contract
    let listing = terminal.list_available_sessions().unwrap_err();
    assert!(listing.starts_with("Failed to list sessions:"));
    assert!(listing.contains("Code:"), "quad is rendered inline: {listing}");

    let status = terminal.system_status().unwrap_err();
    assert!(status.starts_with("Failed to get system status:"));
}

#[test]
fn test_disconnect_never_fails() {
    let host = ScriptedHost::new("v1");
    let session = host.add_session("A", true);
    session.fail_send_keys();
    session.fail_status_reads();
    session.fail_block_reads();

    let mut terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", fast_config())
            .unwrap();
    // every host path is broken, disconnect still just works
    terminal.disconnect();
    assert!(!terminal.connected());
    terminal.disconnect();
    assert!(!terminal.connected());
}
