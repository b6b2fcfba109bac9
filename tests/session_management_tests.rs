//! Session acquisition and configuration tests
//!
//! Covers the three backend acquisition strategies, the 1-based index and
//! name lookup rules, and configuration defaults plus persistence.

use tnpilot::config::SessionConfig;
use tnpilot::scripted::ScriptedHost;
use tnpilot::{ScreenGeometry, TerminalKind, TerminalSession};

fn fast_config() -> SessionConfig {
    SessionConfig {
        poll_interval_ms: 5,
        ready_timeout_secs: 2,
        ..SessionConfig::default()
    }
}

fn two_session_host() -> ScriptedHost {
    let host = ScriptedHost::new("v1");
    host.add_session("PROD", true);
    host.add_session("TEST", false);
    host
}

#[test]
fn test_extra_numeric_spec_is_one_based() {
    let host = ScriptedHost::new("v1");
    let prod = host.add_session("PROD", true);
    let test = host.add_session("TEST", false);
    let mut terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "2", fast_config())
            .unwrap();
    // injecting lands on the second collection entry
    terminal.send_keys("<PA1>").unwrap();
    assert_eq!(test.last_sent().as_deref(), Some("<PA1>"));
    assert!(prod.sent_keys().is_empty());
}

#[test]
fn test_extra_name_spec_scans_collection() {
    let host = two_session_host();
    let terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "TEST", fast_config())
            .unwrap();
    assert!(terminal.connected());
}

#[test]
fn test_his_open_session_by_name() {
    let host = two_session_host();
    let terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::His, "PROD", fast_config())
            .unwrap();
    assert_eq!(terminal.kind(), TerminalKind::His);
    assert!(terminal.connected());
}

#[test]
fn test_netmanage_keyed_lookup() {
    let host = two_session_host();
    let terminal = TerminalSession::with_host(
        host.boxed(),
        TerminalKind::NetManage,
        "TEST",
        fast_config(),
    )
    .unwrap();
    assert_eq!(terminal.kind(), TerminalKind::NetManage);
}

#[test]
fn test_his_unknown_session_is_connection_error() {
    let host = two_session_host();
    let err =
        TerminalSession::with_host(host.boxed(), TerminalKind::His, "NOPE", fast_config())
            .unwrap_err();
    // HIS has no name scan of its own; the vendor call just fails
    assert_eq!(err.code(), 1001);
    assert!(err.detail("hr").is_some());
}

#[test]
fn test_reconnect_after_disconnect() {
    let host = two_session_host();
    let mut terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "PROD", fast_config())
            .unwrap();
    terminal.disconnect();
    assert!(!terminal.connected());
    terminal.connect().unwrap();
    assert!(terminal.connected());
}

#[test]
fn test_config_defaults() {
    let config = SessionConfig::default();
    assert_eq!(config.geometry, ScreenGeometry::new(32, 80));
    assert_eq!(config.busy_sentinel, 5);
    assert_eq!(config.poll_interval_ms, 100);
    assert_eq!(config.ready_timeout_secs, 30);
    // backend handshakes keep their native units
    assert_eq!(config.connect_wait_secs, 30);
    assert_eq!(config.connect_wait_ms, 30_000);
    assert_eq!(config.busy_poll_limit, 10_000);
}

#[test]
fn test_config_round_trip_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tnpilot").join("config.json");

    let config = SessionConfig {
        geometry: ScreenGeometry::new(24, 80),
        ready_timeout_secs: 45,
        ..SessionConfig::default()
    };
    config.save(&path).unwrap();

    let loaded = SessionConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_custom_geometry_drives_reads() {
    let host = ScriptedHost::new("v1");
    let session = host.add_session("A", true);
    session.set_contents("0123456789");

    let config = SessionConfig {
        geometry: ScreenGeometry::new(2, 5),
        poll_interval_ms: 5,
        ready_timeout_secs: 2,
        ..SessionConfig::default()
    };
    let terminal =
        TerminalSession::with_host(host.boxed(), TerminalKind::Extra, "A", config).unwrap();
    let content = terminal.read_screen(true).unwrap();
    assert_eq!(content.rows().unwrap(), &["01234", "56789"]);
}
