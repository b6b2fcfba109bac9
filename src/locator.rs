//! Session lookup against the host automation object
//!
//! Resolution is strict and fails loudly; the enumeration used for
//! diagnostics and interactive selection reports failures as a description
//! string instead. The two shapes are intentionally different so diagnostic
//! callers never have to handle a structured error.

use serde::Serialize;

use crate::error::{TerminalError, TerminalResult};
use crate::host::{AutomationHost, HostSession};

/// One row of the diagnostic session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub index: usize,
    pub name: String,
    pub connected: bool,
}

/// Resolve a session spec against the host collection.
///
/// A spec that parses as an integer is a 1-based positional index into the
/// collection; anything else is matched against session names, first match
/// wins.
pub fn resolve(host: &dyn AutomationHost, spec: &str) -> TerminalResult<Box<dyn HostSession>> {
    let count = host.session_count().map_err(|e| {
        e.into_details(TerminalError::connection("Failed to enumerate host sessions"))
    })?;
    if count == 0 {
        return Err(TerminalError::session("No sessions available"));
    }

    if let Ok(index) = spec.parse::<usize>() {
        return host.session_at(index).map_err(|e| {
            e.into_details(TerminalError::connection("Failed to open session by index"))
                .with_detail("index", index)
        });
    }

    let mut available = Vec::with_capacity(count);
    for index in 1..=count {
        let session = host.session_at(index).map_err(|e| {
            e.into_details(TerminalError::connection("Failed to enumerate host sessions"))
        })?;
        let name = session.name().map_err(|e| {
            e.into_details(TerminalError::connection("Failed to enumerate host sessions"))
        })?;
        if name == spec {
            return Ok(session);
        }
        available.push(name);
    }

    Err(TerminalError::session("Session not found")
        .with_detail("name", spec)
        .with_detail("available", available.join(", ")))
}

/// Enumerate `{index, name, connected}` rows for diagnostics and
/// interactive selection.
///
/// Failures come back as a description string rather than an error value.
pub fn list_sessions(host: &dyn AutomationHost) -> Result<Vec<SessionInfo>, String> {
    let count = host
        .session_count()
        .map_err(|e| format!("Failed to list sessions: {e}"))?;
    let mut sessions = Vec::with_capacity(count);
    for index in 1..=count {
        let session = host
            .session_at(index)
            .map_err(|e| format!("Failed to list sessions: {e}"))?;
        let name = session
            .name()
            .map_err(|e| format!("Failed to list sessions: {e}"))?;
        let connected = session
            .connected()
            .map_err(|e| format!("Failed to list sessions: {e}"))?;
        sessions.push(SessionInfo {
            index,
            name,
            connected,
        });
    }
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedHost;

    fn two_session_host() -> ScriptedHost {
        let host = ScriptedHost::new("test host");
        host.add_session("A", true);
        host.add_session("B", false);
        host
    }

    #[test]
    fn test_resolve_by_numeric_index_is_one_based() {
        let host = two_session_host();
        let session = resolve(&host, "2").unwrap();
        assert_eq!(session.name().unwrap(), "B");
    }

    #[test]
    fn test_resolve_by_name() {
        let host = two_session_host();
        let session = resolve(&host, "B").unwrap();
        assert_eq!(session.name().unwrap(), "B");
        assert!(!session.connected().unwrap());
    }

    #[test]
    fn test_resolve_unknown_name_lists_available() {
        let host = two_session_host();
        let err = resolve(&host, "PROD").unwrap_err();
        assert!(err.is_session());
        assert_eq!(err.message(), "Session not found");
        assert_eq!(err.detail("name"), Some("PROD"));
        assert_eq!(err.detail("available"), Some("A, B"));
    }

    #[test]
    fn test_resolve_empty_collection() {
        let host = ScriptedHost::new("test host");
        let err = resolve(&host, "1").unwrap_err();
        assert!(err.is_session());
        assert_eq!(err.message(), "No sessions available");
    }

    #[test]
    fn test_resolve_index_out_of_range() {
        let host = two_session_host();
        let err = resolve(&host, "7").unwrap_err();
        assert!(err.is_connection());
        assert_eq!(err.detail("index"), Some("7"));
    }

    #[test]
    fn test_list_sessions_rows() {
        let host = two_session_host();
        let sessions = list_sessions(&host).unwrap();
        assert_eq!(
            sessions,
            vec![
                SessionInfo {
                    index: 1,
                    name: "A".to_string(),
                    connected: true,
                },
                SessionInfo {
                    index: 2,
                    name: "B".to_string(),
                    connected: false,
                },
            ]
        );
    }

    #[test]
    fn test_list_sessions_failure_is_a_string() {
        let host = two_session_host();
        host.fail_enumeration();
        let message = list_sessions(&host).unwrap_err();
        assert!(message.starts_with("Failed to list sessions:"));
    }
}
