//! Error taxonomy for terminal automation failures
//!
//! Every host-call failure is caught at the point of the call and re-wrapped
//! into one of four kinds with contextual detail attached; the raw automation
//! error type never reaches callers. Callers match on the kind (or just the
//! code) for coarse handling: retry on busy, fail fast on connection faults.

use std::error::Error as StdError;
use std::fmt;

/// Classification of a terminal automation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Host or session establishment failures
    Connection,
    /// Session lookup and enumeration failures
    Session,
    /// Readiness timeout or status-check failures
    Busy,
    /// Keystroke injection or screen read failures
    Command,
}

impl ErrorKind {
    /// Stable numeric code carried by every error of this kind.
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::Connection => 1001,
            ErrorKind::Session => 1002,
            ErrorKind::Busy => 1003,
            ErrorKind::Command => 1004,
        }
    }
}

/// A classified terminal automation error.
///
/// Immutable once raised: the kind, message and ordered detail list are fixed
/// at the point the underlying failure was caught.
#[derive(Debug, Clone)]
pub struct TerminalError {
    kind: ErrorKind,
    message: String,
    details: Vec<(String, String)>,
}

impl TerminalError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Session, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Busy, message)
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Command, message)
    }

    /// Append one key/value pair to the detail list.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The detail list, in the order the details were attached.
    pub fn details(&self) -> &[(String, String)] {
        &self.details
    }

    /// Look up a single detail value by key.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_connection(&self) -> bool {
        self.kind == ErrorKind::Connection
    }

    pub fn is_session(&self) -> bool {
        self.kind == ErrorKind::Session
    }

    pub fn is_busy(&self) -> bool {
        self.kind == ErrorKind::Busy
    }

    pub fn is_command(&self) -> bool {
        self.kind == ErrorKind::Command
    }
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Error {}] {}", self.code(), self.message)?;
        if !self.details.is_empty() {
            write!(f, "\nDetails:")?;
            for (key, value) in &self.details {
                write!(f, "\n- {key}: {value}")?;
            }
        }
        Ok(())
    }
}

impl StdError for TerminalError {}

/// Result type alias for terminal automation operations
pub type TerminalResult<T> = Result<T, TerminalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(ErrorKind::Connection.code(), 1001);
        assert_eq!(ErrorKind::Session.code(), 1002);
        assert_eq!(ErrorKind::Busy.code(), 1003);
        assert_eq!(ErrorKind::Command.code(), 1004);
    }

    #[test]
    fn test_display_without_details() {
        let err = TerminalError::busy("Terminal busy timeout");
        assert_eq!(err.to_string(), "[Error 1003] Terminal busy timeout");
    }

    #[test]
    fn test_display_with_details() {
        let err = TerminalError::session("Session not found")
            .with_detail("name", "PROD")
            .with_detail("available", "A, B");
        assert_eq!(
            err.to_string(),
            "[Error 1002] Session not found\nDetails:\n- name: PROD\n- available: A, B"
        );
    }

    #[test]
    fn test_details_keep_insertion_order() {
        let err = TerminalError::command("Failed to send keys")
            .with_detail("keys", "x")
            .with_detail("hr", -2147467259i32)
            .with_detail("msg", "fault");
        let keys: Vec<&str> = err.details().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["keys", "hr", "msg"]);
        assert_eq!(err.detail("hr"), Some("-2147467259"));
        assert_eq!(err.detail("missing"), None);
    }

    #[test]
    fn test_kind_predicates() {
        assert!(TerminalError::connection("x").is_connection());
        assert!(TerminalError::session("x").is_session());
        assert!(TerminalError::busy("x").is_busy());
        assert!(TerminalError::command("x").is_command());
        assert!(!TerminalError::command("x").is_busy());
    }
}
