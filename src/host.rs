//! Host automation seam
//!
//! Traits mirroring the emulator vendor's automation object model: the
//! top-level automation object, the entries of its session collection, and
//! the screen object a session exposes. This crate never reimplements the
//! emulator; every operation is a blocking call through one of these traits
//! into the vendor process.

use std::fmt;

use crate::error::{TerminalError, TerminalResult};

/// Raw failure reported by a host automation call.
///
/// Carries the diagnostic quad the platform automation layer reports (result
/// code, message, source, offending argument). Call sites wrap this into a
/// [`TerminalError`]; the quad rides along in the details.
#[derive(Debug, Clone)]
pub struct HostCallError {
    pub code: i32,
    pub message: String,
    pub source: Option<String>,
    pub param: Option<String>,
}

impl HostCallError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            param: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Fold the diagnostic quad into a taxonomy error's detail list.
    pub fn into_details(self, error: TerminalError) -> TerminalError {
        let mut error = error
            .with_detail("hr", self.code)
            .with_detail("msg", self.message);
        if let Some(source) = self.source {
            error = error.with_detail("source", source);
        }
        if let Some(param) = self.param {
            error = error.with_detail("arg", param);
        }
        error
    }
}

impl fmt::Display for HostCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Code: {}, Message: {}, Source: {}, Param: {}",
            self.code,
            self.message,
            self.source.as_deref().unwrap_or("-"),
            self.param.as_deref().unwrap_or("-")
        )
    }
}

impl std::error::Error for HostCallError {}

/// Result type alias for raw host automation calls
pub type HostResult<T> = Result<T, HostCallError>;

/// Top-level automation object of a terminal emulator process.
pub trait AutomationHost {
    /// Emulator version string.
    fn version(&self) -> HostResult<String>;

    /// Number of entries in the host session collection.
    fn session_count(&self) -> HostResult<usize>;

    /// Positional lookup; the vendor collections are 1-based.
    fn session_at(&self, index: usize) -> HostResult<Box<dyn HostSession>>;

    /// Open a session by name (HIS-style `OpenSession`).
    fn open_session(&self, name: &str) -> HostResult<Box<dyn HostSession>>;

    /// Keyed lookup into the session collection (NetManage `Sessions.Item`).
    fn session_named(&self, key: &str) -> HostResult<Box<dyn HostSession>>;
}

/// One entry of the host session collection.
pub trait HostSession: fmt::Debug {
    fn name(&self) -> HostResult<String>;

    fn connected(&self) -> HostResult<bool>;

    fn connect(&self) -> HostResult<()>;

    /// HIS handshake wait. The vendor call takes seconds.
    fn wait_for_connect(&self, timeout_secs: u32) -> HostResult<()>;

    /// NetManage handshake wait. The vendor call takes milliseconds.
    fn wait_ready(&self, timeout_ms: u32) -> HostResult<()>;

    fn screen(&self) -> HostResult<Box<dyn HostScreen>>;
}

/// Screen object of a session.
pub trait HostScreen {
    /// OIA input-inhibited status indicator.
    fn oia_status(&self) -> HostResult<i32>;

    /// Block read of the visible buffer at a fixed extent.
    fn read_block(&self, row: u32, col: u32, rows: u32, cols: u32) -> HostResult<String>;

    /// Inject a formatted keystroke sequence.
    fn send_keys(&self, keys: &str) -> HostResult<()>;

    fn cursor_position(&self) -> HostResult<(u32, u32)>;

    fn move_cursor(&self, row: u32, col: u32) -> HostResult<()>;
}

/// Supported emulator backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Attachmate Extra!
    Extra,
    /// Microsoft Host Integration Server
    His,
    /// NetManage
    NetManage,
}

impl TerminalKind {
    pub const ALL: [TerminalKind; 3] = [
        TerminalKind::Extra,
        TerminalKind::His,
        TerminalKind::NetManage,
    ];

    /// Automation ProgID of the vendor object.
    pub fn prog_id(self) -> &'static str {
        match self {
            TerminalKind::Extra => "EXTRA.System",
            TerminalKind::His => "MSHISServer.Session",
            TerminalKind::NetManage => "NetManage.Connection.1",
        }
    }

    /// Probe every backend and return the ones whose automation object
    /// instantiates on this machine.
    pub fn detect_available() -> Vec<TerminalKind> {
        Self::ALL
            .iter()
            .copied()
            .filter(|kind| create(*kind).is_ok())
            .collect()
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prog_id())
    }
}

impl std::str::FromStr for TerminalKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "extra" => Ok(TerminalKind::Extra),
            "his" => Ok(TerminalKind::His),
            "netmanage" => Ok(TerminalKind::NetManage),
            other => Err(format!(
                "unknown terminal type {other:?} (expected extra, his or netmanage)"
            )),
        }
    }
}

/// Create the platform automation backend for `kind`.
#[cfg(all(windows, feature = "wincom"))]
pub fn create(kind: TerminalKind) -> TerminalResult<Box<dyn AutomationHost>> {
    let host = crate::wincom::ComAutomationHost::create(kind.prog_id()).map_err(|e| {
        e.into_details(TerminalError::connection(format!(
            "Failed to initialize {}",
            kind.prog_id()
        )))
    })?;
    Ok(Box::new(host))
}

/// Create the platform automation backend for `kind`.
///
/// Without the `wincom` backend there is nothing to attach to; the error
/// keeps the same shape a failed dispatch would have.
#[cfg(not(all(windows, feature = "wincom")))]
pub fn create(kind: TerminalKind) -> TerminalResult<Box<dyn AutomationHost>> {
    Err(
        TerminalError::connection(format!("Failed to initialize {}", kind.prog_id()))
            .with_detail("error", "no automation backend available on this platform"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prog_ids() {
        assert_eq!(TerminalKind::Extra.prog_id(), "EXTRA.System");
        assert_eq!(TerminalKind::His.prog_id(), "MSHISServer.Session");
        assert_eq!(TerminalKind::NetManage.prog_id(), "NetManage.Connection.1");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("extra".parse::<TerminalKind>(), Ok(TerminalKind::Extra));
        assert_eq!("HIS".parse::<TerminalKind>(), Ok(TerminalKind::His));
        assert_eq!(
            "netmanage".parse::<TerminalKind>(),
            Ok(TerminalKind::NetManage)
        );
        assert!("vt100".parse::<TerminalKind>().is_err());
    }

    #[test]
    fn test_host_call_error_display() {
        let err = HostCallError::new(-2147467259, "The operation failed")
            .with_source("EXTRA.System")
            .with_param("Sessions");
        assert_eq!(
            err.to_string(),
            "Code: -2147467259, Message: The operation failed, Source: EXTRA.System, Param: Sessions"
        );
    }

    #[test]
    fn test_into_details_keeps_quad() {
        let err = HostCallError::new(-2147352567, "Exception occurred")
            .with_source("Screen")
            .with_param("SendKeys");
        let wrapped = err.into_details(crate::error::TerminalError::command("Failed to send keys"));
        assert_eq!(wrapped.detail("hr"), Some("-2147352567"));
        assert_eq!(wrapped.detail("msg"), Some("Exception occurred"));
        assert_eq!(wrapped.detail("source"), Some("Screen"));
        assert_eq!(wrapped.detail("arg"), Some("SendKeys"));
    }
}
