//! Session controller
//!
//! Ties the locator, poller, reader and formatter together around one host
//! session: connect/disconnect lifecycle, readiness-gated key injection,
//! screen reads and text-appearance waiting. State machine is
//! `disconnected -> connecting -> connected -> disconnected`; failures raise
//! and leave the state unchanged.

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::command;
use crate::config::SessionConfig;
use crate::error::{ErrorKind, TerminalError, TerminalResult};
use crate::host::{self, AutomationHost, HostCallError, HostScreen, HostSession, TerminalKind};
use crate::locator::{self, SessionInfo};
use crate::poller::ReadinessPoller;
use crate::runtime::ApartmentGuard;
use crate::screen::{ScreenContent, ScreenReader};

/// Diagnostic snapshot of the host automation object.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub session_count: usize,
    pub session_names: Vec<String>,
}

/// Controller for one emulator session.
///
/// The host session itself is owned by the emulator process; the controller
/// only looks it up and issues commands against it. Dropping the controller
/// releases the automation runtime acquired at construction.
pub struct TerminalSession {
    id: Uuid,
    kind: TerminalKind,
    host: Box<dyn AutomationHost>,
    session: Box<dyn HostSession>,
    screen: Box<dyn HostScreen>,
    config: SessionConfig,
    poller: ReadinessPoller,
    reader: ScreenReader,
    connected: bool,
    busy_count: u32,
    _apartment: ApartmentGuard,
}

impl TerminalSession {
    /// Attach to a session of the platform automation backend for `kind`.
    ///
    /// `session_spec` is a 1-based index or a session name for Extra; HIS
    /// and NetManage take the name their own acquisition call expects.
    pub fn establish(
        kind: TerminalKind,
        session_spec: &str,
        config: SessionConfig,
    ) -> TerminalResult<Self> {
        let apartment = ApartmentGuard::acquire()?;
        let host = host::create(kind)?;
        Self::attach(apartment, host, kind, session_spec, config)
    }

    /// Attach using a caller-provided host implementation.
    pub fn with_host(
        host: Box<dyn AutomationHost>,
        kind: TerminalKind,
        session_spec: &str,
        config: SessionConfig,
    ) -> TerminalResult<Self> {
        let apartment = ApartmentGuard::acquire()?;
        Self::attach(apartment, host, kind, session_spec, config)
    }

    fn attach(
        apartment: ApartmentGuard,
        host: Box<dyn AutomationHost>,
        kind: TerminalKind,
        session_spec: &str,
        config: SessionConfig,
    ) -> TerminalResult<Self> {
        let id = Uuid::new_v4();
        log::info!(
            "session {id}: attaching to {} session {session_spec:?}",
            kind.prog_id()
        );

        let session = match kind {
            TerminalKind::Extra => locator::resolve(host.as_ref(), session_spec)?,
            TerminalKind::His => host.open_session(session_spec).map_err(|e| {
                e.into_details(TerminalError::connection(format!(
                    "Failed to initialize {}",
                    kind.prog_id()
                )))
            })?,
            TerminalKind::NetManage => host.session_named(session_spec).map_err(|e| {
                e.into_details(TerminalError::connection(format!(
                    "Failed to initialize {}",
                    kind.prog_id()
                )))
            })?,
        };

        let screen = session.screen().map_err(|e| {
            e.into_details(TerminalError::connection("Failed to acquire session screen"))
        })?;

        if let Ok(name) = session.name() {
            log::info!("session {id}: attached to {name:?}");
        }

        let poller = ReadinessPoller::new(config.busy_sentinel, config.poll_interval());
        let reader = ScreenReader::new(config.geometry);
        Ok(Self {
            id,
            kind,
            host,
            session,
            screen,
            config,
            poller,
            reader,
            connected: true,
            busy_count: 0,
            _apartment: apartment,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TerminalKind {
        self.kind
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Controller connection state.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Connect the underlying session. No-op when already connected.
    pub fn connect(&mut self) -> TerminalResult<()> {
        if self.connected {
            return Ok(());
        }
        log::info!("session {}: connecting", self.id);
        let wrap =
            |e: HostCallError| e.into_details(TerminalError::connection("Connection failed"));
        self.session.connect().map_err(wrap)?;
        match self.kind {
            TerminalKind::Extra => {}
            // HIS blocks on its handshake; the vendor call takes seconds.
            TerminalKind::His => self
                .session
                .wait_for_connect(self.config.connect_wait_secs)
                .map_err(wrap)?,
            // NetManage blocks too, but its call takes milliseconds.
            TerminalKind::NetManage => self
                .session
                .wait_ready(self.config.connect_wait_ms)
                .map_err(wrap)?,
        }
        self.connected = true;
        Ok(())
    }

    /// Mark the controller disconnected.
    ///
    /// The host session is left exactly as it was: no host disconnect
    /// primitive is invoked, and this never fails.
    pub fn disconnect(&mut self) {
        if self.connected {
            log::info!("session {}: disconnected", self.id);
        }
        self.connected = false;
    }

    /// Block until the OIA flag reports the terminal settled.
    pub fn wait_for_ready(&self, timeout: Duration) -> TerminalResult<bool> {
        self.poller.wait_for_ready(self.screen.as_ref(), timeout)
    }

    /// Inject raw keystrokes, then wait for the terminal to settle.
    pub fn send_keys(&mut self, keys: &str) -> TerminalResult<()> {
        if !self.connected {
            return Err(TerminalError::connection("Not connected to terminal"));
        }
        self.screen.send_keys(keys).map_err(|e| {
            e.into_details(TerminalError::command("Failed to send keys"))
                .with_detail("keys", keys)
        })?;
        match self
            .poller
            .wait_for_ready(self.screen.as_ref(), self.config.ready_timeout())
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::Busy => {
                Err(TerminalError::command("Terminal not ready after sending keys")
                    .with_detail("keys", keys)
                    .with_detail("cause", e.message()))
            }
            Err(e) => Err(e),
        }
    }

    /// Format a command and send it.
    ///
    /// Returns the formatted string that was actually injected; echoing it
    /// back is part of the contract.
    pub fn send_command(&mut self, command: &str) -> TerminalResult<String> {
        let formatted = command::format_command(command);
        log::info!("session {}: sending command {formatted:?}", self.id);
        self.send_keys(&formatted)?;
        Ok(formatted)
    }

    /// Read the screen buffer.
    ///
    /// With `strip_whitespace` the result is right-trimmed rows, top to
    /// bottom; without it the raw fixed-length buffer.
    pub fn read_screen(&self, strip_whitespace: bool) -> TerminalResult<ScreenContent> {
        self.reader.read(
            self.screen.as_ref(),
            &self.poller,
            self.config.ready_timeout(),
            strip_whitespace,
        )
    }

    /// Wait until `text` appears anywhere on the screen.
    ///
    /// Returns `false` once `timeout` elapses without a match. A second,
    /// looser exit fires when accumulated busy observations exceed the
    /// configured cap; the counter is persistent across calls on purpose
    /// (see DESIGN.md). Internal failures are swallowed and retried.
    pub fn wait_for_text(&mut self, text: &str, timeout: Duration, interval: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match self.read_screen(true) {
                Ok(content) => {
                    if content.contains(text) {
                        return true;
                    }
                    if let Ok(status) = self.screen.oia_status() {
                        if status != 0 {
                            self.busy_count += 1;
                            if self.busy_count > self.config.busy_poll_limit {
                                log::warn!(
                                    "session {}: busy limit reached waiting for {text:?}",
                                    self.id
                                );
                                return false;
                            }
                        }
                    }
                }
                Err(e) => {
                    log::debug!(
                        "session {}: retrying after read failure: {}",
                        self.id,
                        e.message()
                    );
                }
            }
            std::thread::sleep(interval);
        }
        false
    }

    /// Diagnostic snapshot of the automation object; failures come back as
    /// a description string.
    pub fn system_status(&self) -> Result<SystemStatus, String> {
        let fail = |e: HostCallError| format!("Failed to get system status: {e}");
        let version = self.host.version().map_err(fail)?;
        let session_count = self.host.session_count().map_err(fail)?;
        let mut session_names = Vec::with_capacity(session_count);
        for index in 1..=session_count {
            let session = self.host.session_at(index).map_err(fail)?;
            session_names.push(session.name().map_err(fail)?);
        }
        Ok(SystemStatus {
            version,
            session_count,
            session_names,
        })
    }

    /// Diagnostic session listing (`{index, name, connected}` rows).
    pub fn list_available_sessions(&self) -> Result<Vec<SessionInfo>, String> {
        locator::list_sessions(self.host.as_ref())
    }

    /// Run `op` inside a managed connect/disconnect scope.
    ///
    /// `disconnect` runs on every exit path, success or error.
    pub fn scope<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> TerminalResult<R>,
    ) -> TerminalResult<R> {
        self.connect()?;
        let result = op(self);
        self.disconnect();
        result
    }
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("connected", &self.connected)
            .field("busy_count", &self.busy_count)
            .finish_non_exhaustive()
    }
}

impl Drop for TerminalSession {
    // The `_apartment` guard releases the automation runtime right after.
    fn drop(&mut self) {
        self.disconnect();
    }
}
