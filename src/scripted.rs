//! Scripted host backend
//!
//! An in-process stand-in for a vendor automation object, driven by a
//! prepared script: a session table, a sequence of OIA status values, fixed
//! screen contents and failure switches. The integration tests and the
//! binary's `--playback` mode run the full controller stack against it.
//!
//! Handles share state through `Rc`, so they are deliberately not `Send` —
//! the same single-thread exclusivity the real automation objects demand.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::host::{AutomationHost, HostCallError, HostResult, HostScreen, HostSession};

// generic automation failure (E_FAIL)
const SCRIPT_FAULT: i32 = -2147467259;

fn script_error(message: impl Into<String>) -> HostCallError {
    HostCallError::new(SCRIPT_FAULT, message).with_source("ScriptedHost")
}

#[derive(Debug, Default)]
struct ScreenState {
    contents: String,
    statuses: VecDeque<i32>,
    idle_status: i32,
    sent_keys: Vec<String>,
    cursor: (u32, u32),
    fail_status_reads: bool,
    fail_block_reads: bool,
    fail_send_keys: bool,
}

#[derive(Debug)]
struct SessionState {
    name: String,
    connected: bool,
    screen: ScreenState,
}

#[derive(Debug, Default)]
struct HostState {
    version: String,
    sessions: Vec<SessionState>,
    fail_enumeration: bool,
}

/// Scripted automation object.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    state: Rc<RefCell<HostState>>,
}

impl ScriptedHost {
    pub fn new(version: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(HostState {
                version: version.to_string(),
                ..HostState::default()
            })),
        }
    }

    /// Append a session to the collection and return its script handle.
    pub fn add_session(&self, name: &str, connected: bool) -> ScriptedSession {
        let mut state = self.state.borrow_mut();
        state.sessions.push(SessionState {
            name: name.to_string(),
            connected,
            screen: ScreenState::default(),
        });
        ScriptedSession {
            state: Rc::clone(&self.state),
            index: state.sessions.len() - 1,
        }
    }

    /// Make every collection-level call fail from now on.
    pub fn fail_enumeration(&self) {
        self.state.borrow_mut().fail_enumeration = true;
    }

    pub fn boxed(&self) -> Box<dyn AutomationHost> {
        Box::new(self.clone())
    }
}

/// Script handle for one session: configures the screen script and inspects
/// what the controller injected.
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    state: Rc<RefCell<HostState>>,
    index: usize,
}

impl ScriptedSession {
    /// Fix the screen contents returned by every block read.
    pub fn set_contents(&self, contents: &str) -> &Self {
        self.state.borrow_mut().sessions[self.index]
            .screen
            .contents = contents.to_string();
        self
    }

    /// Queue OIA status values, consumed one per read.
    pub fn push_statuses(&self, statuses: &[i32]) -> &Self {
        self.state.borrow_mut().sessions[self.index]
            .screen
            .statuses
            .extend(statuses.iter().copied());
        self
    }

    /// Status reported once the queued values run out (defaults to 0).
    pub fn set_idle_status(&self, status: i32) -> &Self {
        self.state.borrow_mut().sessions[self.index]
            .screen
            .idle_status = status;
        self
    }

    pub fn fail_status_reads(&self) -> &Self {
        self.state.borrow_mut().sessions[self.index]
            .screen
            .fail_status_reads = true;
        self
    }

    pub fn fail_block_reads(&self) -> &Self {
        self.state.borrow_mut().sessions[self.index]
            .screen
            .fail_block_reads = true;
        self
    }

    pub fn fail_send_keys(&self) -> &Self {
        self.state.borrow_mut().sessions[self.index]
            .screen
            .fail_send_keys = true;
        self
    }

    /// Everything injected through `SendKeys`, oldest first.
    pub fn sent_keys(&self) -> Vec<String> {
        self.state.borrow().sessions[self.index]
            .screen
            .sent_keys
            .clone()
    }

    pub fn last_sent(&self) -> Option<String> {
        self.state.borrow().sessions[self.index]
            .screen
            .sent_keys
            .last()
            .cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().sessions[self.index].connected
    }

    /// Screen handle bound to this session, as the controller would get it.
    pub fn screen(&self) -> Box<dyn HostScreen> {
        Box::new(ScreenRef {
            state: Rc::clone(&self.state),
            index: self.index,
        })
    }
}

#[derive(Debug)]
struct SessionRef {
    state: Rc<RefCell<HostState>>,
    index: usize,
}

struct ScreenRef {
    state: Rc<RefCell<HostState>>,
    index: usize,
}

impl AutomationHost for ScriptedHost {
    fn version(&self) -> HostResult<String> {
        let state = self.state.borrow();
        if state.fail_enumeration {
            return Err(script_error("version query refused"));
        }
        Ok(state.version.clone())
    }

    fn session_count(&self) -> HostResult<usize> {
        let state = self.state.borrow();
        if state.fail_enumeration {
            return Err(script_error("session collection unavailable"));
        }
        Ok(state.sessions.len())
    }

    fn session_at(&self, index: usize) -> HostResult<Box<dyn HostSession>> {
        let state = self.state.borrow();
        if state.fail_enumeration {
            return Err(script_error("session collection unavailable"));
        }
        if index == 0 || index > state.sessions.len() {
            return Err(script_error("no session at index")
                .with_param(index.to_string()));
        }
        Ok(Box::new(SessionRef {
            state: Rc::clone(&self.state),
            index: index - 1,
        }))
    }

    fn open_session(&self, name: &str) -> HostResult<Box<dyn HostSession>> {
        self.session_named(name)
    }

    fn session_named(&self, key: &str) -> HostResult<Box<dyn HostSession>> {
        let state = self.state.borrow();
        if state.fail_enumeration {
            return Err(script_error("session collection unavailable"));
        }
        match state.sessions.iter().position(|s| s.name == key) {
            Some(index) => Ok(Box::new(SessionRef {
                state: Rc::clone(&self.state),
                index,
            })),
            None => Err(script_error("no session with that name").with_param(key)),
        }
    }
}

impl HostSession for SessionRef {
    fn name(&self) -> HostResult<String> {
        Ok(self.state.borrow().sessions[self.index].name.clone())
    }

    fn connected(&self) -> HostResult<bool> {
        Ok(self.state.borrow().sessions[self.index].connected)
    }

    fn connect(&self) -> HostResult<()> {
        self.state.borrow_mut().sessions[self.index].connected = true;
        Ok(())
    }

    fn wait_for_connect(&self, _timeout_secs: u32) -> HostResult<()> {
        Ok(())
    }

    fn wait_ready(&self, _timeout_ms: u32) -> HostResult<()> {
        Ok(())
    }

    fn screen(&self) -> HostResult<Box<dyn HostScreen>> {
        Ok(Box::new(ScreenRef {
            state: Rc::clone(&self.state),
            index: self.index,
        }))
    }
}

impl HostScreen for ScreenRef {
    fn oia_status(&self) -> HostResult<i32> {
        let mut state = self.state.borrow_mut();
        let screen = &mut state.sessions[self.index].screen;
        if screen.fail_status_reads {
            return Err(script_error("status indicator unavailable"));
        }
        Ok(screen
            .statuses
            .pop_front()
            .unwrap_or(screen.idle_status))
    }

    fn read_block(&self, _row: u32, _col: u32, _rows: u32, _cols: u32) -> HostResult<String> {
        let state = self.state.borrow();
        let screen = &state.sessions[self.index].screen;
        if screen.fail_block_reads {
            return Err(script_error("block read refused"));
        }
        Ok(screen.contents.clone())
    }

    fn send_keys(&self, keys: &str) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        let screen = &mut state.sessions[self.index].screen;
        if screen.fail_send_keys {
            return Err(script_error("keystroke injection refused").with_param(keys));
        }
        screen.sent_keys.push(keys.to_string());
        Ok(())
    }

    fn cursor_position(&self) -> HostResult<(u32, u32)> {
        Ok(self.state.borrow().sessions[self.index].screen.cursor)
    }

    fn move_cursor(&self, row: u32, col: u32) -> HostResult<()> {
        self.state.borrow_mut().sessions[self.index].screen.cursor = (row, col);
        Ok(())
    }
}
