//! Session configuration
//!
//! Defaults match what the legacy automation flows assume; everything is
//! an explicit value so a deployment can override the screen extent or the
//! polling cadence without touching code. Persisted as JSON under the
//! platform config directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::screen::ScreenGeometry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed extent requested on every screen read.
    pub geometry: ScreenGeometry,
    /// OIA value the host reports while input is inhibited.
    pub busy_sentinel: i32,
    /// Pause between consecutive OIA reads, milliseconds.
    pub poll_interval_ms: u64,
    /// Readiness budget gating sends and reads, seconds.
    pub ready_timeout_secs: u64,
    /// HIS `WaitForConnect` handshake budget. The vendor call takes seconds.
    pub connect_wait_secs: u32,
    /// NetManage `WaitReady` handshake budget. The vendor call takes
    /// milliseconds; keep separate from `connect_wait_secs`.
    pub connect_wait_ms: u32,
    /// Default screen re-read cadence for `wait_for_text`, milliseconds.
    pub text_poll_interval_ms: u64,
    /// Default `wait_for_text` budget, seconds.
    pub text_timeout_secs: u64,
    /// Cap on accumulated busy observations before `wait_for_text` gives
    /// up. 10000 is a millisecond budget reused as a bare count; kept
    /// as-is for compatibility (see DESIGN.md).
    pub busy_poll_limit: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            geometry: ScreenGeometry::default(),
            busy_sentinel: 5,
            poll_interval_ms: 100,
            ready_timeout_secs: 30,
            connect_wait_secs: 30,
            connect_wait_ms: 30_000,
            text_poll_interval_ms: 500,
            text_timeout_secs: 30,
            busy_poll_limit: 10_000,
        }
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn text_poll_interval(&self) -> Duration {
        Duration::from_millis(self.text_poll_interval_ms)
    }

    pub fn text_timeout(&self) -> Duration {
        Duration::from_secs(self.text_timeout_secs)
    }

    /// Default location: `<config dir>/tnpilot/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tnpilot")
            .join("config.json")
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
