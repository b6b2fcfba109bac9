//! Screen geometry and the fixed-extent screen reader
//!
//! Every read re-fetches the full buffer from the host; nothing is cached.
//! The extent is an explicit configuration value, never introspected from
//! the session's declared geometry: legacy automation flows assume a fixed
//! 32x80 block read even on sessions that report another size, and the
//! defaults keep that behavior.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TerminalError, TerminalResult};
use crate::host::HostScreen;
use crate::poller::ReadinessPoller;

/// Screen extent requested from the host on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub rows: usize,
    pub cols: usize,
}

impl ScreenGeometry {
    pub const DEFAULT_ROWS: usize = 32;
    pub const DEFAULT_COLS: usize = 80;

    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Total characters in one full-screen read.
    pub fn area(&self) -> usize {
        self.rows * self.cols
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            rows: Self::DEFAULT_ROWS,
            cols: Self::DEFAULT_COLS,
        }
    }
}

/// Contents of one screen read.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenContent {
    /// The raw fixed-length buffer, exactly rows*cols characters.
    Raw(String),
    /// Right-trimmed rows, top to bottom.
    Rows(Vec<String>),
}

impl ScreenContent {
    /// True when any row (or the raw buffer) contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            ScreenContent::Raw(text) => text.contains(needle),
            ScreenContent::Rows(rows) => rows.iter().any(|row| row.contains(needle)),
        }
    }

    pub fn rows(&self) -> Option<&[String]> {
        match self {
            ScreenContent::Rows(rows) => Some(rows),
            ScreenContent::Raw(_) => None,
        }
    }

    /// Flatten to displayable text, rows joined with newlines.
    pub fn into_text(self) -> String {
        match self {
            ScreenContent::Raw(text) => text,
            ScreenContent::Rows(rows) => rows.join("\n"),
        }
    }
}

/// On-demand reader of the host screen buffer.
#[derive(Debug, Clone, Default)]
pub struct ScreenReader {
    geometry: ScreenGeometry,
}

impl ScreenReader {
    pub fn new(geometry: ScreenGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    /// Fetch the screen buffer and reformat it.
    ///
    /// Gates on readiness first; a busy terminal surfaces as the poller's
    /// busy error before any read is attempted. Host failures during the
    /// read itself are command errors.
    pub fn read(
        &self,
        screen: &dyn HostScreen,
        poller: &ReadinessPoller,
        timeout: Duration,
        strip_whitespace: bool,
    ) -> TerminalResult<ScreenContent> {
        poller.wait_for_ready(screen, timeout)?;

        let block = screen
            .read_block(
                0,
                0,
                self.geometry.rows as u32,
                self.geometry.cols as u32,
            )
            .map_err(|e| e.into_details(TerminalError::command("Read screen failed")))?;
        let buffer = fit(&block, self.geometry);

        if strip_whitespace {
            let chars: Vec<char> = buffer.chars().collect();
            let rows = chars
                .chunks(self.geometry.cols.max(1))
                .map(|row| {
                    row.iter()
                        .collect::<String>()
                        .trim_end()
                        .to_string()
                })
                .collect();
            Ok(ScreenContent::Rows(rows))
        } else {
            Ok(ScreenContent::Raw(buffer))
        }
    }
}

// Truncate or pad with spaces to exactly rows*cols characters. Counted in
// characters, not bytes: truncation must never split a code point.
fn fit(block: &str, geometry: ScreenGeometry) -> String {
    let area = geometry.area();
    let mut out: String = block.chars().take(area).collect();
    let have = out.chars().count();
    if have < area {
        out.extend(std::iter::repeat(' ').take(area - have));
    }
    out
}
