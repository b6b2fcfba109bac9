//! Readiness polling over the OIA status indicator
//!
//! The host reports a sentinel value while the remote application is still
//! processing input; keystrokes must be withheld until the flag clears. The
//! budget is wall-clock and cooperative: it is checked between status reads,
//! never mid-call.

use std::time::{Duration, Instant};

use crate::error::{TerminalError, TerminalResult};
use crate::host::HostScreen;

/// OIA value the host reports while input is inhibited.
pub const BUSY_SENTINEL: i32 = 5;

/// Pause between consecutive status reads.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    busy_sentinel: i32,
    poll_interval: Duration,
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self {
            busy_sentinel: BUSY_SENTINEL,
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl ReadinessPoller {
    pub fn new(busy_sentinel: i32, poll_interval: Duration) -> Self {
        Self {
            busy_sentinel,
            poll_interval,
        }
    }

    /// Block until the status flag leaves the busy sentinel.
    ///
    /// Returns `Ok(true)` on the first non-busy observation. A timeout is a
    /// busy error carrying the budget and the last observed status. A status
    /// read that itself fails is reported as a busy condition too, never as
    /// a connection fault: the terminal could not prove it was ready.
    pub fn wait_for_ready(
        &self,
        screen: &dyn HostScreen,
        timeout: Duration,
    ) -> TerminalResult<bool> {
        let start = Instant::now();
        let mut last_status = None;
        while start.elapsed() < timeout {
            match screen.oia_status() {
                Ok(status) if status != self.busy_sentinel => return Ok(true),
                Ok(status) => last_status = Some(status),
                Err(e) => {
                    return Err(TerminalError::busy("Failed to check terminal status")
                        .with_detail("error", e)
                        .with_detail(
                            "elapsed",
                            format!("{:.3}s", start.elapsed().as_secs_f64()),
                        ));
                }
            }
            std::thread::sleep(self.poll_interval);
        }

        // one final best-effort read so the error reports what the host
        // said last
        let last = screen.oia_status().ok().or(last_status);
        Err(TerminalError::busy("Terminal busy timeout")
            .with_detail("timeout", format!("{}s", timeout.as_secs_f64()))
            .with_detail(
                "last_status",
                last.map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            ))
    }
}
