/// Error taxonomy shared by every operation: four kinds, stable codes,
/// ordered detail maps
pub mod error;

/// Host automation seam: traits over the emulator vendor's object model
pub mod host;

pub mod command;
pub mod config;
pub mod locator;
pub mod poller;
pub mod runtime;
pub mod screen;
pub mod session;

/// Scripted host implementation for tests and offline playback
pub mod scripted;

/// COM late-bound backend for the host seam
#[cfg(all(windows, feature = "wincom"))]
pub mod wincom;

pub use error::{ErrorKind, TerminalError, TerminalResult};
pub use host::TerminalKind;
pub use locator::SessionInfo;
pub use screen::{ScreenContent, ScreenGeometry};
pub use session::{SystemStatus, TerminalSession};
