//! Process-wide automation runtime initialization
//!
//! The platform automation subsystem (the COM apartment on Windows) must be
//! initialized once per thread of use and torn down when the scope that
//! acquired it exits. [`ApartmentGuard`] pairs the two with a per-thread
//! reference count; releasing a guard twice is tolerated and only logged.

use std::cell::Cell;

use crate::error::TerminalResult;

thread_local! {
    static APARTMENT_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// RAII handle for one acquisition of the automation runtime on the current
/// thread. The last guard on a thread tears the runtime down.
#[derive(Debug)]
pub struct ApartmentGuard {
    released: Cell<bool>,
}

impl ApartmentGuard {
    /// Initialize the automation runtime for this thread, or bump the
    /// reference count when it is already initialized.
    pub fn acquire() -> TerminalResult<Self> {
        APARTMENT_DEPTH.with(|depth| {
            if depth.get() == 0 {
                platform_init()?;
            }
            depth.set(depth.get() + 1);
            Ok(ApartmentGuard {
                released: Cell::new(false),
            })
        })
    }

    /// Release this acquisition. Idempotent: only the first call decrements
    /// the thread reference count.
    pub fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        APARTMENT_DEPTH.with(|depth| match depth.get() {
            0 => log::warn!("automation runtime released more times than acquired"),
            1 => {
                depth.set(0);
                platform_teardown();
            }
            n => depth.set(n - 1),
        });
    }
}

impl Drop for ApartmentGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(all(windows, feature = "wincom"))]
fn platform_init() -> TerminalResult<()> {
    crate::wincom::initialize_apartment().map_err(|e| {
        e.into_details(crate::error::TerminalError::connection(
            "Failed to initialize automation runtime",
        ))
    })
}

#[cfg(not(all(windows, feature = "wincom")))]
fn platform_init() -> TerminalResult<()> {
    Ok(())
}

#[cfg(all(windows, feature = "wincom"))]
fn platform_teardown() {
    if let Err(e) = crate::wincom::uninitialize_apartment() {
        log::warn!("automation runtime teardown failed: {e}");
    }
}

#[cfg(not(all(windows, feature = "wincom")))]
fn platform_teardown() {}
