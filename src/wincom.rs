//! COM-backed host automation (Windows, feature `wincom`)
//!
//! Late-bound `IDispatch` driving of the emulator automation objects. The
//! vendor object models differ in shape but not in mechanics: every
//! property walk and method call goes through `GetIDsOfNames` + `Invoke`.
//! COM failures surface as [`HostCallError`] with the HRESULT in `code` and
//! the `EXCEPINFO` description/source preserved when the server filled one
//! in.

use windows::core::{BSTR, GUID, HSTRING, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, CoInitializeEx, CoUninitialize, IDispatch, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPPARAMS,
    EXCEPINFO,
};

use crate::host::{AutomationHost, HostCallError, HostResult, HostScreen, HostSession};

const LOCALE_USER_DEFAULT: u32 = 0x0400;

// GetStringEx wait argument, as the vendor documentation's block-read
// examples pass it
const GETSTRING_WAIT: i32 = 120;

/// Enter a single-threaded apartment on the calling thread.
///
/// `S_FALSE` (already initialized) counts as success; the refcount pairing
/// lives in `runtime::ApartmentGuard`.
pub(crate) fn initialize_apartment() -> HostResult<()> {
    let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
    if hr.is_ok() {
        Ok(())
    } else {
        Err(HostCallError::new(hr.0, "CoInitializeEx failed"))
    }
}

pub(crate) fn uninitialize_apartment() -> HostResult<()> {
    unsafe { CoUninitialize() };
    Ok(())
}

fn com_error(context: &str, error: &windows::core::Error) -> HostCallError {
    HostCallError::new(error.code().0, format!("{context}: {}", error.message()))
}

/// Thin wrapper over one `IDispatch` pointer.
#[derive(Clone)]
struct Dispatch(IDispatch);

impl Dispatch {
    fn from_prog_id(prog_id: &str) -> HostResult<Self> {
        let wide = HSTRING::from(prog_id);
        let clsid: GUID =
            unsafe { CLSIDFromProgID(&wide) }.map_err(|e| com_error(prog_id, &e))?;
        let dispatch: IDispatch = unsafe { CoCreateInstance(&clsid, None, CLSCTX_ALL) }
            .map_err(|e| com_error(prog_id, &e).with_param(prog_id))?;
        Ok(Self(dispatch))
    }

    fn dispid(&self, name: &str) -> HostResult<i32> {
        let wide = HSTRING::from(name);
        let names = [PCWSTR(wide.as_ptr())];
        let mut dispid = 0i32;
        unsafe {
            self.0.GetIDsOfNames(
                &GUID::zeroed(),
                names.as_ptr(),
                1,
                LOCALE_USER_DEFAULT,
                &mut dispid,
            )
        }
        .map_err(|e| com_error(name, &e).with_param(name))?;
        Ok(dispid)
    }

    fn invoke(
        &self,
        name: &str,
        flags: DISPATCH_FLAGS,
        args: &[VARIANT],
    ) -> HostResult<VARIANT> {
        let dispid = self.dispid(name)?;
        // IDispatch argument order is right to left
        let mut reversed: Vec<VARIANT> = args.iter().rev().cloned().collect();
        let params = DISPPARAMS {
            rgvarg: reversed.as_mut_ptr(),
            rgdispidNamedArgs: std::ptr::null_mut(),
            cArgs: reversed.len() as u32,
            cNamedArgs: 0,
        };
        let mut result = VARIANT::default();
        let mut excepinfo = EXCEPINFO::default();
        let invoked = unsafe {
            self.0.Invoke(
                dispid,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                Some(&mut result),
                Some(&mut excepinfo),
                None,
            )
        };
        invoked.map_err(|e| {
            let description = excepinfo.bstrDescription.to_string();
            let source = excepinfo.bstrSource.to_string();
            let message = if description.is_empty() {
                e.message().to_string()
            } else {
                description
            };
            let mut error = HostCallError::new(e.code().0, format!("{name}: {message}"));
            if !source.is_empty() {
                error = error.with_source(source);
            }
            error.with_param(name)
        })?;
        Ok(result)
    }

    fn call(&self, name: &str, args: &[VARIANT]) -> HostResult<VARIANT> {
        self.invoke(name, DISPATCH_METHOD, args)
    }

    fn get(&self, name: &str) -> HostResult<VARIANT> {
        self.invoke(name, DISPATCH_PROPERTYGET, &[])
    }

    // Indexed property access; collections accept either dispatch style.
    fn get_indexed(&self, name: &str, args: &[VARIANT]) -> HostResult<VARIANT> {
        self.invoke(
            name,
            DISPATCH_FLAGS(DISPATCH_METHOD.0 | DISPATCH_PROPERTYGET.0),
            args,
        )
    }

    fn get_string(&self, name: &str) -> HostResult<String> {
        let value = self.get(name)?;
        to_string(name, &value)
    }

    fn get_i32(&self, name: &str) -> HostResult<i32> {
        let value = self.get(name)?;
        to_i32(name, &value)
    }

    fn get_bool(&self, name: &str) -> HostResult<bool> {
        self.get_i32(name).map(|value| value != 0)
    }

    fn get_dispatch(&self, name: &str) -> HostResult<Dispatch> {
        let value = self.get(name)?;
        to_dispatch(name, &value)
    }
}

fn to_string(context: &str, value: &VARIANT) -> HostResult<String> {
    BSTR::try_from(value)
        .map(|text| text.to_string())
        .map_err(|e| com_error(context, &e))
}

fn to_i32(context: &str, value: &VARIANT) -> HostResult<i32> {
    i32::try_from(value).map_err(|e| com_error(context, &e))
}

fn to_dispatch(context: &str, value: &VARIANT) -> HostResult<Dispatch> {
    IDispatch::try_from(value)
        .map(Dispatch)
        .map_err(|e| com_error(context, &e))
}

fn string_arg(value: &str) -> VARIANT {
    VARIANT::from(BSTR::from(value))
}

/// COM automation object of one emulator vendor.
pub struct ComAutomationHost {
    app: Dispatch,
}

impl ComAutomationHost {
    /// Dispatch the vendor automation object by ProgID.
    pub fn create(prog_id: &str) -> HostResult<Self> {
        Ok(Self {
            app: Dispatch::from_prog_id(prog_id)?,
        })
    }
}

impl AutomationHost for ComAutomationHost {
    fn version(&self) -> HostResult<String> {
        self.app.get_string("Version")
    }

    fn session_count(&self) -> HostResult<usize> {
        let sessions = self.app.get_dispatch("Sessions")?;
        let count = sessions.get_i32("Count")?;
        Ok(count.max(0) as usize)
    }

    fn session_at(&self, index: usize) -> HostResult<Box<dyn HostSession>> {
        let sessions = self.app.get_dispatch("Sessions")?;
        let value = sessions.get_indexed("Item", &[VARIANT::from(index as i32)])?;
        Ok(Box::new(ComSession {
            session: to_dispatch("Sessions.Item", &value)?,
        }))
    }

    fn open_session(&self, name: &str) -> HostResult<Box<dyn HostSession>> {
        let value = self.app.call("OpenSession", &[string_arg(name)])?;
        Ok(Box::new(ComSession {
            session: to_dispatch("OpenSession", &value)?,
        }))
    }

    fn session_named(&self, key: &str) -> HostResult<Box<dyn HostSession>> {
        let sessions = self.app.get_dispatch("Sessions")?;
        let value = sessions.get_indexed("Item", &[string_arg(key)])?;
        Ok(Box::new(ComSession {
            session: to_dispatch("Sessions.Item", &value)?,
        }))
    }
}

struct ComSession {
    session: Dispatch,
}

impl std::fmt::Debug for ComSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComSession").finish_non_exhaustive()
    }
}

impl HostSession for ComSession {
    fn name(&self) -> HostResult<String> {
        self.session.get_string("Name")
    }

    fn connected(&self) -> HostResult<bool> {
        self.session.get_bool("Connected")
    }

    fn connect(&self) -> HostResult<()> {
        self.session.call("Connect", &[]).map(|_| ())
    }

    fn wait_for_connect(&self, timeout_secs: u32) -> HostResult<()> {
        self.session
            .call("WaitForConnect", &[VARIANT::from(timeout_secs as i32)])
            .map(|_| ())
    }

    fn wait_ready(&self, timeout_ms: u32) -> HostResult<()> {
        self.session
            .call("WaitReady", &[VARIANT::from(timeout_ms as i32)])
            .map(|_| ())
    }

    fn screen(&self) -> HostResult<Box<dyn HostScreen>> {
        Ok(Box::new(ComScreen {
            screen: self.session.get_dispatch("Screen")?,
        }))
    }
}

struct ComScreen {
    screen: Dispatch,
}

impl HostScreen for ComScreen {
    fn oia_status(&self) -> HostResult<i32> {
        let oia = self.screen.get_dispatch("OIA")?;
        oia.get_i32("XStatus")
    }

    fn read_block(&self, row: u32, col: u32, rows: u32, cols: u32) -> HostResult<String> {
        let args = [
            VARIANT::from(row as i32),
            VARIANT::from(col as i32),
            VARIANT::from(rows as i32),
            VARIANT::from(cols as i32),
            VARIANT::from(GETSTRING_WAIT),
            VARIANT::from(0i32),
            VARIANT::from(0i32),
            VARIANT::from(0i32),
        ];
        let value = self.screen.call("GetStringEx", &args)?;
        to_string("GetStringEx", &value)
    }

    fn send_keys(&self, keys: &str) -> HostResult<()> {
        self.screen
            .call("SendKeys", &[string_arg(keys)])
            .map(|_| ())
    }

    fn cursor_position(&self) -> HostResult<(u32, u32)> {
        let row = self.screen.get_i32("Row")?;
        let col = self.screen.get_i32("Col")?;
        Ok((row.max(0) as u32, col.max(0) as u32))
    }

    fn move_cursor(&self, row: u32, col: u32) -> HostResult<()> {
        self.screen
            .call("MoveTo", &[VARIANT::from(row as i32), VARIANT::from(col as i32)])
            .map(|_| ())
    }
}
