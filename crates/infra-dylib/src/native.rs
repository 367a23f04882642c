// Dynamic engine implementation
// reason: libloading for cross-platform dlopen/LoadLibrary

use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use libloading::Library;
use tracing::{debug, warn};

use extprobe_core::domain::{EntryPoint, Lookup};
use extprobe_core::port::{CallResult, EngineLibrary, EngineLoader, LoadError, ResultTable};

use crate::ffi::{
    CloseFn, EnableLoadExtensionFn, ErrMsgFn, FreeTableFn, GetTableFn, LoadExtensionFn, OpenFn,
    Sqlite3, SQLITE_NOMEM, SQLITE_OK,
};

/// Loads engine libraries through the platform dynamic loader
///
/// The library argument is handed to the loader unchanged, so both paths
/// and bare names resolved through the loader search path work.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicEngineLoader;

impl EngineLoader for DynamicEngineLoader {
    type Library = DynamicEngine;

    fn load(&self, library: &Path) -> Result<DynamicEngine, LoadError> {
        // SAFETY: loading runs the library's initialisers; the caller names
        // the engine library it wants probed.
        let handle = unsafe { Library::new(library.as_os_str()) }.map_err(|e| {
            LoadError::Unloadable {
                path: library.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(library = %library.display(), "Engine library opened");

        Ok(DynamicEngine {
            library: Arc::new(handle),
        })
    }
}

/// A loaded engine library
///
/// Sessions and tables keep the library mapped until they are dropped.
pub struct DynamicEngine {
    library: Arc<Library>,
}

impl DynamicEngine {
    /// Resolve `entry` under its primary name, then its alternate
    ///
    /// # Safety
    /// `T` must match the C prototype of `entry`.
    unsafe fn lookup<T: Copy>(&self, entry: EntryPoint) -> Lookup<T> {
        for symbol in entry.symbols().candidates() {
            if let Ok(resolved) = self.library.get::<T>(symbol.as_bytes()) {
                debug!(symbol, "Entry point resolved");
                return Lookup::Present {
                    symbol,
                    value: *resolved,
                };
            }
        }
        Lookup::Absent(entry)
    }

    /// Name under which `entry` is exported, if any
    pub fn exports(&self, entry: EntryPoint) -> Option<&'static str> {
        // SAFETY: the address is only inspected, never called
        unsafe { self.lookup::<*const c_void>(entry) }.symbol()
    }
}

fn status(code: c_int) -> CallResult<()> {
    if code == SQLITE_OK {
        Ok(())
    } else {
        Err(code)
    }
}

impl EngineLibrary for DynamicEngine {
    type Session = Session;
    type Table = Table;

    fn open(&self, filename: &CStr) -> Lookup<CallResult<Session>> {
        // SAFETY: prototypes match sqlite3_open / sqlite3_close
        let open = unsafe { self.lookup::<OpenFn>(EntryPoint::Open) };
        let close = unsafe { self.lookup::<CloseFn>(EntryPoint::Close) }.into_option();

        open.map(|open| {
            let mut db: *mut Sqlite3 = ptr::null_mut();
            // SAFETY: filename is NUL-terminated and db is a valid out-pointer
            let code = unsafe { open(filename.as_ptr(), &mut db) };

            let session = NonNull::new(db).map(|raw| Session {
                raw,
                close,
                _library: self.library.clone(),
            });

            if code != SQLITE_OK {
                // A handle returned with an error still has to be closed
                drop(session);
                return Err(code);
            }
            session.ok_or(SQLITE_NOMEM)
        })
    }

    fn enable_load_extension(
        &self,
        session: &mut Session,
        enabled: bool,
    ) -> Lookup<CallResult<()>> {
        // SAFETY: prototype matches sqlite3_enable_load_extension
        let enable = unsafe { self.lookup::<EnableLoadExtensionFn>(EntryPoint::EnableLoadExtension) };

        enable.map(|enable| {
            // SAFETY: session holds an open connection
            status(unsafe { enable(session.as_ptr(), c_int::from(enabled)) })
        })
    }

    fn load_extension(&self, session: &mut Session, extension: &CStr) -> Lookup<CallResult<()>> {
        // SAFETY: prototype matches sqlite3_load_extension
        let load = unsafe { self.lookup::<LoadExtensionFn>(EntryPoint::LoadExtension) };

        load.map(|load| {
            // SAFETY: open connection, NUL-terminated path; entry point and
            // error message out-pointer may be null
            status(unsafe {
                load(
                    session.as_ptr(),
                    extension.as_ptr(),
                    ptr::null(),
                    ptr::null_mut(),
                )
            })
        })
    }

    fn get_table(&self, session: &mut Session, sql: &CStr) -> Lookup<CallResult<Table>> {
        // SAFETY: prototypes match sqlite3_get_table / sqlite3_free_table
        let get_table = unsafe { self.lookup::<GetTableFn>(EntryPoint::GetTable) };
        let free = unsafe { self.lookup::<FreeTableFn>(EntryPoint::FreeTable) }.into_option();

        get_table.map(|get_table| {
            let mut result: *mut *mut c_char = ptr::null_mut();
            let mut rows: c_int = 0;
            let mut columns: c_int = 0;

            // SAFETY: open connection, NUL-terminated SQL, valid out-pointers;
            // the error message out-pointer may be null
            let code = unsafe {
                get_table(
                    session.as_ptr(),
                    sql.as_ptr(),
                    &mut result,
                    &mut rows,
                    &mut columns,
                    ptr::null_mut(),
                )
            };

            let table = Table {
                raw: result,
                rows: usize::try_from(rows).unwrap_or(0),
                columns: usize::try_from(columns).unwrap_or(0),
                free,
                _library: self.library.clone(),
            };

            if code != SQLITE_OK {
                drop(table);
                return Err(code);
            }
            Ok(table)
        })
    }

    fn close(&self, session: Session) -> Lookup<CallResult<()>> {
        // SAFETY: prototype matches sqlite3_close
        let close = unsafe { self.lookup::<CloseFn>(EntryPoint::Close) };

        close.map(move |close| {
            let raw = session.into_raw();
            // SAFETY: raw is an open connection that nothing else will close
            status(unsafe { close(raw) })
        })
    }

    fn last_error(&self, session: &Session) -> Option<String> {
        // SAFETY: prototype matches sqlite3_errmsg
        let errmsg = unsafe { self.lookup::<ErrMsgFn>(EntryPoint::ErrMsg) }.into_option()?;

        // SAFETY: open connection; the message is owned by the engine and
        // copied before any other call on the session
        let message = unsafe { errmsg(session.as_ptr()) };
        if message.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned())
    }
}

/// An open engine connection
///
/// Closed on drop unless handed to `EngineLibrary::close`.
pub struct Session {
    raw: NonNull<Sqlite3>,
    close: Option<CloseFn>,
    _library: Arc<Library>,
}

impl Session {
    fn as_ptr(&self) -> *mut Sqlite3 {
        self.raw.as_ptr()
    }

    /// Take the handle out; the caller becomes responsible for closing it
    fn into_raw(mut self) -> *mut Sqlite3 {
        self.close = None;
        self.raw.as_ptr()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(close) = self.close.take() {
            // SAFETY: the handle came from a successful open and was not closed
            let code = unsafe { close(self.raw.as_ptr()) };
            debug!(code, "Session released on drop");
        }
    }
}

/// Result of `sqlite3_get_table`, freed on drop
pub struct Table {
    raw: *mut *mut c_char,
    rows: usize,
    columns: usize,
    free: Option<FreeTableFn>,
    _library: Arc<Library>,
}

impl ResultTable for Table {
    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn cell(&self, index: usize) -> Option<String> {
        let len = (self.rows + 1) * self.columns;
        if self.raw.is_null() || index >= len {
            return None;
        }

        // SAFETY: the engine allocated (rows + 1) * columns entries
        let cell = unsafe { *self.raw.add(index) };
        if cell.is_null() {
            return None;
        }
        // SAFETY: non-null entries are NUL-terminated strings owned by the table
        Some(unsafe { CStr::from_ptr(cell) }.to_string_lossy().into_owned())
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        match self.free {
            // SAFETY: raw came from get_table and is freed exactly once
            Some(free) => unsafe { free(self.raw) },
            None => warn!("No free_table entry point; result table leaked"),
        }
    }
}
