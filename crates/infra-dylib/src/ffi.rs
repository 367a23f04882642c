//! C prototypes of the engine entry points, resolved at runtime.

use std::os::raw::{c_char, c_int};

/// Opaque `sqlite3` connection object
#[repr(C)]
pub struct Sqlite3 {
    _private: [u8; 0],
}

/// `SQLITE_OK`
pub const SQLITE_OK: c_int = 0;

/// `SQLITE_NOMEM`, reported when open yields no handle
pub const SQLITE_NOMEM: c_int = 7;

pub type OpenFn = unsafe extern "C" fn(filename: *const c_char, db: *mut *mut Sqlite3) -> c_int;

pub type EnableLoadExtensionFn = unsafe extern "C" fn(db: *mut Sqlite3, onoff: c_int) -> c_int;

pub type LoadExtensionFn = unsafe extern "C" fn(
    db: *mut Sqlite3,
    file: *const c_char,
    entry_point: *const c_char,
    err_msg: *mut *mut c_char,
) -> c_int;

pub type GetTableFn = unsafe extern "C" fn(
    db: *mut Sqlite3,
    sql: *const c_char,
    result: *mut *mut *mut c_char,
    n_row: *mut c_int,
    n_column: *mut c_int,
    err_msg: *mut *mut c_char,
) -> c_int;

pub type FreeTableFn = unsafe extern "C" fn(result: *mut *mut c_char);

pub type CloseFn = unsafe extern "C" fn(db: *mut Sqlite3) -> c_int;

pub type ErrMsgFn = unsafe extern "C" fn(db: *mut Sqlite3) -> *const c_char;
