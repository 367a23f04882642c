// Targets without a dynamic loader: every load reports the capability as absent

use std::ffi::CStr;
use std::path::Path;

use tracing::debug;

use extprobe_core::domain::Lookup;
use extprobe_core::port::{CallResult, EngineLibrary, EngineLoader, LoadError, ResultTable};

#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicEngineLoader;

/// Never constructed on this target
pub enum DynamicEngine {}

pub enum Session {}

pub enum Table {}

impl EngineLoader for DynamicEngineLoader {
    type Library = DynamicEngine;

    fn load(&self, library: &Path) -> Result<DynamicEngine, LoadError> {
        debug!(library = %library.display(), "No dynamic loader on this target");
        Err(LoadError::Unsupported)
    }
}

impl ResultTable for Table {
    fn rows(&self) -> usize {
        match *self {}
    }

    fn columns(&self) -> usize {
        match *self {}
    }

    fn cell(&self, _index: usize) -> Option<String> {
        match *self {}
    }
}

impl EngineLibrary for DynamicEngine {
    type Session = Session;
    type Table = Table;

    fn open(&self, _filename: &CStr) -> Lookup<CallResult<Session>> {
        match *self {}
    }

    fn enable_load_extension(&self, _session: &mut Session, _enabled: bool) -> Lookup<CallResult<()>> {
        match *self {}
    }

    fn load_extension(&self, _session: &mut Session, _extension: &CStr) -> Lookup<CallResult<()>> {
        match *self {}
    }

    fn get_table(&self, _session: &mut Session, _sql: &CStr) -> Lookup<CallResult<Table>> {
        match *self {}
    }

    fn close(&self, session: Session) -> Lookup<CallResult<()>> {
        match session {}
    }

    fn last_error(&self, _session: &Session) -> Option<String> {
        match *self {}
    }
}
