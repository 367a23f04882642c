// Engine Port
// Abstraction over a dynamically loaded database engine library

use std::ffi::CStr;
use std::path::Path;

use thiserror::Error;

use crate::domain::{Lookup, NativeStatus};

/// Outcome of a resolved native call: the call's out-value or its status code
pub type CallResult<T> = std::result::Result<T, NativeStatus>;

/// Engine library loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Dynamic loading is not supported on this platform")]
    Unsupported,

    #[error("Cannot load {path}: {reason}")]
    Unloadable { path: String, reason: String },
}

/// Loads engine libraries
///
/// Implementations:
/// - DynamicEngineLoader: platform dynamic loader (infra-dylib)
/// - MockLoader: scripted engine for tests
pub trait EngineLoader {
    type Library: EngineLibrary;

    /// Load the engine library by path or loader search name
    ///
    /// # Errors
    /// - LoadError::Unsupported if the platform has no dynamic loader
    /// - LoadError::Unloadable if the library cannot be loaded
    fn load(&self, library: &Path) -> Result<Self::Library, LoadError>;
}

/// Flat text result of a get-table call
///
/// Cells are laid out as `columns` header names followed by
/// `rows * columns` values, row-major.
pub trait ResultTable {
    fn rows(&self) -> usize;

    fn columns(&self) -> usize;

    /// Cell at flat position `index`; `None` when out of range or SQL NULL
    fn cell(&self, index: usize) -> Option<String>;
}

/// Entry points of a loaded engine library
///
/// Every call resolves its entry point under the primary name first, then
/// the alternate. `Lookup::Absent` means neither is exported; the call was
/// not made.
///
/// Dropping a `Session` that was not passed to `close` releases it.
/// Dropping a `Table` frees it.
pub trait EngineLibrary {
    type Session;
    type Table: ResultTable;

    /// Open a session on `filename` (e.g. `:memory:`)
    fn open(&self, filename: &CStr) -> Lookup<CallResult<Self::Session>>;

    fn enable_load_extension(
        &self,
        session: &mut Self::Session,
        enabled: bool,
    ) -> Lookup<CallResult<()>>;

    /// Load `extension` with the default entry point, discarding the error message
    fn load_extension(&self, session: &mut Self::Session, extension: &CStr)
        -> Lookup<CallResult<()>>;

    fn get_table(&self, session: &mut Self::Session, sql: &CStr) -> Lookup<CallResult<Self::Table>>;

    fn close(&self, session: Self::Session) -> Lookup<CallResult<()>>;

    /// Most recent engine error message for the session, if the engine exposes one
    fn last_error(&self, session: &Self::Session) -> Option<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::EntryPoint;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// Everything the mock engine saw
    #[derive(Debug, Default)]
    pub struct MockJournal {
        /// Resolved symbol names, in call order
        pub calls: Vec<&'static str>,
        pub sessions_opened: usize,
        pub sessions_released: usize,
        pub tables_freed: usize,
        /// Messages handed out by `last_error`
        pub errors_read: Vec<String>,
        pub extensions: Vec<String>,
        pub queries: Vec<String>,
    }

    /// Scripted engine library
    #[derive(Debug, Clone)]
    pub struct MockEngine {
        absent: HashSet<EntryPoint>,
        alternate_names: bool,
        statuses: HashMap<EntryPoint, NativeStatus>,
        columns: usize,
        cells: Vec<Option<String>>,
        error_message: Option<String>,
        journal: Arc<Mutex<MockJournal>>,
    }

    impl MockEngine {
        /// Engine whose query returns one column holding `version`
        pub fn new(version: impl Into<String>) -> Self {
            Self {
                absent: HashSet::new(),
                alternate_names: false,
                statuses: HashMap::new(),
                columns: 1,
                cells: vec![Some("ogr_version()".to_string()), Some(version.into())],
                error_message: None,
                journal: Arc::new(Mutex::new(MockJournal::default())),
            }
        }

        /// Export entry points only under their alternate names
        pub fn with_alternate_names(mut self) -> Self {
            self.alternate_names = true;
            self
        }

        pub fn without(mut self, entry: EntryPoint) -> Self {
            self.absent.insert(entry);
            self
        }

        pub fn failing(mut self, entry: EntryPoint, code: NativeStatus) -> Self {
            self.statuses.insert(entry, code);
            self
        }

        pub fn with_table(mut self, columns: usize, cells: Vec<Option<String>>) -> Self {
            self.columns = columns;
            self.cells = cells;
            self
        }

        pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
            self.error_message = Some(message.into());
            self
        }

        pub fn journal(&self) -> Arc<Mutex<MockJournal>> {
            self.journal.clone()
        }

        fn resolve(&self, entry: EntryPoint) -> Option<&'static str> {
            if self.absent.contains(&entry) {
                return None;
            }
            let pair = entry.symbols();
            Some(if self.alternate_names {
                pair.alternate
            } else {
                pair.primary
            })
        }

        fn call<T>(&self, entry: EntryPoint, ok: impl FnOnce() -> T) -> Lookup<CallResult<T>> {
            let Some(symbol) = self.resolve(entry) else {
                return Lookup::Absent(entry);
            };
            self.journal.lock().unwrap().calls.push(symbol);

            let value = match self.statuses.get(&entry) {
                Some(code) => Err(*code),
                None => Ok(ok()),
            };
            Lookup::Present { symbol, value }
        }
    }

    /// Session handed out by the mock engine
    #[derive(Debug)]
    pub struct MockSession {
        journal: Arc<Mutex<MockJournal>>,
        released: bool,
    }

    impl Drop for MockSession {
        fn drop(&mut self) {
            if !self.released {
                self.journal.lock().unwrap().sessions_released += 1;
            }
        }
    }

    /// Table handed out by the mock engine
    #[derive(Debug)]
    pub struct MockTable {
        columns: usize,
        cells: Vec<Option<String>>,
        journal: Arc<Mutex<MockJournal>>,
    }

    impl ResultTable for MockTable {
        fn rows(&self) -> usize {
            if self.columns == 0 {
                return 0;
            }
            (self.cells.len() / self.columns).saturating_sub(1)
        }

        fn columns(&self) -> usize {
            self.columns
        }

        fn cell(&self, index: usize) -> Option<String> {
            self.cells.get(index).cloned().flatten()
        }
    }

    impl Drop for MockTable {
        fn drop(&mut self) {
            self.journal.lock().unwrap().tables_freed += 1;
        }
    }

    impl EngineLibrary for MockEngine {
        type Session = MockSession;
        type Table = MockTable;

        fn open(&self, _filename: &CStr) -> Lookup<CallResult<MockSession>> {
            self.call(EntryPoint::Open, || {
                self.journal.lock().unwrap().sessions_opened += 1;
                MockSession {
                    journal: self.journal.clone(),
                    released: false,
                }
            })
        }

        fn enable_load_extension(
            &self,
            _session: &mut MockSession,
            _enabled: bool,
        ) -> Lookup<CallResult<()>> {
            self.call(EntryPoint::EnableLoadExtension, || ())
        }

        fn load_extension(
            &self,
            _session: &mut MockSession,
            extension: &CStr,
        ) -> Lookup<CallResult<()>> {
            self.journal
                .lock()
                .unwrap()
                .extensions
                .push(extension.to_string_lossy().into_owned());
            self.call(EntryPoint::LoadExtension, || ())
        }

        fn get_table(&self, _session: &mut MockSession, sql: &CStr) -> Lookup<CallResult<MockTable>> {
            self.journal
                .lock()
                .unwrap()
                .queries
                .push(sql.to_string_lossy().into_owned());
            self.call(EntryPoint::GetTable, || MockTable {
                columns: self.columns,
                cells: self.cells.clone(),
                journal: self.journal.clone(),
            })
        }

        fn close(&self, mut session: MockSession) -> Lookup<CallResult<()>> {
            let lookup = self.call(EntryPoint::Close, || ());
            if lookup.is_present() {
                session.released = true;
                self.journal.lock().unwrap().sessions_released += 1;
            }
            lookup
        }

        fn last_error(&self, _session: &MockSession) -> Option<String> {
            self.resolve(EntryPoint::ErrMsg)?;
            let message = self.error_message.clone()?;
            self.journal
                .lock()
                .unwrap()
                .errors_read
                .push(message.clone());
            Some(message)
        }
    }

    /// What the mock loader hands back
    #[derive(Debug, Clone)]
    enum LoaderScript {
        Engine(MockEngine),
        Unloadable,
        Unsupported,
    }

    /// Loader returning a scripted engine (or refusing to)
    pub struct MockLoader {
        script: LoaderScript,
    }

    impl MockLoader {
        pub fn new(engine: MockEngine) -> Self {
            Self {
                script: LoaderScript::Engine(engine),
            }
        }

        pub fn unloadable() -> Self {
            Self {
                script: LoaderScript::Unloadable,
            }
        }

        pub fn unsupported() -> Self {
            Self {
                script: LoaderScript::Unsupported,
            }
        }
    }

    impl EngineLoader for MockLoader {
        type Library = MockEngine;

        fn load(&self, library: &Path) -> Result<MockEngine, LoadError> {
            match &self.script {
                LoaderScript::Engine(engine) => Ok(engine.clone()),
                LoaderScript::Unloadable => Err(LoadError::Unloadable {
                    path: library.display().to_string(),
                    reason: "cannot open shared object file".to_string(),
                }),
                LoaderScript::Unsupported => Err(LoadError::Unsupported),
            }
        }
    }
}
