// Extension Load Probe
// open -> enable extensions -> load extension -> query -> close, in that order

use std::ffi::CString;
use std::io::Write;

use tracing::{debug, error, info, warn};

use super::constants::{DEFAULT_QUERY, IN_MEMORY_DATABASE, VERSION_CELL};
use crate::domain::{EntryPoint, Failure, Lookup, NativeStatus, ProbeOutcome, ProbeRequest, SkipReason};
use crate::error::{AppError, Result};
use crate::port::{EngineLibrary, EngineLoader, LoadError, ResultTable};

/// Probe configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Database the session is opened on
    pub database: String,
    /// Diagnostic query whose first value is reported
    pub query: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            database: IN_MEMORY_DATABASE.to_string(),
            query: DEFAULT_QUERY.to_string(),
        }
    }
}

/// Checks that an extension library loads into a session of an engine library
///
/// Native status codes become a `ProbeOutcome`; only harness problems
/// (stdout write errors, NUL bytes in configuration) are `Err`.
pub struct ExtensionProbe<L: EngineLoader> {
    loader: L,
    config: ProbeConfig,
}

impl<L: EngineLoader> ExtensionProbe<L> {
    /// Create a new probe
    ///
    /// # Example
    /// ```text
    /// let probe = ExtensionProbe::new(DynamicEngineLoader, ProbeConfig::default());
    /// let outcome = probe.run(&request, &mut std::io::stdout().lock())?;
    /// ```
    pub fn new(loader: L, config: ProbeConfig) -> Self {
        Self { loader, config }
    }

    /// Run the probe, writing the stdout contract to `out`
    ///
    /// Writes the extension version (no newline) on success, `skip` when the
    /// environment cannot exercise the probe, or `Error <symbol> ret = <code>`.
    pub fn run<W: Write>(&self, request: &ProbeRequest, out: &mut W) -> Result<ProbeOutcome> {
        let outcome = self.execute(request, out)?;

        if let Some(line) = outcome.report_line() {
            writeln!(out, "{}", line)?;
            out.flush()?;
        }

        match &outcome {
            ProbeOutcome::Skipped(reason) => info!(reason = %reason, "Probe skipped"),
            ProbeOutcome::Succeeded { version } => info!(version = %version, "Extension loaded"),
            ProbeOutcome::Failed(failure) => error!(failure = ?failure, "Probe failed"),
        }

        Ok(outcome)
    }

    fn execute<W: Write>(&self, request: &ProbeRequest, out: &mut W) -> Result<ProbeOutcome> {
        let database = c_string("database", &self.config.database)?;
        let query = c_string("query", &self.config.query)?;

        // 1. Engine library
        let library = match self.loader.load(request.engine_library()) {
            Ok(library) => library,
            Err(LoadError::Unsupported) => {
                debug!("Dynamic loading unavailable");
                return Ok(ProbeOutcome::Skipped(SkipReason::LoaderUnsupported));
            }
            Err(e) => {
                debug!(error = %e, "Engine library not loadable");
                return Ok(ProbeOutcome::Skipped(SkipReason::LibraryUnavailable(e.to_string())));
            }
        };
        debug!(library = %request.engine_library().display(), "Engine library loaded");

        // 2. In-memory session
        let mut session = match library.open(&database) {
            Lookup::Present {
                value: Ok(session),
                symbol,
            } => {
                debug!(symbol, database = %self.config.database, "Session opened");
                session
            }
            Lookup::Present {
                value: Err(code),
                symbol,
            } => return Ok(failed(symbol, code)),
            Lookup::Absent(entry) => return Ok(absent(entry)),
        };

        // 3. Extension loading is off by default; a refusal means the build cannot be probed
        match library.enable_load_extension(&mut session, true) {
            Lookup::Present { value: Ok(()), symbol } => debug!(symbol, "Extension loading enabled"),
            Lookup::Present {
                value: Err(code),
                symbol,
            } => {
                debug!(symbol, code, "Engine refused to enable extension loading");
                return Ok(ProbeOutcome::Skipped(
                    SkipReason::ExtensionLoadingRefused { symbol, code },
                ));
            }
            Lookup::Absent(entry) => return Ok(absent(entry)),
        }

        // 4. Extension
        match library.load_extension(&mut session, request.extension_library()) {
            Lookup::Present { value: Ok(()), symbol } => {
                debug!(symbol, extension = ?request.extension_library(), "Extension loaded")
            }
            Lookup::Present {
                value: Err(code),
                symbol,
            } => {
                // load_extension reports only through its (null) message
                // out-parameter, so errmsg would read "not an error"
                return Ok(failed(symbol, code));
            }
            Lookup::Absent(entry) => return Ok(absent(entry)),
        }

        // 5. Diagnostic query
        let (symbol, table) = match library.get_table(&mut session, &query) {
            Lookup::Present {
                value: Ok(table),
                symbol,
            } => (symbol, table),
            Lookup::Present {
                value: Err(code),
                symbol,
            } => {
                log_engine_error(&library, &session, symbol);
                return Ok(failed(symbol, code));
            }
            Lookup::Absent(entry) => return Ok(absent(entry)),
        };
        debug!(
            symbol,
            rows = table.rows(),
            columns = table.columns(),
            "Query executed"
        );

        // 6. Version cell; the table is released before the session closes
        let version = table.cell(VERSION_CELL);
        drop(table);
        let Some(version) = version else {
            return Ok(ProbeOutcome::Failed(Failure::EmptyResult { symbol }));
        };

        write!(out, "{}", version)?;
        out.flush()?;

        // 7. Close
        match library.close(session) {
            Lookup::Present { value: Ok(()), symbol } => {
                debug!(symbol, "Session closed");
            }
            Lookup::Present {
                value: Err(code),
                symbol,
            } => {
                error!(symbol, code, "Session close failed");
                return Ok(ProbeOutcome::Failed(Failure::Close { symbol, code }));
            }
            Lookup::Absent(entry) => {
                warn!(entry = %entry, "No close entry point; session left open");
            }
        }

        Ok(ProbeOutcome::Succeeded { version })
    }
}

fn failed(symbol: &'static str, code: NativeStatus) -> ProbeOutcome {
    debug!(symbol, code, "Native call failed");
    ProbeOutcome::Failed(Failure::Call { symbol, code })
}

fn absent(entry: EntryPoint) -> ProbeOutcome {
    let pair = entry.symbols();
    debug!(
        primary = pair.primary,
        alternate = pair.alternate,
        "Entry point not exported"
    );
    ProbeOutcome::Skipped(SkipReason::SymbolAbsent(entry))
}

fn log_engine_error<E: EngineLibrary>(library: &E, session: &E::Session, symbol: &'static str) {
    if let Some(message) = library.last_error(session) {
        error!(symbol, message = %message, "Engine error");
    }
}

fn c_string(what: &str, value: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| AppError::InvalidArgument(format!("{} contains a NUL byte: {:?}", what, value)))
}
