// Probe Outcome Model

use std::fmt;

use super::entry_point::EntryPoint;

/// Native status code returned by an engine entry point (0 = OK)
pub type NativeStatus = i32;

/// Literal token printed when the environment cannot exercise the probe
pub const SKIP_TOKEN: &str = "skip";

/// Why the probe could not run (not a failure)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Dynamic loading is not available on this platform
    LoaderUnsupported,
    /// The engine library could not be loaded
    LibraryUnavailable(String),
    /// A required entry point is exported under neither name
    SymbolAbsent(EntryPoint),
    /// The engine refused to enable extension loading
    ExtensionLoadingRefused { symbol: &'static str, code: NativeStatus },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LoaderUnsupported => write!(f, "dynamic loading unsupported"),
            SkipReason::LibraryUnavailable(reason) => write!(f, "library unavailable: {}", reason),
            SkipReason::SymbolAbsent(entry) => write!(f, "entry point {} not exported", entry),
            SkipReason::ExtensionLoadingRefused { symbol, code } => {
                write!(f, "{} ret = {}", symbol, code)
            }
        }
    }
}

/// A native call that made the probe fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// open / load_extension / get_table returned non-zero
    Call { symbol: &'static str, code: NativeStatus },
    /// The query succeeded but produced no value at row 0, column 0
    EmptyResult { symbol: &'static str },
    /// close returned non-zero (the version was already reported)
    Close { symbol: &'static str, code: NativeStatus },
}

/// Final result of one probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Skipped(SkipReason),
    Succeeded { version: String },
    Failed(Failure),
}

impl ProbeOutcome {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ProbeOutcome::Skipped(_) | ProbeOutcome::Succeeded { .. } => ExitStatus::Success,
            ProbeOutcome::Failed(_) => ExitStatus::Failure,
        }
    }

    /// Line written to stdout after the procedure returns
    ///
    /// `None` when nothing is left to print: a success has already
    /// streamed its version, and a close failure follows that version.
    pub fn report_line(&self) -> Option<String> {
        match self {
            ProbeOutcome::Skipped(_) => Some(SKIP_TOKEN.to_string()),
            ProbeOutcome::Succeeded { .. } => None,
            ProbeOutcome::Failed(Failure::Call { symbol, code }) => {
                Some(format!("Error {} ret = {}", symbol, code))
            }
            ProbeOutcome::Failed(Failure::EmptyResult { symbol }) => {
                Some(format!("Error {} returned no value", symbol))
            }
            ProbeOutcome::Failed(Failure::Close { .. }) => None,
        }
    }
}

/// Process exit status
///
/// Skipped and succeeded runs share `Success`; callers tell them apart
/// by the `skip` token on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_and_success_share_exit_code() {
        let skipped = ProbeOutcome::Skipped(SkipReason::SymbolAbsent(EntryPoint::Open));
        let succeeded = ProbeOutcome::Succeeded {
            version: "3.8.4".to_string(),
        };

        assert_eq!(skipped.exit_status().code(), 0);
        assert_eq!(succeeded.exit_status().code(), 0);
        assert_eq!(skipped.report_line().as_deref(), Some("skip"));
        assert_eq!(succeeded.report_line(), None);
    }

    #[test]
    fn test_call_failure_report_line() {
        let outcome = ProbeOutcome::Failed(Failure::Call {
            symbol: "sqlite3_open",
            code: 14,
        });

        assert_eq!(outcome.exit_status(), ExitStatus::Failure);
        assert_eq!(
            outcome.report_line().as_deref(),
            Some("Error sqlite3_open ret = 14")
        );
    }

    #[test]
    fn test_alternate_symbol_in_report_line() {
        let outcome = ProbeOutcome::Failed(Failure::Call {
            symbol: "SPLite3_load_extension",
            code: 1,
        });
        assert_eq!(
            outcome.report_line().as_deref(),
            Some("Error SPLite3_load_extension ret = 1")
        );
    }

    #[test]
    fn test_close_failure_prints_nothing_more() {
        let outcome = ProbeOutcome::Failed(Failure::Close {
            symbol: "sqlite3_close",
            code: 5,
        });
        assert_eq!(outcome.exit_status().code(), 1);
        assert_eq!(outcome.report_line(), None);
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::ExtensionLoadingRefused {
            symbol: "sqlite3_enable_load_extension",
            code: 1,
        };
        assert_eq!(reason.to_string(), "sqlite3_enable_load_extension ret = 1");
    }
}
