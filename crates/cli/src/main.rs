//! Extprobe - checks that an extension library loads into a SQLite session
//!
//! Prints the extension's version on success, `skip` when the host cannot
//! run the check, or `Error <call> ret = <code>` when a native call fails.

mod config;
mod logging;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;

use extprobe_core::application::ExtensionProbe;
use extprobe_core::domain::{ExitStatus, ProbeRequest};
use extprobe_infra_dylib::DynamicEngineLoader;

use crate::config::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exactly two positional arguments; flags are not recognised so that any
/// token is taken as a library name.
#[derive(Parser, Debug)]
#[command(name = "extprobe")]
#[command(about = "Load an extension library into an in-memory SQLite session", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// SQLite shared library (path or loader name)
    #[arg(value_name = "name_of_libsqlite3", allow_hyphen_values = true)]
    engine_library: PathBuf,

    /// Extension shared library handed to sqlite3_load_extension
    #[arg(value_name = "name_of_libgdal", allow_hyphen_values = true)]
    extension_library: PathBuf,
}

/// Parse the command line; `None` means it was not exactly two arguments
fn parse_args<I>(args: I) -> Option<Cli>
where
    I: IntoIterator<Item = OsString>,
{
    let args: Vec<OsString> = args.into_iter().collect();
    if args.len() != 3 {
        return None;
    }
    Cli::try_parse_from(args).ok()
}

fn usage() -> String {
    Cli::command().render_usage().to_string()
}

fn main() -> ExitCode {
    // Usage goes to stdout with the rest of the harness-facing output
    let Some(cli) = parse_args(std::env::args_os()) else {
        println!("{}", usage());
        return ExitStatus::Failure.into();
    };

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("extprobe: {}", e);
            return ExitStatus::Failure.into();
        }
    };

    logging::init(settings.log_format);
    debug!("extprobe v{} starting", VERSION);

    match run(cli, settings) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("extprobe: {:#}", e);
            ExitStatus::Failure.into()
        }
    }
}

fn run(cli: Cli, settings: Settings) -> Result<ExitStatus> {
    debug!(
        engine = %cli.engine_library.display(),
        extension = %cli.extension_library.display(),
        query = %settings.probe.query,
        "Probing"
    );

    let request = ProbeRequest::new(cli.engine_library, &cli.extension_library)
        .context("Invalid extension library argument")?;
    let probe = ExtensionProbe::new(DynamicEngineLoader, settings.probe);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = probe
        .run(&request, &mut out)
        .context("Probe could not report its result")?;

    Ok(outcome.exit_status())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_two_arguments_parse() {
        let cli = parse_args(args(&["extprobe", "libsqlite3.so.0", "/usr/lib/libgdal.so"])).unwrap();
        assert_eq!(cli.engine_library, PathBuf::from("libsqlite3.so.0"));
        assert_eq!(cli.extension_library, PathBuf::from("/usr/lib/libgdal.so"));
    }

    #[test]
    fn test_wrong_argument_count_is_rejected() {
        assert!(parse_args(args(&["extprobe"])).is_none());
        assert!(parse_args(args(&["extprobe", "libsqlite3.so"])).is_none());
        assert!(parse_args(args(&["extprobe", "a", "b", "c"])).is_none());
        assert!(parse_args(args(&["extprobe", "--help", "-V", "x"])).is_none());
    }

    #[test]
    fn test_usage_names_both_libraries() {
        let usage = usage();
        assert!(usage.starts_with("Usage:"));
        assert!(usage.contains("extprobe"));
        assert!(usage.contains("name_of_libsqlite3"));
        assert!(usage.contains("name_of_libgdal"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
