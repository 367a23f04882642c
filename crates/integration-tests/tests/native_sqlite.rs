//! Native SQLite Integration Tests
//!
//! Runs the probe against the host's SQLite shared library. Each test
//! skips (with a message) when no SQLite library can be loaded.
//!
//! - `EXTPROBE_TEST_SQLITE3`: SQLite library to use instead of the defaults
//! - `EXTPROBE_TEST_GDAL`: GDAL library; enables the end-to-end version check

use std::ffi::CStr;
use std::path::{Path, PathBuf};

use extprobe_core::application::{ExtensionProbe, ProbeConfig};
use extprobe_core::domain::{EntryPoint, Failure, ProbeOutcome, ProbeRequest, SkipReason};
use extprobe_core::port::{EngineLibrary, EngineLoader, ResultTable};
use extprobe_infra_dylib::{DynamicEngine, DynamicEngineLoader};

const SQLITE_CANDIDATES: &[&str] = &[
    "libsqlite3.so.0",
    "libsqlite3.so",
    "libsqlite3.dylib",
    "/usr/lib/libsqlite3.dylib",
    "sqlite3.dll",
];

const MISSING_EXTENSION: &str = "/nonexistent/libgdal-extprobe.so";

fn sqlite_library() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("EXTPROBE_TEST_SQLITE3") {
        return Some(PathBuf::from(path));
    }

    let found = SQLITE_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| DynamicEngineLoader.load(candidate).is_ok());

    if found.is_none() {
        eprintln!("skipping test: no SQLite shared library found");
    }
    found
}

fn load(path: &Path) -> DynamicEngine {
    match DynamicEngineLoader.load(path) {
        Ok(engine) => engine,
        Err(e) => panic!("cannot load {}: {}", path.display(), e),
    }
}

fn probe(engine: &Path, extension: &str, config: ProbeConfig) -> (ProbeOutcome, String) {
    let request = ProbeRequest::new(engine, extension).unwrap();
    let probe = ExtensionProbe::new(DynamicEngineLoader, config);
    let mut out = Vec::new();
    let outcome = probe.run(&request, &mut out).unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

fn c(text: &[u8]) -> &CStr {
    CStr::from_bytes_with_nul(text).unwrap()
}

#[test]
fn test_engine_exports_core_entry_points() {
    let Some(path) = sqlite_library() else { return };
    let engine = load(&path);

    for entry in [
        EntryPoint::Open,
        EntryPoint::GetTable,
        EntryPoint::FreeTable,
        EntryPoint::Close,
        EntryPoint::ErrMsg,
    ] {
        assert!(
            engine.exports(entry).is_some(),
            "{} not exported by {}",
            entry,
            path.display()
        );
    }
}

#[test]
fn test_get_table_flat_layout() {
    let Some(path) = sqlite_library() else { return };
    let engine = load(&path);

    let mut session = engine
        .open(c(b":memory:\0"))
        .into_option()
        .expect("open not exported")
        .expect("open failed");

    {
        let table = engine
            .get_table(&mut session, c(b"SELECT 42 AS answer, 'x' AS other\0"))
            .into_option()
            .expect("get_table not exported")
            .expect("get_table failed");

        assert_eq!(table.columns(), 2);
        assert_eq!(table.rows(), 1);
        assert_eq!(table.cell(0).as_deref(), Some("answer"));
        assert_eq!(table.cell(1).as_deref(), Some("other"));
        assert_eq!(table.cell(2).as_deref(), Some("42"));
        assert_eq!(table.cell(3).as_deref(), Some("x"));
        assert_eq!(table.cell(4), None);
    }

    let closed = engine.close(session).into_option().expect("close not exported");
    assert_eq!(closed, Ok(()));
}

#[test]
fn test_null_cell_and_failed_query() {
    let Some(path) = sqlite_library() else { return };
    let engine = load(&path);

    let mut session = engine
        .open(c(b":memory:\0"))
        .into_option()
        .expect("open not exported")
        .expect("open failed");

    let table = engine
        .get_table(&mut session, c(b"SELECT NULL AS empty_cell\0"))
        .into_option()
        .expect("get_table not exported")
        .expect("get_table failed");
    assert_eq!(table.cell(1), None);
    drop(table);

    let failed = engine
        .get_table(&mut session, c(b"SELECT no_such_function()\0"))
        .into_option()
        .expect("get_table not exported");
    assert!(matches!(failed, Err(code) if code != 0));

    let message = engine.last_error(&session).unwrap_or_default();
    assert!(message.contains("no_such_function"), "errmsg: {message}");
    // Session dropped here without an explicit close
}

#[test]
fn test_missing_extension_fails_load_extension() {
    let Some(path) = sqlite_library() else { return };

    let (outcome, stdout) = probe(&path, MISSING_EXTENSION, ProbeConfig::default());

    match outcome {
        ProbeOutcome::Failed(Failure::Call { symbol, code }) => {
            assert!(symbol.ends_with("_load_extension"));
            assert_ne!(code, 0);
            assert_eq!(stdout, format!("Error {} ret = {}\n", symbol, code));
        }
        // Builds without extension loading cannot run this check
        ProbeOutcome::Skipped(SkipReason::SymbolAbsent(EntryPoint::EnableLoadExtension))
        | ProbeOutcome::Skipped(SkipReason::ExtensionLoadingRefused { .. }) => {
            assert_eq!(stdout, "skip\n");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_library_without_engine_symbols_skips() {
    let libm = Path::new("libm.so.6");
    if DynamicEngineLoader.load(libm).is_err() {
        eprintln!("skipping test: cannot load libm.so.6");
        return;
    }

    let (outcome, stdout) = probe(libm, MISSING_EXTENSION, ProbeConfig::default());

    assert_eq!(
        outcome,
        ProbeOutcome::Skipped(SkipReason::SymbolAbsent(EntryPoint::Open))
    );
    assert_eq!(stdout, "skip\n");
}

#[test]
fn test_unloadable_engine_skips() {
    let (outcome, stdout) = probe(
        Path::new("/nonexistent/libsqlite3-extprobe.so"),
        MISSING_EXTENSION,
        ProbeConfig::default(),
    );

    assert!(matches!(
        outcome,
        ProbeOutcome::Skipped(SkipReason::LibraryUnavailable(_))
    ));
    assert_eq!(stdout, "skip\n");
    assert_eq!(outcome.exit_status().code(), 0);
}

#[test]
fn test_gdal_reports_its_version() {
    let Some(path) = sqlite_library() else { return };
    let Ok(gdal) = std::env::var("EXTPROBE_TEST_GDAL") else {
        eprintln!("skipping test: EXTPROBE_TEST_GDAL not set");
        return;
    };

    let (first, stdout) = probe(&path, &gdal, ProbeConfig::default());
    if let ProbeOutcome::Skipped(reason) = &first {
        eprintln!("skipping test: {}", reason);
        return;
    }

    let ProbeOutcome::Succeeded { version } = &first else {
        panic!("unexpected outcome: {first:?}");
    };
    assert_eq!(&stdout, version);
    assert!(version.chars().next().is_some_and(|c| c.is_ascii_digit()));
    assert!(version.contains('.'));

    let (second, _) = probe(&path, &gdal, ProbeConfig::default());
    assert_eq!(first, second);
}
