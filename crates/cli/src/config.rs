//! Environment configuration
//!
//! The command line is reserved for the two library arguments, so every
//! tunable comes from the environment.
//!
//! # Environment Variables
//!
//! - `EXTPROBE_QUERY`: diagnostic query (default: `SELECT ogr_version()`)
//! - `EXTPROBE_LOG_FORMAT`: `pretty` (default), `compact` or `json`
//! - `RUST_LOG`: log filter (default: `off`)

use extprobe_core::application::ProbeConfig;
use extprobe_core::{AppError, Result};

pub const QUERY_ENV: &str = "EXTPROBE_QUERY";
pub const LOG_FORMAT_ENV: &str = "EXTPROBE_LOG_FORMAT";

/// Log output format (always written to stderr)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to pretty output
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub probe: ProbeConfig,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut probe = ProbeConfig::default();

        if let Some(query) = lookup(QUERY_ENV) {
            if query.trim().is_empty() {
                return Err(AppError::Config(format!("{} is set but empty", QUERY_ENV)));
            }
            probe.query = query;
        }

        let log_format = lookup(LOG_FORMAT_ENV)
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        Ok(Self { probe, log_format })
    }
}
