//! Process-wide `tracing` subscriber.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};

/// Filter directive for `-v` (info), `-vv` (debug), `-vvv` and beyond (trace).
#[must_use]
pub fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 | 1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Pick the effective filter directive.
///
/// CLI verbosity beats `RUST_LOG`, which beats the configured filter.
#[must_use]
pub fn resolve_filter(config: &LoggingConfig, verbose: u8, rust_log: Option<&str>) -> String {
    if verbose > 0 {
        return verbosity_filter(verbose).to_owned();
    }
    match rust_log.map(str::trim) {
        Some(directive) if !directive.is_empty() => directive.to_owned(),
        _ => config.filter.clone(),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays usable
/// for `--print-config` and `check` output.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, verbose: u8) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = resolve_filter(config, verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.context("failed to install tracing subscriber")?;

    tracing::debug!(filter = %directive, format = ?config.format, "logging initialized");
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn config(filter: &str) -> LoggingConfig {
        LoggingConfig {
            filter: filter.to_owned(),
            format: LogFormat::Text,
        }
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_filter(1), "info");
        assert_eq!(verbosity_filter(2), "debug");
        assert_eq!(verbosity_filter(3), "trace");
        assert_eq!(verbosity_filter(9), "trace");
    }

    #[test]
    fn cli_beats_rust_log_beats_config() {
        let cfg = config("warn");
        assert_eq!(resolve_filter(&cfg, 2, Some("error")), "debug");
        assert_eq!(resolve_filter(&cfg, 0, Some("error")), "error");
        assert_eq!(resolve_filter(&cfg, 0, None), "warn");
    }

    #[test]
    fn blank_rust_log_is_ignored() {
        assert_eq!(resolve_filter(&config("warn"), 0, Some("  ")), "warn");
    }
}
