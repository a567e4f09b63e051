//! Log output for the sweeper CLI.
//!
//! Everything the tool reports (selection, deletes, stack events, failures)
//! goes through `tracing` to stderr. `RUST_LOG` overrides `--log-level` when
//! set, which also allows per-module filters:
//!
//! ```bash
//! RUST_LOG=stack_sweeper::io=debug stack-sweeper --expiry-tag expiry
//! ```

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parse a `--log-level` value. Case-insensitive; `warning` and `critical`
/// are accepted as aliases for `warn` and `error`.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    let normalized = match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    };
    normalized
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("Invalid log level: {level}"))
}

/// Install the stderr subscriber.
///
/// The level is validated even when `RUST_LOG` takes over, so a bad flag
/// never goes unnoticed.
pub fn init(level: &str) -> Result<()> {
    let level = parse_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .context("install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("INFO").expect("info"), LevelFilter::INFO);
        assert_eq!(parse_level("debug").expect("debug"), LevelFilter::DEBUG);
        assert_eq!(parse_level("Warning").expect("warning"), LevelFilter::WARN);
        assert_eq!(parse_level("CRITICAL").expect("critical"), LevelFilter::ERROR);
    }

    #[test]
    fn rejects_unknown_level() {
        let err = parse_level("chatty").unwrap_err();
        assert_eq!(err.to_string(), "Invalid log level: chatty");
    }
}
