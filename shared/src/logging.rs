//! Tracing subscriber initialisation

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber described by `config`.
///
/// A valid `RUST_LOG` takes precedence over `config.filter`. Returns an error
/// when the configured filter does not parse or a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), String> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), &config.filter)?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_file(config.with_location)
        .with_line_number(config.with_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| format!("Failed to install tracing subscriber: {}", e))?;
    if let Some(directive) = env.filter(|d| EnvFilter::try_new(d).is_err()) {
        tracing::warn!(directive = %directive, "Ignoring invalid RUST_LOG, using configured filter");
    }
    tracing::debug!(filter = %config.filter, format = ?config.format, "Tracing initialised");
    Ok(())
}

/// Filter from the environment directive when it parses, otherwise from `configured`
fn build_filter(env: Option<&str>, configured: &str) -> Result<EnvFilter, String> {
    if let Some(Ok(filter)) = env.map(EnvFilter::try_new) {
        return Ok(filter);
    }
    EnvFilter::try_new(configured).map_err(|e| format!("Invalid log filter '{}': {}", configured, e))
}
