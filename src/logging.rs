//! Diagnostic logging via `tracing-subscriber`.
//!
//! Logs go to stderr; stdout is the result channel.

use std::io;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `LEVEL target: message fields`
    #[default]
    Compact,
    /// JSON Lines
    Json,
}

/// Build the filter: `RUST_LOG` wins over `level`, and the postgres driver stays quiet.
pub fn build_env_filter(level: &str) -> Result<EnvFilter, String> {
    let base = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    let directives = format!("{},tokio_postgres=warn,postgres=warn", base);
    EnvFilter::try_new(&directives)
        .map_err(|e| format!("Invalid log filter '{}': {}", directives, e))
}

/// Install the global subscriber. Calling it twice is an error.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build_env_filter(level)?;

    let layer = match format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}
