//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` takes precedence; otherwise the level follows the verbosity
//! flags.

use crate::config::{LogFormat, Verbosity};
use crate::error::{CliError, CliResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Layer, Registry};

/// Filter directive used when `RUST_LOG` is unset
#[must_use]
pub const fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "info",
        Verbosity::Debug => "debug",
    }
}

fn resolve_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Install the process-wide subscriber
pub fn init_logging(verbosity: Verbosity, format: LogFormat, ansi: bool) -> CliResult<()> {
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Text => Box::new(
            tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity.is_debug())
                .with_ansi(ansi),
        ),
        LogFormat::Json => Box::new(
            tracing_fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        ),
    };

    Registry::default()
        .with(layer)
        .with(resolve_filter(verbosity))
        .try_init()
        .map_err(|err| CliError::logging(err.to_string()))
}
