//! Observability: structured logging and metrics.
//!
//! Logging goes through a `tracing-subscriber` registry with an
//! [`EnvFilter`]. The filter comes from `PRICING_TRANSFER_LOG` when set,
//! else the configured level, else `info` (`debug` when verbose).

mod metrics;

pub use self::metrics::{install_prometheus, listen_addr};

use crate::config::{LogFormat, LoggingSettings, MetricsSettings};
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "PRICING_TRANSFER_LOG";

/// Options for initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
}

/// What was installed by [`init`].
#[derive(Debug, Clone, Copy)]
pub struct ObservabilityHandle {
    /// Address of the Prometheus listener, when metrics are enabled.
    pub metrics_addr: Option<SocketAddr>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging and metrics for the process.
///
/// # Errors
///
/// Returns an error if observability has already been initialized, the
/// filter directive is invalid, the log file cannot be opened, or the
/// metrics exporter cannot be installed.
pub fn init(
    logging: &LoggingSettings,
    metrics: &MetricsSettings,
    options: InitOptions,
) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(init_failed("already initialized"));
    }

    tracing_subscriber::registry()
        .with(fmt_layer(logging)?)
        .with(build_filter(logging, options.verbose)?)
        .try_init()
        .map_err(init_failed)?;

    let metrics_addr = install_prometheus(metrics)?;
    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| init_failed("initialized concurrently"))?;

    Ok(ObservabilityHandle { metrics_addr })
}

/// Builds the formatting layer for the configured format and destination.
///
/// Files get plain text without ANSI colors.
fn fmt_layer(logging: &LoggingSettings) -> Result<BoxedLayer> {
    let (writer, ansi) = match &logging.file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    Ok(match logging.format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Pretty => layer.boxed(),
    })
}

/// Resolves the log filter.
fn build_filter(logging: &LoggingSettings, verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    let directive = logging
        .level
        .as_deref()
        .filter(|level| !level.trim().is_empty())
        .unwrap_or(if verbose { "debug" } else { "info" });

    EnvFilter::try_new(directive).map_err(|e| Error::OperationFailed {
        operation: "parse_log_filter".to_string(),
        cause: format!("{directive}: {e}"),
    })
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    let open = || -> io::Result<File> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    };

    open().map_err(|e| Error::OperationFailed {
        operation: "open_log_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}

fn init_failed(cause: impl std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: cause.to_string(),
    }
}
