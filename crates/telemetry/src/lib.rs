//! Structured logging setup.
//!
//! Provides:
//! - Pretty or JSON console output filtered by `RUST_LOG`
//! - An optional append-only request log file (INFO and above, no colours)
//! - Quiet-by-default initialisation for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let config = telemetry::TelemetryConfig::from_env();
//! telemetry::init_with_config("igapi", config).expect("logging");
//! tracing::info!("Application started");
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `RUST_LOG` - Log filter directive (default: "info")
//! - `LOG_FORMAT` - Output format: "json" or "pretty" (default: "pretty")
//! - `IGAPI_REQUEST_LOG` - Path of the append-only request log
//! - `TEST_LOG` - If set, enables logs in test mode

pub mod config;
pub mod error;

pub use config::{LogFormat, TelemetryConfig};
pub use error::{Result, TelemetryError};

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initialize logging with full configuration control.
///
/// ```rust,no_run
/// use telemetry::{LogFormat, TelemetryConfig};
///
/// let config = TelemetryConfig::new()
///     .with_filter("debug")
///     .with_format(LogFormat::Json)
///     .with_request_log("igapi.log");
///
/// telemetry::init_with_config("igapi", config).expect("logging");
/// ```
pub fn init_with_config(name: &str, config: TelemetryConfig) -> Result<()> {
    let layers = build_layers(&config)?;
    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(
        app = name,
        format = ?config.format,
        request_log = ?config.request_log,
        "logging initialised"
    );
    Ok(())
}

/// Initialize logging for tests.
///
/// Logs are suppressed unless `TEST_LOG` is set. Safe to call from every test.
pub fn init_test() {
    let config = TelemetryConfig::from_env().with_test_mode(true);
    if config.should_suppress_logs() {
        return;
    }

    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_new(&config.filter)
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let formatting_layer = fmt::layer().with_target(true).with_test_writer();
        let _ = tracing_subscriber::registry()
            .with(formatting_layer.with_filter(env_filter))
            .try_init();
    });
}

/// Console layer plus, when configured, the request log layer.
pub fn build_layers(config: &TelemetryConfig) -> Result<Vec<BoxedLayer>> {
    let mut layers = vec![console_layer(config)?];
    if let Some(path) = config.request_log.as_deref() {
        layers.push(request_log_layer(path)?);
    }
    Ok(layers)
}

fn console_layer(config: &TelemetryConfig) -> Result<BoxedLayer> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: config.filter.clone(),
            reason: e.to_string(),
        })?;
    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };
    Ok(layer)
}

/// Timestamped INFO+ lines appended to `path`; parent directories are created.
pub fn request_log_layer(path: &Path) -> Result<BoxedLayer> {
    let io_err = |source| TelemetryError::RequestLog {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;

    Ok(fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::INFO)
        .boxed())
}
