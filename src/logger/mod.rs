//! Logger setup
//!
//! Builds a `tracing-subscriber` registry with an optional console layer and
//! an optional file layer. File output goes through a `tracing-appender`
//! rolling appender wrapped in a non-blocking writer, so the returned
//! [`LoggerGuard`] must be held for the lifetime of the process.

pub mod config;
pub mod error;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the background file writer alive; dropping it flushes pending lines.
#[derive(Debug, Default)]
pub struct LoggerGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the global subscriber with the given configuration
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<LoggerGuard> {
    config.validate()?;
    let filter = config.env_filter()?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = LoggerGuard::default();

    // File layer goes first so the console's ANSI setting does not leak into
    // span fields written to the file.
    if config.file.enabled {
        let (layer, worker) = file_layer(&config.file)?;
        layers.push(layer);
        guard._file = Some(worker);
    }

    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(LoggerError::from)?;

    Ok(guard)
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer(config: &FileConfig) -> Result<(BoxedLayer, WorkerGuard), LoggerError> {
    let (writer, worker) = tracing_appender::non_blocking(file_appender(config)?);

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_writer(writer)
            .boxed(),
    };

    Ok((layer, worker))
}

/// Create the rolling appender for `config.path`, creating its directory.
pub(crate) fn file_appender(config: &FileConfig) -> Result<RollingFileAppender, LoggerError> {
    let directory = config.directory();
    std::fs::create_dir_all(directory)?;

    let file_name = config.file_name().ok_or_else(|| {
        LoggerError::config(format!(
            "Log file path '{}' has no file name",
            config.path.display()
        ))
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.to_rotation())
        .filename_prefix(file_name)
        .build(directory)?;

    Ok(appender)
}
