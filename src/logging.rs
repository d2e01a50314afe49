//! Logging setup and configuration.

use log::debug;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::error::EventError;
use crate::event::Event;

/// Sets up logging with both console and file output.
pub fn setup_logging(config: &Config) -> Result<(), EventError> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("event-dispatch")
        .filename_suffix("log")
        .max_log_files(7)
        .build(&config.logs_path)
        .map_err(|e| EventError::Configuration {
            msg: format!(
                "Failed to initialize rolling file appender at '{}': {}",
                config.logs_path.to_string_lossy(),
                e
            ),
        })?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Leak the guard so the writer thread lives as long as the process
    std::mem::forget(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| EventError::Configuration {
            msg: format!("Invalid log filter '{}': {}", config.log_filter, e),
        })?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .map_err(|e| EventError::Configuration {
            msg: format!("Failed to install global logger: {}", e),
        })?;

    Ok(())
}

/// `on_emitted` hook that logs every emission.
pub fn log_emission(event: &dyn Event, invoked: usize) {
    debug!("Emitted {} to {} listener(s)", event.event_name(), invoked);
}
