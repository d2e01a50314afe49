//! Environment-driven configuration.

use std::path::PathBuf;

use crate::error::EventError;

#[derive(Clone, Debug)]
pub struct Config {
    pub logs_path: PathBuf,
    pub log_filter: String,
    /// Install [`log_emission`](crate::logging::log_emission) on managers
    /// built with [`EventManager::with_config`](crate::event::EventManager::with_config).
    pub trace_emissions: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            logs_path: PathBuf::from("logs"),
            log_filter: "event_dispatch=info".to_string(),
            trace_emissions: false,
        }
    }

    /// Overrides the defaults with `.env` and process environment values.
    pub fn load(&mut self) -> Result<(), EventError> {
        dotenv::dotenv().ok();

        if let Ok(path) = std::env::var("EVENTS_LOGS_PATH") {
            self.logs_path = PathBuf::from(path);
        }
        if let Ok(filter) = std::env::var("EVENTS_LOG_FILTER") {
            self.log_filter = filter;
        }
        if let Ok(value) = std::env::var("EVENTS_TRACE_EMISSIONS") {
            self.trace_emissions = parse_flag("EVENTS_TRACE_EMISSIONS", &value)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, EventError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(EventError::Configuration {
            msg: format!("Invalid boolean `{}` for \"{}\"", value, key),
        }),
    }
}
