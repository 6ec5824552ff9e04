//! Logging configuration module
//! Console logging on stderr, optionally mirrored to rotating JSON files

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "hcipower.log";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,               // log level (trace, debug, info, warn, error)
    pub log_dir: Option<PathBuf>,    // directory for log files
    pub rotation: LogRotation,       // log rotation policy
    pub json_format: bool,           // use JSON formatting on the console
}

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            rotation: LogRotation::Daily,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Filter used when RUST_LOG is not set
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Initialize logging. Keep the returned guard alive until exit so
    /// buffered file output is flushed.
    pub fn init(&self) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(!self.json_format)
            .with_writer(io::stderr);
        let console_layer = if self.json_format {
            console_layer.json().boxed()
        } else {
            console_layer.boxed()
        };

        let guard = if let Some(ref dir) = self.log_dir {
            let file_appender = match self.rotation {
                LogRotation::Hourly => rolling::hourly(dir, LOG_FILE_NAME),
                LogRotation::Daily => rolling::daily(dir, LOG_FILE_NAME),
                LogRotation::Never => rolling::never(dir, LOG_FILE_NAME),
            };

            let (writer, guard) = non_blocking(file_appender);

            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_writer(writer);

            tracing_subscriber::registry()
                .with(self.env_filter())
                .with(console_layer)
                .with(file_layer)
                .try_init()?;

            Some(guard)
        } else {
            tracing_subscriber::registry()
                .with(self.env_filter())
                .with(console_layer)
                .try_init()?;

            None
        };

        tracing::debug!("Logging initialized - level: {}", self.level);

        Ok(guard)
    }
}

/// Log the start of a power operation
#[macro_export]
macro_rules! log_power_operation {
    ($action:expr, $cluster:expr) => {
        tracing::info!(
            action = %$action,
            cluster = %$cluster,
            "Power operation"
        )
    };
    ($action:expr, $cluster:expr, $($key:ident = $value:expr),+) => {
        tracing::info!(
            action = %$action,
            cluster = %$cluster,
            $($key = $value),+,
            "Power operation"
        )
    };
}
