use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    prelude::*,
    EnvFilter,
};

use crate::config::Config;

/// `RUST_LOG` wins over the configured level. Logs go to stderr so stdout
/// only carries command output.
pub fn setup_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log level '{}'", config.log_level))?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = config.log_file.as_deref().map(|path| {
        let directory = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = path.file_name().unwrap_or(path.as_os_str());
        let file_appender = RollingFileAppender::new(Rotation::NEVER, directory, file_name);

        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_timer(SystemTime)
            .with_writer(file_appender)
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match &config.log_file {
        Some(path) => tracing::debug!("Logging initialized, also writing to {}", path.display()),
        None => tracing::debug!("Logging initialized"),
    }

    Ok(())
}
