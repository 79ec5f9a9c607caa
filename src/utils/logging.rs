use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Builds the filter from `RUST_LOG` plus the configured level
/// for this crate.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directive = format!("uatu_sniper={}", config.level);
    Ok(EnvFilter::from_default_env().add_directive(directive.parse()?))
}

/// Installs the global subscriber: stdout always, plus a daily-rolling file
/// when `logging.directory` is set. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
