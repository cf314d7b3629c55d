use std::io;

use anyhow::{Context, Result};
use isoko_config::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `log.level`.
///
/// Keep the returned guard alive for the life of the process so the file
/// writer flushes on exit.
pub fn init_tracing(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    let json = config
        .json
        .then(|| fmt::layer().json().with_writer(io::stderr));
    let plain = (!config.json).then(|| fmt::layer().with_target(false).with_writer(io::stderr));

    let (file, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "isoko.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(guard)
}
