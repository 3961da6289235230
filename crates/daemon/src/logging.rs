//! Log sink setup
//!
//! stdout in pretty or JSON form, plus an optional daily-rolling JSON file.

use crate::config::{DaemonConfig, Environment, LogFormat};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "kiosk-print.log";

fn default_directives(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "kiosk_print=debug,tower=info",
        Environment::Production => "kiosk_print=info,tower=warn",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// The returned guard flushes the file writer on drop; keep it alive until
/// the process exits.
pub fn init_logging(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(config.environment)))
        .context("Failed to create env filter")?;

    let json = config.log_format == LogFormat::Json;
    let stdout_json = json.then(|| fmt::layer().json());
    let stdout_pretty = (!json).then(|| fmt::layer().pretty());

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_json)
        .with(stdout_pretty)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
