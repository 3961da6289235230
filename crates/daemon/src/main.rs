//! Kiosk Print Daemon - Main Entry Point
//! HTTP API + badge fetch/print pipeline + deferred temp cleanup

mod config;
mod logging;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use config::DaemonConfig;
use kiosk_print_api_http::{ApiServer, ApiServerConfig, AppStateInner};
use kiosk_print_core::application::{
    shutdown_channel, CleanupScheduler, CoordinatorSettings, JobCoordinator, QueueInspector,
};
use kiosk_print_core::port::time_provider::SystemTimeProvider;
use kiosk_print_core::port::TimeProvider;
use kiosk_print_infra_http::{FetchLimits, HttpFetcher};
use kiosk_print_infra_system::{CommandPrintSubsystem, CommandTimeouts};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration + log sink (both fatal on failure)
    let config = DaemonConfig::from_env().context("Invalid configuration")?;
    let _log_guard = logging::init_logging(&config)?;

    info!(
        version = VERSION,
        environment = %config.environment,
        api_url = %config.api_url,
        "Kiosk Print Daemon starting..."
    );

    // 2. Adapters
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

    let fetcher = Arc::new(
        HttpFetcher::new(
            FetchLimits {
                timeout: config.fetch_timeout,
                max_bytes: config.fetch_max_bytes,
            },
            time_provider.clone(),
        )
        .context("HTTP client initialization failed")?,
    );

    let mut subsystem = CommandPrintSubsystem::new(
        config.printer_program.clone(),
        config.printer_args.clone(),
        CommandTimeouts {
            submit: config.print_timeout,
            query: config.query_timeout,
        },
        time_provider.clone(),
    );
    if let Some(dir) = &config.printer_workdir {
        subsystem = subsystem.with_working_dir(dir);
    }
    let subsystem = Arc::new(subsystem);

    // 3. Application services
    let cleanup = Arc::new(CleanupScheduler::new(config.cleanup_delay));
    let coordinator = Arc::new(JobCoordinator::new(
        CoordinatorSettings {
            api_url: config.api_url.clone(),
            temp_dir: config.temp_dir.clone(),
            default_printer: config.default_printer.clone(),
        },
        fetcher,
        subsystem.clone(),
        cleanup.clone(),
        time_provider,
    ));
    let inspector = Arc::new(QueueInspector::new(
        config.temp_dir.clone(),
        config.api_url.clone(),
        subsystem,
    ));

    // 4. Temp area
    prepare_temp_dir(&config.temp_dir, &inspector).await?;

    // 5. HTTP server
    let server_config = ApiServerConfig {
        host: config.host.clone(),
        port: config.port,
    };
    let state = Arc::new(AppStateInner {
        coordinator,
        inspector,
    });
    let server = ApiServer::bind(&server_config, state)
        .await
        .with_context(|| format!("Failed to bind {}:{}", server_config.host, server_config.port))?;

    let (shutdown_tx, shutdown_token) = shutdown_channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received. Draining in-flight requests...");
        shutdown_tx.shutdown();
    });

    info!(addr = %server.local_addr()?, "System ready. Waiting for print requests...");

    // 6. Serve until SIGINT/SIGTERM
    server
        .serve(shutdown_token.cancelled())
        .await
        .context("HTTP server failed")?;

    // 7. Grace timers would die with the runtime; delete now instead
    let removed = cleanup.flush().await;
    info!(removed, "Shutdown complete.");

    Ok(())
}

/// Create the temp directory and report documents left by a previous run
async fn prepare_temp_dir(dir: &Path, inspector: &QueueInspector) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create temp directory {}", dir.display()))?;

    match inspector.list_queue().await {
        Ok(leftovers) if !leftovers.is_empty() => {
            let names: Vec<&str> = leftovers.iter().map(|e| e.name.as_str()).collect();
            warn!(
                dir = %dir.display(),
                count = leftovers.len(),
                files = ?names,
                "Documents left over from a previous run"
            );
        }
        Ok(_) => info!(dir = %dir.display(), "Temp directory ready"),
        Err(e) => warn!(error = %e, "Could not list temp directory"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
