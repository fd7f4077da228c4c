//! sevaultd — Docker volume plugin daemon.
//!
//! Serves the volume-plugin protocol on a Unix socket and mounts NFS/CIFS
//! shares under `<state-root>/mounts/<volume>`.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use libsevault::{BackendRegistry, PluginServer, SystemCommandRunner, VolumeDriver};
use tracing::info;

use crate::config::{Args, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let registry = BackendRegistry::builtin(args.default_backend.clone());
    let driver = VolumeDriver::new(args.driver_config(), registry, Arc::new(SystemCommandRunner))
        .with_context(|| format!("invalid default backend {:?}", args.default_backend))?;
    let mount_root = driver.config().mount_root();
    info!(
        backends = ?driver.registry().selectors(),
        default_backend = %args.default_backend,
        mount_root = %mount_root.display(),
        "starting sevault volume plugin",
    );

    tokio::fs::create_dir_all(&mount_root)
        .await
        .with_context(|| format!("failed to create mount root {}", mount_root.display()))?;

    let server = PluginServer::bind(&args.socket, Arc::new(driver))
        .await
        .with_context(|| format!("failed to bind plugin socket {}", args.socket.display()))?;
    server
        .serve_until(shutdown_signal())
        .await
        .context("plugin server failed")?;

    info!("sevault volume plugin stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C"),
        () = terminate => info!("received SIGTERM"),
    }
}
