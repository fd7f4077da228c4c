//! Daemon configuration.
//!
//! Every flag can also be set through an environment variable:
//! - `SEVAULT_SOCKET`: plugin socket path. Defaults to `/run/docker/plugins/sevault.sock`.
//! - `SEVAULT_STATE_ROOT`: state root; volumes are mounted under `<root>/mounts`.
//!   Defaults to `/var/lib/sevault`.
//! - `SEVAULT_DEFAULT_BACKEND`: backend for volumes without a `type`/`backend` option.
//!   Defaults to `nfs`.
//! - `SEVAULT_LOG_FORMAT`: `text` or `json`. Log levels come from `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use libsevault::DriverConfig;
use libsevault::config::DEFAULT_STATE_ROOT;

pub const DEFAULT_SOCKET: &str = "/run/docker/plugins/sevault.sock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "sevaultd", version, about = "Docker volume plugin for NFS and CIFS shares")]
pub struct Args {
    /// Unix socket the plugin listens on.
    #[arg(long, env = "SEVAULT_SOCKET", default_value = DEFAULT_SOCKET)]
    pub socket: PathBuf,

    /// Root directory for mount points.
    #[arg(long, env = "SEVAULT_STATE_ROOT", default_value = DEFAULT_STATE_ROOT)]
    pub state_root: PathBuf,

    /// Backend used when a volume names none.
    #[arg(long, env = "SEVAULT_DEFAULT_BACKEND", default_value = "nfs")]
    pub default_backend: String,

    #[arg(long, env = "SEVAULT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::new(&self.state_root)
    }
}
