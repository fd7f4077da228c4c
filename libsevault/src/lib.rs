//! # libsevault — named network-storage volumes for container hosts
//!
//! `libsevault` manages the lifecycle of named volumes whose storage lives on
//! a network filesystem (NFS, CIFS).  A host plugin protocol asks it to
//! create, mount, unmount and remove volumes; it turns those requests into
//! `mount`/`umount` invocations against a deterministic local mount point.
//! It follows the RK8s conventions: Tokio async runtime, `tracing` for
//! observability, `thiserror` for structured errors.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Data model: `VolumeInfo`, `MountSpec`, capabilities, name rules. |
//! | [`error`] | [`VolumeError`] enum covering all failure modes. |
//! | [`config`] | [`DriverConfig`]: state root and mount point layout. |
//! | [`backend`] | [`Backend`] trait, NFS/CIFS backends, [`BackendRegistry`]. |
//! | [`command`] | [`CommandRunner`] trait for the external `mount`/`umount`. |
//! | [`plugin`] | [`VolumePlugin`] trait — the lifecycle operations. |
//! | [`driver`] | [`VolumeDriver`] — the in-memory lifecycle manager. |
//! | [`message`] | Docker volume-plugin request/response bodies. |
//! | [`transport`] | Unix-socket HTTP server built on `hyper`. |

pub mod backend;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod message;
pub mod plugin;
pub mod transport;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use backend::{Backend, BackendRegistry, CifsBackend, NfsBackend};
pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use config::DriverConfig;
pub use driver::VolumeDriver;
pub use error::VolumeError;
pub use plugin::VolumePlugin;
pub use transport::PluginServer;
pub use types::*;
