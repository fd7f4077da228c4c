//! Driver configuration.
//!
//! Volumes live under `<state_root>/mounts/<name>`.  Nothing else is written
//! beneath the state root.

use std::path::PathBuf;

/// Default state root used by the daemon.
pub const DEFAULT_STATE_ROOT: &str = "/var/lib/sevault";
/// Sub-directory of the state root that holds one directory per volume.
pub const MOUNTS_DIR: &str = "mounts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Root of all on-disk state.
    pub state_root: PathBuf,
}

impl DriverConfig {
    pub fn new(state_root: impl Into<PathBuf>) -> Self {
        Self {
            state_root: state_root.into(),
        }
    }

    /// Directory containing one mount point per volume.
    pub fn mount_root(&self) -> PathBuf {
        self.state_root.join(MOUNTS_DIR)
    }

    /// Mount point of the volume called `name`.
    pub fn mount_path(&self, name: &str) -> PathBuf {
        self.mount_root().join(name)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_ROOT)
    }
}
