//! Core driver types: volume options, mount specifications, volume snapshots
//! and plugin capabilities.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::VolumeError;

/// Options supplied when a volume is created: the backend selector plus
/// backend-specific parameters (e.g. `host`, `export`, `vers` for NFS).
pub type VolumeOptions = HashMap<String, String>;

/// Option keys consulted, in order, to pick a volume's backend.
pub const BACKEND_SELECTOR_KEYS: [&str; 2] = ["type", "backend"];

// ---------------------------------------------------------------------------
// Backend output
// ---------------------------------------------------------------------------

/// What a backend derives from a volume's options: the source passed to the
/// OS mount facility and the ordered list of mount options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    /// Backend-specific source string, e.g. `10.0.0.5:/srv/db`.
    pub device: String,
    /// Mount options, e.g. `["vers=4", "soft", "timeo=30"]`.
    pub options: Vec<String>,
}

impl MountSpec {
    /// The options as the single comma-joined argument given to `mount -o`.
    pub fn joined_options(&self) -> String {
        self.options.join(",")
    }
}

// ---------------------------------------------------------------------------
// Volume snapshots
// ---------------------------------------------------------------------------

/// Point-in-time view of a registered volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Volume name.
    pub name: String,
    /// Local path at which the volume is (or will be) mounted.
    pub mountpoint: PathBuf,
    /// Options recorded at creation time.
    #[serde(default)]
    pub options: VolumeOptions,
    /// Whether the last successful `mount` has not been followed by an
    /// `unmount` yet.
    #[serde(default)]
    pub mounted: bool,
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Scope of the volumes this driver manages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Volumes are visible cluster-wide.
    Global,
    /// Volumes are only visible on this host.
    Local,
}

/// Static capability descriptor advertised to the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capabilities {
    pub scope: Scope,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            scope: Scope::Global,
        }
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Check that `name` can be used as a single path component under the mount
/// root.
pub fn validate_volume_name(name: &str) -> Result<(), VolumeError> {
    if name.is_empty() {
        return Err(VolumeError::configuration("volume name must not be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(VolumeError::Configuration(format!(
            "invalid volume name {name:?}: must be a single path component"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_default_global() {
        let caps = Capabilities::default();
        assert_eq!(caps.scope, Scope::Global);
        assert_eq!(
            serde_json::to_string(&caps).expect("serialize"),
            r#"{"scope":"global"}"#
        );
    }

    #[test]
    fn joined_options() {
        let spec = MountSpec {
            device: "h:/e".into(),
            options: vec!["vers=4".into(), "soft".into(), "timeo=30".into()],
        };
        assert_eq!(spec.joined_options(), "vers=4,soft,timeo=30");
    }

    #[test]
    fn volume_names() {
        assert!(validate_volume_name("db").is_ok());
        assert!(validate_volume_name("my-vol_1.data").is_ok());
        for bad in ["", ".", "..", "a/b", "../etc", "a\\b", "nul\0"] {
            assert!(
                matches!(validate_volume_name(bad), Err(VolumeError::Configuration(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
