//! Volume driver error types.
//!
//! Every fallible operation in `libsevault` returns a [`VolumeError`].  The
//! variants follow the driver's error taxonomy: configuration problems,
//! unknown volumes, local storage failures, and failures reported by the
//! external `mount`/`umount` commands.

use thiserror::Error;

/// Unified error type for volume lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VolumeError {
    /// Invalid or missing volume/backend options, or an unknown backend.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The operation referenced a volume name that is not registered.
    #[error("volume {0} not found")]
    NotFound(String),

    /// A local filesystem operation (directory create/remove) failed.
    #[error("storage error at {path}: {reason}")]
    Storage {
        /// Path the operation was applied to.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// The `mount` command failed.  `reason` carries the command's output.
    #[error("mount failed at {path}: {reason}")]
    MountFailed {
        /// Target mount path.
        path: String,
        /// Failure reason including the command's diagnostic output.
        reason: String,
    },

    /// The `umount` command failed.  `reason` carries the command's output.
    #[error("unmount failed at {path}: {reason}")]
    UnmountFailed {
        /// Target mount path.
        path: String,
        /// Failure reason including the command's diagnostic output.
        reason: String,
    },

    /// A plugin-socket / wire-level error.
    #[error("transport error: {0}")]
    Transport(String),
}

impl VolumeError {
    /// Create a [`VolumeError::Configuration`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn configuration<E: std::fmt::Display>(e: E) -> Self {
        Self::Configuration(e.to_string())
    }

    /// Create a [`VolumeError::Transport`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn transport<E: std::fmt::Display>(e: E) -> Self {
        Self::Transport(e.to_string())
    }

    /// Whether this error came from the `mount`/`umount` collaborator.
    pub fn is_mount_error(&self) -> bool {
        matches!(self, Self::MountFailed { .. } | Self::UnmountFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = VolumeError::NotFound("db".into());
        assert_eq!(err.to_string(), "volume db not found");

        let err = VolumeError::MountFailed {
            path: "/var/lib/sevault/mounts/db".into(),
            reason: "exit status 32: Connection timed out".into(),
        };
        assert_eq!(
            err.to_string(),
            "mount failed at /var/lib/sevault/mounts/db: exit status 32: Connection timed out"
        );
    }

    #[test]
    fn mount_error_classification() {
        assert!(
            VolumeError::UnmountFailed {
                path: "/mnt".into(),
                reason: "busy".into()
            }
            .is_mount_error()
        );
        assert!(!VolumeError::configuration("missing host").is_mount_error());
    }
}
