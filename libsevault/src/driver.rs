//! Volume lifecycle manager.
//!
//! [`VolumeDriver`] owns the table of known volumes and implements
//! [`VolumePlugin`] on top of a [`BackendRegistry`] and a [`CommandRunner`].
//!
//! # Locking
//!
//! The table sits behind a single [`parking_lot::Mutex`].  The guard is only
//! held for table reads and writes, never across an `.await`: directory I/O
//! and the external `mount`/`umount` commands run unlocked, so a hung network
//! share blocks only the request that touched it.
//!
//! # On-disk layout
//!
//! ```text
//! <state_root>/
//!   mounts/
//!     <volume-name>/     # mount point, created on create, deleted on remove
//! ```
//!
//! Volume options are kept in memory only.  After a restart the mount point
//! directories remain but the volumes must be created again.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, BackendRegistry};
use crate::command::CommandRunner;
use crate::config::DriverConfig;
use crate::error::VolumeError;
use crate::plugin::VolumePlugin;
use crate::types::{
    BACKEND_SELECTOR_KEYS, Capabilities, VolumeInfo, VolumeOptions, validate_volume_name,
};

pub const MOUNT_PROGRAM: &str = "mount";
pub const UMOUNT_PROGRAM: &str = "umount";

#[derive(Debug, Clone)]
struct VolumeRecord {
    mount_path: PathBuf,
    options: VolumeOptions,
    /// Selector resolved at creation time.
    backend: String,
    mounted: bool,
}

impl VolumeRecord {
    fn info(&self, name: &str) -> VolumeInfo {
        VolumeInfo {
            name: name.to_owned(),
            mountpoint: self.mount_path.clone(),
            options: self.options.clone(),
            mounted: self.mounted,
        }
    }
}

/// In-memory volume lifecycle manager.
pub struct VolumeDriver {
    config: DriverConfig,
    registry: BackendRegistry,
    runner: Arc<dyn CommandRunner>,
    volumes: Mutex<HashMap<String, VolumeRecord>>,
}

impl VolumeDriver {
    /// Create a driver with an empty volume table.
    ///
    /// Fails if the registry's default selector has no backend.
    pub fn new(
        config: DriverConfig,
        registry: BackendRegistry,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, VolumeError> {
        registry.get(registry.default_selector())?;
        Ok(Self {
            config,
            registry,
            runner,
            volumes: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Backend for a stored selector.  The default backend is used if the
    /// selector is no longer registered, which cannot happen while the
    /// registry stays unchanged after construction.
    fn resolve_backend(
        &self,
        name: &str,
        selector: &str,
    ) -> Result<Arc<dyn Backend>, VolumeError> {
        self.registry.get(selector).or_else(|_| {
            let fallback = self.registry.default_selector();
            warn!(
                volume = %name,
                %selector,
                %fallback,
                "backend not registered, falling back to default"
            );
            self.registry.get(fallback)
        })
    }

    fn set_mounted(&self, name: &str, mounted: bool) {
        if let Some(record) = self.volumes.lock().get_mut(name) {
            record.mounted = mounted;
        }
    }
}

#[async_trait]
impl VolumePlugin for VolumeDriver {
    #[instrument(skip(self, options))]
    async fn create(&self, name: &str, options: VolumeOptions) -> Result<(), VolumeError> {
        validate_volume_name(name)?;

        if self.volumes.lock().contains_key(name) {
            debug!("volume already exists, nothing to do");
            return Ok(());
        }

        let selector = self.registry.select(&options);
        if !BACKEND_SELECTOR_KEYS.iter().any(|key| options.contains_key(*key)) {
            debug!(backend = %selector, "no backend type given, using default");
        }
        let backend = self.registry.get(&selector).inspect_err(|e| {
            warn!(backend = %selector, error = %e, "cannot create volume");
        })?;

        let mount_path = self.config.mount_path(name);
        tokio::fs::create_dir_all(&mount_path)
            .await
            .map_err(|e| VolumeError::Storage {
                path: mount_path.display().to_string(),
                reason: format!("create directory: {e}"),
            })
            .inspect_err(|e| warn!(error = %e, "cannot create mount point"))?;

        let mut volumes = self.volumes.lock();
        match volumes.entry(name.to_owned()) {
            // A concurrent create won the race; its options are kept.
            Entry::Occupied(_) => debug!("volume created concurrently, keeping existing record"),
            Entry::Vacant(slot) => {
                info!(
                    backend = %selector,
                    fs_type = backend.fs_type(),
                    path = %mount_path.display(),
                    "volume created",
                );
                slot.insert(VolumeRecord {
                    mount_path,
                    options,
                    backend: selector,
                    mounted: false,
                });
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, name: &str) -> Result<(), VolumeError> {
        let removed = self.volumes.lock().remove(name);
        let Some(record) = removed else {
            debug!("volume not found, nothing to remove");
            return Ok(());
        };

        let path = &record.mount_path;
        let result = if record.mounted {
            // Never recurse into storage that may still be mounted.
            warn!(path = %path.display(), "volume still marked mounted, removing mount point only");
            tokio::fs::remove_dir(path).await
        } else {
            tokio::fs::remove_dir_all(path).await
        };
        match result {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to delete mount point, forgetting volume anyway"
                );
            }
        }

        info!("volume removed");
        Ok(())
    }

    async fn path(&self, name: &str) -> Result<PathBuf, VolumeError> {
        self.volumes
            .lock()
            .get(name)
            .map(|record| record.mount_path.clone())
            .ok_or_else(|| VolumeError::NotFound(name.to_owned()))
    }

    #[instrument(skip(self))]
    async fn mount(&self, name: &str, id: &str) -> Result<PathBuf, VolumeError> {
        let (mount_path, selector, options) = {
            let volumes = self.volumes.lock();
            let Some(record) = volumes.get(name) else {
                warn!("mount requested for unknown volume");
                return Err(VolumeError::NotFound(name.to_owned()));
            };
            (
                record.mount_path.clone(),
                record.backend.clone(),
                record.options.clone(),
            )
        };

        let backend = self.resolve_backend(name, &selector)?;
        let spec = backend
            .prepare(name, &options)
            .inspect_err(|e| warn!(error = %e, "backend rejected volume options"))?;

        let target = mount_path.to_string_lossy().into_owned();
        let mut args = vec!["-t".to_owned(), backend.fs_type().to_owned()];
        if !spec.options.is_empty() {
            args.push("-o".to_owned());
            args.push(spec.joined_options());
        }
        args.push(spec.device.clone());
        args.push(target.clone());

        info!(fs_type = backend.fs_type(), device = %spec.device, path = %target, "running mount");
        let output = self
            .runner
            .run(MOUNT_PROGRAM, &args)
            .await
            .map_err(|e| VolumeError::MountFailed {
                path: target.clone(),
                reason: format!("failed to run {MOUNT_PROGRAM}: {e}"),
            })?;
        if !output.success {
            let reason = output.describe_failure();
            warn!(path = %target, %reason, "mount failed");
            return Err(VolumeError::MountFailed {
                path: target,
                reason,
            });
        }

        self.set_mounted(name, true);
        info!(path = %target, "volume mounted");
        Ok(mount_path)
    }

    #[instrument(skip(self))]
    async fn unmount(&self, name: &str, id: &str) -> Result<(), VolumeError> {
        validate_volume_name(name)?;
        // Derived from the name alone so that it works without a record.
        let target = self.config.mount_path(name).to_string_lossy().into_owned();

        info!(path = %target, "running umount");
        let output = self
            .runner
            .run(UMOUNT_PROGRAM, std::slice::from_ref(&target))
            .await
            .map_err(|e| VolumeError::UnmountFailed {
                path: target.clone(),
                reason: format!("failed to run {UMOUNT_PROGRAM}: {e}"),
            })?;
        if !output.success {
            let reason = output.describe_failure();
            warn!(path = %target, %reason, "unmount failed");
            return Err(VolumeError::UnmountFailed {
                path: target,
                reason,
            });
        }

        self.set_mounted(name, false);
        info!(path = %target, "volume unmounted");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<VolumeInfo, VolumeError> {
        self.volumes
            .lock()
            .get(name)
            .map(|record| record.info(name))
            .ok_or_else(|| VolumeError::NotFound(name.to_owned()))
    }

    async fn list(&self) -> Result<Vec<VolumeInfo>, VolumeError> {
        let volumes = self.volumes.lock();
        Ok(volumes
            .iter()
            .map(|(name, record)| record.info(name))
            .collect())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}
