//! Volume plugin service trait.
//!
//! [`VolumePlugin`] is the lifecycle surface the transport dispatches to.  It
//! mirrors the host's volume-driver protocol one method per request.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::VolumeError;
use crate::types::{Capabilities, VolumeInfo};

/// Named-volume lifecycle operations.
///
/// Implementations must be safe to call concurrently: the transport issues
/// one call per incoming request without serializing them.
#[async_trait]
pub trait VolumePlugin: Send + Sync {
    /// Register a volume.  Creating a known name succeeds without changes.
    async fn create(&self, name: &str, options: HashMap<String, String>) -> Result<(), VolumeError>;

    /// Forget a volume and delete its mount point.  Unknown names succeed.
    async fn remove(&self, name: &str) -> Result<(), VolumeError>;

    /// Mount path of a registered volume.
    async fn path(&self, name: &str) -> Result<PathBuf, VolumeError>;

    /// Mount the volume's storage and return its mount path.
    ///
    /// `id` identifies the attaching client; it is informational only.
    async fn mount(&self, name: &str, id: &str) -> Result<PathBuf, VolumeError>;

    /// Unmount whatever is mounted at the volume's path.
    async fn unmount(&self, name: &str, id: &str) -> Result<(), VolumeError>;

    /// Path and options of a registered volume.
    async fn get(&self, name: &str) -> Result<VolumeInfo, VolumeError>;

    /// All registered volumes, in no particular order.
    async fn list(&self) -> Result<Vec<VolumeInfo>, VolumeError>;

    /// Static capability descriptor.
    fn capabilities(&self) -> Capabilities;
}
