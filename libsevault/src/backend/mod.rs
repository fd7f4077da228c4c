//! Pluggable storage backends.
//!
//! A [`Backend`] turns a volume's creation options into a [`MountSpec`] for
//! one filesystem type.  Backends hold no state and perform no I/O, so the
//! same options always yield the same spec and validation errors surface
//! before any mount is attempted.
//!
//! The [`BackendRegistry`] maps a selector string (`"nfs"`, `"cifs"`, ...)
//! to a backend.  It is built once at startup and only read afterwards.

pub mod cifs;
pub mod nfs;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::VolumeError;
use crate::types::{BACKEND_SELECTOR_KEYS, MountSpec, VolumeOptions};

pub use cifs::CifsBackend;
pub use nfs::NfsBackend;

/// Option key holding extra comma-separated mount options appended verbatim.
pub const EXTRA_OPTIONS_KEY: &str = "mount_options";

/// A storage technology able to describe how a volume is mounted.
pub trait Backend: Send + Sync {
    /// Filesystem type passed to `mount -t`.
    fn fs_type(&self) -> &str;

    /// Derive the device locator and mount options for `volume`.
    ///
    /// Keys the backend does not understand are ignored.  Missing or
    /// malformed keys yield [`VolumeError::Configuration`] naming the
    /// offending fields.
    fn prepare(&self, volume: &str, options: &VolumeOptions) -> Result<MountSpec, VolumeError>;
}

/// Look up `key`, treating blank values as absent.
pub(crate) fn option<'a>(options: &'a VolumeOptions, key: &str) -> Option<&'a str> {
    options
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Split the [`EXTRA_OPTIONS_KEY`] value into individual mount options.
pub(crate) fn extra_options(options: &VolumeOptions) -> Vec<String> {
    option(options, EXTRA_OPTIONS_KEY)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Build the error reported when required keys are absent.
pub(crate) fn missing_options(fs_type: &str, missing: &[&str]) -> VolumeError {
    VolumeError::Configuration(format!(
        "{fs_type} backend requires option(s): {}",
        missing.join(", ")
    ))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Selector → backend mapping with a configured default selector.
#[derive(Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
    default_selector: String,
}

impl BackendRegistry {
    /// An empty registry whose fallback selector is `default_selector`.
    pub fn new(default_selector: impl Into<String>) -> Self {
        Self {
            backends: HashMap::new(),
            default_selector: default_selector.into(),
        }
    }

    /// A registry with every bundled backend (`nfs`, `cifs`) registered.
    pub fn builtin(default_selector: impl Into<String>) -> Self {
        Self::new(default_selector)
            .with("nfs", Arc::new(NfsBackend))
            .with("cifs", Arc::new(CifsBackend))
    }

    /// Builder-style [`Self::register`].
    pub fn with(mut self, selector: impl Into<String>, backend: Arc<dyn Backend>) -> Self {
        self.register(selector, backend);
        self
    }

    /// Register `backend` under `selector`, replacing any previous entry.
    pub fn register(&mut self, selector: impl Into<String>, backend: Arc<dyn Backend>) {
        self.backends.insert(selector.into(), backend);
    }

    /// Resolve a selector to its backend.
    pub fn get(&self, selector: &str) -> Result<Arc<dyn Backend>, VolumeError> {
        self.backends
            .get(selector)
            .cloned()
            .ok_or_else(|| VolumeError::Configuration(format!("backend type {selector} not found")))
    }

    /// Pick the selector named by the volume's `type` or `backend` option,
    /// falling back to the default selector.
    pub fn select(&self, options: &VolumeOptions) -> String {
        BACKEND_SELECTOR_KEYS
            .iter()
            .find_map(|key| option(options, key))
            .unwrap_or(self.default_selector.as_str())
            .to_owned()
    }

    /// Selector used when a volume names no backend.
    pub fn default_selector(&self) -> &str {
        &self.default_selector
    }

    /// Registered selectors, sorted.
    pub fn selectors(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.selectors())
            .field("default_selector", &self.default_selector)
            .finish()
    }
}
