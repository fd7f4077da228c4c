//! Docker volume-plugin protocol messages.
//!
//! Requests arrive as `POST /<Endpoint>` with a JSON body; every response is
//! JSON.  Field names follow the host's PascalCase convention.  Failed calls
//! answer with [`ErrorResponse`] only.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{Capabilities, Scope, VolumeInfo};

/// Content type the host expects on every plugin response.
pub const PLUGIN_CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1.1+json";

/// Protocol endpoints served by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Activate,
    Create,
    Remove,
    Mount,
    Path,
    Unmount,
    Get,
    List,
    Capabilities,
}

impl Endpoint {
    pub const ALL: [Endpoint; 9] = [
        Self::Activate,
        Self::Create,
        Self::Remove,
        Self::Mount,
        Self::Path,
        Self::Unmount,
        Self::Get,
        Self::List,
        Self::Capabilities,
    ];

    /// HTTP path of the endpoint.
    pub fn path(self) -> &'static str {
        match self {
            Self::Activate => "/Plugin.Activate",
            Self::Create => "/VolumeDriver.Create",
            Self::Remove => "/VolumeDriver.Remove",
            Self::Mount => "/VolumeDriver.Mount",
            Self::Path => "/VolumeDriver.Path",
            Self::Unmount => "/VolumeDriver.Unmount",
            Self::Get => "/VolumeDriver.Get",
            Self::List => "/VolumeDriver.List",
            Self::Capabilities => "/VolumeDriver.Capabilities",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.path() == path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `/VolumeDriver.Create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRequest {
    pub name: String,
    /// The host sends `null` when no `-o` options were given.
    #[serde(default)]
    pub opts: Option<HashMap<String, String>>,
}

/// Body of `/VolumeDriver.Remove`, `/VolumeDriver.Path` and
/// `/VolumeDriver.Get`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameRequest {
    pub name: String,
}

/// Body of `/VolumeDriver.Mount` and `/VolumeDriver.Unmount`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountRequest {
    pub name: String,
    /// Unique ID of the attaching caller.
    #[serde(rename = "ID", default)]
    pub id: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    pub implements: Vec<String>,
}

impl Default for ActivateResponse {
    fn default() -> Self {
        Self {
            implements: vec!["VolumeDriver".to_owned()],
        }
    }
}

/// Success body for calls that return nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountpointResponse {
    pub mountpoint: PathBuf,
}

/// Volume description as the host sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireVolume {
    pub name: String,
    pub mountpoint: PathBuf,
    /// Creation options of the volume.
    #[serde(default)]
    pub status: HashMap<String, String>,
}

impl From<VolumeInfo> for WireVolume {
    fn from(info: VolumeInfo) -> Self {
        Self {
            name: info.name,
            mountpoint: info.mountpoint,
            status: info.options,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResponse {
    pub volume: WireVolume,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResponse {
    pub volumes: Vec<WireVolume>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireCapability {
    /// `"global"` or `"local"`.
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    pub capabilities: WireCapability,
}

impl From<Capabilities> for CapabilitiesResponse {
    fn from(caps: Capabilities) -> Self {
        let scope = match caps.scope {
            Scope::Global => "global",
            Scope::Local => "local",
        };
        Self {
            capabilities: WireCapability {
                scope: scope.to_owned(),
            },
        }
    }
}

/// Body of every failed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub err: String,
}

impl ErrorResponse {
    pub fn new(err: impl fmt::Display) -> Self {
        Self {
            err: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_null_opts() {
        let req: CreateRequest =
            serde_json::from_str(r#"{"Name":"db","Opts":null}"#).expect("deserialize");
        assert_eq!(req.name, "db");
        assert!(req.opts.is_none());

        let req: CreateRequest = serde_json::from_str(
            r#"{"Name":"db","Opts":{"host":"10.0.0.5","export":"/srv/db"}}"#,
        )
        .expect("deserialize");
        assert_eq!(req.opts.unwrap()["export"], "/srv/db");
    }

    #[test]
    fn mount_request_id_field() {
        let req: MountRequest =
            serde_json::from_str(r#"{"Name":"db","ID":"abc123"}"#).expect("deserialize");
        assert_eq!(req.id, "abc123");
    }

    #[test]
    fn response_field_names() {
        let json = serde_json::to_value(ActivateResponse::default()).unwrap();
        assert_eq!(json, serde_json::json!({"Implements": ["VolumeDriver"]}));

        let json =
            serde_json::to_value(CapabilitiesResponse::from(Capabilities::default())).unwrap();
        assert_eq!(json, serde_json::json!({"Capabilities": {"Scope": "global"}}));

        let json = serde_json::to_value(ErrorResponse::new("volume db not found")).unwrap();
        assert_eq!(json, serde_json::json!({"Err": "volume db not found"}));

        let json = serde_json::to_value(EmptyResponse::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn endpoint_paths() {
        for endpoint in Endpoint::ALL {
            assert_eq!(Endpoint::from_path(endpoint.path()), Some(endpoint));
        }
        assert_eq!(Endpoint::from_path("/VolumeDriver.Frobnicate"), None);
        assert_eq!(Endpoint::Mount.to_string(), "VolumeDriver.Mount");
    }
}
