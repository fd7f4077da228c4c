//! CIFS/SMB backend.
//!
//! Required keys are `host` and `share`.  Credentials are optional: without
//! a `username` the mount is requested as `guest`.  `vers` defaults to `3.0`
//! and `mount_options` is appended verbatim.

use crate::backend::{Backend, extra_options, missing_options, option};
use crate::error::VolumeError;
use crate::types::{MountSpec, VolumeOptions};

pub const DEFAULT_VERSION: &str = "3.0";

#[derive(Debug, Clone, Copy, Default)]
pub struct CifsBackend;

impl Backend for CifsBackend {
    fn fs_type(&self) -> &str {
        "cifs"
    }

    fn prepare(&self, _volume: &str, options: &VolumeOptions) -> Result<MountSpec, VolumeError> {
        let host = option(options, "host");
        let share = option(options, "share").map(|s| s.trim_start_matches('/'));

        let mut missing = Vec::new();
        if host.is_none() {
            missing.push("host");
        }
        if share.is_none_or(str::is_empty) {
            missing.push("share");
        }
        let (Some(host), Some(share), true) = (host, share, missing.is_empty()) else {
            return Err(missing_options(self.fs_type(), &missing));
        };

        if host.contains(['/', '\\']) || host.contains(char::is_whitespace) {
            return Err(VolumeError::Configuration(format!(
                "cifs option host {host:?} must be a bare host name or address"
            )));
        }

        let vers = option(options, "vers").unwrap_or(DEFAULT_VERSION);
        let username = option(options, "username");
        let password = option(options, "password");
        let domain = option(options, "domain");

        // The option list is split on commas by mount.cifs.
        for (key, value) in [("username", username), ("password", password), ("domain", domain)] {
            if value.is_some_and(|v| v.contains(',')) {
                return Err(VolumeError::Configuration(format!(
                    "cifs option {key} must not contain ','"
                )));
            }
        }

        let mut mount_options = vec![format!("vers={vers}"), "soft".to_owned()];
        match (username, password) {
            (Some(user), pass) => {
                mount_options.push(format!("username={user}"));
                if let Some(pass) = pass {
                    mount_options.push(format!("password={pass}"));
                }
                if let Some(domain) = domain {
                    mount_options.push(format!("domain={domain}"));
                }
            }
            (None, Some(_)) => {
                return Err(VolumeError::configuration(
                    "cifs option password requires username",
                ));
            }
            (None, None) => mount_options.push("guest".to_owned()),
        }
        mount_options.extend(extra_options(options));

        Ok(MountSpec {
            device: format!("//{host}/{share}"),
            options: mount_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> VolumeOptions {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn guest_mount() {
        let spec = CifsBackend
            .prepare("media", &opts(&[("host", "fileserver"), ("share", "/media")]))
            .unwrap();
        assert_eq!(spec.device, "//fileserver/media");
        assert_eq!(spec.options, vec!["vers=3.0", "soft", "guest"]);
    }

    #[test]
    fn credentials() {
        let spec = CifsBackend
            .prepare(
                "home",
                &opts(&[
                    ("host", "10.1.1.1"),
                    ("share", "home"),
                    ("vers", "2.1"),
                    ("username", "alice"),
                    ("password", "s3cret"),
                    ("domain", "CORP"),
                    ("mount_options", "uid=1000"),
                ]),
            )
            .unwrap();
        assert_eq!(spec.device, "//10.1.1.1/home");
        assert_eq!(
            spec.options,
            vec![
                "vers=2.1",
                "soft",
                "username=alice",
                "password=s3cret",
                "domain=CORP",
                "uid=1000"
            ]
        );
    }

    #[test]
    fn missing_fields_are_named() {
        let err = CifsBackend.prepare("x", &opts(&[("share", "/")])).unwrap_err();
        assert_eq!(
            err,
            VolumeError::Configuration("cifs backend requires option(s): host, share".into())
        );
    }

    #[test]
    fn password_without_username() {
        let err = CifsBackend
            .prepare(
                "x",
                &opts(&[("host", "h"), ("share", "s"), ("password", "p")]),
            )
            .unwrap_err();
        assert!(matches!(err, VolumeError::Configuration(m) if m.contains("username")));
    }

    #[test]
    fn comma_in_credentials_rejected() {
        let err = CifsBackend
            .prepare(
                "x",
                &opts(&[("host", "h"), ("share", "s"), ("username", "a,b")]),
            )
            .unwrap_err();
        assert!(matches!(err, VolumeError::Configuration(m) if m.contains("username")));
    }
}
