//! NFS backend.
//!
//! | Key | Required | Default | Notes |
//! |---|---|---|---|
//! | `host` | yes | | server name or address |
//! | `export` | yes | | absolute export path |
//! | `vers` | no | `4` | protocol version |
//! | `timeo` | no | `30` | retransmission timeout, deciseconds |
//! | `hard` | no | `false` | `true` requests a hard mount instead of soft |
//! | `mount_options` | no | | extra comma-separated options |
//!
//! Mounts are soft with a bounded timeout by default so that a dead server
//! fails requests instead of hanging them indefinitely.

use crate::backend::{Backend, extra_options, missing_options, option};
use crate::error::VolumeError;
use crate::types::{MountSpec, VolumeOptions};

pub const DEFAULT_VERSION: &str = "4";
pub const DEFAULT_TIMEO: &str = "30";

/// Stateless NFS option translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NfsBackend;

impl Backend for NfsBackend {
    fn fs_type(&self) -> &str {
        "nfs"
    }

    fn prepare(&self, _volume: &str, options: &VolumeOptions) -> Result<MountSpec, VolumeError> {
        let host = option(options, "host");
        let export = option(options, "export");

        let (host, export) = match (host, export) {
            (Some(h), Some(e)) => (h, e),
            (h, e) => {
                let mut missing = Vec::new();
                if h.is_none() {
                    missing.push("host");
                }
                if e.is_none() {
                    missing.push("export");
                }
                return Err(missing_options(self.fs_type(), &missing));
            }
        };

        if host.contains(char::is_whitespace) {
            return Err(VolumeError::Configuration(format!(
                "nfs option host {host:?} must not contain whitespace"
            )));
        }
        if !export.starts_with('/') {
            return Err(VolumeError::Configuration(format!(
                "nfs option export {export:?} must be an absolute path"
            )));
        }

        let vers = option(options, "vers").unwrap_or(DEFAULT_VERSION);
        if !vers.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(VolumeError::Configuration(format!(
                "nfs option vers {vers:?} must be a version number"
            )));
        }

        let timeo = option(options, "timeo").unwrap_or(DEFAULT_TIMEO);
        if !matches!(timeo.parse::<u32>(), Ok(t) if t > 0) {
            return Err(VolumeError::Configuration(format!(
                "nfs option timeo {timeo:?} must be a positive integer"
            )));
        }

        let mode = match option(options, "hard") {
            None | Some("false") => "soft",
            Some("true") => "hard",
            Some(other) => {
                return Err(VolumeError::Configuration(format!(
                    "nfs option hard {other:?} must be \"true\" or \"false\""
                )));
            }
        };

        let mut mount_options = vec![
            format!("vers={vers}"),
            mode.to_owned(),
            format!("timeo={timeo}"),
        ];
        mount_options.extend(extra_options(options));

        Ok(MountSpec {
            device: format!("{host}:{export}"),
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
    fn defaults_applied() {
        let spec = NfsBackend
            .prepare("db", &opts(&[("host", "10.0.0.5"), ("export", "/srv/db")]))
            .unwrap();
        assert_eq!(spec.device, "10.0.0.5:/srv/db");
        assert_eq!(spec.options, vec!["vers=4", "soft", "timeo=30"]);
    }

    #[test]
    fn overrides_and_extras() {
        let spec = NfsBackend
            .prepare(
                "db",
                &opts(&[
                    ("host", "nas"),
                    ("export", "/srv/db"),
                    ("vers", "4.1"),
                    ("timeo", "600"),
                    ("hard", "true"),
                    ("mount_options", "noatime,nolock"),
                    ("type", "nfs"),
                    ("unrelated", "ignored"),
                ]),
            )
            .unwrap();
        assert_eq!(spec.device, "nas:/srv/db");
        assert_eq!(
            spec.options,
            vec!["vers=4.1", "hard", "timeo=600", "noatime", "nolock"]
        );
    }

    #[test]
    fn missing_fields_are_named() {
        let err = NfsBackend
            .prepare("x", &opts(&[("export", "/srv/x")]))
            .unwrap_err();
        assert!(matches!(
            &err,
            VolumeError::Configuration(m) if m.contains("host") && !m.contains("export")
        ));

        let err = NfsBackend.prepare("x", &opts(&[])).unwrap_err();
        assert_eq!(
            err,
            VolumeError::Configuration("nfs backend requires option(s): host, export".into())
        );
    }

    #[test]
    fn malformed_fields_rejected() {
        for (key, value) in [
            ("export", "srv/x"),
            ("host", "bad host"),
            ("vers", "four"),
            ("timeo", "0"),
            ("timeo", "-1"),
            ("hard", "yes"),
        ] {
            let mut o = opts(&[("host", "nas"), ("export", "/srv/x")]);
            o.insert(key.to_owned(), value.to_owned());
            let err = NfsBackend.prepare("x", &o).unwrap_err();
            assert!(
                matches!(&err, VolumeError::Configuration(m) if m.contains(key)),
                "{key}={value} gave {err}"
            );
        }
    }

    #[test]
    fn prepare_is_deterministic() {
        let o = opts(&[
            ("host", "10.0.0.5"),
            ("export", "/srv/db"),
            ("mount_options", "ro"),
        ]);
        let first = NfsBackend.prepare("db", &o).unwrap();
        for _ in 0..16 {
            assert_eq!(NfsBackend.prepare("db", &o).unwrap(), first);
        }
    }
}
