//! Platform identification from os-release.
//!
//! # Design
//! - `ID=ubuntu-core` or `VARIANT_ID=core` identifies a device with a managed
//!   boot layout; everything else is classic.
//! - A missing os-release file is treated as a generic classic Linux.
//! - `GADGETD_ON_CLASSIC` overrides detection for tests and development.

use std::fs;
use std::io;

use tracing::debug;

use crate::dirs::Dirs;
use crate::error::{ConfigError, ConfigResult};

/// Environment variable forcing classic (`1`/`true`) or core (`0`/`false`).
pub const ON_CLASSIC_ENV: &str = "GADGETD_ON_CLASSIC";

const DEFAULT_ID: &str = "linux";

/// Identity of the running platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// `ID=` value.
    pub id: String,
    /// `VARIANT_ID=` value when present.
    pub variant_id: Option<String>,
    /// Whether the platform lacks a managed boot layout.
    pub on_classic: bool,
}

impl Release {
    /// Release describing a device with a managed boot layout.
    #[must_use]
    pub fn core() -> Self {
        Self {
            id: "ubuntu-core".to_string(),
            variant_id: None,
            on_classic: false,
        }
    }

    /// Release describing a general-purpose classic system.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            id: "ubuntu".to_string(),
            variant_id: None,
            on_classic: true,
        }
    }

    /// Detect the platform from `dirs.os_release`, honouring `$GADGETD_ON_CLASSIC`.
    ///
    /// # Errors
    ///
    /// Returns an error when os-release cannot be read or the override is invalid.
    pub fn detect(dirs: &Dirs) -> ConfigResult<Self> {
        Self::detect_with(dirs, |name| std::env::var(name).ok())
    }

    /// Detect the platform with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when os-release cannot be read or the override is invalid.
    pub fn detect_with(dirs: &Dirs, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let raw = match fs::read_to_string(&dirs.os_release) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %dirs.os_release.display(), "os-release missing; assuming classic");
                String::new()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    operation: "read_os_release",
                    path: dirs.os_release.clone(),
                    source,
                });
            }
        };
        let mut release = Self::parse(&raw);
        if let Some(value) = lookup(ON_CLASSIC_ENV) {
            release.on_classic = parse_flag(&value)?;
        }
        debug!(
            id = %release.id,
            on_classic = release.on_classic,
            "platform detected"
        );
        Ok(release)
    }

    /// Parse os-release content.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut id = None;
        let mut variant_id = None;
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value.trim());
            match key.trim() {
                "ID" => id = Some(value),
                "VARIANT_ID" => variant_id = Some(value),
                _ => {}
            }
        }
        let id = id.unwrap_or_else(|| DEFAULT_ID.to_string());
        let on_classic = !(id == "ubuntu-core" || variant_id.as_deref() == Some("core"));
        Self {
            id,
            variant_id,
            on_classic,
        }
    }
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .or_else(|| {
            value
                .strip_prefix('\'')
                .and_then(|inner| inner.strip_suffix('\''))
        })
        .unwrap_or(value)
        .to_string()
}

fn parse_flag(value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ConfigError::invalid_env(ON_CLASSIC_ENV, value, "not_boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn dirs_with_os_release(contents: Option<&str>) -> Result<(TempDir, Dirs)> {
        let root = TempDir::new()?;
        let dirs = Dirs::new(root.path());
        if let Some(contents) = contents {
            if let Some(parent) = dirs.os_release.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dirs.os_release, contents)?;
        }
        Ok((root, dirs))
    }

    #[test]
    fn ubuntu_core_is_not_classic() -> Result<()> {
        let (_root, dirs) = dirs_with_os_release(Some("NAME=\"Ubuntu Core\"\nID=ubuntu-core\n"))?;
        let release = Release::detect_with(&dirs, |_| None)?;
        assert_eq!(release.id, "ubuntu-core");
        assert!(!release.on_classic);
        Ok(())
    }

    #[test]
    fn core_variant_is_not_classic() {
        let release = Release::parse("ID=ubuntu\nVARIANT_ID='core'\n");
        assert_eq!(release.variant_id.as_deref(), Some("core"));
        assert!(!release.on_classic);
    }

    #[test]
    fn desktop_and_missing_file_are_classic() -> Result<()> {
        let (_root, dirs) = dirs_with_os_release(Some("# comment\nID=\"ubuntu\"\n"))?;
        assert!(Release::detect_with(&dirs, |_| None)?.on_classic);

        let (_root, dirs) = dirs_with_os_release(None)?;
        let release = Release::detect_with(&dirs, |_| None)?;
        assert_eq!(release.id, "linux");
        assert!(release.on_classic);
        Ok(())
    }

    #[test]
    fn environment_override_wins() -> Result<()> {
        let (_root, dirs) = dirs_with_os_release(Some("ID=ubuntu\n"))?;
        let forced = Release::detect_with(&dirs, |name| {
            (name == ON_CLASSIC_ENV).then(|| "false".to_string())
        })?;
        assert!(!forced.on_classic);

        let invalid = Release::detect_with(&dirs, |_| Some("maybe".to_string()));
        assert!(matches!(
            invalid,
            Err(ConfigError::InvalidEnv {
                name: ON_CLASSIC_ENV,
                reason: "not_boolean",
                ..
            })
        ));
        Ok(())
    }
}
