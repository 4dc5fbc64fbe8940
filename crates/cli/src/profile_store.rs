//! Named connection profiles persisted as TOML under the user's config dir.
//!
//! The file holds defaults for the global flags. It is written atomically and
//! kept owner-only; a group or world readable file is refused on load.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStore {
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// `$XDG_CONFIG_HOME/connctl/config.toml`, else `~/.config/connctl/config.toml`.
pub fn config_path() -> anyhow::Result<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) => PathBuf::from(xdg),
        None => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .ok_or_else(|| anyhow::anyhow!("neither XDG_CONFIG_HOME nor HOME is set"))?,
    };
    Ok(base.join("connctl").join("config.toml"))
}

impl ProfileStore {
    pub fn path() -> anyhow::Result<PathBuf> {
        config_path()
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    /// A missing file is an empty store.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        perms::ensure_owner_only(path)?;
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read profiles from {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse profiles in {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("profile path {} has no parent", path.display()))?;
        fs::create_dir_all(dir)?;
        perms::restrict(dir, 0o700)?;

        let rendered = toml::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        perms::restrict(tmp.path(), 0o600)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path)
            .with_context(|| format!("failed to write profiles to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(unix)]
mod perms {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    pub fn restrict(path: &Path, mode: u32) -> anyhow::Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    pub fn ensure_owner_only(path: &Path) -> anyhow::Result<()> {
        let mode = fs::metadata(path)?.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            anyhow::bail!(
                "profile config is too permissive (mode {mode:o}); run: chmod 600 {}",
                path.display()
            );
        }
        Ok(())
    }
}

#[cfg(not(unix))]
mod perms {
    use std::path::Path;

    pub fn restrict(_path: &Path, _mode: u32) -> anyhow::Result<()> {
        Ok(())
    }

    pub fn ensure_owner_only(_path: &Path) -> anyhow::Result<()> {
        Ok(())
    }
}
