//! Installer configuration.
//!
//! Read from `config.toml` in the config directory, or from the file named by
//! `AI_INSTALLER_CONFIG`. Every field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::host::{config_dir, expand_tilde};
use crate::update::{UpdateError, UpdateResult};

pub const CONFIG_ENV: &str = "AI_INSTALLER_CONFIG";

/// Accepted range for `probe_timeout_secs`.
const PROBE_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=9;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Repository holding the release artifacts
    pub repo_url: String,

    /// Branch to clone
    pub branch: String,

    /// Name of the installed executable
    pub binary_name: String,

    /// Artifact file names start with this
    pub artifact_prefix: String,

    /// Install root; the binary goes in `<prefix>/bin`
    pub prefix: PathBuf,

    /// Directories searched for existing installs, after `PATH`
    pub search_paths: Vec<PathBuf>,

    /// Plain-text file holding the latest published version
    pub version_url: Option<String>,

    /// Seconds to wait for `<binary> version`
    pub probe_timeout_secs: u64,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            repo_url: "https://github.com/minerofthesoal/ai-cli.git".to_string(),
            branch: "claude/cpu-windows-llm-api-uiTei".to_string(),
            binary_name: "ai".to_string(),
            artifact_prefix: "main-v".to_string(),
            prefix: PathBuf::from("/usr/local"),
            search_paths: [
                "/usr/local/bin",
                "/usr/bin",
                "/opt/local/bin",
                "~/.local/bin",
                "~/bin",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            version_url: None,
            probe_timeout_secs: 5,
        }
    }
}

impl InstallerConfig {
    /// Load from `explicit`, else the default location. A missing file gives
    /// defaults; only an explicitly named file must exist.
    pub fn load(explicit: Option<&Path>) -> UpdateResult<Self> {
        match explicit {
            Some(path) => Self::load_from(path, true),
            None => {
                let path = config_path()?;
                Self::load_from(&path, false)
            }
        }
    }

    pub fn load_from(path: &Path, required: bool) -> UpdateResult<Self> {
        if !path.exists() {
            if required {
                return Err(UpdateError::Config(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| UpdateError::Config(format!("read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| UpdateError::Config(format!("parse {}: {}", path.display(), e)))?;
        if !PROBE_TIMEOUT_RANGE.contains(&config.probe_timeout_secs) {
            return Err(UpdateError::Config(format!(
                "{}: probe_timeout_secs must be between {} and {}, got {}",
                path.display(),
                PROBE_TIMEOUT_RANGE.start(),
                PROBE_TIMEOUT_RANGE.end(),
                config.probe_timeout_secs
            )));
        }
        Ok(config.expanded())
    }

    fn expanded(mut self) -> Self {
        self.prefix = expand_tilde(&self.prefix);
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Search directories with `~` expanded and `<prefix>/bin` appended.
    pub fn search_dirs(&self, prefix: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.search_paths.iter().map(|p| expand_tilde(p)).collect();
        let bin = prefix.join("bin");
        if !dirs.contains(&bin) {
            dirs.push(bin);
        }
        dirs
    }
}

/// `$AI_INSTALLER_CONFIG`, else `config.toml` in the config directory.
pub fn config_path() -> UpdateResult<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let dir = config_dir().map_err(|e| UpdateError::Config(e.to_string()))?;
    Ok(dir.join("config.toml"))
}
