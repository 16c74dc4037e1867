use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

pub fn home_dir() -> Option<PathBuf> {
    env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| env::var("USERPROFILE").ok().map(PathBuf::from))
}

/// Get the configuration directory for ai-installer.
pub fn config_dir() -> Result<PathBuf> {
    let dir = if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("ai-installer")
    } else if let Some(home) = home_dir() {
        if cfg!(target_os = "macos") {
            home.join("Library").join("Application Support").join("ai-installer")
        } else if cfg!(target_os = "windows") {
            home.join("AppData").join("Roaming").join("ai-installer")
        } else {
            home.join(".config").join("ai-installer")
        }
    } else {
        bail!("Cannot determine config directory");
    };

    Ok(dir)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Windows, or a MinGW/MSYS shell on Windows.
pub fn is_windows() -> bool {
    cfg!(target_os = "windows") || env::var("MSYSTEM").is_ok_and(|m| m.contains("MINGW"))
}

pub fn is_wsl() -> bool {
    if cfg!(target_os = "linux") {
        if let Ok(version) = std::fs::read_to_string("/proc/version") {
            let lower = version.to_lowercase();
            return lower.contains("microsoft") || lower.contains("wsl");
        }
    }
    false
}

pub fn command_exists(name: &str) -> bool {
    which::which(name).is_ok()
}

/// True when running as root, where privilege escalation is pointless.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        unsafe extern "C" {
            fn geteuid() -> u32;
        }
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Whether a `sudo` retry is available for permission failures.
pub fn can_escalate() -> bool {
    !is_windows() && !is_elevated() && command_exists("sudo")
}
