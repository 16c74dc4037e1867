//! Filesystem mutations, retried with `sudo` on permission errors.
//!
//! Dry-run is not handled here: callers skip these calls entirely.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::process::{Command, Stdio};

/// The operations that change the host.
pub trait Mutator {
    /// Remove one installed file.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Copy `artifact` to `dest` (creating the parent) and make it executable.
    fn install(&self, artifact: &Path, dest: &Path) -> io::Result<()>;

    /// Write a small text file such as a `.cmd` wrapper.
    fn write_text(&self, dest: &Path, contents: &str) -> io::Result<()>;
}

/// Real filesystem, with one elevated retry when permission is denied.
pub struct HostMutator {
    /// Whether `sudo` may be used for the retry.
    pub escalate: bool,
}

impl HostMutator {
    fn elevated(&self, err: io::Error, steps: &[Vec<&str>]) -> io::Result<()> {
        if !self.escalate || err.kind() != ErrorKind::PermissionDenied {
            return Err(err);
        }
        log::info!("permission denied ({}); retrying with sudo", err);
        for args in steps {
            run_sudo(args)?;
        }
        Ok(())
    }
}

impl Mutator for HostMutator {
    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                let p = path.to_string_lossy();
                self.elevated(e, &[vec!["rm", "-f", &*p]])
            }
        }
    }

    fn install(&self, artifact: &Path, dest: &Path) -> io::Result<()> {
        match copy_executable(artifact, dest) {
            Ok(()) => Ok(()),
            Err(e) => {
                let src = artifact.to_string_lossy();
                let dst = dest.to_string_lossy();
                let dir = dest
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|| ".".to_string());
                self.elevated(
                    e,
                    &[
                        vec!["mkdir", "-p", dir.as_str()],
                        vec!["cp", &*src, &*dst],
                        vec!["chmod", "755", &*dst],
                    ],
                )
            }
        }
    }

    fn write_text(&self, dest: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, contents)
    }
}

fn copy_executable(artifact: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(artifact, dest)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(dest)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        fs::set_permissions(dest, perms)?;
    }

    Ok(())
}

fn run_sudo(args: &[&str]) -> io::Result<()> {
    log::debug!("sudo {}", args.join(" "));
    let status = Command::new("sudo")
        .args(args)
        .stdin(Stdio::inherit())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            ErrorKind::PermissionDenied,
            format!("sudo {} exited with {}", args.join(" "), status),
        ))
    }
}
