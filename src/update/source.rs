//! Artifact providers: where candidate builds come from.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tempfile::TempDir;

use super::selector::{ArtifactName, BuildCandidate};
use super::{UpdateError, UpdateResult};
use crate::host::command_exists;

const GIT_INSTALL_HINT: &str = "  Arch:   sudo pacman -S git\n  \
                                Ubuntu: sudo apt install git\n  \
                                macOS:  brew install git";

/// Something that yields a directory of candidate builds.
pub trait ArtifactSource {
    fn fetch(&self) -> UpdateResult<ArtifactTree>;

    /// Human-readable origin for headers and logs.
    fn describe(&self) -> String;
}

/// A directory of artifacts. A fetched tree owns its temporary directory and
/// removes it when dropped.
#[derive(Debug)]
pub struct ArtifactTree {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl ArtifactTree {
    /// Wrap an existing directory that must not be deleted.
    pub fn borrowed(root: PathBuf) -> Self {
        Self { root, temp: None }
    }

    /// A tree at `root` inside `temp`, removed with it.
    pub fn scoped(temp: TempDir, root: PathBuf) -> Self {
        Self {
            root,
            temp: Some(temp),
        }
    }

    /// Regular files whose names start with `prefix`, as build candidates.
    pub fn candidates(&self, prefix: &str) -> UpdateResult<Vec<BuildCandidate>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let ArtifactName::Candidate(candidate) = ArtifactName::parse(prefix, &name) {
                out.push(candidate);
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    pub fn path_of(&self, candidate: &BuildCandidate) -> PathBuf {
        self.root.join(&candidate.name)
    }

    /// Stop the temporary directory from being cleaned up.
    pub fn keep(mut self) -> PathBuf {
        if let Some(temp) = self.temp.take() {
            let _ = temp.keep();
        }
        self.root.clone()
    }
}

/// A local directory of artifacts, used as-is.
pub struct LocalSource {
    pub dir: PathBuf,
}

impl ArtifactSource for LocalSource {
    fn fetch(&self) -> UpdateResult<ArtifactTree> {
        if !self.dir.is_dir() {
            return Err(UpdateError::Fetch(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        Ok(ArtifactTree::borrowed(self.dir.clone()))
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Shallow clone of one branch of a git repository into a temp directory.
pub struct GitSource {
    pub url: String,
    pub branch: String,
}

impl ArtifactSource for GitSource {
    fn fetch(&self) -> UpdateResult<ArtifactTree> {
        if !command_exists("git") {
            return Err(UpdateError::ToolMissing {
                tool: "git",
                hint: GIT_INSTALL_HINT.to_string(),
            });
        }

        let temp = tempfile::Builder::new().prefix("ai-cli-install-").tempdir()?;
        let dest = temp.path().join("ai-cli");

        log::debug!("git clone --depth=1 --branch {} {}", self.branch, self.url);
        let pb = create_spinner(&format!("Cloning {} (branch: {})", self.url, self.branch));
        let output = Command::new("git")
            .args(["clone", "--depth=1", "--branch", &self.branch, &self.url])
            .arg(&dest)
            .stdin(Stdio::null())
            .output();
        pb.finish_and_clear();

        let output = output?;
        if !output.status.success() {
            return Err(UpdateError::Fetch(format!(
                "git clone exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(ArtifactTree::scoped(temp, dest))
    }

    fn describe(&self) -> String {
        format!("{} (branch: {})", self.url, self.branch)
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("[ai-installer] {spinner} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
