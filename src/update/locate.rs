//! Discovery of existing installations and their versions.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::version::VersionTuple;

const WINDOWS_WRAPPERS: &[&str] = &["cmd", "bat", "exe"];
const POLL_INTERVAL: Duration = Duration::from_millis(25);
const ETXTBSY: i32 = 26;

/// One executable found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledInstance {
    pub path: PathBuf,
    pub version: VersionTuple,
}

/// Asks an installed binary for its version.
pub trait VersionProbe {
    /// Never fails: anything that goes wrong yields [`VersionTuple::UNKNOWN`].
    fn probe(&self, path: &Path) -> VersionTuple;
}

/// Runs `<path> version` with a deadline.
pub struct CommandVersionProbe {
    pub timeout: Duration,
}

impl VersionProbe for CommandVersionProbe {
    fn probe(&self, path: &Path) -> VersionTuple {
        match run_with_timeout(path, &["version"], self.timeout) {
            Some(output) => VersionTuple::find_in(&output).unwrap_or_else(|| {
                log::debug!("{}: no version in output {:?}", path.display(), output.trim());
                VersionTuple::UNKNOWN
            }),
            None => VersionTuple::UNKNOWN,
        }
    }
}

/// Run a command and return combined stdout+stderr, or None on spawn
/// failure or timeout. A timed-out child is killed.
///
/// The deadline also covers draining the pipes: a background process that
/// inherited them can hold them open after the child itself has exited.
fn run_with_timeout(program: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = match spawn_piped(program, args) {
        Ok(child) => child,
        Err(e) => {
            log::debug!("could not run {}: {}", program.display(), e);
            return None;
        }
    };

    // Drain both pipes on their own threads so a chatty child cannot block.
    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(out) = child.stdout.take() {
        spawn_reader(out, 0, tx.clone());
        pending += 1;
    }
    if let Some(err) = child.stderr.take() {
        spawn_reader(err, 1, tx.clone());
        pending += 1;
    }
    drop(tx);

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if start.elapsed() >= timeout => {
                log::warn!(
                    "{} did not report a version within {}s",
                    program.display(),
                    timeout.as_secs_f32()
                );
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                log::debug!("waiting on {} failed: {}", program.display(), e);
                return None;
            }
        }
    }

    let mut parts = [String::new(), String::new()];
    while pending > 0 {
        let remaining = timeout.saturating_sub(start.elapsed());
        match rx.recv_timeout(remaining) {
            Ok((index, text)) => {
                parts[index] = text;
                pending -= 1;
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{} kept its output open past {}s",
                    program.display(),
                    timeout.as_secs_f32()
                );
                return None;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Some(parts.concat())
}

fn spawn_piped(program: &Path, args: &[&str]) -> std::io::Result<Child> {
    let mut attempts = 0;
    loop {
        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        match result {
            // ETXTBSY: a just-written executable may still be open for writing elsewhere.
            Err(e) if e.raw_os_error() == Some(ETXTBSY) && attempts < 3 => {
                attempts += 1;
                thread::sleep(POLL_INTERVAL);
            }
            other => return other,
        }
    }
}

/// Read `pipe` to EOF on a detached thread and send the text tagged with `index`.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R, index: usize, tx: Sender<(usize, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((index, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Finds installs of `binary_name` on `PATH` and in fixed directories.
pub struct InstallLocator<'a> {
    pub binary_name: String,
    pub search_dirs: Vec<PathBuf>,
    /// `PATH` value to resolve against; `None` skips PATH lookup.
    pub path_var: Option<OsString>,
    /// Also look for `.cmd`/`.bat`/`.exe` wrappers.
    pub windows: bool,
    pub probe: &'a dyn VersionProbe,
}

impl InstallLocator<'_> {
    /// Every install found, in discovery order, each with its probed version.
    pub fn locate(&self) -> Vec<InstalledInstance> {
        self.discover()
            .into_iter()
            .map(|path| {
                let version = self.probe.probe(&path);
                log::debug!("found {} (version {})", path.display(), version);
                InstalledInstance { path, version }
            })
            .collect()
    }

    /// Absolute paths of matching executables, deduplicated, discovery order kept.
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = Vec::new();
        let mut push = |path: PathBuf| {
            let path = std::path::absolute(&path).unwrap_or(path);
            if !found.contains(&path) {
                found.push(path);
            }
        };

        if let Some(path_var) = &self.path_var {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            match which::which_in_all(&self.binary_name, Some(path_var), cwd) {
                Ok(paths) => paths.for_each(&mut push),
                Err(e) => log::debug!("PATH lookup for {}: {}", self.binary_name, e),
            }
        }

        for dir in &self.search_dirs {
            let candidate = dir.join(&self.binary_name);
            if candidate.is_file() {
                push(candidate.clone());
            }
            if self.windows {
                for ext in WINDOWS_WRAPPERS {
                    let wrapper = candidate.with_extension(ext);
                    if wrapper.is_file() {
                        push(wrapper);
                    }
                }
            }
        }

        found
    }
}
