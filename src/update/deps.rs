//! Post-install dependency step (`<binary> install-deps`).

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

pub trait DependencyRunner {
    /// Run `command`, returning whether it exited successfully.
    fn run(&self, command: &[String]) -> io::Result<bool>;
}

/// Runs the command with the terminal's stdio so output streams live.
pub struct StreamingRunner;

impl DependencyRunner for StreamingRunner {
    fn run(&self, command: &[String]) -> io::Result<bool> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(status.success())
    }
}

/// `install-deps` is always CPU-only on Windows-class hosts.
pub fn dependency_command(binary: &Path, cpu_only: bool, windows: bool) -> Vec<String> {
    let mut cmd = vec![binary.display().to_string(), "install-deps".to_string()];
    if cpu_only || windows {
        cmd.push("--cpu-only".to_string());
    }
    cmd
}
