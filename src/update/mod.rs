//! Install/update engine: version resolution, build selection, and the
//! uninstall-then-install transition.

pub mod decision;
pub mod deps;
pub mod locate;
pub mod mutate;
pub mod remote;
pub mod selector;
pub mod source;
pub mod transition;
pub mod version;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error(
        "No installable build found for {arch} ({} candidate(s) rejected{})",
        .rejected.len(),
        list_suffix(.rejected)
    )]
    NoBuildFound { arch: String, rejected: Vec<String> },

    #[error("{tool} is not installed.\n{hint}")]
    ToolMissing { tool: &'static str, hint: String },

    #[error("Fetching artifacts failed: {0}")]
    Fetch(String),

    #[error(
        "Failed to write {}: {source}\nRemoved before failure: {}",
        .dest.display(),
        removed_list(.removed)
    )]
    WriteFailed {
        dest: PathBuf,
        removed: Vec<PathBuf>,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type UpdateResult<T> = Result<T, UpdateError>;

fn list_suffix(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(": {}", names.join(", "))
    }
}

fn removed_list(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
