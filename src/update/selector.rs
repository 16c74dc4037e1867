//! Artifact name parsing and build selection.

use serde::Serialize;

use super::version::{arch_suffix, VersionTuple};
use super::{UpdateError, UpdateResult};
use crate::profile::Architecture;

/// Architecture encoded in an artifact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchTag {
    None,
    Arm64,
    Armv7l,
}

/// A candidate build, derived purely from its file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildCandidate {
    pub name: String,
    pub version: VersionTuple,
    pub arch_tag: ArchTag,
}

impl BuildCandidate {
    pub fn from_name(name: &str) -> Self {
        let arch_tag = match arch_suffix(name) {
            Some("arm64" | "aarch64") => ArchTag::Arm64,
            Some(_) => ArchTag::Armv7l,
            None => ArchTag::None,
        };
        Self {
            name: name.to_string(),
            version: VersionTuple::parse(name),
            arch_tag,
        }
    }
}

/// Result of parsing a directory entry name against the artifact prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactName {
    Candidate(BuildCandidate),
    Unmatched,
}

impl ArtifactName {
    pub fn parse(prefix: &str, name: &str) -> Self {
        if name.starts_with(prefix) && name.len() > prefix.len() {
            ArtifactName::Candidate(BuildCandidate::from_name(name))
        } else {
            ArtifactName::Unmatched
        }
    }
}

/// The chosen build, and whether selection fell back to a generic build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub candidate: BuildCandidate,
    pub fell_back: bool,
}

/// Pick the best build for `arch`.
///
/// arm64 targets prefer arm64-tagged builds and fall back to generic ones.
/// Every other target only considers generic builds. Within the eligible set
/// the highest version wins; equal versions resolve to the smallest name.
pub fn select(candidates: &[BuildCandidate], arch: &Architecture) -> UpdateResult<Selection> {
    let generic: Vec<&BuildCandidate> = candidates
        .iter()
        .filter(|c| c.arch_tag == ArchTag::None)
        .collect();

    let (eligible, fell_back) = match arch {
        Architecture::Arm64 => {
            let tagged: Vec<&BuildCandidate> = candidates
                .iter()
                .filter(|c| c.arch_tag == ArchTag::Arm64)
                .collect();
            if tagged.is_empty() {
                (generic, true)
            } else {
                (tagged, false)
            }
        }
        _ => (generic, false),
    };

    let best = eligible
        .into_iter()
        .max_by(|a, b| a.version.cmp(&b.version).then_with(|| b.name.cmp(&a.name)))
        .ok_or_else(|| UpdateError::NoBuildFound {
            arch: arch.to_string(),
            rejected: candidates.iter().map(|c| c.name.clone()).collect(),
        })?;

    if fell_back {
        log::warn!(
            "no arm64-specific build available; falling back to generic {}",
            best.name
        );
    }

    Ok(Selection {
        candidate: best.clone(),
        fell_back,
    })
}
