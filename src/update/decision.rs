//! Update decision: what to do given the installed and latest versions.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::version::VersionTuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateDecision {
    FreshInstall,
    UpToDate,
    NewerInstalledThanRemote,
    UpgradeAvailable,
    ForcedReinstall,
    RequiresConfirmation,
    /// The user declined the confirmation prompt.
    Skipped,
}

impl UpdateDecision {
    /// Whether the decision leads to an uninstall/install.
    pub fn proceeds(&self) -> bool {
        matches!(
            self,
            UpdateDecision::FreshInstall
                | UpdateDecision::UpgradeAvailable
                | UpdateDecision::ForcedReinstall
        )
    }
}

impl fmt::Display for UpdateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateDecision::FreshInstall => "fresh install",
            UpdateDecision::UpToDate => "up to date",
            UpdateDecision::NewerInstalledThanRemote => "installed version is newer than remote",
            UpdateDecision::UpgradeAvailable => "upgrade available",
            UpdateDecision::ForcedReinstall => "forced reinstall",
            UpdateDecision::RequiresConfirmation => "upgrade available (confirmation required)",
            UpdateDecision::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Decide what to do. Pure: no prompting, no I/O.
///
/// `installed == None` means nothing is installed; that is always a fresh
/// install. `force` reinstalls whatever the comparison says. An older install
/// upgrades without asking under `update` or `dry_run`, otherwise it needs
/// confirmation.
pub fn decide(
    installed: Option<VersionTuple>,
    latest: VersionTuple,
    force: bool,
    update: bool,
    dry_run: bool,
) -> UpdateDecision {
    let Some(installed) = installed else {
        return UpdateDecision::FreshInstall;
    };

    if force {
        return UpdateDecision::ForcedReinstall;
    }

    match installed.compare(&latest) {
        Ordering::Equal => UpdateDecision::UpToDate,
        Ordering::Greater => UpdateDecision::NewerInstalledThanRemote,
        Ordering::Less if update || dry_run => UpdateDecision::UpgradeAvailable,
        Ordering::Less => UpdateDecision::RequiresConfirmation,
    }
}
