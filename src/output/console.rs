//! Human-readable step output.
//!
//! In JSON mode the same lines go to stderr so stdout stays machine-readable.

use colored::Colorize;

use crate::update::decision::UpdateDecision;
use crate::update::transition::{TraceEvent, TraceObserver, TransitionState};
use crate::update::version::VersionTuple;

pub struct Console {
    to_stderr: bool,
}

impl Console {
    pub fn new(json: bool) -> Self {
        Self { to_stderr: json }
    }

    fn line(&self, text: &str) {
        if self.to_stderr {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    }

    pub fn header(&self, msg: &str) {
        self.line("");
        self.line(&msg.bold().to_string());
    }

    pub fn ok(&self, msg: &str) {
        self.line(&format!("{} {}", "✓".green(), msg));
    }

    pub fn info(&self, msg: &str) {
        self.line(&format!("{} {}", "ℹ".cyan(), msg));
    }

    pub fn warn(&self, msg: &str) {
        self.line(&format!("{} {}", "⚠".yellow(), msg.yellow()));
    }

    fn planned(&self, dry_run: bool, done: &str, would: &str) {
        if dry_run {
            self.info(&format!("{} {}", "[dry-run]".dimmed(), would));
        } else {
            self.ok(done);
        }
    }

    fn decision(&self, installed: Option<VersionTuple>, latest: VersionTuple, decision: UpdateDecision) {
        let have = installed.map(version_label).unwrap_or_default();
        match decision {
            UpdateDecision::FreshInstall => self.info(&format!("Installing v{}", latest)),
            UpdateDecision::UpToDate => self.ok(&format!("Already up to date ({}).", have)),
            UpdateDecision::NewerInstalledThanRemote => self.info(&format!(
                "Installed {} is newer than the latest build v{}; nothing to do.",
                have, latest
            )),
            UpdateDecision::UpgradeAvailable => {
                self.info(&format!("Upgrading {} -> v{}", have, latest))
            }
            UpdateDecision::RequiresConfirmation => {
                self.info(&format!("Update available: {} -> v{}", have, latest))
            }
            UpdateDecision::ForcedReinstall => {
                self.info(&format!("Reinstalling v{} (--force)", latest))
            }
            UpdateDecision::Skipped => self.info("Update cancelled."),
        }
    }
}

/// `v1.2.3`, or `unknown version` for the sentinel.
pub fn version_label(version: VersionTuple) -> String {
    if version.is_unknown() {
        "unknown version".to_string()
    } else {
        format!("v{}", version)
    }
}

fn step_title(state: TransitionState) -> Option<&'static str> {
    match state {
        TransitionState::Detect => Some("Checking for existing install..."),
        TransitionState::ResolveLatest => Some("Resolving latest build..."),
        TransitionState::Uninstall => Some("Uninstalling old version..."),
        TransitionState::Install => Some("Installing..."),
        TransitionState::DependencyStep => Some("Installing dependencies..."),
        TransitionState::Decide | TransitionState::Confirm | TransitionState::Done => None,
    }
}

impl TraceObserver for Console {
    fn on_event(&self, event: &TraceEvent, dry_run: bool) {
        match event {
            TraceEvent::Entered(state) => {
                if let Some(title) = step_title(*state) {
                    self.header(title);
                }
            }
            TraceEvent::Found(instance) => self.warn(&format!(
                "Found: {}  ({})",
                instance.path.display(),
                version_label(instance.version)
            )),
            TraceEvent::NothingInstalled => self.ok("No existing install found."),
            TraceEvent::Candidates(names) => {
                log::debug!("candidates: {}", names.join(", "));
                self.info(&format!("{} candidate build(s)", names.len()));
            }
            TraceEvent::Selected(selection) => {
                if selection.fell_back {
                    self.warn(&format!(
                        "No arm64 build available; using generic build {}",
                        selection.candidate.name
                    ));
                }
                self.info(&format!(
                    "Latest build: {}  (v{})",
                    selection.candidate.name, selection.candidate.version
                ));
            }
            TraceEvent::RemoteAhead(version) => self.warn(&format!(
                "Remote marker reports v{}, newer than any available build",
                version
            )),
            TraceEvent::Decided {
                installed,
                latest,
                decision,
            } => self.decision(*installed, *latest, *decision),
            TraceEvent::Confirmed => {}
            TraceEvent::Declined => self.info("Update cancelled."),
            TraceEvent::Removed(path) => self.planned(
                dry_run,
                &format!("Removed {}", path.display()),
                &format!("Would remove {}", path.display()),
            ),
            TraceEvent::RemoveFailed { path, reason } => {
                self.warn(&format!("Could not remove {}: {}", path.display(), reason))
            }
            TraceEvent::Installed(path) => self.planned(
                dry_run,
                &format!("Installed -> {}", path.display()),
                &format!("Would install to {}", path.display()),
            ),
            TraceEvent::WrapperWritten(path) => self.planned(
                dry_run,
                &format!("Wrapper -> {}", path.display()),
                &format!("Would write wrapper {}", path.display()),
            ),
            TraceEvent::WrapperFailed { path, reason } => {
                self.warn(&format!("Could not write {}: {}", path.display(), reason))
            }
            TraceEvent::DependencyCommand(command) => {
                let shown = command.join(" ");
                if dry_run {
                    self.info(&format!("{} {}", "[dry-run]".dimmed(), shown));
                } else {
                    self.info(&format!("Running: {}", shown));
                }
            }
            TraceEvent::DependencySkipped => self.info("Skipped (--no-deps)"),
            TraceEvent::DependencyFailed(reason) => self.warn(reason),
            TraceEvent::CloneKept(path) => {
                self.info(&format!("Clone kept at {}", path.display()))
            }
        }
    }
}
