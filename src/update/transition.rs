//! The install transition: detect, resolve, decide, confirm, uninstall,
//! install, dependency step.
//!
//! Every step is recorded as a [`TraceEvent`]. Dry-run skips the calls into
//! [`Mutator`] and [`DependencyRunner`] but emits the same events, so a dry
//! run and a real run of the same inputs produce the same trace.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::decision::{decide, UpdateDecision};
use super::deps::{dependency_command, DependencyRunner};
use super::locate::{InstallLocator, InstalledInstance};
use super::mutate::Mutator;
use super::remote::RemoteMarker;
use super::selector::{select, Selection};
use super::source::{ArtifactSource, ArtifactTree};
use super::version::VersionTuple;
use super::{UpdateError, UpdateResult};
use crate::profile::PlatformProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    Detect,
    ResolveLatest,
    Decide,
    Confirm,
    Uninstall,
    Install,
    DependencyStep,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Entered(TransitionState),
    Found(InstalledInstance),
    NothingInstalled,
    Candidates(Vec<String>),
    Selected(Selection),
    /// The remote marker is newer than any artifact on offer.
    RemoteAhead(VersionTuple),
    Decided {
        installed: Option<VersionTuple>,
        latest: VersionTuple,
        decision: UpdateDecision,
    },
    Confirmed,
    Declined,
    /// Removed, or would be removed under dry-run.
    Removed(PathBuf),
    RemoveFailed { path: PathBuf, reason: String },
    /// Written, or would be written under dry-run.
    Installed(PathBuf),
    WrapperWritten(PathBuf),
    WrapperFailed { path: PathBuf, reason: String },
    DependencyCommand(Vec<String>),
    DependencySkipped,
    DependencyFailed(String),
    CloneKept(PathBuf),
}

impl TraceEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            TraceEvent::RemoveFailed { .. }
                | TraceEvent::WrapperFailed { .. }
                | TraceEvent::DependencyFailed(_)
        )
    }
}

/// Receives events as they happen, for live console output.
pub trait TraceObserver {
    fn on_event(&self, event: &TraceEvent, dry_run: bool);
}

/// Ignores every event.
pub struct SilentObserver;

impl TraceObserver for SilentObserver {
    fn on_event(&self, _event: &TraceEvent, _dry_run: bool) {}
}

/// Ask the user a yes/no question.
pub trait PromptProvider {
    fn prompt_yes_no(&self, message: &str) -> io::Result<bool>;
}

/// Source of installed instances.
pub trait Locate {
    fn locate(&self) -> Vec<InstalledInstance>;
}

impl Locate for InstallLocator<'_> {
    fn locate(&self) -> Vec<InstalledInstance> {
        InstallLocator::locate(self)
    }
}

#[derive(Debug, Clone)]
pub struct TransitionOptions {
    pub profile: PlatformProfile,
    pub binary_name: String,
    pub artifact_prefix: String,
    pub prefix: PathBuf,
    pub force: bool,
    pub update: bool,
    pub check: bool,
    pub dry_run: bool,
    pub no_deps: bool,
    pub cpu_only: bool,
    pub keep_clone: bool,
    pub windows: bool,
}

/// Where the artifact goes under `<prefix>/bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub binary: PathBuf,
    /// Windows `.cmd` shim and its contents.
    pub wrapper: Option<(PathBuf, String)>,
}

impl InstallLayout {
    pub fn new(prefix: &Path, name: &str, windows: bool) -> Self {
        let bin = prefix.join("bin");
        if windows {
            let script = format!("{name}.sh");
            Self {
                binary: bin.join(&script),
                wrapper: Some((
                    bin.join(format!("{name}.cmd")),
                    format!("@echo off\r\nbash \"%~dp0{script}\" %*\r\n"),
                )),
            }
        } else {
            Self {
                binary: bin.join(name),
                wrapper: None,
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransitionReport {
    pub decision: UpdateDecision,
    pub installed_version: Option<VersionTuple>,
    pub latest_version: VersionTuple,
    pub selection: Selection,
    pub instances: Vec<InstalledInstance>,
    pub removed: Vec<PathBuf>,
    pub destination: Option<PathBuf>,
    pub dry_run: bool,
    #[serde(skip)]
    pub trace: Vec<TraceEvent>,
}

impl TransitionReport {
    pub fn warnings(&self) -> usize {
        self.trace.iter().filter(|e| e.is_warning()).count()
    }
}

/// The external pieces the transition drives.
pub struct Collaborators<'a> {
    pub locator: &'a dyn Locate,
    pub source: &'a dyn ArtifactSource,
    pub remote: &'a dyn RemoteMarker,
    pub mutator: &'a dyn Mutator,
    pub prompt: &'a dyn PromptProvider,
    pub deps: &'a dyn DependencyRunner,
    pub observer: &'a dyn TraceObserver,
}

struct Trace<'a> {
    events: Vec<TraceEvent>,
    observer: &'a dyn TraceObserver,
    dry_run: bool,
}

impl Trace<'_> {
    fn emit(&mut self, event: TraceEvent) {
        self.observer.on_event(&event, self.dry_run);
        self.events.push(event);
    }

    fn enter(&mut self, state: TransitionState) {
        log::debug!("transition: {:?}", state);
        self.emit(TraceEvent::Entered(state));
    }
}

pub struct InstallTransition<'a> {
    pub options: TransitionOptions,
    pub with: Collaborators<'a>,
}

impl InstallTransition<'_> {
    pub fn run(&self) -> UpdateResult<TransitionReport> {
        let mut trace = Trace {
            events: Vec::new(),
            observer: self.with.observer,
            dry_run: self.options.dry_run,
        };

        trace.enter(TransitionState::Detect);
        let instances = self.with.locator.locate();
        if instances.is_empty() {
            trace.emit(TraceEvent::NothingInstalled);
        }
        for instance in &instances {
            trace.emit(TraceEvent::Found(instance.clone()));
        }

        trace.enter(TransitionState::ResolveLatest);
        let tree = self.with.source.fetch()?;
        let result = self.apply(&tree, instances, &mut trace);

        if self.options.keep_clone {
            let kept = tree.keep();
            trace.emit(TraceEvent::CloneKept(kept));
        }

        let mut report = result?;
        report.trace = trace.events;
        Ok(report)
    }

    /// Everything after the artifact tree is available.
    fn apply(
        &self,
        tree: &ArtifactTree,
        instances: Vec<InstalledInstance>,
        trace: &mut Trace<'_>,
    ) -> UpdateResult<TransitionReport> {
        let opts = &self.options;

        let candidates = tree.candidates(&opts.artifact_prefix)?;
        trace.emit(TraceEvent::Candidates(
            candidates.iter().map(|c| c.name.clone()).collect(),
        ));
        let selection = select(&candidates, &opts.profile.architecture)?;
        trace.emit(TraceEvent::Selected(selection.clone()));

        let latest = selection.candidate.version;
        if let Some(remote) = self.with.remote.latest_version() {
            if remote > latest {
                log::warn!("remote marker reports {} but newest artifact is {}", remote, latest);
                trace.emit(TraceEvent::RemoteAhead(remote));
            }
        }

        trace.enter(TransitionState::Decide);
        let installed = instances.first().map(|i| i.version);
        let mut decision = decide(installed, latest, opts.force, opts.update, opts.dry_run);
        trace.emit(TraceEvent::Decided {
            installed,
            latest,
            decision,
        });

        let mut report = TransitionReport {
            decision,
            installed_version: installed,
            latest_version: latest,
            selection,
            instances,
            removed: Vec::new(),
            destination: None,
            dry_run: opts.dry_run,
            trace: Vec::new(),
        };

        if opts.check {
            trace.enter(TransitionState::Done);
            return Ok(report);
        }

        if decision == UpdateDecision::RequiresConfirmation {
            trace.enter(TransitionState::Confirm);
            let question = format!(
                "Upgrade {} from v{} to v{}? [y/N] ",
                opts.binary_name,
                installed.unwrap_or_default(),
                latest
            );
            if self.with.prompt.prompt_yes_no(&question)? {
                trace.emit(TraceEvent::Confirmed);
                decision = UpdateDecision::UpgradeAvailable;
            } else {
                trace.emit(TraceEvent::Declined);
                decision = UpdateDecision::Skipped;
            }
            report.decision = decision;
        }

        if !decision.proceeds() {
            trace.enter(TransitionState::Done);
            return Ok(report);
        }

        if !report.instances.is_empty() {
            trace.enter(TransitionState::Uninstall);
            for instance in &report.instances {
                if opts.dry_run {
                    trace.emit(TraceEvent::Removed(instance.path.clone()));
                    continue;
                }
                match self.with.mutator.remove(&instance.path) {
                    Ok(()) => {
                        report.removed.push(instance.path.clone());
                        trace.emit(TraceEvent::Removed(instance.path.clone()));
                    }
                    Err(e) => {
                        log::warn!("could not remove {}: {}", instance.path.display(), e);
                        trace.emit(TraceEvent::RemoveFailed {
                            path: instance.path.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        trace.enter(TransitionState::Install);
        let layout = InstallLayout::new(&opts.prefix, &opts.binary_name, opts.windows);
        let artifact = tree.path_of(&report.selection.candidate);
        if !opts.dry_run {
            self.with
                .mutator
                .install(&artifact, &layout.binary)
                .map_err(|source| UpdateError::WriteFailed {
                    dest: layout.binary.clone(),
                    removed: report.removed.clone(),
                    source,
                })?;
        }
        trace.emit(TraceEvent::Installed(layout.binary.clone()));
        report.destination = Some(layout.binary.clone());

        if let Some((wrapper, contents)) = &layout.wrapper {
            let written = if opts.dry_run {
                Ok(())
            } else {
                self.with.mutator.write_text(wrapper, contents)
            };
            match written {
                Ok(()) => trace.emit(TraceEvent::WrapperWritten(wrapper.clone())),
                Err(e) => trace.emit(TraceEvent::WrapperFailed {
                    path: wrapper.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        trace.enter(TransitionState::DependencyStep);
        if opts.no_deps {
            trace.emit(TraceEvent::DependencySkipped);
        } else {
            let command = dependency_command(&layout.binary, opts.cpu_only, opts.windows);
            trace.emit(TraceEvent::DependencyCommand(command.clone()));
            if !opts.dry_run {
                match self.with.deps.run(&command) {
                    Ok(true) => {}
                    Ok(false) => trace.emit(TraceEvent::DependencyFailed(
                        "install-deps returned non-zero; some optional packages may be missing"
                            .to_string(),
                    )),
                    Err(e) => trace.emit(TraceEvent::DependencyFailed(format!(
                        "could not run install-deps: {e}"
                    ))),
                }
            }
        }

        trace.enter(TransitionState::Done);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Architecture, ArmSubtype, CpuTier};
    use crate::update::source::LocalSource;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashSet, VecDeque};
    use std::fs;
    use tempfile::TempDir;

    struct FixedLocator(Vec<InstalledInstance>);

    impl Locate for FixedLocator {
        fn locate(&self) -> Vec<InstalledInstance> {
            self.0.clone()
        }
    }

    struct NoMarker;

    impl RemoteMarker for NoMarker {
        fn latest_version(&self) -> Option<VersionTuple> {
            None
        }
    }

    struct FixedMarker(VersionTuple);

    impl RemoteMarker for FixedMarker {
        fn latest_version(&self) -> Option<VersionTuple> {
            Some(self.0)
        }
    }

    #[derive(Default)]
    struct MockMutator {
        fail_remove: HashSet<PathBuf>,
        fail_install: bool,
        removed: RefCell<Vec<PathBuf>>,
        installed: RefCell<Vec<(PathBuf, PathBuf)>>,
        texts: RefCell<Vec<PathBuf>>,
    }

    impl MockMutator {
        fn calls(&self) -> usize {
            self.removed.borrow().len() + self.installed.borrow().len() + self.texts.borrow().len()
        }
    }

    impl Mutator for MockMutator {
        fn remove(&self, path: &Path) -> io::Result<()> {
            if self.fail_remove.contains(path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            self.removed.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn install(&self, artifact: &Path, dest: &Path) -> io::Result<()> {
            if self.fail_install {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.installed
                .borrow_mut()
                .push((artifact.to_path_buf(), dest.to_path_buf()));
            Ok(())
        }

        fn write_text(&self, dest: &Path, _contents: &str) -> io::Result<()> {
            self.texts.borrow_mut().push(dest.to_path_buf());
            Ok(())
        }
    }

    struct MockPrompt {
        answers: RefCell<VecDeque<bool>>,
        calls: Cell<usize>,
    }

    impl MockPrompt {
        fn new(answers: Vec<bool>) -> Self {
            Self {
                answers: RefCell::new(answers.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl PromptProvider for MockPrompt {
        fn prompt_yes_no(&self, _message: &str) -> io::Result<bool> {
            self.calls.set(self.calls.get() + 1);
            Ok(self
                .answers
                .borrow_mut()
                .pop_front()
                .expect("Unexpected prompt"))
        }
    }

    struct MockDeps {
        success: bool,
        commands: RefCell<Vec<Vec<String>>>,
    }

    impl MockDeps {
        fn ok() -> Self {
            Self {
                success: true,
                commands: RefCell::new(vec![]),
            }
        }
    }

    impl DependencyRunner for MockDeps {
        fn run(&self, command: &[String]) -> io::Result<bool> {
            self.commands.borrow_mut().push(command.to_vec());
            Ok(self.success)
        }
    }

    fn x86_profile() -> PlatformProfile {
        PlatformProfile {
            architecture: Architecture::X86_64,
            arm_subtype: ArmSubtype::None,
            cpu_tier: CpuTier::Avx2,
        }
    }

    fn options(prefix: &Path) -> TransitionOptions {
        TransitionOptions {
            profile: x86_profile(),
            binary_name: "ai".to_string(),
            artifact_prefix: "main-v".to_string(),
            prefix: prefix.to_path_buf(),
            force: false,
            update: false,
            check: false,
            dry_run: false,
            no_deps: false,
            cpu_only: false,
            keep_clone: false,
            windows: false,
        }
    }

    fn artifacts(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::write(dir.path().join(name), format!("#!/bin/sh\necho {name}\n")).unwrap();
        }
        dir
    }

    fn instance(path: &str, version: VersionTuple) -> InstalledInstance {
        InstalledInstance {
            path: PathBuf::from(path),
            version,
        }
    }

    struct Fixture {
        locator: FixedLocator,
        source: LocalSource,
        mutator: MockMutator,
        prompt: MockPrompt,
        deps: MockDeps,
    }

    impl Fixture {
        fn new(dir: &TempDir, installed: Vec<InstalledInstance>) -> Self {
            Self {
                locator: FixedLocator(installed),
                source: LocalSource {
                    dir: dir.path().to_path_buf(),
                },
                mutator: MockMutator::default(),
                prompt: MockPrompt::new(vec![]),
                deps: MockDeps::ok(),
            }
        }

        fn run(&self, options: TransitionOptions) -> UpdateResult<TransitionReport> {
            self.run_with_marker(options, &NoMarker)
        }

        fn run_with_marker(
            &self,
            options: TransitionOptions,
            remote: &dyn RemoteMarker,
        ) -> UpdateResult<TransitionReport> {
            InstallTransition {
                options,
                with: Collaborators {
                    locator: &self.locator,
                    source: &self.source,
                    remote,
                    mutator: &self.mutator,
                    prompt: &self.prompt,
                    deps: &self.deps,
                    observer: &SilentObserver,
                },
            }
            .run()
        }
    }

    fn states(trace: &[TraceEvent]) -> Vec<TransitionState> {
        trace
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Entered(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    const V250: VersionTuple = VersionTuple::new(2, 5, 0);
    const V260: VersionTuple = VersionTuple::new(2, 6, 0);

    #[test]
    fn fresh_install_walks_every_state_but_uninstall() {
        let dir = artifacts(&["main-v2.5", "main-v2.6"]);
        let fx = Fixture::new(&dir, vec![]);
        let report = fx.run(options(Path::new("/opt/ai"))).unwrap();

        assert_eq!(report.decision, UpdateDecision::FreshInstall);
        assert_eq!(report.destination, Some(PathBuf::from("/opt/ai/bin/ai")));
        assert_eq!(
            *fx.mutator.installed.borrow(),
            vec![(dir.path().join("main-v2.6"), PathBuf::from("/opt/ai/bin/ai"))]
        );
        assert_eq!(
            states(&report.trace),
            vec![
                TransitionState::Detect,
                TransitionState::ResolveLatest,
                TransitionState::Decide,
                TransitionState::Install,
                TransitionState::DependencyStep,
                TransitionState::Done,
            ]
        );
        assert!(fx.mutator.removed.borrow().is_empty());
        assert_eq!(
            *fx.deps.commands.borrow(),
            vec![vec!["/opt/ai/bin/ai".to_string(), "install-deps".to_string()]]
        );
        assert_eq!(report.warnings(), 0);
    }

    #[test]
    fn up_to_date_makes_no_changes() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V260)]);
        let report = fx.run(options(Path::new("/opt/ai"))).unwrap();

        assert_eq!(report.decision, UpdateDecision::UpToDate);
        assert_eq!(fx.mutator.calls(), 0);
        assert!(fx.deps.commands.borrow().is_empty());
        assert_eq!(states(&report.trace).last(), Some(&TransitionState::Done));
    }

    #[test]
    fn newer_install_makes_no_changes() {
        let dir = artifacts(&["main-v2.5"]);
        let fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V260)]);
        let report = fx.run(options(Path::new("/opt/ai"))).unwrap();
        assert_eq!(report.decision, UpdateDecision::NewerInstalledThanRemote);
        assert_eq!(fx.mutator.calls(), 0);
    }

    #[test]
    fn declined_prompt_is_skipped() {
        let dir = artifacts(&["main-v2.6"]);
        let mut fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V250)]);
        fx.prompt = MockPrompt::new(vec![false]);
        let report = fx.run(options(Path::new("/opt/ai"))).unwrap();

        assert_eq!(report.decision, UpdateDecision::Skipped);
        assert_eq!(fx.prompt.calls.get(), 1);
        assert_eq!(fx.mutator.calls(), 0);
        assert!(report.trace.contains(&TraceEvent::Declined));
    }

    #[test]
    fn confirmed_prompt_upgrades() {
        let dir = artifacts(&["main-v2.6"]);
        let mut fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V250)]);
        fx.prompt = MockPrompt::new(vec![true]);
        let report = fx.run(options(Path::new("/opt/ai"))).unwrap();

        assert_eq!(report.decision, UpdateDecision::UpgradeAvailable);
        assert_eq!(*fx.mutator.removed.borrow(), vec![PathBuf::from("/usr/bin/ai")]);
        assert_eq!(fx.mutator.installed.borrow().len(), 1);
        assert!(states(&report.trace).contains(&TransitionState::Confirm));
    }

    #[test]
    fn update_flag_does_not_prompt() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V250)]);
        let mut opts = options(Path::new("/opt/ai"));
        opts.update = true;
        let report = fx.run(opts).unwrap();

        assert_eq!(report.decision, UpdateDecision::UpgradeAvailable);
        assert_eq!(fx.prompt.calls.get(), 0);
        assert_eq!(fx.mutator.installed.borrow().len(), 1);
    }

    #[test]
    fn check_never_prompts_or_mutates() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V250)]);
        let mut opts = options(Path::new("/opt/ai"));
        opts.check = true;
        let report = fx.run(opts).unwrap();

        assert_eq!(report.decision, UpdateDecision::RequiresConfirmation);
        assert_eq!(fx.prompt.calls.get(), 0);
        assert_eq!(fx.mutator.calls(), 0);
        assert!(report.destination.is_none());
    }

    #[test]
    fn all_stale_instances_are_removed_before_install() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(
            &dir,
            vec![
                instance("/usr/local/bin/ai", V250),
                instance("/home/u/.local/bin/ai", VersionTuple::new(2, 4, 0)),
            ],
        );
        let mut opts = options(Path::new("/usr/local"));
        opts.force = true;
        let report = fx.run(opts).unwrap();

        assert_eq!(report.decision, UpdateDecision::ForcedReinstall);
        assert_eq!(report.removed.len(), 2);
        assert!(states(&report.trace).contains(&TransitionState::Uninstall));
        let removed_at = report
            .trace
            .iter()
            .rposition(|e| matches!(e, TraceEvent::Removed(_)))
            .unwrap();
        let installed_at = report
            .trace
            .iter()
            .position(|e| matches!(e, TraceEvent::Installed(_)))
            .unwrap();
        assert!(removed_at < installed_at);
    }

    #[test]
    fn failed_removal_warns_and_continues() {
        let dir = artifacts(&["main-v2.6"]);
        let mut fx = Fixture::new(
            &dir,
            vec![instance("/usr/bin/ai", V250), instance("/home/u/bin/ai", V250)],
        );
        fx.mutator.fail_remove.insert(PathBuf::from("/usr/bin/ai"));
        let mut opts = options(Path::new("/opt/ai"));
        opts.update = true;
        opts.no_deps = true;
        let report = fx.run(opts).unwrap();

        assert_eq!(report.removed, vec![PathBuf::from("/home/u/bin/ai")]);
        assert_eq!(report.warnings(), 1);
        assert_eq!(fx.mutator.installed.borrow().len(), 1);
        assert_eq!(states(&report.trace).last(), Some(&TransitionState::Done));
    }

    #[test]
    fn failed_write_is_fatal_and_reports_removals() {
        let dir = artifacts(&["main-v2.6"]);
        let mut fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V250)]);
        fx.mutator.fail_install = true;
        let mut opts = options(Path::new("/opt/ai"));
        opts.update = true;

        match fx.run(opts) {
            Err(UpdateError::WriteFailed { dest, removed, .. }) => {
                assert_eq!(dest, PathBuf::from("/opt/ai/bin/ai"));
                assert_eq!(removed, vec![PathBuf::from("/usr/bin/ai")]);
            }
            other => panic!("expected WriteFailed, got {other:?}"),
        }
        assert!(fx.deps.commands.borrow().is_empty());
    }

    #[test]
    fn no_build_found_aborts_before_decision() {
        let dir = artifacts(&["main-v2.6-arm64"]);
        let fx = Fixture::new(&dir, vec![instance("/usr/bin/ai", V250)]);
        let err = fx.run(options(Path::new("/opt/ai"))).unwrap_err();
        assert!(matches!(err, UpdateError::NoBuildFound { .. }));
        assert_eq!(fx.mutator.calls(), 0);
    }

    #[test]
    fn dry_run_trace_matches_real_run_without_touching_anything() {
        let dir = artifacts(&["main-v2.5", "main-v2.6", "main-v2.6-arm64"]);
        let installed = vec![instance("/usr/bin/ai", V250), instance("/home/u/bin/ai", V250)];

        for (force, update) in [(false, true), (true, false)] {
            let real = Fixture::new(&dir, installed.clone());
            let mut real_opts = options(Path::new("/opt/ai"));
            real_opts.force = force;
            real_opts.update = update;
            let real_report = real.run(real_opts.clone()).unwrap();

            let dry = Fixture::new(&dir, installed.clone());
            let mut dry_opts = real_opts;
            dry_opts.dry_run = true;
            let dry_report = dry.run(dry_opts).unwrap();

            assert_eq!(dry_report.trace, real_report.trace);
            assert_eq!(dry_report.decision, real_report.decision);
            assert_eq!(dry.mutator.calls(), 0);
            assert!(dry.deps.commands.borrow().is_empty());
            assert!(dry_report.removed.is_empty());
            assert!(real.mutator.calls() > 0);
        }
    }

    #[test]
    fn dry_run_fresh_install_matches_real_run() {
        let dir = artifacts(&["main-v2.6"]);
        let real = Fixture::new(&dir, vec![]);
        let real_report = real.run(options(Path::new("/opt/ai"))).unwrap();

        let dry = Fixture::new(&dir, vec![]);
        let mut opts = options(Path::new("/opt/ai"));
        opts.dry_run = true;
        let dry_report = dry.run(opts).unwrap();

        assert_eq!(dry_report.trace, real_report.trace);
        assert_eq!(dry.mutator.calls(), 0);
    }

    #[test]
    fn arm64_fallback_is_recorded() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(&dir, vec![]);
        let mut opts = options(Path::new("/opt/ai"));
        opts.profile = PlatformProfile {
            architecture: Architecture::Arm64,
            arm_subtype: ArmSubtype::GenericArm64,
            cpu_tier: CpuTier::Unknown,
        };
        opts.check = true;
        let report = fx.run(opts).unwrap();
        assert!(report.selection.fell_back);
    }

    #[test]
    fn remote_marker_ahead_is_traced() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(&dir, vec![]);
        let mut opts = options(Path::new("/opt/ai"));
        opts.check = true;
        let report = fx
            .run_with_marker(opts, &FixedMarker(VersionTuple::new(2, 7, 0)))
            .unwrap();
        assert!(report
            .trace
            .contains(&TraceEvent::RemoteAhead(VersionTuple::new(2, 7, 0))));
        assert_eq!(report.latest_version, V260);
    }

    #[test]
    fn dependency_failure_is_a_warning() {
        let dir = artifacts(&["main-v2.6"]);
        let mut fx = Fixture::new(&dir, vec![]);
        fx.deps = MockDeps {
            success: false,
            commands: RefCell::new(vec![]),
        };
        let mut opts = options(Path::new("/opt/ai"));
        opts.cpu_only = true;
        let report = fx.run(opts).unwrap();

        assert_eq!(report.warnings(), 1);
        assert_eq!(
            fx.deps.commands.borrow()[0].last().map(String::as_str),
            Some("--cpu-only")
        );
    }

    #[test]
    fn no_deps_skips_dependency_step() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(&dir, vec![]);
        let mut opts = options(Path::new("/opt/ai"));
        opts.no_deps = true;
        let report = fx.run(opts).unwrap();
        assert!(report.trace.contains(&TraceEvent::DependencySkipped));
        assert!(fx.deps.commands.borrow().is_empty());
    }

    #[test]
    fn windows_layout_writes_script_and_wrapper() {
        let dir = artifacts(&["main-v2.6"]);
        let fx = Fixture::new(&dir, vec![]);
        let mut opts = options(Path::new("C:/Users/u"));
        opts.windows = true;
        let report = fx.run(opts).unwrap();

        assert_eq!(report.destination, Some(PathBuf::from("C:/Users/u/bin/ai.sh")));
        assert_eq!(*fx.mutator.texts.borrow(), vec![PathBuf::from("C:/Users/u/bin/ai.cmd")]);
        assert_eq!(
            fx.deps.commands.borrow()[0].last().map(String::as_str),
            Some("--cpu-only")
        );
    }

    #[test]
    fn install_layout_wrapper_invokes_script() {
        let layout = InstallLayout::new(Path::new("/p"), "ai", true);
        let (path, contents) = layout.wrapper.unwrap();
        assert_eq!(path, PathBuf::from("/p/bin/ai.cmd"));
        assert!(contents.contains("bash \"%~dp0ai.sh\" %*"));
    }
}
