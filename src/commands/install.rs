//! Default command: detect, resolve, decide, and install or update.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::args::InstallArgs;
use crate::cli::context::RunContext;
use crate::config::InstallerConfig;
use crate::host::{self, expand_tilde};
use crate::output::console::Console;
use crate::output::format::to_json;
use crate::profile::PlatformProfile;
use crate::update::decision::UpdateDecision;
use crate::update::deps::StreamingRunner;
use crate::update::locate::{CommandVersionProbe, InstallLocator};
use crate::update::mutate::HostMutator;
use crate::update::remote::HttpMarker;
use crate::update::source::{ArtifactSource, GitSource, LocalSource};
use crate::update::transition::{
    Collaborators, InstallTransition, PromptProvider, TransitionOptions, TransitionReport,
};

/// Reads a yes/no answer from stdin. EOF counts as no.
pub struct StdinPrompt {
    pub to_stderr: bool,
}

impl PromptProvider for StdinPrompt {
    fn prompt_yes_no(&self, message: &str) -> io::Result<bool> {
        if self.to_stderr {
            eprint!("{}", message);
            io::stderr().flush()?;
        } else {
            print!("{}", message);
            io::stdout().flush()?;
        }
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(is_yes(&input))
    }
}

fn is_yes(input: &str) -> bool {
    let answer = input.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Run the install command.
pub fn run(
    ctx: &RunContext,
    config: &InstallerConfig,
    profile: PlatformProfile,
    prefix: &Path,
    args: &InstallArgs,
) -> Result<()> {
    let console = Console::new(ctx.is_json());
    let windows = host::is_windows();

    let source: Box<dyn ArtifactSource> = match &args.source {
        Some(dir) => Box::new(LocalSource {
            dir: expand_tilde(dir),
        }),
        None => Box::new(GitSource {
            url: args.repo.clone().unwrap_or_else(|| config.repo_url.clone()),
            branch: args.branch.clone().unwrap_or_else(|| config.branch.clone()),
        }),
    };

    console.header("=== AI CLI Installer ===");
    console.info(&format!("Source:   {}", source.describe()));
    console.info(&format!("Prefix:   {}", prefix.display()));
    console.info(&format!("Platform: {}", describe_platform(&profile)));
    if args.dry_run {
        console.warn("DRY RUN: no changes will be made");
    }

    let probe = CommandVersionProbe {
        timeout: config.probe_timeout(),
    };
    let locator = InstallLocator {
        binary_name: config.binary_name.clone(),
        search_dirs: config.search_dirs(prefix),
        path_var: std::env::var_os("PATH"),
        windows,
        probe: &probe,
    };
    let remote = HttpMarker {
        url: config.version_url.clone(),
    };
    let mutator = HostMutator {
        escalate: host::can_escalate(),
    };
    let prompt = StdinPrompt {
        to_stderr: ctx.is_json(),
    };

    let transition = InstallTransition {
        options: TransitionOptions {
            profile,
            binary_name: config.binary_name.clone(),
            artifact_prefix: config.artifact_prefix.clone(),
            prefix: prefix.to_path_buf(),
            force: args.force,
            update: args.update,
            check: args.check,
            dry_run: args.dry_run,
            no_deps: args.no_deps,
            cpu_only: args.cpu_only,
            keep_clone: args.keep_clone,
            windows,
        },
        with: Collaborators {
            locator: &locator,
            source: source.as_ref(),
            remote: &remote,
            mutator: &mutator,
            prompt: &prompt,
            deps: &StreamingRunner,
            observer: &console,
        },
    };

    let report = transition.run()?;

    if ctx.is_json() {
        println!("{}", to_json(&report));
        return Ok(());
    }

    print_summary(&console, &report, args, &config.binary_name);
    Ok(())
}

fn describe_platform(profile: &PlatformProfile) -> String {
    let mut parts = vec![profile.architecture.to_string()];
    if profile.arm_subtype != crate::profile::ArmSubtype::None {
        parts.push(profile.arm_subtype.to_string());
    }
    if profile.cpu_tier != crate::profile::CpuTier::Unknown {
        parts.push(format!("cpu tier {}", profile.cpu_tier));
    }
    parts.join(", ")
}

fn print_summary(console: &Console, report: &TransitionReport, args: &InstallArgs, binary: &str) {
    let warnings = report.warnings();

    if args.check {
        if matches!(
            report.decision,
            UpdateDecision::RequiresConfirmation | UpdateDecision::UpgradeAvailable
        ) {
            console.info("Run with --update to upgrade.");
        }
        return;
    }

    if !report.decision.proceeds() {
        return;
    }

    if args.dry_run {
        console.header("=== Dry run complete ===");
        console.ok("Nothing was changed.");
    } else {
        console.header("=== Installation complete ===");
        console.ok(&format!("{} v{} is ready.", binary, report.latest_version));
        println!();
        println!("  {}", "Usage:".bold());
        println!("    {} ask \"Hello!\"", binary);
        println!("    {} recommended", binary);
        println!("    {} install-deps --cpu-only   (CPU-only mode)", binary);
        println!();
    }

    if warnings > 0 {
        console.warn(&format!("Finished with {} warning(s).", warnings));
    }
}
