use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::profile::{Architecture, ArmSubtype};

fn parse_arch(s: &str) -> Result<Architecture, String> {
    match Architecture::from_machine(s) {
        Architecture::Unknown(_) => Err(format!(
            "invalid architecture '{}': expected x86_64, arm64 or armv7l",
            s
        )),
        arch => Ok(arch),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ai-installer",
    version = env!("AI_INSTALLER_VERSION"),
    about = "Install or update the ai CLI"
)]
pub struct Cli {
    /// Install prefix; the binary goes in <PREFIX>/bin [default: /usr/local]
    #[arg(long, global = true)]
    pub prefix: Option<PathBuf>,

    /// Use a specific config file instead of the default
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the detected architecture [x86_64, arm64, armv7l]
    #[arg(long, global = true, value_parser = parse_arch)]
    pub arch: Option<Architecture>,

    /// Override the detected ARM board type
    #[arg(long, global = true, value_enum)]
    pub arm_type: Option<ArmSubtype>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output for debugging detection and install steps
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub install: InstallArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags for the default install/update run.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Reinstall even when the installed version is current
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Upgrade without asking when a newer build is available
    #[arg(long, short = 'u')]
    pub update: bool,

    /// Report what would happen and exit without changing anything
    #[arg(long)]
    pub check: bool,

    /// Show every step without removing or writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip running '<binary> install-deps' after install
    #[arg(long)]
    pub no_deps: bool,

    /// Pass --cpu-only to install-deps (no CUDA)
    #[arg(long)]
    pub cpu_only: bool,

    /// Keep the cloned repository after install
    #[arg(long)]
    pub keep_clone: bool,

    /// Install from a local directory of artifacts instead of cloning
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Repository to clone
    #[arg(long, value_name = "URL", conflicts_with = "source")]
    pub repo: Option<String>,

    /// Branch to clone
    #[arg(long, value_name = "NAME", conflicts_with = "source")]
    pub branch: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the detected platform profile
    Platform,

    /// List installed copies and their versions
    #[command(visible_alias = "ls")]
    List,
}
