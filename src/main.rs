mod cli;
mod commands;
mod config;
mod host;
mod output;
mod profile;
mod update;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cli::args::{Cli, Commands};
use cli::context::RunContext;
use config::InstallerConfig;

fn main() -> Result<()> {
    setup_broken_pipe_handling();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = RunContext::from_args(cli.json, cli.no_color);
    let config = InstallerConfig::load(cli.config.as_deref())?;
    let prefix = resolve_prefix(cli.prefix.as_ref(), &config);
    let profile = profile::profile(cli.arch.clone(), cli.arm_type);

    match &cli.command {
        Some(Commands::Platform) => commands::platform::run(&ctx, &profile)?,
        Some(Commands::List) => commands::list::run(&ctx, &config, &prefix)?,
        None => commands::install::run(&ctx, &config, profile, &prefix, &cli.install)?,
    }

    Ok(())
}

/// `--prefix` wins over the config file; the result is absolute.
fn resolve_prefix(flag: Option<&PathBuf>, config: &InstallerConfig) -> PathBuf {
    let prefix = flag
        .map(|p| host::expand_tilde(p))
        .unwrap_or_else(|| config.prefix.clone());
    std::path::absolute(&prefix).unwrap_or(prefix)
}

/// Initialize logging based on the `--verbose` flag or `AI_INSTALLER_LOG` env var.
///
/// - `AI_INSTALLER_LOG` env var: full filter control (e.g. `AI_INSTALLER_LOG=ai_installer::update=trace`)
/// - `--verbose`: sets the `ai_installer` crate to `Debug` level
/// - Otherwise: `Warn` level only (effectively silent)
fn init_logging(verbose: bool) {
    let env_var = std::env::var("AI_INSTALLER_LOG").ok();

    let mut builder = env_logger::Builder::new();
    builder.format_target(true);
    builder.format_module_path(false);

    if let Some(ref filter) = env_var {
        builder.parse_filters(filter);
    } else if verbose {
        builder.filter_module("ai_installer", log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.init();
}

/// Handle broken pipe gracefully instead of panicking.
///
/// When output is piped to a process that exits early (e.g. `ai-installer list --json | head -1`),
/// `println!` panics because the runtime sets SIGPIPE to SIG_IGN. On Unix this resets SIGPIPE to
/// the default; everywhere, a panic hook exits silently on stdout pipe failures.
fn setup_broken_pipe_handling() {
    #[cfg(unix)]
    unsafe {
        // SIGPIPE = 13, SIG_DFL = 0
        unsafe extern "C" {
            fn signal(sig: i32, handler: usize) -> usize;
        }
        signal(13, 0);
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info
            .payload()
            .downcast_ref::<String>()
            .map(|s| s.as_str())
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("");

        if msg.contains("failed printing to stdout") {
            std::process::exit(0);
        }

        default_hook(info);
    }));
}
