use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::context::RunContext;
use crate::config::InstallerConfig;
use crate::host;
use crate::output::console::version_label;
use crate::output::format::to_json;
use crate::update::locate::{CommandVersionProbe, InstallLocator};

/// List every installed copy with its probed version.
pub fn run(ctx: &RunContext, config: &InstallerConfig, prefix: &Path) -> Result<()> {
    let probe = CommandVersionProbe {
        timeout: config.probe_timeout(),
    };
    let locator = InstallLocator {
        binary_name: config.binary_name.clone(),
        search_dirs: config.search_dirs(prefix),
        path_var: std::env::var_os("PATH"),
        windows: host::is_windows(),
        probe: &probe,
    };
    let instances = locator.locate();

    if ctx.is_json() {
        println!("{}", to_json(&instances));
        return Ok(());
    }

    if instances.is_empty() {
        println!("No installs of '{}' found.", config.binary_name);
        return Ok(());
    }

    for (i, instance) in instances.iter().enumerate() {
        let label = version_label(instance.version);
        let marker = if i == 0 { " (primary)".green().to_string() } else { String::new() };
        println!("{}  {}{}", instance.path.display(), label, marker);
    }
    Ok(())
}
