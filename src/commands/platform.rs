use anyhow::Result;
use serde::Serialize;

use crate::cli::context::RunContext;
use crate::host;
use crate::output::format::to_json;
use crate::profile::{ArmSubtype, CpuTier, PlatformProfile};

#[derive(Debug, Serialize)]
struct PlatformReport<'a> {
    #[serde(flatten)]
    profile: &'a PlatformProfile,
    os: &'static str,
    wsl: bool,
    windows: bool,
    inference_hint: &'static str,
}

/// Print the detected platform profile.
pub fn run(ctx: &RunContext, profile: &PlatformProfile) -> Result<()> {
    let report = PlatformReport {
        profile,
        os: std::env::consts::OS,
        wsl: host::is_wsl(),
        windows: host::is_windows(),
        inference_hint: profile.cpu_tier.inference_hint(),
    };

    if ctx.is_json() {
        println!("{}", to_json(&report));
        return Ok(());
    }

    println!("Architecture: {}", profile.architecture);
    if profile.arm_subtype != ArmSubtype::None {
        println!("ARM board:    {}", profile.arm_subtype);
    }
    if profile.cpu_tier != CpuTier::Unknown {
        println!("CPU tier:     {} ({})", profile.cpu_tier, report.inference_hint);
    }
    let os = if report.wsl {
        format!("{} (WSL)", report.os)
    } else {
        report.os.to_string()
    };
    println!("OS:           {}", os);
    Ok(())
}
