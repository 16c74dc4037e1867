//! ARM64 board detection.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use super::HostProbe;

const DEVICE_TREE_MODEL: &str = "/proc/device-tree/model";
const CPUINFO: &str = "/proc/cpuinfo";
const TEGRA_RELEASE: &str = "/etc/nv_tegra_release";
const JETSON_TOOLS: &[&str] = &["tegrastats", "jetson_release"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ArmSubtype {
    AppleSilicon,
    Jetson,
    RaspberryPi,
    #[value(name = "generic")]
    GenericArm64,
    /// Not an arm64 host.
    #[value(skip)]
    None,
}

impl fmt::Display for ArmSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArmSubtype::AppleSilicon => "Apple Silicon",
            ArmSubtype::Jetson => "NVIDIA Jetson",
            ArmSubtype::RaspberryPi => "Raspberry Pi",
            ArmSubtype::GenericArm64 => "generic arm64",
            ArmSubtype::None => "none",
        };
        f.write_str(s)
    }
}

/// What a device-model or CPU descriptor string says about the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardHint {
    RaspberryPi,
    Jetson,
    Unmatched,
}

impl BoardHint {
    pub fn parse(descriptor: &str) -> Self {
        let lower = descriptor.trim_end_matches('\0').to_ascii_lowercase();
        if lower.contains("raspberry pi") {
            BoardHint::RaspberryPi
        } else if lower.contains("jetson") || lower.contains("tegra") {
            BoardHint::Jetson
        } else {
            BoardHint::Unmatched
        }
    }
}

/// Identify the arm64 board. First match wins:
/// Apple Silicon, Raspberry Pi model, Jetson/Tegra model or CPU descriptor,
/// Jetson marker file or tool, then generic.
///
/// The board model comes from the device tree, or from the `Model` line of
/// `/proc/cpuinfo` when the device tree says nothing.
pub fn detect_subtype(host: &dyn HostProbe) -> ArmSubtype {
    if host.os() == "macos" {
        return ArmSubtype::AppleSilicon;
    }

    let cpuinfo = host.read_to_string(Path::new(CPUINFO)).unwrap_or_default();
    let descriptors = cpu_descriptors(&cpuinfo);

    let model = host
        .read_to_string(Path::new(DEVICE_TREE_MODEL))
        .map(|m| BoardHint::parse(&m))
        .filter(|hint| *hint != BoardHint::Unmatched)
        .or_else(|| {
            descriptors
                .iter()
                .find(|(key, _)| *key == "Model")
                .map(|(_, hint)| *hint)
        })
        .unwrap_or(BoardHint::Unmatched);

    if model == BoardHint::RaspberryPi {
        return ArmSubtype::RaspberryPi;
    }

    if model == BoardHint::Jetson || descriptors.iter().any(|(_, hint)| *hint == BoardHint::Jetson)
    {
        return ArmSubtype::Jetson;
    }

    if host.exists(Path::new(TEGRA_RELEASE)) || JETSON_TOOLS.iter().any(|t| host.has_command(t)) {
        return ArmSubtype::Jetson;
    }

    ArmSubtype::GenericArm64
}

/// Every `model name` / `Hardware` / `Model` line of `/proc/cpuinfo`, in order.
fn cpu_descriptors(cpuinfo: &str) -> Vec<(&str, BoardHint)> {
    cpuinfo
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value))
        .filter(|(key, _)| matches!(*key, "model name" | "Hardware" | "Model"))
        .map(|(key, value)| (key, BoardHint::parse(value)))
        .collect()
}
