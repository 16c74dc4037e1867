//! Host platform profiling: architecture, ARM board, and CPU tier.
//!
//! Detection never fails. Anything unrecognized degrades to an `Unknown`,
//! generic, or baseline variant so the run can continue.

pub mod arm;
pub mod cpu;

use std::fmt;
use std::path::Path;
use std::process::Command;

use serde::{Serialize, Serializer};

pub use arm::ArmSubtype;
pub use cpu::{CpuFlags, CpuTier};

/// CPU architecture as reported by the host, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    Arm64,
    Armv7l,
    /// Unrecognized machine string, kept for display.
    Unknown(String),
}

impl Architecture {
    pub fn from_machine(machine: &str) -> Self {
        match machine.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Architecture::X86_64,
            "aarch64" | "arm64" | "armv8" | "armv8l" => Architecture::Arm64,
            "armv7l" | "armv7" | "armhf" | "arm" => Architecture::Armv7l,
            _ => Architecture::Unknown(machine.trim().to_string()),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86_64 => f.write_str("x86_64"),
            Architecture::Arm64 => f.write_str("arm64"),
            Architecture::Armv7l => f.write_str("armv7l"),
            Architecture::Unknown(raw) if raw.is_empty() => f.write_str("unknown"),
            Architecture::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

impl Serialize for Architecture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Architecture::Unknown(_) => serializer.serialize_str("unknown"),
            other => serializer.collect_str(other),
        }
    }
}

/// Everything the installer needs to know about the machine it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    pub architecture: Architecture,
    pub arm_subtype: ArmSubtype,
    pub cpu_tier: CpuTier,
}

/// Read-only view of the host, so detection can run against fixtures.
pub trait HostProbe {
    /// `std::env::consts::OS` style name.
    fn os(&self) -> &str;

    /// Raw machine type (`uname -m`), if it could be read.
    fn machine(&self) -> Option<String>;

    fn read_to_string(&self, path: &Path) -> Option<String>;

    fn exists(&self, path: &Path) -> bool;

    fn has_command(&self, name: &str) -> bool;

    fn cpu_flags(&self) -> CpuFlags {
        cpuinfo_flags(self)
    }
}

/// The `flags` line of `/proc/cpuinfo`; empty when it cannot be read.
fn cpuinfo_flags<H: HostProbe + ?Sized>(host: &H) -> CpuFlags {
    host.read_to_string(Path::new("/proc/cpuinfo"))
        .map(|info| CpuFlags::from_cpuinfo(&info))
        .unwrap_or_default()
}

/// The machine this process is running on.
#[derive(Default)]
pub struct RealHost;

impl HostProbe for RealHost {
    fn os(&self) -> &str {
        std::env::consts::OS
    }

    fn machine(&self) -> Option<String> {
        if cfg!(windows) {
            return std::env::var("PROCESSOR_ARCHITECTURE").ok();
        }
        let output = Command::new("uname").arg("-m").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let machine = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!machine.is_empty()).then_some(machine)
    }

    fn read_to_string(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn has_command(&self, name: &str) -> bool {
        crate::host::command_exists(name)
    }

    fn cpu_flags(&self) -> CpuFlags {
        if self.os() == "macos" {
            return Command::new("sysctl")
                .args(["-n", "machdep.cpu.features", "machdep.cpu.leaf7_features"])
                .output()
                .ok()
                .filter(|o| o.status.success())
                .map(|o| CpuFlags::from_tokens(&String::from_utf8_lossy(&o.stdout)))
                .unwrap_or_default();
        }
        cpuinfo_flags(self)
    }
}

/// Profile the current host. Explicit overrides bypass detection.
pub fn profile(arch_override: Option<Architecture>, arm_override: Option<ArmSubtype>) -> PlatformProfile {
    profile_with(&RealHost, arch_override, arm_override)
}

/// Profile `host`, letting explicit overrides bypass detection.
pub fn profile_with(
    host: &dyn HostProbe,
    arch_override: Option<Architecture>,
    arm_override: Option<ArmSubtype>,
) -> PlatformProfile {
    let architecture = arch_override.unwrap_or_else(|| {
        let machine = host
            .machine()
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());
        Architecture::from_machine(&machine)
    });

    let arm_subtype = match architecture {
        Architecture::Arm64 => arm_override.unwrap_or_else(|| arm::detect_subtype(host)),
        _ => ArmSubtype::None,
    };

    let cpu_tier = match architecture {
        Architecture::X86_64 => {
            let flags = host.cpu_flags();
            if flags.is_empty() {
                log::debug!("no CPU flags readable; assuming baseline x86_64");
            }
            CpuTier::classify(&flags)
        }
        _ => CpuTier::Unknown,
    };

    let profile = PlatformProfile {
        architecture,
        arm_subtype,
        cpu_tier,
    };
    log::debug!("platform profile: {:?}", profile);
    profile
}
