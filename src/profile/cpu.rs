//! CPU feature flag parsing and instruction-set tier classification.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// Ranked x86_64 instruction-set support, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuTier {
    Avx512,
    Avx2,
    Avx,
    Sse4,
    Baseline,
    /// Not evaluated (non-x86_64 host).
    Unknown,
}

impl CpuTier {
    /// Classify a flag set into the highest satisfied tier.
    pub fn classify(flags: &CpuFlags) -> Self {
        if flags.has("avx512f") {
            CpuTier::Avx512
        } else if flags.has("avx2") {
            CpuTier::Avx2
        } else if flags.has("avx") {
            CpuTier::Avx
        } else if flags.has("sse4_2") || flags.has("sse4_1") {
            CpuTier::Sse4
        } else {
            CpuTier::Baseline
        }
    }

    /// Short hint for which build variant runs quantized inference fastest.
    pub fn inference_hint(&self) -> &'static str {
        match self {
            CpuTier::Avx512 => "AVX-512 builds give the fastest quantized inference",
            CpuTier::Avx2 => "AVX2 builds are well supported",
            CpuTier::Avx => "AVX only; quantized inference will be slower",
            CpuTier::Sse4 => "no AVX; expect slow quantized inference",
            CpuTier::Baseline => "baseline x86_64; prefer small models",
            CpuTier::Unknown => "not applicable",
        }
    }
}

impl fmt::Display for CpuTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CpuTier::Avx512 => "avx512",
            CpuTier::Avx2 => "avx2",
            CpuTier::Avx => "avx",
            CpuTier::Sse4 => "sse4",
            CpuTier::Baseline => "baseline",
            CpuTier::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Normalized, lowercase CPU feature flags.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CpuFlags(HashSet<String>);

impl CpuFlags {
    /// Parse the first `flags` line of a Linux `/proc/cpuinfo` dump.
    ///
    /// Returns an empty set when no such line exists.
    pub fn from_cpuinfo(cpuinfo: &str) -> Self {
        cpuinfo
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                (key.trim() == "flags").then_some(value)
            })
            .map(Self::from_tokens)
            .unwrap_or_default()
    }

    /// Parse whitespace-separated feature tokens.
    ///
    /// Accepts the macOS `sysctl machdep.cpu.*features` spelling too
    /// (`AVX1.0`, `SSE4.2`, `AVX512F`).
    pub fn from_tokens(tokens: &str) -> Self {
        let set = tokens
            .split_whitespace()
            .map(|t| {
                let t = t.to_ascii_lowercase().replace('.', "_");
                match t.as_str() {
                    "avx1_0" => "avx".to_string(),
                    _ => t,
                }
            })
            .collect();
        CpuFlags(set)
    }

    pub fn has(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
