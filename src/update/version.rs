//! Version parsing and comparison for artifact names and probe output.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// Architecture tokens that may trail an artifact name, longest first so
/// `-armv7l` is not mistaken for `-arm`.
const ARCH_SUFFIXES: &[&str] = &["-aarch64", "-armv7l", "-arm64", "-arm"];

/// A `major.minor.patch` version, ordered field by field.
///
/// `(0, 0, 0)` doubles as "unknown": anything that cannot be parsed maps to it,
/// and it sorts below every real release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionTuple {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionTuple {
    pub const UNKNOWN: VersionTuple = VersionTuple::new(0, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the version embedded in an artifact name such as `main-v2.6-arm64`.
    ///
    /// A trailing architecture token is stripped first, then the first
    /// `major.minor[.patch]` run is taken. Returns [`VersionTuple::UNKNOWN`]
    /// when nothing matches.
    pub fn parse(name: &str) -> Self {
        Self::find_in(strip_arch_suffix(name)).unwrap_or(Self::UNKNOWN)
    }

    /// Find the first `v?major.minor[.patch]` token in free-form text.
    pub fn find_in(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if !bytes[i].is_ascii_digit() {
                i += 1;
                continue;
            }

            let (major, after_major) = digit_run(bytes, i);
            if let Some(version) = match_rest(bytes, major, after_major) {
                return Some(version);
            }
            i = after_major;
        }

        None
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for VersionTuple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Remove one trailing architecture token, matched case-insensitively.
pub fn strip_arch_suffix(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    for suffix in ARCH_SUFFIXES {
        if lower.ends_with(suffix) {
            return &name[..name.len() - suffix.len()];
        }
    }
    name
}

/// Returns the architecture token at the end of `name`, lowercased, if any.
pub fn arch_suffix(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    ARCH_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &suffix[1..])
}

/// Scan a run of ASCII digits starting at `start`.
///
/// Returns the parsed value (None on overflow) and the index just past the run.
fn digit_run(bytes: &[u8], start: usize) -> (Option<u32>, usize) {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    // The slice is ASCII digits only, so from_utf8 cannot fail.
    let value = std::str::from_utf8(&bytes[start..end])
        .ok()
        .and_then(|s| s.parse::<u32>().ok());
    (value, end)
}

/// Try to complete `major` into `major.minor[.patch]` starting at `pos`.
fn match_rest(bytes: &[u8], major: Option<u32>, pos: usize) -> Option<VersionTuple> {
    let major = major?;
    if bytes.get(pos) != Some(&b'.') || !bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let (minor, after_minor) = digit_run(bytes, pos + 1);
    let minor = minor?;

    let patch = if bytes.get(after_minor) == Some(&b'.')
        && bytes.get(after_minor + 1).is_some_and(u8::is_ascii_digit)
    {
        digit_run(bytes, after_minor + 1).0?
    } else {
        0
    };

    Some(VersionTuple::new(major, minor, patch))
}
