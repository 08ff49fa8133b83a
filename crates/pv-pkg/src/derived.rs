//! Fields derived from decoded package metadata

use std::fmt;

/// Minimum firmware from a raw `SYSTEM_VER` value
///
/// The first hex digit is the major version and the next two the minor, so
/// `0x08500000` reads as `8.50`. Returns `None` for non-numeric, zero, or
/// too-short values.
pub fn firmware_version(system_ver: &str) -> Option<String> {
    let raw: u64 = system_ver.trim().parse().ok()?;
    if raw == 0 {
        return None;
    }

    let hex = format!("{:X}", raw);
    if hex.len() < 3 {
        return None;
    }
    Some(format!("{}.{}", &hex[..1], &hex[1..3]))
}

/// Strip leading zero padding from a version string; all zeros becomes `"0"`
pub fn strip_version_padding(version: &str) -> String {
    let stripped = version.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Backport guess, taken from the file name only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackportHint {
    /// The file name mentions a backport
    Likely,
    Unknown,
}

impl fmt::Display for BackportHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Likely => write!(f, "Likely (filename hint)"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Guess whether a package is a backport from its file name
pub fn backport_hint(file_name: &str) -> BackportHint {
    if file_name.to_lowercase().contains("backport") {
        BackportHint::Likely
    } else {
        BackportHint::Unknown
    }
}
