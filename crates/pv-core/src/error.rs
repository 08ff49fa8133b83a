//! Error types for pkg-validator

use std::path::PathBuf;
use thiserror::Error;

/// Bounds-checked read failures
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Read of {len} bytes at 0x{offset:x} exceeds source extent 0x{extent:x}")]
    OutOfBounds { offset: u64, len: u64, extent: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// PKG header decode errors
#[derive(Error, Debug)]
pub enum PkgError {
    #[error("File too small to be a valid PKG: {len} bytes (minimum 0x{min:X})")]
    TooSmall { len: u64, min: u64 },

    #[error("Invalid PKG magic: 0x{found:08X} (expected 0x{expected:08X})")]
    BadMagic { found: u32, expected: u32 },

    #[error("Failed to read PKG header: {0}")]
    Read(#[from] ReadError),
}

/// Fatal validation outcomes
///
/// The `Display` text of each variant is the reason string handed to the
/// presentation layer.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("File does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Pkg(#[from] PkgError),
}

/// Configuration load/save errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
