//! Core types for pkg-validator
//!
//! This crate provides the error types, configuration, and logging
//! infrastructure shared by the package decoder and the UI.

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{ConfigError, PkgError, ReadError, ValidationError};
