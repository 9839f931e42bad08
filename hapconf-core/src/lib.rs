//! hapconf Core Library
//!
//! This crate provides the pieces of hapconf that sit outside the object
//! model: file I/O for configuration text, printer settings and the shared
//! error type.

pub mod config;
pub mod error;

pub use config::{FormatOptions, load_config, save_config};
pub use error::{Error, Result};

/// hapconf version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
