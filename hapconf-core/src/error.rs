//! Error types for hapconf

use std::path::PathBuf;
use thiserror::Error;

/// Result type for hapconf core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the I/O side of hapconf
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be opened or read
    #[error("Cannot read file \"{}\": {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be opened, written or flushed
    #[error("Cannot write file \"{}\": {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Printer settings could not be decoded
    #[error("Invalid format options: {0}")]
    FormatOptions(String),
}

impl Error {
    /// Path of the file involved, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::FileRead { path, .. } | Error::FileWrite { path, .. } => Some(path),
            Error::FormatOptions(_) => None,
        }
    }
}
