//! Whole-file configuration I/O
//!
//! Reading and writing are atomic from the caller's point of view: the full
//! text is read before parsing starts, and the full text is rendered before
//! anything is written.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Read a configuration file into a string
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded configuration");
    Ok(content)
}

/// Write rendered configuration text to a file, replacing its contents
pub fn save_config<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
    let path = path.as_ref();
    let write_error = |source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(write_error)?;
    file.write_all(text.as_bytes()).map_err(write_error)?;
    // Surfaces errors that would otherwise be lost when the handle is dropped.
    file.sync_all().map_err(write_error)?;

    tracing::debug!(path = %path.display(), bytes = text.len(), "saved configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haproxy.cfg");

        save_config(&path, "global\n    daemon\n").unwrap();
        assert_eq!(load_config(&path).unwrap(), "global\n    daemon\n");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.cfg");

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(err.to_string().starts_with("Cannot read file"));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("this/path/does/not/exist.cfg");

        let err = save_config(&path, "").unwrap_err();
        assert!(matches!(err, Error::FileWrite { .. }));
        assert!(err.to_string().contains("exist.cfg"));
    }
}
