//! Printer settings
//!
//! These control how a parsed configuration is rendered back to text.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// HAProxy rejects lines with more than 64 arguments; stay below that.
pub const DEFAULT_MAX_LINE_ARGS: usize = 60;

/// Formatting options for the configuration printer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Spaces per nesting level
    pub spaces_per_indent: usize,

    /// Maximum number of arguments emitted on one directive line before
    /// long `acl` and `use_backend` directives are wrapped
    pub max_line_args: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            spaces_per_indent: 4,
            max_line_args: DEFAULT_MAX_LINE_ARGS,
        }
    }
}

impl FormatOptions {
    /// Parse options from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: FormatOptions =
            toml::from_str(content).map_err(|e| Error::FormatOptions(e.to_string()))?;

        if options.max_line_args < 2 {
            return Err(Error::FormatOptions(format!(
                "max_line_args must be at least 2, got {}",
                options.max_line_args
            )));
        }

        Ok(options)
    }

    /// Load options from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = super::load_config(path)?;
        Self::from_toml_str(&content)
    }

    /// Indentation string for the given nesting level
    pub fn indent(&self, level: usize) -> String {
        " ".repeat(self.spaces_per_indent * level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FormatOptions::default();
        assert_eq!(options.spaces_per_indent, 4);
        assert_eq!(options.max_line_args, 60);
        assert_eq!(options.indent(2), "        ");
    }

    #[test]
    fn test_partial_toml() {
        let options = FormatOptions::from_toml_str("spaces_per_indent = 2").unwrap();
        assert_eq!(options.spaces_per_indent, 2);
        assert_eq!(options.max_line_args, DEFAULT_MAX_LINE_ARGS);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            FormatOptions::from_toml_str("spaces_per_indent = \"four\""),
            Err(Error::FormatOptions(_))
        ));
        assert!(FormatOptions::from_toml_str("max_line_args = 1").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hapconf.toml");
        std::fs::write(&path, "max_line_args = 30\n").unwrap();

        let options = FormatOptions::load(&path).unwrap();
        assert_eq!(options.max_line_args, 30);
    }
}
