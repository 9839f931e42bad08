//! Error types for the configuration model and parser

use crate::parser::CursorError;
use thiserror::Error;

/// A directive operation was rejected by the section it targets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidParameterError {
    /// The section kind does not support this directive family
    #[error("{} is not allowed on a {section} proxy block!", capitalize(.operation))]
    NotAllowed {
        operation: &'static str,
        section: &'static str,
    },

    /// The section only accepts this data through its dedicated methods
    #[error("{message}")]
    Rejected { message: String },

    #[error("use_backend requires a backend name")]
    MissingBackendName,
}

/// Structural errors found while reading configuration text
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{section} section at position {position} must have a name")]
    MissingName {
        section: &'static str,
        position: usize,
    },

    #[error("{section} section at position {position} does not take a name, found '{found}'")]
    UnexpectedName {
        section: &'static str,
        found: String,
        position: usize,
    },

    #[error("Invalid bind parameters for {section} \"{name}\" at position {position}: '{value}'")]
    InvalidBind {
        section: &'static str,
        name: String,
        value: String,
        position: usize,
    },

    #[error("Invalid server parameters for {section} \"{name}\" at position {position}: '{value}'")]
    InvalidServer {
        section: &'static str,
        name: String,
        value: String,
        position: usize,
    },

    #[error("Invalid acl parameters for {section} \"{name}\" at position {position}")]
    InvalidAcl {
        section: &'static str,
        name: String,
        position: usize,
    },

    #[error("Unable to parse user or group parameters for userlist \"{name}\" at position {position}")]
    InvalidUserlistEntry { name: String, position: usize },

    #[error("Invalid directive at position {position}: {source}")]
    Parameter {
        #[source]
        source: InvalidParameterError,
        position: usize,
    },

    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),
}

impl ParseError {
    /// Byte offset of the line that caused the error
    pub fn position(&self) -> usize {
        match self {
            ParseError::MissingName { position, .. }
            | ParseError::UnexpectedName { position, .. }
            | ParseError::InvalidBind { position, .. }
            | ParseError::InvalidServer { position, .. }
            | ParseError::InvalidAcl { position, .. }
            | ParseError::InvalidUserlistEntry { position, .. }
            | ParseError::Parameter { position, .. } => *position,
            ParseError::Cursor(CursorError::OutOfRange { position }) => *position,
        }
    }
}

/// Top-level error for load/parse/save pipelines
#[derive(Debug, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),

    #[error(transparent)]
    Io(#[from] hapconf_core::Error),
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_allowed_message() {
        let err = InvalidParameterError::NotAllowed {
            operation: "bind",
            section: "backend",
        };
        assert_eq!(err.to_string(), "Bind is not allowed on a backend proxy block!");
    }

    #[test]
    fn test_parse_error_position() {
        let err = ParseError::InvalidBind {
            section: "frontend",
            name: "www".to_string(),
            value: "badhost".to_string(),
            position: 17,
        };
        assert_eq!(err.position(), 17);
        assert!(err.to_string().contains("Invalid bind parameters for frontend \"www\""));
    }
}
