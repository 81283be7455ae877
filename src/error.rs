//! Centralized error types for mhtml2html.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mhtml2html library.
#[derive(Error, Debug)]
pub enum MhtmlError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("MHTML file not found: {0}")]
    FileNotFound(PathBuf),

    /// A structural violation in the archive, tagged with the 1-based line
    /// number at which it was detected.
    #[error("{reason}; Line {line}")]
    Parse { reason: String, line: usize },

    /// The cursor ran past the end of the input while scanning for a line.
    /// `line` is the last line that was read.
    #[error("Unexpected EOF; Line {line}")]
    UnexpectedEof { line: usize },

    /// An archive handed to the converter does not have the required shape.
    #[error("MHTML error: invalid {0}")]
    InvalidArchive(&'static str),

    /// A payload could not be re-encoded for embedding.
    #[error("Encoding error: {0}")]
    Encode(String),

    /// The converted document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Convenience alias for `Result<T, MhtmlError>`.
pub type Result<T> = std::result::Result<T, MhtmlError>;

impl MhtmlError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Parse` variant for the given line.
    pub fn parse(reason: impl Into<String>, line: usize) -> Self {
        Self::Parse {
            reason: reason.into(),
            line,
        }
    }

    /// Line number carried by a parse error, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::UnexpectedEof { line } => Some(*line),
            _ => None,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (prefer `MhtmlError::io`).
impl From<std::io::Error> for MhtmlError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = MhtmlError::parse("Content-Transfer-Encoding not provided", 14);
        assert_eq!(
            err.to_string(),
            "Content-Transfer-Encoding not provided; Line 14"
        );
        assert_eq!(err.line(), Some(14));
    }

    #[test]
    fn test_unexpected_eof_message() {
        let err = MhtmlError::UnexpectedEof { line: 8 };
        assert_eq!(err.to_string(), "Unexpected EOF; Line 8");
        assert_eq!(err.line(), Some(8));
    }

    #[test]
    fn test_invalid_archive_message() {
        let err = MhtmlError::InvalidArchive("frames");
        assert_eq!(err.to_string(), "MHTML error: invalid frames");
        assert_eq!(err.line(), None);
    }
}
