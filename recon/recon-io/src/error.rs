//! Error types for interchange I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for interchange I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during interchange I/O.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Invalid file content (parse error).
    #[error("invalid file content at line {line}: {message}")]
    InvalidContent {
        /// 1-based line number of the offending line.
        line: usize,
        /// Description of what was invalid.
        message: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    /// Creates an `InvalidContent` error for the given line.
    #[must_use]
    pub fn invalid_content(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IoError::invalid_content(7, "bad vertex");
        let text = format!("{err}");
        assert!(text.contains("line 7"));
        assert!(text.contains("bad vertex"));
    }
}
