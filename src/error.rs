//! Error type shared by all components.
//!
//! Every error is fatal for the current run.
//! The variants correspond to the kind of failure: missing resources, truncated or malformed streams, invalid data, and inconsistent mate pairs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ReadzipError>;

/// Errors that can occur when compressing or decompressing reads.
#[derive(Debug, Error)]
pub enum ReadzipError {
    /// I/O error while reading or writing an open stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file could not be opened or created.
    #[error("Cannot access {}: {source}", path.display())]
    Resource {
        /// The file that could not be accessed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The stream ended in the middle of a record.
    #[error("Unexpected end of stream while reading {0}")]
    UnexpectedEnd(&'static str),

    /// The stream is malformed.
    #[error("Invalid stream: {0}")]
    Format(String),

    /// Invalid input data, such as an unknown symbol or an edit outside the read.
    #[error("Invalid data: {0}")]
    Data(String),

    /// The mates of a pair do not fit together.
    #[error("Inconsistent pair {name}: {reason}")]
    Consistency {
        /// Name of the first mate.
        name: String,
        /// What went wrong.
        reason: String,
    },
}

impl ReadzipError {
    /// Creates a resource error for the given file.
    pub fn resource<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        ReadzipError::Resource { path: path.into(), source }
    }

    /// Creates a consistency error for the pair with the given name.
    pub fn consistency(name: &str, reason: impl Into<String>) -> Self {
        ReadzipError::Consistency { name: String::from(name), reason: reason.into() }
    }

    /// Returns `true` if the error was caused by the stream ending in the middle of a record.
    pub fn is_unexpected_end(&self) -> bool {
        matches!(self, ReadzipError::UnexpectedEnd(_))
    }
}
