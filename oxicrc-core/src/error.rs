//! Error types for OxiCRC operations.
//!
//! Checksum arithmetic itself is total and never fails. Errors only arise at
//! the edges: choosing a backend by name, configuring the stream layout of an
//! accelerated engine, and reading input files.

use std::io;
use thiserror::Error;

/// The main error type for OxiCRC operations.
#[derive(Debug, Error)]
pub enum OxiCrcError {
    /// I/O error while reading checksum input.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stream count outside the supported range.
    #[error("Invalid {kind} stream count {count}: expected {min}..={max}")]
    InvalidStreamCount {
        /// Which lane family the count was given for (`crc` or `pclmul`).
        kind: &'static str,
        /// The rejected count.
        count: usize,
        /// Smallest accepted count.
        min: usize,
        /// Largest accepted count.
        max: usize,
    },

    /// Unknown medium-size cutoff strategy name.
    #[error("Unknown cutoff strategy: {name}")]
    UnknownStrategy {
        /// The name that failed to parse.
        name: String,
    },

    /// A backend description that could not be parsed.
    #[error("Invalid backend '{spec}': expected 'auto', 'generic' or '<crc>+<pclmul>/<strategy>'")]
    InvalidBackend {
        /// The rejected backend description.
        spec: String,
    },

    /// The requested backend cannot run on this CPU or build.
    #[error("Backend {backend} is not available on this CPU")]
    UnsupportedBackend {
        /// Display form of the requested backend.
        backend: String,
    },

    /// Parallel chunk size of zero.
    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Result type alias for OxiCRC operations.
pub type Result<T> = std::result::Result<T, OxiCrcError>;

impl OxiCrcError {
    /// Create an invalid stream count error.
    pub fn invalid_stream_count(kind: &'static str, count: usize, min: usize, max: usize) -> Self {
        Self::InvalidStreamCount {
            kind,
            count,
            min,
            max,
        }
    }

    /// Create an unknown strategy error.
    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy { name: name.into() }
    }

    /// Create an invalid backend error.
    pub fn invalid_backend(spec: impl Into<String>) -> Self {
        Self::InvalidBackend { spec: spec.into() }
    }

    /// Create an unsupported backend error.
    pub fn unsupported_backend(backend: impl ToString) -> Self {
        Self::UnsupportedBackend {
            backend: backend.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OxiCrcError::invalid_stream_count("crc", 4, 1, 3);
        assert_eq!(
            err.to_string(),
            "Invalid crc stream count 4: expected 1..=3"
        );

        let err = OxiCrcError::unknown_strategy("fold5");
        assert!(err.to_string().contains("fold5"));

        let err = OxiCrcError::invalid_backend("3+x");
        assert!(err.to_string().contains("'3+x'"));

        let err = OxiCrcError::unsupported_backend("3+1/fold3");
        assert!(err.to_string().contains("3+1/fold3"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OxiCrcError = io_err.into();
        assert!(matches!(err, OxiCrcError::Io(_)));
    }
}
