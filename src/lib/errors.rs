//! Typed errors for nonref operations.

use thiserror::Error;

/// Result type alias for nonref operations.
pub type Result<T> = std::result::Result<T, NonrefError>;

/// Error type for nonref operations.
#[derive(Error, Debug)]
pub enum NonrefError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "FASTA")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Required reference sequence not found
    #[error("Reference sequence '{ref_name}' not found")]
    ReferenceNotFound {
        /// The reference sequence name
        ref_name: String,
    },

    /// Requested span does not fit inside a reference sequence
    #[error("Span {start}..{end} exceeds reference sequence '{ref_name}' (length {len})")]
    SpanOutOfBounds {
        /// The reference sequence name
        ref_name: String,
        /// 0-based inclusive start of the requested span
        start: u64,
        /// 0-based exclusive end of the requested span
        end: u64,
        /// Length of the sequence
        len: u64,
    },
}
