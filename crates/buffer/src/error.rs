// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! Error type shared by the stores, the line trackers and the document.

/// Errors reported by buffer operations.
///
/// These are contract violations by the caller (or, for
/// [`BufferError::InvariantViolation`], by the buffer itself). Nothing is
/// retried and no operation that returns an error leaves a partial edit behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// An offset or range falls outside `[0, len]`.
    #[error("invalid location: offset {offset}, length {length} in a buffer of length {len}")]
    BadLocation {
        offset: usize,
        length: usize,
        len: usize,
    },

    /// A line number falls outside `[0, lines)`.
    #[error("invalid line {line}: buffer has {lines} lines")]
    BadLine { line: usize, lines: usize },

    /// A rewrite session was started while another one is active.
    #[error("a rewrite session is already active")]
    RewriteSessionActive,

    /// Line information was requested while line updates are still queued
    /// by the active rewrite session.
    #[error("line information is stale while a rewrite session has queued edits")]
    PendingRewrite,

    /// The store cannot perform the requested mutation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A strictly sequential rewrite session received an out-of-order edit.
    #[error("edit at offset {offset} breaks the strictly sequential rewrite order")]
    NotSequential { offset: usize },

    /// A configuration value was rejected.
    #[error("invalid buffer configuration: {0}")]
    InvalidConfig(String),

    /// Structural validation of a line tracker failed.
    #[error("line tracker invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_location_message() {
        let err = BufferError::BadLocation {
            offset: 7,
            length: 3,
            len: 8,
        };
        assert_eq!(
            err.to_string(),
            "invalid location: offset 7, length 3 in a buffer of length 8"
        );
    }

    #[test]
    fn test_bad_line_message() {
        let err = BufferError::BadLine { line: 4, lines: 2 };
        assert_eq!(err.to_string(), "invalid line 4: buffer has 2 lines");
    }
}
