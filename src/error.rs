//! Error types for the permascroll.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scroll operations.
///
/// Variants fall into two classes. Contract violations (bad paragraph
/// indices, offsets, ranges or text) are caller bugs and are never clamped.
/// Everything else comes from the environment or from the log on disk.
#[derive(Debug, Error)]
pub enum ScrollError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Paragraph {paragraph} out of range (document has {count})")]
    ParagraphOutOfRange { paragraph: usize, count: usize },

    #[error("Offset {offset} out of range for paragraph {paragraph} (length {len})")]
    OffsetOutOfRange {
        paragraph: usize,
        offset: usize,
        len: usize,
    },

    #[error("Invalid range: start {start} > end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Invalid text: {0}")]
    InvalidText(String),

    #[error("Invariant violated: {0}")]
    InvariantViolated(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Log not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Log is locked by another process")]
    Locked,

    #[error("Invalid log header: {found:?}")]
    InvalidHeader { found: String },

    #[error("Corrupt log at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Durable append failed after in-memory commit: {source}")]
    FatalWrite {
        #[source]
        source: std::io::Error,
    },

    #[error("Scroll is unusable after a fatal write failure")]
    Poisoned,
}

impl From<serde_json::Error> for ScrollError {
    fn from(e: serde_json::Error) -> Self {
        ScrollError::InvalidConfig(e.to_string())
    }
}

impl ScrollError {
    /// Wrap an I/O error with the operation that produced it.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ScrollError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for errors caused by the caller breaking the API contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ScrollError::ParagraphOutOfRange { .. }
                | ScrollError::OffsetOutOfRange { .. }
                | ScrollError::InvalidRange { .. }
                | ScrollError::InvalidText(_)
                | ScrollError::InvariantViolated(_)
        )
    }

    /// True once the engine must not be used again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrollError::FatalWrite { .. } | ScrollError::Poisoned)
    }
}

/// Result type for scroll operations.
pub type Result<T> = std::result::Result<T, ScrollError>;
