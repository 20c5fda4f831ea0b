//! Core types for the permascroll.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single flushed edit, exactly as it is recorded in the log.
///
/// Paragraphs are numbered from 1; offsets count chars from 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Insert `text` at `offset`.
    Insert {
        paragraph: usize,
        offset: usize,
        text: String,
    },

    /// Remove `text`, which starts at `offset`. The deleted text is kept so
    /// the record can be inverted.
    Delete {
        paragraph: usize,
        offset: usize,
        text: String,
    },

    /// Divide the paragraph at `offset`; the tail becomes paragraph + 1.
    Split { paragraph: usize, offset: usize },

    /// Join paragraph + 1 onto the paragraph, whose length was `offset`.
    Merge { paragraph: usize, offset: usize },
}

impl Operation {
    /// Log opcode letter.
    pub fn opcode(&self) -> char {
        match self {
            Operation::Insert { .. } => 'I',
            Operation::Delete { .. } => 'D',
            Operation::Split { .. } => 'S',
            Operation::Merge { .. } => 'M',
        }
    }

    pub fn paragraph(&self) -> usize {
        match self {
            Operation::Insert { paragraph, .. }
            | Operation::Delete { paragraph, .. }
            | Operation::Split { paragraph, .. }
            | Operation::Merge { paragraph, .. } => *paragraph,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            Operation::Insert { offset, .. }
            | Operation::Delete { offset, .. }
            | Operation::Split { offset, .. }
            | Operation::Merge { offset, .. } => *offset,
        }
    }

    /// Text payload, present only for Insert and Delete.
    pub fn text(&self) -> Option<&str> {
        match self {
            Operation::Insert { text, .. } | Operation::Delete { text, .. } => Some(text),
            Operation::Split { .. } | Operation::Merge { .. } => None,
        }
    }

    /// The operation that undoes this one when applied right after it.
    pub fn inverse(&self) -> Operation {
        match self.clone() {
            Operation::Insert {
                paragraph,
                offset,
                text,
            } => Operation::Delete {
                paragraph,
                offset,
                text,
            },
            Operation::Delete {
                paragraph,
                offset,
                text,
            } => Operation::Insert {
                paragraph,
                offset,
                text,
            },
            Operation::Split { paragraph, offset } => Operation::Merge { paragraph, offset },
            Operation::Merge { paragraph, offset } => Operation::Split { paragraph, offset },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{},{}", self.opcode(), self.paragraph(), self.offset())?;
        if let Some(text) = self.text() {
            write!(f, ":{}", text)?;
        }
        Ok(())
    }
}

/// Scroll statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollStats {
    pub paragraphs: usize,
    pub records: u64,
    pub log_bytes: u64,
    pub has_pending: bool,
}
