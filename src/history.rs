//! Read-only view of a permascroll's full history.
//!
//! Every record ever flushed is still in the log, so the document can be
//! rebuilt as it stood after any number of records.

use crate::error::{Result, ScrollError};
use crate::paragraphs::Paragraphs;
use crate::records::{parse_log, replay_entries, LogEntry};
use std::path::Path;
use tracing::warn;

/// Parsed records of a log, oldest first.
#[derive(Clone, Debug)]
pub struct History {
    entries: Vec<LogEntry>,
    len: u64,
}

impl History {
    /// Parse a complete log. Fails like replay does on any malformed record.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let parsed = parse_log(bytes)?;
        Ok(Self {
            entries: parsed.entries,
            len: parsed.len,
        })
    }

    /// Like [`History::parse`], but ignores an unterminated final line, such
    /// as one torn by a crash mid-append. Every complete record is kept.
    pub fn parse_complete(bytes: &[u8]) -> Result<Self> {
        let end = bytes
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |i| i + 1);
        if end < bytes.len() {
            warn!(dropped = bytes.len() - end, "ignoring torn final record");
        }
        Self::parse(&bytes[..end])
    }

    /// Read and parse the log file at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ScrollError::io(format!("reading {}", path.display()), e))?;
        Self::parse(&bytes)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Log size in bytes, header included.
    pub fn byte_len(&self) -> u64 {
        self.len
    }

    /// Paragraph texts after the first `records` records.
    pub fn document_at(&self, records: usize) -> Result<Vec<String>> {
        if records > self.entries.len() {
            return Err(ScrollError::InvalidRange {
                start: records,
                end: self.entries.len(),
            });
        }
        let paragraphs = replay_entries(&self.entries[..records])?;
        Ok(texts(&paragraphs))
    }

    /// Paragraph texts after every record.
    pub fn latest(&self) -> Result<Vec<String>> {
        self.document_at(self.entries.len())
    }

    /// The entries as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

fn texts(paragraphs: &Paragraphs) -> Vec<String> {
    paragraphs.iter().map(str::to_string).collect()
}
