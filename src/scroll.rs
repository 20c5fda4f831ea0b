//! The `Scroll`: paragraphs, the pending edit and the log tied together.

use crate::error::{Result, ScrollError};
use crate::gateway::{FileSink, LogSink, MemorySink};
use crate::paragraphs::{check_range, out_of_range, Paragraphs};
use crate::pending::{DeleteMerge, PendingEdit};
use crate::records::{replay, validate_text, OperationLog};
use crate::types::{Operation, ScrollStats};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Scroll configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Log file backing the scroll.
    pub path: PathBuf,

    /// Whether to create and initialize the log if it doesn't exist.
    pub create_if_missing: bool,

    /// Prefix each record with its version delta.
    pub version_deltas: bool,

    /// Sync after every N records (0 = only on `sync`/`close`).
    pub sync_every: u64,

    /// Period for a background `SyncTimer`, if one is wanted.
    pub sync_interval_ms: Option<u64>,

    /// Hold an exclusive lock on the log file while open.
    pub lock: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./scroll.log"),
            create_if_missing: true,
            version_deltas: false,
            sync_every: 0,
            sync_interval_ms: None,
            lock: true,
        }
    }
}

impl ScrollConfig {
    /// Default configuration for the log at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON object; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn sync_interval(&self) -> Option<Duration> {
        self.sync_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// A versioned document: paragraphs plus the permascroll that records every
/// change made to them.
///
/// All mutation goes through a single pending edit. Adjacent edits coalesce
/// into it; anything incompatible flushes it first. A flush updates the
/// paragraphs, then appends exactly one record. The scroll does no locking of
/// its own; share it behind a mutex (see [`crate::SharedScroll`]).
pub struct Scroll {
    paragraphs: Paragraphs,
    pending: PendingEdit,
    log: OperationLog,
    path: Option<PathBuf>,

    /// Set when a durable append failed after memory was already updated.
    poisoned: bool,

    closed: bool,
}

impl Scroll {
    /// Open the log at `config.path`, replaying it, or create it.
    pub fn open(config: ScrollConfig) -> Result<Self> {
        let path = config.path.clone();
        if !path.exists() && !config.create_if_missing {
            return Err(ScrollError::NotFound(path));
        }

        let mut sink = FileSink::open_append(&path, config.create_if_missing)
            .map_err(|e| ScrollError::io(format!("opening {}", path.display()), e))?;

        if config.lock {
            sink.try_lock().map_err(|e| {
                if e.kind() == fs2::lock_contended_error().kind() {
                    ScrollError::Locked
                } else {
                    ScrollError::io(format!("locking {}", path.display()), e)
                }
            })?;
        }

        let existing = std::fs::read(&path)
            .map_err(|e| ScrollError::io(format!("reading {}", path.display()), e))?;

        let mut scroll = Self::from_parts(&existing, Box::new(sink), &config)?;
        info!(
            path = %path.display(),
            paragraphs = scroll.paragraph_count(),
            records = scroll.log.records(),
            "scroll opened"
        );
        scroll.path = Some(path);
        Ok(scroll)
    }

    /// Build a scroll from a log's existing bytes and a sink positioned at
    /// their end. Empty `existing` starts a new log by writing the header.
    pub fn from_parts(
        existing: &[u8],
        sink: Box<dyn LogSink>,
        config: &ScrollConfig,
    ) -> Result<Self> {
        let (paragraphs, log) = if existing.is_empty() {
            let log = OperationLog::create(sink, config.version_deltas, config.sync_every)
                .map_err(|e| ScrollError::io("writing log header", e))?;
            (Paragraphs::new(), log)
        } else {
            let replayed = replay(existing)?;
            let log = OperationLog::resume(
                sink,
                replayed.len,
                replayed.last_record_start,
                replayed.records,
                config.version_deltas,
                config.sync_every,
            );
            (replayed.paragraphs, log)
        };

        Ok(Self {
            paragraphs,
            pending: PendingEdit::None,
            log,
            path: None,
            poisoned: false,
            closed: false,
        })
    }

    /// A fresh scroll writing into an in-memory sink.
    pub fn in_memory(sink: MemorySink) -> Result<Self> {
        Self::from_parts(&[], Box::new(sink), &ScrollConfig::default())
    }

    // --- Reads ---

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.count()
    }

    /// Text of `paragraph` with any pending edit applied.
    pub fn get_text(&self, paragraph: usize) -> Result<String> {
        let stored = self.paragraphs.text(paragraph)?;
        Ok(self.pending.overlay(paragraph, stored).into_owned())
    }

    /// Length in chars of `paragraph` with any pending edit applied.
    pub fn get_size(&self, paragraph: usize) -> Result<usize> {
        let stored = self.paragraphs.len(paragraph)?;
        Ok(self.pending.live_len(paragraph, stored))
    }

    /// Live text of every paragraph.
    pub fn texts(&self) -> Vec<String> {
        (1..=self.paragraph_count())
            .map(|p| {
                let stored = self.paragraphs.text(p).unwrap_or_default();
                self.pending.overlay(p, stored).into_owned()
            })
            .collect()
    }

    pub fn pending(&self) -> &PendingEdit {
        &self.pending
    }

    pub fn stats(&self) -> ScrollStats {
        ScrollStats {
            paragraphs: self.paragraph_count(),
            records: self.log.records(),
            log_bytes: self.log.len(),
            has_pending: !self.pending.is_none(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn stored(&self) -> &Paragraphs {
        &self.paragraphs
    }

    // --- Text edits ---

    /// Insert `text` at char offset `pos` of `paragraph`.
    pub fn insert_text(&mut self, paragraph: usize, pos: usize, text: &str) -> Result<()> {
        self.ensure_usable()?;
        validate_text(text)?;
        let len = self.get_size(paragraph)?;
        if pos > len {
            return Err(out_of_range(paragraph, pos, len));
        }
        if text.is_empty() {
            return Ok(());
        }

        if self.pending.absorb_insert(paragraph, pos, text) {
            trace!(paragraph, pos, "insert coalesced");
            return Ok(());
        }

        self.flush()?;
        self.pending = PendingEdit::Insert {
            paragraph,
            offset: pos,
            text: text.to_string(),
        };
        Ok(())
    }

    /// Insert `text` at the end of `paragraph`.
    pub fn append_text(&mut self, paragraph: usize, text: &str) -> Result<()> {
        let len = self.get_size(paragraph)?;
        self.insert_text(paragraph, len, text)
    }

    /// Delete the chars in `[pos, end)` of `paragraph`.
    pub fn delete_text(&mut self, paragraph: usize, pos: usize, end: usize) -> Result<()> {
        self.ensure_usable()?;
        let len = self.get_size(paragraph)?;
        check_range(paragraph, pos, end, len)?;
        if pos == end {
            return Ok(());
        }

        match self.pending.absorb_delete(paragraph, pos, end) {
            DeleteMerge::Absorbed => {
                trace!(paragraph, pos, end, "delete coalesced");
            }
            DeleteMerge::Incompatible => {
                self.flush()?;
                self.pending = PendingEdit::Delete {
                    paragraph,
                    offset: pos,
                    len: end - pos,
                };
            }
            DeleteMerge::Overflow { offset, len } => {
                trace!(paragraph, offset, len, "delete ran past pending insert");
                self.flush()?;
                self.pending = PendingEdit::Delete {
                    paragraph,
                    offset,
                    len,
                };
            }
        }
        Ok(())
    }

    // --- Structural edits ---

    /// Split `paragraph` at `pos`; the tail becomes the next paragraph.
    pub fn split_paragraph(&mut self, paragraph: usize, pos: usize) -> Result<()> {
        self.ensure_usable()?;
        let len = self.get_size(paragraph)?;
        if pos > len {
            return Err(out_of_range(paragraph, pos, len));
        }
        self.flush()?;
        self.commit(Operation::Split {
            paragraph,
            offset: pos,
        })
    }

    /// Join the following paragraph onto `paragraph`. No-op on the last one.
    pub fn merge_paragraph(&mut self, paragraph: usize) -> Result<()> {
        self.ensure_usable()?;
        self.paragraphs.check_paragraph(paragraph)?;
        if paragraph == self.paragraph_count() {
            return Ok(());
        }
        self.flush()?;
        let offset = self.paragraphs.len(paragraph)?;
        self.commit(Operation::Merge { paragraph, offset })
    }

    // --- Durability ---

    /// Apply the pending edit to the paragraphs and append its record.
    /// Does nothing when no edit is pending.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_usable()?;
        let paragraphs = &self.paragraphs;
        let op = self
            .pending
            .take()
            .into_operation(|p, start, end| paragraphs.slice(p, start, end))
            .map_err(|e| {
                ScrollError::InvariantViolated(format!("pending delete is out of bounds: {}", e))
            })?;
        match op {
            Some(op) => self.commit(op),
            None => Ok(()),
        }
    }

    /// Flush, then make the log durable.
    pub fn sync(&mut self) -> Result<()> {
        self.flush()?;
        self.log
            .sync()
            .map_err(|e| ScrollError::io("syncing log", e))
    }

    /// Flush, sync and release the log.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        if self.poisoned {
            return Err(ScrollError::Poisoned);
        }
        let synced = self.sync();
        let closed = self
            .log
            .close()
            .map_err(|e| ScrollError::io("closing log", e));
        info!(records = self.log.records(), "scroll closed");
        synced.and(closed)
    }

    pub(crate) fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(ScrollError::Poisoned);
        }
        Ok(())
    }

    /// Memory first, then the log. A failed append after memory changed is
    /// fatal: the scroll would otherwise diverge from its log. Once the
    /// append succeeds the edit has happened, so nothing after it may fail.
    fn commit(&mut self, op: Operation) -> Result<()> {
        self.paragraphs.apply(&op).map_err(|e| {
            ScrollError::InvariantViolated(format!("cannot apply {}: {}", op, e))
        })?;

        if let Err(e) = self.log.append(&op) {
            return Err(self.poison(e));
        }
        debug!(record = %op, "flushed");

        // The record is committed either way; a failed interval sync stays
        // due and is retried by the next commit or an explicit `sync`.
        if self.log.sync_due() {
            if let Err(e) = self.log.sync() {
                warn!(error = %e, record = %op, "interval sync failed");
            }
        }
        Ok(())
    }

    fn poison(&mut self, source: io::Error) -> ScrollError {
        self.poisoned = true;
        error!(error = %source, "log append failed after in-memory commit; scroll is unusable");
        if let Err(e) = self.log.close() {
            warn!(error = %e, "closing log after fatal write failed");
        }
        ScrollError::FatalWrite { source }
    }
}

impl Drop for Scroll {
    fn drop(&mut self) {
        if self.closed || self.poisoned || self.pending.is_none() {
            return;
        }
        if let Err(e) = self.sync() {
            warn!(error = %e, "flushing pending edit on drop failed");
        }
    }
}
