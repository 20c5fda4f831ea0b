//! Append-only operation log.

use super::codec::{encode, LOG_MAGIC};
use crate::gateway::LogSink;
use crate::types::Operation;
use std::io;

/// Writer side of the permascroll.
///
/// Tracks where the last record started so each new record can carry its
/// version delta, and counts writes for interval syncing.
pub struct OperationLog {
    sink: Box<dyn LogSink>,

    /// Bytes in the log, header included.
    len: u64,

    /// Offset of the most recent record (0 = the header).
    last_record_start: u64,

    /// Records appended over the log's lifetime.
    records: u64,

    /// Prefix records with their version delta.
    version_deltas: bool,

    /// Sync every N records (0 = only on explicit sync).
    sync_every: u64,

    writes_since_sync: u64,
}

impl OperationLog {
    /// Start a brand new log by writing the header.
    pub fn create(
        mut sink: Box<dyn LogSink>,
        version_deltas: bool,
        sync_every: u64,
    ) -> io::Result<Self> {
        sink.write(LOG_MAGIC.as_bytes())?;
        sink.sync()?;
        Ok(Self::resume(
            sink,
            LOG_MAGIC.len() as u64,
            0,
            0,
            version_deltas,
            sync_every,
        ))
    }

    /// Continue a log whose existing content has already been replayed.
    pub fn resume(
        sink: Box<dyn LogSink>,
        len: u64,
        last_record_start: u64,
        records: u64,
        version_deltas: bool,
        sync_every: u64,
    ) -> Self {
        Self {
            sink,
            len,
            last_record_start,
            records,
            version_deltas,
            sync_every,
            writes_since_sync: 0,
        }
    }

    /// Append one record.
    ///
    /// Returns the number of bytes written. Positions only advance when the
    /// write succeeds.
    pub fn append(&mut self, op: &Operation) -> io::Result<u64> {
        let delta = self
            .version_deltas
            .then(|| self.len - self.last_record_start);
        let line = encode(op, delta);
        self.sink.write(line.as_bytes())?;

        let written = line.len() as u64;
        self.last_record_start = self.len;
        self.len += written;
        self.records += 1;
        self.writes_since_sync += 1;
        Ok(written)
    }

    /// True when the configured interval asks for a sync now.
    pub fn sync_due(&self) -> bool {
        self.sync_every > 0 && self.writes_since_sync >= self.sync_every
    }

    pub fn sync(&mut self) -> io::Result<()> {
        self.sink.sync()?;
        self.writes_since_sync = 0;
        Ok(())
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.sink.close()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn records(&self) -> u64 {
        self.records
    }
}
