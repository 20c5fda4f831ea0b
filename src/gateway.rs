//! Persistence gateway: where log bytes go.
//!
//! The engine only ever appends, syncs and closes. `FileSink` is the durable
//! implementation; `MemorySink` keeps bytes in a shared buffer for tests and
//! embedders that persist the log themselves.

use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Append-only destination for log records.
pub trait LogSink: Send {
    /// Append `bytes` in full.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Make everything written so far durable.
    fn sync(&mut self) -> io::Result<()>;

    /// Release the sink. Later writes are errors.
    fn close(&mut self) -> io::Result<()>;
}

/// Log file opened in append mode.
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
    locked: bool,
}

impl FileSink {
    /// Open `path` for appending, creating it when `create` is set.
    pub fn open_append(path: impl AsRef<Path>, create: bool) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(create)
            .open(&path)?;
        Ok(Self {
            path,
            file: Some(file),
            locked: false,
        })
    }

    /// Take an exclusive advisory lock. Fails with `WouldBlock` when another
    /// process holds it.
    pub fn try_lock(&mut self) -> io::Result<()> {
        self.handle()?.try_lock_exclusive()?;
        self.locked = true;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the file on disk.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.handle()?.metadata()?.len())
    }

    fn handle(&self) -> io::Result<&File> {
        self.file.as_ref().ok_or_else(closed)
    }
}

impl LogSink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.as_mut().ok_or_else(closed)?.write_all(bytes)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.handle()?.sync_data()
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let synced = file.sync_all();
        if self.locked {
            if let Err(e) = FileExt::unlock(&file) {
                warn!(path = %self.path.display(), error = %e, "unlocking log failed");
            }
            self.locked = false;
        }
        synced
    }
}

/// In-memory sink sharing its buffer between clones.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
    syncs: Arc<Mutex<u64>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    /// Number of `sync` calls observed.
    pub fn sync_count(&self) -> u64 {
        *self.syncs.lock()
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.bytes.lock().extend_from_slice(bytes);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        *self.syncs.lock() += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "log sink is closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.log");
        std::fs::write(&path, b"head\n").unwrap();

        let mut sink = FileSink::open_append(&path, false).unwrap();
        sink.write(b"one\n").unwrap();
        sink.write(b"two\n").unwrap();
        sink.sync().unwrap();
        assert_eq!(sink.len().unwrap(), 13);
        sink.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"head\none\ntwo\n");
        assert!(sink.write(b"late").is_err());
    }

    #[test]
    fn test_close_releases_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.log");

        let mut first = FileSink::open_append(&path, true).unwrap();
        first.try_lock().unwrap();
        let mut second = FileSink::open_append(&path, false).unwrap();
        assert!(second.try_lock().is_err());

        first.close().unwrap();
        second.try_lock().unwrap();
        second.close().unwrap();
    }

    #[test]
    fn test_file_sink_missing_without_create() {
        let dir = TempDir::new().unwrap();
        let err = FileSink::open_append(dir.path().join("absent.log"), false)
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write(b"abc").unwrap();
        writer.sync().unwrap();
        assert_eq!(sink.contents(), b"abc");
        assert_eq!(sink.sync_count(), 1);
    }
}
