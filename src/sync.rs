//! Background durability syncing.
//!
//! The scroll does no locking itself, so the timer and the editing code share
//! it through one mutex.

use crate::error::{Result, ScrollError};
use crate::scroll::{Scroll, ScrollConfig};
use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

/// A scroll shared between the editor and the sync timer.
pub type SharedScroll = Arc<Mutex<Scroll>>;

/// Wrap a scroll for sharing.
pub fn shared(scroll: Scroll) -> SharedScroll {
    Arc::new(Mutex::new(scroll))
}

/// Periodically flushes and syncs a shared scroll on its own thread.
pub struct SyncTimer {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SyncTimer {
    /// Start syncing `scroll` every `interval`, which must be non-zero.
    pub fn spawn(scroll: SharedScroll, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ScrollError::InvalidConfig(
                "sync interval must be greater than zero".into(),
            ));
        }
        let (stop, stopped) = bounded::<()>(1);
        let ticks = tick(interval);

        let handle = thread::Builder::new()
            .name("permascroll-sync".into())
            .spawn(move || loop {
                select! {
                    recv(stopped) -> _ => break,
                    recv(ticks) -> _ => {
                        match scroll.lock().sync() {
                            Ok(()) => {}
                            Err(e) if e.is_fatal() => {
                                error!(error = %e, "sync timer stopping");
                                break;
                            }
                            Err(e) => warn!(error = %e, "periodic sync failed"),
                        }
                    }
                }
            })
            .map_err(|e| ScrollError::io("spawning sync timer", e))?;

        debug!(?interval, "sync timer started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Start a timer if `config` asks for one.
    pub fn from_config(scroll: &SharedScroll, config: &ScrollConfig) -> Result<Option<Self>> {
        config
            .sync_interval()
            .map(|interval| Self::spawn(Arc::clone(scroll), interval))
            .transpose()
    }

    /// True while the background thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the timer and wait for its thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("sync timer thread panicked");
            }
        }
    }
}

impl Drop for SyncTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemorySink;
    use std::time::Instant;

    #[test]
    fn test_timer_flushes_pending_edit() {
        let sink = MemorySink::new();
        let scroll = shared(Scroll::in_memory(sink.clone()).unwrap());
        scroll.lock().append_text(1, "tick").unwrap();

        let timer = SyncTimer::spawn(Arc::clone(&scroll), Duration::from_millis(5)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while scroll.lock().stats().has_pending && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        timer.stop();

        assert_eq!(sink.contents(), b"JottyV0\nI1,0:tick\n");
        assert!(sink.sync_count() >= 2);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let scroll = shared(Scroll::in_memory(MemorySink::new()).unwrap());
        let err = SyncTimer::spawn(scroll, Duration::ZERO).err().unwrap();
        assert!(matches!(err, ScrollError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_config_without_interval() {
        let scroll = shared(Scroll::in_memory(MemorySink::new()).unwrap());
        let timer = SyncTimer::from_config(&scroll, &ScrollConfig::default()).unwrap();
        assert!(timer.is_none());
    }
}
