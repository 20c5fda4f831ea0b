//! The permascroll's operation log.
//!
//! Records are single text lines appended after a fixed header. The log is
//! never rewritten; replaying it from the start rebuilds the paragraphs.

mod codec;
mod log;
mod replay;

pub use codec::{decode, encode, validate_text, LOG_MAGIC};
pub use log::OperationLog;
pub use replay::{parse_log, replay, replay_entries, LogEntry, ParsedLog, Replayed};
