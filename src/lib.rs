//! # Permascroll
//!
//! A versioned paragraph store: an append-only edit log paired with an
//! in-memory coalescing buffer.
//!
//! ## Core Concepts
//!
//! - **Paragraphs**: Ordered texts addressed from 1; offsets count chars
//! - **Pending edit**: One staged insert or delete that absorbs adjacent edits
//! - **Permascroll**: The log every flushed edit is appended to, never rewritten
//! - **Replay**: Opening a log rebuilds the paragraphs from its records
//!
//! ## Example
//!
//! ```ignore
//! use permascroll::{ExportScope, Scroll, ScrollConfig};
//!
//! let mut scroll = Scroll::open(ScrollConfig::new("./notes.log"))?;
//!
//! scroll.append_text(1, "Sample data")?;
//! scroll.split_paragraph(1, 7)?;
//! scroll.export(ExportScope::Document, std::io::stdout())?;
//!
//! scroll.close()?;
//! ```

pub mod error;
pub mod export;
pub mod gateway;
pub mod history;
pub mod paragraphs;
pub mod pending;
pub mod records;
pub mod scroll;
pub mod sync;
pub mod types;

// Re-exports
pub use error::{Result, ScrollError};
pub use export::{render, ExportScope};
pub use gateway::{FileSink, LogSink, MemorySink};
pub use history::History;
pub use paragraphs::Paragraphs;
pub use pending::{DeleteMerge, PendingEdit};
pub use records::{LogEntry, OperationLog, LOG_MAGIC};
pub use scroll::{Scroll, ScrollConfig};
pub use sync::{shared, SharedScroll, SyncTimer};
pub use types::*;
