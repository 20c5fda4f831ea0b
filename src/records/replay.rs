//! Parsing and replaying a whole log.

use super::codec::{decode, LOG_MAGIC};
use crate::error::{Result, ScrollError};
use crate::paragraphs::Paragraphs;
use crate::types::Operation;
use serde::Serialize;
use tracing::{debug, info};

/// One parsed record and where it sits in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// 1-based line number; the header is line 1.
    pub line: usize,
    /// Byte offset of the record's first byte.
    pub offset: u64,
    /// Version delta, if the writer recorded one.
    pub delta: Option<u64>,
    pub operation: Operation,
}

/// A log split into validated records.
#[derive(Clone, Debug, Default)]
pub struct ParsedLog {
    pub entries: Vec<LogEntry>,
    /// Total bytes, header included.
    pub len: u64,
    /// Offset of the last record (0 when there are none).
    pub last_record_start: u64,
}

/// Result of replaying a log into a fresh store.
#[derive(Clone, Debug)]
pub struct Replayed {
    pub paragraphs: Paragraphs,
    pub records: u64,
    pub len: u64,
    pub last_record_start: u64,
}

/// Check the header, then decode every record and verify version deltas.
///
/// Any malformed line rejects the whole log. That includes a final line torn
/// by a crash mid-append: opening such a log for writing would append after
/// garbage, so the caller must repair it first. Read-only callers can use
/// [`crate::History::parse_complete`] to see every complete record.
pub fn parse_log(bytes: &[u8]) -> Result<ParsedLog> {
    if !bytes.starts_with(LOG_MAGIC.as_bytes()) {
        let first = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
        return Err(ScrollError::InvalidHeader {
            found: String::from_utf8_lossy(first).into_owned(),
        });
    }

    let header = LOG_MAGIC.len();
    let body = std::str::from_utf8(&bytes[header..]).map_err(|e| {
        let valid = &bytes[header..header + e.valid_up_to()];
        ScrollError::Corrupt {
            line: 2 + valid.iter().filter(|b| **b == b'\n').count(),
            reason: "invalid UTF-8".into(),
        }
    })?;

    let mut parsed = ParsedLog {
        len: bytes.len() as u64,
        ..Default::default()
    };
    let mut offset = header as u64;
    let mut rest = body;
    let mut line = 1;

    while !rest.is_empty() {
        line += 1;
        let Some(nl) = rest.find('\n') else {
            return Err(ScrollError::Corrupt {
                line,
                reason: "truncated record (no trailing newline)".into(),
            });
        };
        let (delta, operation) = decode(line, &rest[..nl])?;

        if let Some(delta) = delta {
            let actual = offset - parsed.last_record_start;
            if delta != actual {
                return Err(ScrollError::Corrupt {
                    line,
                    reason: format!(
                        "version delta {} does not match distance {} to previous record",
                        delta, actual
                    ),
                });
            }
        }

        parsed.entries.push(LogEntry {
            line,
            offset,
            delta,
            operation,
        });
        parsed.last_record_start = offset;
        offset += nl as u64 + 1;
        rest = &rest[nl + 1..];
    }

    Ok(parsed)
}

/// Apply entries in order to a fresh single-paragraph store.
pub fn replay_entries<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
) -> Result<Paragraphs> {
    let mut paragraphs = Paragraphs::new();
    for entry in entries {
        paragraphs
            .apply(&entry.operation)
            .map_err(|e| ScrollError::Corrupt {
                line: entry.line,
                reason: e.to_string(),
            })?;
    }
    Ok(paragraphs)
}

/// Rebuild the paragraph store from a complete log.
pub fn replay(bytes: &[u8]) -> Result<Replayed> {
    let parsed = parse_log(bytes)?;
    let paragraphs = replay_entries(&parsed.entries)?;
    debug!(
        records = parsed.entries.len(),
        bytes = parsed.len,
        "log parsed"
    );
    info!(
        records = parsed.entries.len(),
        paragraphs = paragraphs.count(),
        "replay complete"
    );
    Ok(Replayed {
        paragraphs,
        records: parsed.entries.len() as u64,
        len: parsed.len,
        last_record_start: parsed.last_record_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(r: &Replayed) -> Vec<String> {
        r.paragraphs.iter().map(str::to_string).collect()
    }

    #[test]
    fn test_replay_header_only() {
        let r = replay(b"JottyV0\n").unwrap();
        assert_eq!(texts(&r), [""]);
        assert_eq!(r.records, 0);
        assert_eq!(r.last_record_start, 0);
    }

    #[test]
    fn test_replay_builds_paragraphs() {
        let log = "JottyV0\nI1,0:Sample data\nS1,7\nD2,0:da\nI2,0:Fi\nM1,7\n";
        let r = replay(log.as_bytes()).unwrap();
        assert_eq!(texts(&r), ["Sample Fita"]);
        assert_eq!(r.records, 5);
        assert_eq!(r.len, log.len() as u64);
    }

    #[test]
    fn test_replay_checks_version_deltas() {
        let good = "JottyV0\n8I1,0:abc\n10S1,1\n7I1,0:z\n";
        let r = replay(good.as_bytes()).unwrap();
        assert_eq!(texts(&r), ["za", "bc"]);
        assert_eq!(r.last_record_start, 25);

        let bad = "JottyV0\n8I1,0:abc\n11S1,1\n";
        let err = replay(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, ScrollError::Corrupt { line: 3, .. }));
    }

    #[test]
    fn test_replay_accepts_mixed_deltas() {
        let log = "JottyV0\nI1,0:abc\n9S1,1\n";
        let parsed = parse_log(log.as_bytes()).unwrap();
        assert_eq!(parsed.entries[0].delta, None);
        assert_eq!(parsed.entries[1].delta, Some(9));
        assert_eq!(parsed.entries[1].offset, 17);
    }

    #[test]
    fn test_replay_rejects_bad_header() {
        let err = replay(b"NotALog\nI1,0:x\n").unwrap_err();
        assert!(matches!(err, ScrollError::InvalidHeader { ref found } if found == "NotALog"));
        assert!(matches!(
            replay(b"").unwrap_err(),
            ScrollError::InvalidHeader { .. }
        ));
    }

    #[test]
    fn test_replay_rejects_torn_tail() {
        let err = replay(b"JottyV0\nI1,0:ok\nI1,2:tor").unwrap_err();
        assert!(matches!(err, ScrollError::Corrupt { line: 3, .. }));
    }

    #[test]
    fn test_replay_rejects_inapplicable_record() {
        let err = replay(b"JottyV0\nI1,0:ab\nD1,0:xy\n").unwrap_err();
        assert!(matches!(err, ScrollError::Corrupt { line: 3, .. }));

        let err = replay(b"JottyV0\nI2,0:ab\n").unwrap_err();
        assert!(matches!(err, ScrollError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn test_replay_rejects_invalid_utf8() {
        let mut log = b"JottyV0\nI1,0:ok\nI1,2:".to_vec();
        log.extend_from_slice(&[0xff, b'\n']);
        let err = replay(&log).unwrap_err();
        assert!(matches!(err, ScrollError::Corrupt { line: 3, .. }));
    }
}
