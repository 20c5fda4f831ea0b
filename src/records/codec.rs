//! Line codec for log records.
//!
//! ```text
//! [<delta>]I<p>,<o>:<text>\n
//! [<delta>]D<p>,<o>:<text>\n
//! [<delta>]S<p>,<o>\n
//! [<delta>]M<p>,<o>\n
//! ```

use crate::error::{Result, ScrollError};
use crate::types::Operation;
use std::fmt::Write;

/// Header written once at the start of every log.
pub const LOG_MAGIC: &str = "JottyV0\n";

/// Reject text that cannot be carried in a single record line.
pub fn validate_text(text: &str) -> Result<()> {
    if text.contains('\n') {
        return Err(ScrollError::InvalidText(
            "paragraph text cannot contain a newline".into(),
        ));
    }
    Ok(())
}

/// Serialize one record, newline included.
pub fn encode(op: &Operation, delta: Option<u64>) -> String {
    let mut line = String::with_capacity(16 + op.text().map_or(0, str::len));
    if let Some(delta) = delta {
        let _ = write!(line, "{}", delta);
    }
    let _ = write!(line, "{}", op);
    line.push('\n');
    line
}

/// Parse one record line (without its newline). `line_no` is 1-based and
/// only used for error reporting.
pub fn decode(line_no: usize, line: &str) -> Result<(Option<u64>, Operation)> {
    let corrupt = |reason: &str| ScrollError::Corrupt {
        line: line_no,
        reason: reason.to_string(),
    };

    let (delta, rest) = match take_number(line) {
        Some((n, rest)) => (Some(n), rest),
        None => (None, line),
    };

    let mut chars = rest.chars();
    let opcode = chars.next().ok_or_else(|| corrupt("empty record"))?;
    let rest = chars.as_str();

    let (paragraph, rest) = take_number(rest).ok_or_else(|| corrupt("missing paragraph"))?;
    let rest = rest
        .strip_prefix(',')
        .ok_or_else(|| corrupt("expected ',' after paragraph"))?;
    let (offset, rest) = take_number(rest).ok_or_else(|| corrupt("missing offset"))?;

    let paragraph = to_usize(paragraph).ok_or_else(|| corrupt("paragraph too large"))?;
    let offset = to_usize(offset).ok_or_else(|| corrupt("offset too large"))?;

    let text = || {
        rest.strip_prefix(':')
            .map(str::to_string)
            .ok_or_else(|| corrupt("expected ':' before text"))
    };
    let bare = || {
        if rest.is_empty() {
            Ok(())
        } else {
            Err(corrupt("unexpected trailing data"))
        }
    };

    let op = match opcode {
        'I' => Operation::Insert {
            paragraph,
            offset,
            text: text()?,
        },
        'D' => Operation::Delete {
            paragraph,
            offset,
            text: text()?,
        },
        'S' => {
            bare()?;
            Operation::Split { paragraph, offset }
        }
        'M' => {
            bare()?;
            Operation::Merge { paragraph, offset }
        }
        other => return Err(corrupt(&format!("unknown opcode {:?}", other))),
    };

    Ok((delta, op))
}

/// Split a leading run of ASCII digits off `s`.
fn take_number(s: &str) -> Option<(u64, &str)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let n = s[..digits].parse().ok()?;
    Some((n, &s[digits..]))
}

fn to_usize(n: u64) -> Option<usize> {
    usize::try_from(n).ok()
}
