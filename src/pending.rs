//! The pending edit: at most one staged insert or delete.
//!
//! All positions handed to this module are in the live view, i.e. stored text
//! with the pending edit already applied. A pending Delete is a pure window
//! over stored text and collapses to a single point (`offset`) in the live
//! view. A pending Insert owns its literal text, which occupies
//! `[offset, offset + len)` in the live view.

use crate::paragraphs::char_to_byte;
use crate::types::Operation;
use std::borrow::Cow;

/// The staged edit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PendingEdit {
    #[default]
    None,
    Insert {
        paragraph: usize,
        offset: usize,
        text: String,
    },
    Delete {
        paragraph: usize,
        offset: usize,
        len: usize,
    },
}

/// Outcome of offering a delete range to the pending edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteMerge {
    /// The range was folded into the pending edit.
    Absorbed,
    /// The range cannot be combined; flush and stage a fresh delete.
    Incompatible,
    /// The part inside the pending insert was spliced out. Flush, then stage
    /// a delete of `len` chars at `offset` for the part past its end.
    Overflow { offset: usize, len: usize },
}

impl PendingEdit {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingEdit::None)
    }

    /// Paragraph targeted by the pending edit.
    pub fn paragraph(&self) -> Option<usize> {
        match self {
            PendingEdit::None => None,
            PendingEdit::Insert { paragraph, .. } | PendingEdit::Delete { paragraph, .. } => {
                Some(*paragraph)
            }
        }
    }

    /// Take the edit out, leaving `None`.
    pub fn take(&mut self) -> PendingEdit {
        std::mem::take(self)
    }

    /// Live length of `paragraph` given its stored length.
    pub fn live_len(&self, paragraph: usize, stored: usize) -> usize {
        match self {
            PendingEdit::Insert {
                paragraph: p, text, ..
            } if *p == paragraph => stored + text.chars().count(),
            PendingEdit::Delete { paragraph: p, len, .. } if *p == paragraph => stored - len,
            _ => stored,
        }
    }

    /// Live text of `paragraph` given its stored text.
    pub fn overlay<'a>(&self, paragraph: usize, stored: &'a str) -> Cow<'a, str> {
        match self {
            PendingEdit::Insert {
                paragraph: p,
                offset,
                text,
            } if *p == paragraph => {
                let at = char_to_byte(stored, *offset);
                Cow::Owned([&stored[..at], text.as_str(), &stored[at..]].concat())
            }
            PendingEdit::Delete {
                paragraph: p,
                offset,
                len,
            } if *p == paragraph => {
                let from = char_to_byte(stored, *offset);
                let to = from + char_to_byte(&stored[from..], *len);
                Cow::Owned([&stored[..from], &stored[to..]].concat())
            }
            _ => Cow::Borrowed(stored),
        }
    }

    /// Try to splice `text` into a pending insert. Returns false when the
    /// caller has to flush and stage a new insert.
    pub fn absorb_insert(&mut self, paragraph: usize, pos: usize, new: &str) -> bool {
        match self {
            PendingEdit::Insert {
                paragraph: p,
                offset,
                text,
            } if *p == paragraph && pos >= *offset && pos - *offset <= text.chars().count() => {
                let at = char_to_byte(text, pos - *offset);
                text.insert_str(at, new);
                true
            }
            _ => false,
        }
    }

    /// Offer the live range `[pos, end)` of `paragraph` for deletion.
    pub fn absorb_delete(&mut self, paragraph: usize, pos: usize, end: usize) -> DeleteMerge {
        match self {
            PendingEdit::None => DeleteMerge::Incompatible,

            PendingEdit::Delete {
                paragraph: p,
                offset,
                len,
            } => {
                // The window sits at a single live point; only a range that
                // touches that point stays contiguous in stored text.
                if *p != paragraph || end < *offset || pos > *offset {
                    return DeleteMerge::Incompatible;
                }
                *len += end - pos;
                *offset = pos;
                DeleteMerge::Absorbed
            }

            PendingEdit::Insert {
                paragraph: p,
                offset,
                text,
            } => {
                let ins_end = *offset + text.chars().count();
                if *p != paragraph || end < *offset || pos > ins_end || pos < *offset {
                    return DeleteMerge::Incompatible;
                }
                let from = char_to_byte(text, pos - *offset);
                let merge = if end <= ins_end {
                    let to = from + char_to_byte(&text[from..], end - pos);
                    text.replace_range(from..to, "");
                    DeleteMerge::Absorbed
                } else {
                    text.truncate(from);
                    DeleteMerge::Overflow {
                        offset: pos,
                        len: end - ins_end,
                    }
                };
                let emptied = text.is_empty();
                if emptied {
                    *self = PendingEdit::None;
                }
                merge
            }
        }
    }

    /// Turn the edit into a log operation. Deletes need the stored span they
    /// remove, read through `doomed(paragraph, start, end)`.
    pub fn into_operation<F, E>(self, doomed: F) -> Result<Option<Operation>, E>
    where
        F: FnOnce(usize, usize, usize) -> Result<String, E>,
    {
        Ok(match self {
            PendingEdit::None => None,
            PendingEdit::Insert {
                paragraph,
                offset,
                text,
            } => Some(Operation::Insert {
                paragraph,
                offset,
                text,
            }),
            PendingEdit::Delete { len: 0, .. } => None,
            PendingEdit::Delete {
                paragraph,
                offset,
                len,
            } => Some(Operation::Delete {
                paragraph,
                offset,
                text: doomed(paragraph, offset, offset + len)?,
            }),
        })
    }
}
