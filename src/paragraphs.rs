//! Ordered, 1-based paragraph storage.
//!
//! Offsets everywhere in the crate count `char`s, not bytes. Each paragraph
//! caches its char count so sizes are O(1).

use crate::error::{Result, ScrollError};
use crate::types::Operation;

/// Byte index of the `idx`-th char of `s` (or `s.len()` at the end).
pub(crate) fn char_to_byte(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(b, _)| b)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Paragraph {
    text: String,
    chars: usize,
}

impl Paragraph {
    fn new(text: String) -> Self {
        let chars = text.chars().count();
        Self { text, chars }
    }
}

/// Mutable sequence of paragraph texts. Never empty: a fresh store holds a
/// single empty paragraph, and a merge always needs a following paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paragraphs {
    items: Vec<Paragraph>,
}

impl Default for Paragraphs {
    fn default() -> Self {
        Self::new()
    }
}

impl Paragraphs {
    /// A store with one empty paragraph.
    pub fn new() -> Self {
        Self {
            items: vec![Paragraph::default()],
        }
    }

    /// Number of paragraphs.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Stored text of a paragraph.
    pub fn text(&self, paragraph: usize) -> Result<&str> {
        Ok(&self.get(paragraph)?.text)
    }

    /// Stored length of a paragraph, in chars.
    pub fn len(&self, paragraph: usize) -> Result<usize> {
        Ok(self.get(paragraph)?.chars)
    }

    /// Stored texts in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|p| p.text.as_str())
    }

    /// Copy of the chars in `[start, end)`.
    pub fn slice(&self, paragraph: usize, start: usize, end: usize) -> Result<String> {
        let p = self.get(paragraph)?;
        check_range(paragraph, start, end, p.chars)?;
        let from = char_to_byte(&p.text, start);
        let to = from + char_to_byte(&p.text[from..], end - start);
        Ok(p.text[from..to].to_string())
    }

    /// Validate a paragraph index without touching anything.
    pub fn check_paragraph(&self, paragraph: usize) -> Result<()> {
        self.get(paragraph).map(|_| ())
    }

    /// Apply a logged operation.
    ///
    /// The operation is fully validated before anything changes, so an error
    /// leaves the store untouched. Used both by flush and by replay.
    pub fn apply(&mut self, op: &Operation) -> Result<()> {
        match op {
            Operation::Insert {
                paragraph,
                offset,
                text,
            } => {
                let p = self.get_mut(*paragraph)?;
                if *offset > p.chars {
                    return Err(out_of_range(*paragraph, *offset, p.chars));
                }
                let at = char_to_byte(&p.text, *offset);
                p.text.insert_str(at, text);
                p.chars += text.chars().count();
            }
            Operation::Delete {
                paragraph,
                offset,
                text,
            } => {
                let removed = text.chars().count();
                let stored = self.slice(*paragraph, *offset, offset + removed)?;
                if stored != *text {
                    return Err(ScrollError::InvariantViolated(format!(
                        "delete at {},{} expected {:?}, found {:?}",
                        paragraph, offset, text, stored
                    )));
                }
                let p = self.get_mut(*paragraph)?;
                let from = char_to_byte(&p.text, *offset);
                p.text.replace_range(from..from + text.len(), "");
                p.chars -= removed;
            }
            Operation::Split { paragraph, offset } => {
                let p = self.get_mut(*paragraph)?;
                if *offset > p.chars {
                    return Err(out_of_range(*paragraph, *offset, p.chars));
                }
                let at = char_to_byte(&p.text, *offset);
                let tail = p.text.split_off(at);
                p.chars = *offset;
                self.items.insert(*paragraph, Paragraph::new(tail));
            }
            Operation::Merge { paragraph, offset } => {
                let len = self.len(*paragraph)?;
                if *paragraph == self.count() {
                    return Err(ScrollError::InvariantViolated(format!(
                        "merge of last paragraph {}",
                        paragraph
                    )));
                }
                if *offset != len {
                    return Err(ScrollError::InvariantViolated(format!(
                        "merge of paragraph {} at {} but its length is {}",
                        paragraph, offset, len
                    )));
                }
                let next = self.items.remove(*paragraph);
                let p = &mut self.items[*paragraph - 1];
                p.text.push_str(&next.text);
                p.chars += next.chars;
            }
        }
        Ok(())
    }

    fn get(&self, paragraph: usize) -> Result<&Paragraph> {
        let count = self.count();
        paragraph
            .checked_sub(1)
            .and_then(|i| self.items.get(i))
            .ok_or(ScrollError::ParagraphOutOfRange { paragraph, count })
    }

    fn get_mut(&mut self, paragraph: usize) -> Result<&mut Paragraph> {
        let count = self.count();
        paragraph
            .checked_sub(1)
            .and_then(|i| self.items.get_mut(i))
            .ok_or(ScrollError::ParagraphOutOfRange { paragraph, count })
    }
}

impl<S: Into<String>> FromIterator<S> for Paragraphs {
    /// Build a store from texts; an empty iterator yields one empty paragraph.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let items: Vec<_> = iter.into_iter().map(|t| Paragraph::new(t.into())).collect();
        if items.is_empty() {
            Self::new()
        } else {
            Self { items }
        }
    }
}

pub(crate) fn out_of_range(paragraph: usize, offset: usize, len: usize) -> ScrollError {
    ScrollError::OffsetOutOfRange {
        paragraph,
        offset,
        len,
    }
}

/// Check `start <= end <= len`.
pub(crate) fn check_range(paragraph: usize, start: usize, end: usize, len: usize) -> Result<()> {
    if start > end {
        return Err(ScrollError::InvalidRange { start, end });
    }
    if end > len {
        return Err(out_of_range(paragraph, end, len));
    }
    Ok(())
}
