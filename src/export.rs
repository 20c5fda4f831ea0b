//! Export of document content to an external sink.

use crate::error::{Result, ScrollError};
use crate::paragraphs::{check_range, Paragraphs};
use crate::scroll::Scroll;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// What to export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportScope {
    /// Every paragraph, separated by a blank line.
    Document,
    /// The chars `[start, end)` of one paragraph.
    Span {
        paragraph: usize,
        start: usize,
        end: usize,
    },
}

/// Render `scope` from stored paragraphs, trailing newline included.
pub fn render(paragraphs: &Paragraphs, scope: ExportScope) -> Result<String> {
    let mut out = match scope {
        ExportScope::Document => paragraphs.iter().collect::<Vec<_>>().join("\n\n"),
        ExportScope::Span {
            paragraph,
            start,
            end,
        } => paragraphs.slice(paragraph, start, end)?,
    };
    out.push('\n');
    Ok(out)
}

impl Scroll {
    /// Flush, then write `scope` to `sink`.
    ///
    /// A write error wins over a later close (flush) error.
    pub fn export<W: Write>(&mut self, scope: ExportScope, mut sink: W) -> Result<()> {
        let rendered = self.prepare_export(scope)?;
        let written = sink.write_all(rendered.as_bytes());
        let closed = sink.flush();
        finish(written, closed)?;
        debug!(?scope, bytes = rendered.len(), "exported");
        Ok(())
    }

    /// Flush, then write `scope` to a new file at `path`. Closing the file
    /// syncs it to disk.
    pub fn export_to_path(&mut self, scope: ExportScope, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let rendered = self.prepare_export(scope)?;
        let file = File::create(path)
            .map_err(|e| ScrollError::io(format!("creating {}", path.display()), e))?;

        let mut writer = BufWriter::new(file);
        let written = writer.write_all(rendered.as_bytes());
        let closed = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all());
        finish(written, closed)?;
        debug!(?scope, path = %path.display(), "exported");
        Ok(())
    }

    /// Validate against the live view, flush, then render from storage.
    fn prepare_export(&mut self, scope: ExportScope) -> Result<String> {
        self.ensure_usable()?;
        if let ExportScope::Span {
            paragraph,
            start,
            end,
        } = scope
        {
            let len = self.get_size(paragraph)?;
            check_range(paragraph, start, end, len)?;
        }
        self.flush()?;
        render(self.stored(), scope)
    }
}

fn finish(written: io::Result<()>, closed: io::Result<()>) -> Result<()> {
    written.map_err(|e| ScrollError::io("writing export", e))?;
    closed.map_err(|e| ScrollError::io("closing export", e))
}
