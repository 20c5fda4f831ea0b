//! Coalescing behavior of the pending edit, observed through the log.

use permascroll::{ExportScope, MemorySink, PendingEdit, Scroll, ScrollError};

fn test_scroll() -> (Scroll, MemorySink) {
    let sink = MemorySink::new();
    (Scroll::in_memory(sink.clone()).unwrap(), sink)
}

fn records(sink: &MemorySink) -> Vec<String> {
    String::from_utf8(sink.contents())
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[test]
fn test_adjacent_inserts_match_single_insert() {
    let (mut split, split_sink) = test_scroll();
    split.insert_text(1, 0, "Hello, ").unwrap();
    split.insert_text(1, 7, "world").unwrap();
    split.flush().unwrap();

    let (mut whole, whole_sink) = test_scroll();
    whole.insert_text(1, 0, "Hello, world").unwrap();
    whole.flush().unwrap();

    assert_eq!(records(&split_sink), ["I1,0:Hello, world"]);
    assert_eq!(records(&split_sink), records(&whole_sink));
}

#[test]
fn test_interior_insert_is_spliced() {
    let (mut s, sink) = test_scroll();
    s.insert_text(1, 0, "Helo").unwrap();
    s.insert_text(1, 3, "l").unwrap();
    assert_eq!(s.get_text(1).unwrap(), "Hello");
    s.flush().unwrap();
    assert_eq!(records(&sink), ["I1,0:Hello"]);
}

#[test]
fn test_distant_insert_flushes_first() {
    let (mut s, sink) = test_scroll();
    s.append_text(1, "abcdef").unwrap();
    s.flush().unwrap();

    s.insert_text(1, 1, "X").unwrap();
    s.insert_text(1, 5, "Y").unwrap();
    assert_eq!(records(&sink), ["I1,0:abcdef", "I1,1:X"]);
    assert_eq!(s.get_text(1).unwrap(), "aXbcdYef");
}

#[test]
fn test_repeated_delete_is_one_window() {
    let (mut s, sink) = test_scroll();
    s.append_text(1, "Test").unwrap();
    s.flush().unwrap();

    s.delete_text(1, 1, 2).unwrap();
    s.delete_text(1, 1, 2).unwrap();
    assert_eq!(
        *s.pending(),
        PendingEdit::Delete {
            paragraph: 1,
            offset: 1,
            len: 2
        }
    );
    assert_eq!(records(&sink), ["I1,0:Test"]);

    s.flush().unwrap();
    assert_eq!(records(&sink), ["I1,0:Test", "D1,1:es"]);
    assert_eq!(s.get_text(1).unwrap(), "Tt");
}

#[test]
fn test_backspace_run_is_one_record() {
    let (mut s, sink) = test_scroll();
    s.append_text(1, "typo!").unwrap();
    s.flush().unwrap();

    for end in (1..=5).rev().take(3) {
        s.delete_text(1, end - 1, end).unwrap();
    }
    s.flush().unwrap();
    assert_eq!(records(&sink), ["I1,0:typo!", "D1,2:po!"]);
    assert_eq!(s.get_text(1).unwrap(), "ty");
}

#[test]
fn test_delete_splices_pending_insert_after_split() {
    let (mut s, sink) = test_scroll();
    s.insert_text(1, 0, "Sample ").unwrap();
    s.split_paragraph(1, 7).unwrap();
    s.insert_text(2, 0, "data").unwrap();

    s.delete_text(2, 2, 4).unwrap();
    assert_eq!(
        *s.pending(),
        PendingEdit::Insert {
            paragraph: 2,
            offset: 0,
            text: "da".into()
        }
    );

    s.flush().unwrap();
    assert_eq!(records(&sink), ["I1,0:Sample ", "S1,7", "I2,0:da"]);
    assert_eq!(s.texts(), ["Sample ", "da"]);
}

#[test]
fn test_delete_past_pending_insert_end() {
    let (mut s, sink) = test_scroll();
    s.append_text(1, "XYZ").unwrap();
    s.flush().unwrap();

    s.insert_text(1, 1, "ab").unwrap();
    s.delete_text(1, 2, 4).unwrap();
    assert_eq!(s.get_text(1).unwrap(), "XaZ");
    assert_eq!(
        *s.pending(),
        PendingEdit::Delete {
            paragraph: 1,
            offset: 2,
            len: 1
        }
    );

    s.flush().unwrap();
    assert_eq!(records(&sink), ["I1,0:XYZ", "I1,1:a", "D1,2:Y"]);
}

#[test]
fn test_typing_then_erasing_logs_nothing() {
    let (mut s, sink) = test_scroll();
    s.append_text(1, "oops").unwrap();
    s.delete_text(1, 0, 4).unwrap();
    assert!(s.pending().is_none());
    s.flush().unwrap();
    assert!(records(&sink).is_empty());
}

#[test]
fn test_edit_on_other_paragraph_flushes() {
    let (mut s, sink) = test_scroll();
    s.append_text(1, "OneTwo").unwrap();
    s.split_paragraph(1, 3).unwrap();

    s.delete_text(1, 0, 1).unwrap();
    s.delete_text(2, 0, 1).unwrap();
    assert_eq!(records(&sink), ["I1,0:OneTwo", "S1,3", "D1,0:O"]);
    assert_eq!(s.texts(), ["ne", "wo"]);
}

#[test]
fn test_append_boundary() {
    let (mut s, _sink) = test_scroll();
    s.append_text(1, "Test").unwrap();
    assert_eq!(s.get_size(1).unwrap(), 4);

    s.insert_text(1, 4, "s").unwrap();
    assert!(matches!(
        s.insert_text(1, 6, "x"),
        Err(ScrollError::OffsetOutOfRange { offset: 6, len: 5, .. })
    ));
    s.delete_text(1, 4, 5).unwrap();
    assert!(matches!(
        s.delete_text(1, 4, 5),
        Err(ScrollError::OffsetOutOfRange { .. })
    ));
    assert_eq!(s.get_text(1).unwrap(), "Test");
}

#[test]
fn test_export_flushes_pending_edits() {
    let build = || {
        let (mut s, sink) = test_scroll();
        s.append_text(1, "OneTwo").unwrap();
        s.split_paragraph(1, 3).unwrap();
        (s, sink)
    };

    let (mut plain, _) = build();
    let mut out = Vec::new();
    plain.export(ExportScope::Document, &mut out).unwrap();
    assert_eq!(out, b"One\n\nTwo\n");

    let (mut staged, staged_sink) = build();
    staged.append_text(2, " more").unwrap();
    let mut unflushed = Vec::new();
    staged.export(ExportScope::Document, &mut unflushed).unwrap();
    assert!(staged.pending().is_none());
    assert_eq!(records(&staged_sink).last().unwrap(), "I2,3: more");

    let (mut explicit, _) = build();
    explicit.append_text(2, " more").unwrap();
    explicit.flush().unwrap();
    let mut flushed = Vec::new();
    explicit.export(ExportScope::Document, &mut flushed).unwrap();

    assert_eq!(unflushed, flushed);
    assert_eq!(flushed, b"One\n\nTwo more\n");
}

#[test]
fn test_export_span() {
    let (mut s, _sink) = test_scroll();
    s.append_text(1, "Sample data").unwrap();
    let mut out = Vec::new();
    s.export(
        ExportScope::Span {
            paragraph: 1,
            start: 7,
            end: 11,
        },
        &mut out,
    )
    .unwrap();
    assert_eq!(out, b"data\n");
}
