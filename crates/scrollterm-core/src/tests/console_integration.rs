//! Integration tests for the console façade.
//!
//! These exercise the full pipeline: host events in, buffer and viewport
//! state, redraw plans, and painted rows out. Host collaborators are
//! scripted doubles.

use std::collections::VecDeque;

use crate::config::ConsoleConfig;
use crate::console::{Console, RedrawPlan, RowPaint};
use crate::editor::ReadProgress;
use crate::host::{read_line_blocking, Clipboard, EventPump, Renderer};
use crate::input::Key;

fn console(rows: usize, cols: usize) -> Console {
    let config = ConsoleConfig::builder()
        .buffer_bytes(8192)
        .buffer_lines(256)
        .eviction_shift(4)
        .rows(rows)
        .cols(cols)
        .build();
    Console::new(&config).expect("console allocation")
}

fn type_keys(console: &mut Console, s: &str) {
    for b in s.bytes() {
        console.push_key(Key::Char(b));
    }
}

fn buffer_lines(console: &Console) -> Vec<String> {
    (0..console.buffer().line_count())
        .map(|i| console.buffer().line_str(i).into_owned())
        .collect()
}

#[derive(Default)]
struct ScriptedClipboard {
    content: Option<String>,
}

impl Clipboard for ScriptedClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.content.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.content = Some(text.to_owned());
    }
}

/// Delivers one scripted key burst per pump; errors when the script runs
/// out.
struct ScriptedPump {
    bursts: VecDeque<Vec<Key>>,
}

impl ScriptedPump {
    fn new(bursts: &[&[Key]]) -> Self {
        Self {
            bursts: bursts.iter().map(|b| b.to_vec()).collect(),
        }
    }
}

impl EventPump for ScriptedPump {
    fn pump(&mut self, console: &mut Console) -> std::io::Result<()> {
        let burst = self.bursts.pop_front().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "script exhausted")
        })?;
        for key in burst {
            console.push_key(key);
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingRenderer {
    painted: Vec<(usize, String)>,
    scrolls: Vec<i32>,
    clears: usize,
    presents: usize,
}

impl Renderer for RecordingRenderer {
    fn paint_row(&mut self, screen_row: usize, paint: &RowPaint<'_>) {
        self.painted
            .push((screen_row, String::from_utf8_lossy(paint.text).into_owned()));
    }

    fn scroll_rows(&mut self, delta: i32) {
        self.scrolls.push(delta);
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn present(&mut self) {
        self.presents += 1;
    }
}

// ============================================================================
// Export and round trip
// ============================================================================

#[test]
fn export_round_trips_through_write() {
    let mut original = console(5, 40);
    original.write_str("alpha\nbeta\n\tindented\ngamma\n");
    let exported = original.export_text();
    assert!(exported.ends_with("\r\n"));

    let mut replayed = console(5, 40);
    replayed.write_str(&exported.replace("\r\n", "\n"));

    let old = buffer_lines(&original);
    let new = buffer_lines(&replayed);
    // The export terminates the synthetic tail line too, so the replay
    // grows exactly one extra empty line.
    assert_eq!(new.len(), old.len() + 1);
    assert_eq!(&new[..old.len()], &old[..]);
    assert_eq!(new.last().map(String::as_str), Some(""));
}

#[test]
fn copy_selection_to_clipboard() {
    let mut c = console(5, 40);
    c.write_str("hello\nworld\n");
    c.selection_begin(2, 0);
    c.selection_drag(1, 1);
    let mut clipboard = ScriptedClipboard::default();
    c.copy(&mut clipboard);
    assert_eq!(clipboard.content.as_deref(), Some("llo\r\nwo"));
}

#[test]
fn copy_without_selection_rings_bell() {
    let mut c = console(5, 40);
    c.write_str("text\n");
    c.take_bell();
    let mut clipboard = ScriptedClipboard::default();
    c.copy(&mut clipboard);
    assert_eq!(clipboard.content, None);
    assert_eq!(c.take_bell(), 1);
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn queue_overflow_keeps_first_keys_in_order() {
    let config = ConsoleConfig::builder()
        .buffer_bytes(4096)
        .buffer_lines(64)
        .key_queue_capacity(4)
        .build();
    let mut c = Console::new(&config).expect("console allocation");
    for b in b"abcde" {
        c.push_key(Key::Char(*b));
    }
    assert_eq!(c.take_bell(), 1, "one overflow event");
    c.begin_read("> ", true).expect("begin_read");
    assert_eq!(c.poll_read(), ReadProgress::NeedInput);
    assert_eq!(c.buffer().line(0), b"> abcd");
}

#[test]
fn write_during_read_preserves_typed_text() {
    let mut c = console(5, 40);
    c.begin_read("> ", true).expect("begin_read");
    type_keys(&mut c, "1 + ");
    c.poll_read();
    c.write_str("background output\n");
    type_keys(&mut c, "1");
    c.push_key(Key::Enter);
    assert_eq!(c.poll_read(), ReadProgress::Submitted("1 + 1\n".into()));
    let lines = buffer_lines(&c);
    assert_eq!(lines[0], "background output");
    assert_eq!(lines[1], "> 1 + 1");
}

#[test]
fn paste_feeds_read() {
    let mut c = console(5, 40);
    let mut clipboard = ScriptedClipboard::default();
    clipboard.set_text("pasted\n");
    c.begin_read("> ", true).expect("begin_read");
    c.paste(&mut clipboard);
    assert_eq!(c.poll_read(), ReadProgress::Submitted("pasted\n".into()));
}

#[test]
fn inject_command_submits_and_restores_half_typed_line() {
    let mut c = console(5, 40);
    c.begin_read("> ", true).expect("begin_read");
    type_keys(&mut c, "half");
    c.push_key(Key::MoveLeft);
    c.push_key(Key::MoveLeft);
    c.poll_read();
    c.inject_command(b"print()");
    assert_eq!(c.poll_read(), ReadProgress::Submitted("print()\n".into()));
    assert_eq!(c.buffer().line(0), b"> print()");

    // The half-typed line replays into the next read, cursor included.
    c.begin_read("> ", true).expect("begin_read");
    assert_eq!(c.poll_read(), ReadProgress::NeedInput);
    let last = c.buffer().line_count() - 1;
    assert_eq!(c.buffer().line(last), b"> half");
    let paint = c.row_paint(last).expect("edit row visible");
    assert_eq!(paint.cursor, Some(4));
}

#[test]
fn clear_during_read_keeps_edit_line_only() {
    let mut c = console(5, 40);
    c.write_str("old\nlines\n");
    c.begin_read("> ", true).expect("begin_read");
    type_keys(&mut c, "kept");
    c.poll_read();
    c.clear();
    c.push_key(Key::Enter);
    assert_eq!(c.poll_read(), ReadProgress::Submitted("kept\n".into()));
    assert_eq!(buffer_lines(&c), vec!["> kept", ""]);
}

#[test]
fn blocking_read_pumps_until_submit() {
    let mut c = console(5, 40);
    let mut pump = ScriptedPump::new(&[
        &[Key::Char(b'o')],
        &[],
        &[Key::Char(b'k'), Key::Enter],
    ]);
    let progress = read_line_blocking(&mut c, &mut pump, "> ", true).expect("read line");
    assert_eq!(progress, ReadProgress::Submitted("ok\n".into()));
}

#[test]
fn blocking_read_propagates_pump_failure() {
    let mut c = console(5, 40);
    let mut pump = ScriptedPump::new(&[&[Key::Char(b'x')]]);
    let err = read_line_blocking(&mut c, &mut pump, "> ", true).expect_err("script ends");
    assert!(err.to_string().contains("script exhausted"));
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn full_redraw_paints_visible_rows() {
    let mut c = console(3, 40);
    for i in 0..6 {
        c.write_str(&format!("row {i}\n"));
    }
    let mut r = RecordingRenderer::default();
    c.render(&mut r);
    assert_eq!(r.clears, 1);
    assert_eq!(
        r.painted,
        vec![
            (0, "row 4".to_owned()),
            (1, "row 5".to_owned()),
            (2, String::new()),
        ]
    );
    assert_eq!(r.presents, 1);
}

#[test]
fn single_row_scroll_blits() {
    let mut c = console(3, 40);
    for i in 0..6 {
        c.write_str(&format!("row {i}\n"));
    }
    c.take_redraw();
    c.scroll_by(-1);
    let mut r = RecordingRenderer::default();
    c.render(&mut r);
    assert_eq!(r.scrolls, vec![-1]);
    assert_eq!(r.painted, vec![(0, "row 3".to_owned())]);
    assert_eq!(r.clears, 0);
}

#[test]
fn no_plan_paints_nothing() {
    let mut c = console(3, 40);
    c.write_str("x\n");
    c.take_redraw();
    let mut r = RecordingRenderer::default();
    c.render(&mut r);
    assert_eq!(r.presents, 0);
    assert!(r.painted.is_empty());
}

#[test]
fn highlight_marker_survives_into_paint() {
    use crate::console::SegmentKind;

    let mut c = console(5, 40);
    c.write_str("hit\nmiss\n");
    c.set_highlight(0, true);
    let paint = c.row_paint(0).expect("row visible");
    assert_eq!(paint.segments.len(), 1);
    assert_eq!(paint.segments[0].kind, SegmentKind::Highlighted);
}

#[test]
fn grow_is_observable_and_preserves_content() {
    let mut c = console(5, 40);
    c.write_str("keep me\n");
    let report = c.grow(16 * 1024, 512);
    assert!(report.bytes_grown);
    assert!(report.lines_grown);
    assert_eq!(c.buffer().line(0), b"keep me");
}
