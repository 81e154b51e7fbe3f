//! Console façade tying storage, viewport, selection, input, and editing
//! together.
//!
//! ## Design
//!
//! - All mutation funnels through this type, which records what the
//!   screen now needs as a [`RedrawPlan`]. Hosts drive a pull loop:
//!   deliver events, call [`Console::take_redraw`], paint.
//! - Nothing here blocks. [`Console::poll_read`] returns
//!   [`ReadProgress::NeedInput`] when the key queue runs dry;
//!   [`read_line_blocking`](crate::host::read_line_blocking) shows the
//!   conventional wrapper.
//! - Output while a read is active goes through the buffer's interleave
//!   path, so the half-typed line survives streaming output.
//! - With lazy update on, output does not force the window to the bottom
//!   on every write; the pin is deferred and applied with the next
//!   repaint. A read in progress always pins immediately.

use std::ops::Range;

use crate::arena::{ArenaError, GrowthReport, LineMarker};
use crate::buffer::ScrollbackBuffer;
use crate::config::ConsoleConfig;
use crate::editor::{LineEditor, ReadError, ReadProgress};
use crate::host::{Clipboard, HistoryStore, MemoryHistory, Renderer};
use crate::input::{InputQueue, Key, PushOutcome};
use crate::selection::{self, Point, SelectionModel};
use crate::viewport::{ScrollStep, Viewport};

/// What the renderer must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawPlan {
    /// Nothing to paint.
    None,
    /// Only the bottom visible row changed.
    Line,
    /// The window moved one row: blit and paint the exposed row.
    Scroll {
        /// Signed row delta, always ±1.
        delta: i32,
    },
    /// Repaint every visible row.
    Full,
}

/// Semantic color class of a painted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Program output.
    Output,
    /// Echoed user input.
    UserInput,
    /// Pager search hit.
    Highlighted,
    /// Inside the mouse selection.
    Selected,
}

/// A run of same-kind screen columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Classification of the run.
    pub kind: SegmentKind,
    /// Screen columns covered.
    pub cols: Range<usize>,
}

/// Everything a renderer needs for one visible row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPaint<'a> {
    /// Visible slice of the line's bytes.
    pub text: &'a [u8],
    /// Same-kind runs over `text`, in screen columns.
    pub segments: Vec<Segment>,
    /// Screen column of the edit cursor, when it sits on this row.
    pub cursor: Option<usize>,
}

/// An interactive scrollback console.
pub struct Console {
    buffer: ScrollbackBuffer,
    viewport: Viewport,
    selection: SelectionModel,
    queue: InputQueue,
    editor: LineEditor,
    history: Box<dyn HistoryStore>,
    hscroll_step: usize,
    lazy_update: bool,
    /// Bottom pin recorded but not yet applied (lazy update).
    deferred_first_row: Option<usize>,
    plan: RedrawPlan,
    bells: usize,
}

impl Console {
    /// Create a console from its configuration.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Allocation`] when the line arena cannot be allocated.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ArenaError> {
        Ok(Self {
            buffer: ScrollbackBuffer::new(
                config.buffer_bytes,
                config.buffer_lines,
                config.eviction_shift,
                config.tab_width,
            )?,
            viewport: Viewport::new(config.rows, config.cols, config.hscroll_step),
            selection: SelectionModel::new(),
            queue: InputQueue::new(config.key_queue_capacity),
            editor: LineEditor::new(config.input_line_limit),
            history: Box::new(MemoryHistory::new(config.history_size)),
            hscroll_step: config.hscroll_step.max(1),
            lazy_update: false,
            deferred_first_row: None,
            plan: RedrawPlan::Full,
            bells: 0,
        })
    }

    /// Replace the history store, e.g. with one backed by a file.
    pub fn set_history_store(&mut self, history: Box<dyn HistoryStore>) {
        self.history = history;
    }

    /// The underlying buffer, for inspection.
    #[must_use]
    pub fn buffer(&self) -> &ScrollbackBuffer {
        &self.buffer
    }

    /// The visible window.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Whether a read is in progress.
    #[must_use]
    pub fn is_reading(&self) -> bool {
        self.editor.is_reading()
    }

    /// Whether bottom-pinning on output is deferred to the next repaint.
    #[must_use]
    pub fn lazy_update(&self) -> bool {
        self.lazy_update
    }

    /// Toggle deferred bottom-pinning.
    pub fn toggle_lazy_update(&mut self) {
        self.lazy_update = !self.lazy_update;
    }

    /// Whether the editor overwrites instead of inserting.
    #[must_use]
    pub fn overwrite(&self) -> bool {
        self.editor.overwrite()
    }

    /// Toggle overwrite mode.
    pub fn toggle_overwrite(&mut self) {
        self.editor.toggle_overwrite();
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Append program output.
    ///
    /// While a read is active the half-typed line is preserved below the
    /// output. Horizontal scroll resets, and the window pins to the
    /// bottom now or at the next repaint depending on lazy update.
    pub fn write(&mut self, s: &[u8]) {
        let effects = self.buffer.write_output(s, self.editor.is_reading());
        self.bells += effects.bells;
        if memchr::memchr(b'\n', s).is_some() {
            self.merge(RedrawPlan::Full);
        } else {
            self.merge(RedrawPlan::Line);
        }
        if self.viewport.scroll_to_col(0, 0) {
            self.merge(RedrawPlan::Full);
        }
        let bottom = self.viewport.max_first_row(self.buffer.line_count());
        if !self.lazy_update || self.editor.is_reading() {
            self.deferred_first_row = None;
            self.pin_row(bottom);
        } else {
            self.deferred_first_row = Some(bottom);
        }
    }

    /// Write UTF-8 text.
    pub fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    /// Discard all committed lines, keeping the in-progress one.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.selection.clear();
        self.pin_row(0);
        self.merge(RedrawPlan::Full);
    }

    /// Attempt to enlarge the buffer. Partial success is reported, never
    /// an error; stored lines are unaffected either way.
    pub fn grow(&mut self, new_bytes: usize, new_lines: usize) -> GrowthReport {
        self.buffer.grow(new_bytes, new_lines)
    }

    /// Set or clear the search-hit highlight on a buffer line.
    pub fn set_highlight(&mut self, row: usize, on: bool) {
        if row < self.buffer.line_count() {
            self.buffer.set_highlight(row, on);
            self.merge(RedrawPlan::Full);
        }
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Start reading a line: echo the prompt and pin the window to the
    /// bottom.
    ///
    /// # Errors
    ///
    /// [`ReadError::OutOfSpace`] when the buffer cannot hold a full input
    /// line.
    pub fn begin_read(&mut self, prompt: &str, add_to_history: bool) -> Result<(), ReadError> {
        self.editor.begin_read(&mut self.buffer, prompt, add_to_history)?;
        if self.editor.take_redraw() {
            self.merge(RedrawPlan::Full);
        }
        self.deferred_first_row = None;
        let bottom = self.viewport.max_first_row(self.buffer.line_count());
        self.pin_row(bottom);
        self.follow_cursor();
        Ok(())
    }

    /// Feed queued keys to the editor until a line completes or the queue
    /// runs dry.
    pub fn poll_read(&mut self) -> ReadProgress {
        let progress = self
            .editor
            .poll_read(&mut self.buffer, &mut self.queue, self.history.as_mut());
        self.bells += self.editor.take_bells();
        if self.editor.take_redraw() {
            self.merge(RedrawPlan::Full);
        } else {
            self.merge(RedrawPlan::Line);
        }
        let bottom = self.viewport.max_first_row(self.buffer.line_count());
        self.pin_row(bottom);
        self.follow_cursor();
        progress
    }

    // ------------------------------------------------------------------
    // Input events
    // ------------------------------------------------------------------

    /// Queue one key. Overflow rings the bell and drops the key.
    pub fn push_key(&mut self, key: Key) {
        if self.queue.push(key) == PushOutcome::Dropped {
            self.bells += 1;
        }
    }

    /// Queue pasted text.
    pub fn paste_text(&mut self, text: &str) {
        self.queue.push_paste(text.as_bytes());
    }

    /// Paste from the system clipboard.
    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) {
        if let Some(text) = clipboard.get_text() {
            self.queue.push_paste(text.as_bytes());
        }
    }

    /// Copy the selection to the clipboard. Without a selection, rings
    /// the bell.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard) {
        match self.selection.extract_text(&self.buffer) {
            Some(text) => clipboard.set_text(&text),
            None => self.bells += 1,
        }
    }

    /// Submit a command programmatically, as queued keystrokes. A
    /// half-typed line is killed first and replayed afterwards, cursor
    /// position included.
    pub fn inject_command(&mut self, command: &[u8]) {
        let saved = self.editor.saved_line(&self.buffer);
        let saved_ref = saved.as_ref().map(|(line, cursor)| (line.as_slice(), *cursor));
        let dropped = self.queue.inject_command(command, saved_ref);
        if dropped > 0 {
            self.bells += 1;
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Start a mouse selection at a screen position.
    pub fn selection_begin(&mut self, screen_col: usize, screen_row: usize) {
        let was_active = self.selection.is_active();
        self.selection.begin(self.screen_to_buffer(screen_col, screen_row));
        if was_active {
            self.merge(RedrawPlan::Full);
        }
    }

    /// Extend the mouse selection to a screen position.
    pub fn selection_drag(&mut self, screen_col: usize, screen_row: usize) {
        self.selection.drag(self.screen_to_buffer(screen_col, screen_row));
        self.merge(RedrawPlan::Full);
    }

    /// Select the entire buffer.
    pub fn select_all(&mut self) {
        self.selection.select_all(&self.buffer);
        self.merge(RedrawPlan::Full);
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        if self.selection.is_active() {
            self.selection.clear();
            self.merge(RedrawPlan::Full);
        }
    }

    /// The selected text, or the whole buffer when nothing is selected,
    /// CRLF-joined.
    #[must_use]
    pub fn export_text(&self) -> String {
        if let Some(text) = self.selection.extract_text(&self.buffer) {
            return text;
        }
        let last = self.buffer.line_count() - 1;
        selection::extract_range(
            &self.buffer,
            Point::new(0, 0),
            Point::new(self.buffer.line_len(last), last),
        )
    }

    fn screen_to_buffer(&self, screen_col: usize, screen_row: usize) -> Point {
        Point::new(
            self.viewport.first_col() + screen_col,
            self.viewport.first_row() + screen_row,
        )
    }

    // ------------------------------------------------------------------
    // Scrolling and geometry
    // ------------------------------------------------------------------

    /// Scroll vertically by a signed row count.
    pub fn scroll_by(&mut self, delta: isize) {
        let target = self.viewport.first_row() as isize + delta;
        let step = self.viewport.scroll_to_row(target, self.buffer.line_count());
        self.merge_step(step);
    }

    /// Scroll up or down by one page.
    pub fn scroll_page(&mut self, up: bool) {
        let page = self.viewport.rows().saturating_sub(1).max(1) as isize;
        self.scroll_by(if up { -page } else { page });
    }

    /// Jump to the first line.
    pub fn scroll_to_top(&mut self) {
        let step = self.viewport.scroll_to_row(0, self.buffer.line_count());
        self.merge_step(step);
    }

    /// Jump to the last line.
    pub fn scroll_to_bottom(&mut self) {
        let bottom = self.viewport.max_first_row(self.buffer.line_count());
        self.pin_row(bottom);
    }

    /// Scroll horizontally by a signed column count.
    pub fn scroll_cols(&mut self, delta: isize) {
        let target = self.viewport.first_col() as isize + delta;
        if self.viewport.scroll_to_col(target, self.longest_visible()) {
            self.merge(RedrawPlan::Full);
        }
    }

    /// Change the visible extent, keeping the bottom visible line pinned.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let anchor = self.viewport.first_row() + self.viewport.rows();
        self.viewport.resize(rows, cols);
        let target = anchor as isize - self.viewport.rows() as isize;
        self.viewport.scroll_to_row(target, self.buffer.line_count());
        self.merge(RedrawPlan::Full);
    }

    fn pin_row(&mut self, row: usize) {
        let step = self.viewport.scroll_to_row(row as isize, self.buffer.line_count());
        self.merge_step(step);
    }

    fn longest_visible(&self) -> usize {
        self.viewport
            .visible_rows(self.buffer.line_count())
            .map(|row| self.buffer.line_len(row))
            .max()
            .unwrap_or(0)
    }

    /// Keep the edit cursor horizontally visible, stepping the window in
    /// scroll-step increments.
    fn follow_cursor(&mut self) {
        let Some(cursor) = self.editor.cursor_col() else {
            return;
        };
        let step = self.hscroll_step;
        let margin = self.viewport.cols().saturating_sub(2).max(1);
        let target = if cursor <= margin {
            0
        } else {
            let min_fc = cursor - margin;
            (min_fc.div_ceil(step) * step).min(cursor - 1)
        };
        if self
            .viewport
            .scroll_to_col(target as isize, self.longest_visible())
        {
            self.merge(RedrawPlan::Full);
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Take and reset the pending redraw plan. A deferred bottom pin is
    /// applied here, so a lazy console catches up whenever it repaints.
    pub fn take_redraw(&mut self) -> RedrawPlan {
        if self.plan != RedrawPlan::None {
            if let Some(row) = self.deferred_first_row.take() {
                self.pin_row(row);
            }
        }
        std::mem::replace(&mut self.plan, RedrawPlan::None)
    }

    /// Bell count accumulated since the last call.
    pub fn take_bell(&mut self) -> usize {
        std::mem::take(&mut self.bells)
    }

    /// Paint data for one visible screen row, if a buffer line is there.
    #[must_use]
    pub fn row_paint(&self, screen_row: usize) -> Option<RowPaint<'_>> {
        if screen_row >= self.viewport.rows() {
            return None;
        }
        let row = self.viewport.first_row() + screen_row;
        if row >= self.buffer.line_count() {
            return None;
        }
        let line = self.buffer.line(row);
        let fc = self.viewport.first_col();
        let end = line.len().min(fc + self.viewport.cols());
        let text = if fc >= line.len() { &line[0..0] } else { &line[fc..end] };

        let marker = self.buffer.marker(row);
        let selected = self.selection.highlight_span(row, line.len());
        let kind_at = |col: usize| {
            if selected.as_ref().is_some_and(|r| r.contains(&col)) {
                SegmentKind::Selected
            } else {
                match marker {
                    LineMarker::Output => SegmentKind::Output,
                    LineMarker::Highlighted => SegmentKind::Highlighted,
                    LineMarker::UserInput(at) if col >= at => SegmentKind::UserInput,
                    LineMarker::UserInput(_) => SegmentKind::Output,
                }
            }
        };

        let mut segments: Vec<Segment> = Vec::new();
        for i in 0..text.len() {
            let kind = kind_at(fc + i);
            match segments.last_mut() {
                Some(seg) if seg.kind == kind && seg.cols.end == i => seg.cols.end = i + 1,
                _ => segments.push(Segment { kind, cols: i..i + 1 }),
            }
        }

        let cursor = if row + 1 == self.buffer.line_count() {
            self.editor.cursor_col().and_then(|c| self.viewport.screen_col(c))
        } else {
            None
        };
        Some(RowPaint { text, segments, cursor })
    }

    /// Drive a renderer from the pending plan.
    pub fn render(&mut self, renderer: &mut dyn Renderer) {
        match self.take_redraw() {
            RedrawPlan::None => return,
            RedrawPlan::Line => {
                let rows = self.viewport.visible_rows(self.buffer.line_count());
                if let Some(last) = rows.last() {
                    let screen_row = last - self.viewport.first_row();
                    if let Some(paint) = self.row_paint(screen_row) {
                        renderer.paint_row(screen_row, &paint);
                    }
                }
            }
            RedrawPlan::Scroll { delta } => {
                renderer.scroll_rows(delta);
                let exposed = if delta > 0 {
                    self.viewport.rows() - 1
                } else {
                    0
                };
                if let Some(paint) = self.row_paint(exposed) {
                    renderer.paint_row(exposed, &paint);
                }
            }
            RedrawPlan::Full => {
                renderer.clear();
                for screen_row in 0..self.viewport.rows() {
                    if let Some(paint) = self.row_paint(screen_row) {
                        renderer.paint_row(screen_row, &paint);
                    }
                }
            }
        }
        renderer.present();
    }

    fn merge(&mut self, next: RedrawPlan) {
        self.plan = match (self.plan, next) {
            (RedrawPlan::None, p) | (p, RedrawPlan::None) => p,
            (RedrawPlan::Full, _) | (_, RedrawPlan::Full) => RedrawPlan::Full,
            (RedrawPlan::Line, RedrawPlan::Line) => RedrawPlan::Line,
            _ => RedrawPlan::Full,
        };
    }

    fn merge_step(&mut self, step: ScrollStep) {
        match step {
            ScrollStep::None => {}
            ScrollStep::Blit { delta } => self.merge(RedrawPlan::Scroll { delta }),
            ScrollStep::Jump => self.merge(RedrawPlan::Full),
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("lines", &self.buffer.line_count())
            .field("viewport", &self.viewport)
            .field("reading", &self.editor.is_reading())
            .field("lazy_update", &self.lazy_update)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(rows: usize, cols: usize) -> Console {
        let config = ConsoleConfig::builder()
            .buffer_bytes(4096)
            .buffer_lines(128)
            .eviction_shift(4)
            .rows(rows)
            .cols(cols)
            .build();
        Console::new(&config).expect("console allocation")
    }

    #[test]
    fn test_write_pins_window_to_bottom() {
        let mut c = console(3, 40);
        for i in 0..10 {
            c.write_str(&format!("line {i}\n"));
        }
        assert_eq!(c.viewport().first_row(), c.buffer().line_count() - 3);
    }

    #[test]
    fn test_lazy_write_defers_pin_until_redraw() {
        let mut c = console(3, 40);
        c.take_redraw();
        c.toggle_lazy_update();
        for i in 0..10 {
            c.write_str(&format!("line {i}\n"));
        }
        assert_eq!(c.viewport().first_row(), 0, "pin deferred");
        assert_eq!(c.take_redraw(), RedrawPlan::Full);
        assert_eq!(c.viewport().first_row(), c.buffer().line_count() - 3);
    }

    #[test]
    fn test_resize_keeps_bottom_line_visible() {
        let mut c = console(5, 40);
        for i in 0..20 {
            c.write_str(&format!("line {i}\n"));
        }
        let bottom = c.buffer().line_count() - 1;
        c.resize(3, 40);
        assert!(c.viewport().visible_rows(c.buffer().line_count()).contains(&bottom));
        c.resize(10, 40);
        assert!(c.viewport().visible_rows(c.buffer().line_count()).contains(&bottom));
    }

    #[test]
    fn test_plan_merges_to_full_on_mixed_changes() {
        let mut c = console(3, 40);
        for i in 0..10 {
            c.write_str(&format!("line {i}\n"));
        }
        c.take_redraw();
        c.write_str("partial");
        assert_eq!(c.take_redraw(), RedrawPlan::Line);
        c.write_str(" done\n");
        assert_eq!(c.take_redraw(), RedrawPlan::Full);
    }

    #[test]
    fn test_row_paint_segments_prompt_and_input() {
        let mut c = console(3, 40);
        c.begin_read("> ", true).expect("begin_read");
        c.push_key(Key::Char(b'o'));
        c.push_key(Key::Char(b'k'));
        assert_eq!(c.poll_read(), ReadProgress::NeedInput);
        let paint = c.row_paint(0).expect("visible row");
        assert_eq!(paint.text, b"> ok");
        assert_eq!(
            paint.segments,
            vec![
                Segment { kind: SegmentKind::Output, cols: 0..2 },
                Segment { kind: SegmentKind::UserInput, cols: 2..4 },
            ]
        );
        assert_eq!(paint.cursor, Some(4));
    }

    #[test]
    fn test_clear_keeps_edit_line() {
        let mut c = console(3, 40);
        c.write_str("old output\n");
        c.begin_read("> ", true).expect("begin_read");
        c.push_key(Key::Char(b'x'));
        c.poll_read();
        c.clear();
        c.push_key(Key::Char(b'y'));
        c.poll_read();
        assert_eq!(c.buffer().line_count(), 1);
        assert_eq!(c.buffer().line(0), b"> xy");
    }

    #[test]
    fn test_scroll_commands_clamp() {
        let mut c = console(3, 40);
        for i in 0..10 {
            c.write_str(&format!("{i}\n"));
        }
        c.scroll_to_top();
        assert_eq!(c.viewport().first_row(), 0);
        c.scroll_by(-5);
        assert_eq!(c.viewport().first_row(), 0);
        c.scroll_page(false);
        assert_eq!(c.viewport().first_row(), 2);
        c.scroll_to_bottom();
        assert_eq!(c.viewport().first_row(), c.buffer().line_count() - 3);
    }
}
