//! Line editor over the in-progress buffer line.
//!
//! ## Design
//!
//! The editor never blocks. [`LineEditor::begin_read`] echoes the prompt
//! and reserves room; [`LineEditor::poll_read`] drains the key queue and
//! returns [`ReadProgress::NeedInput`] the moment it runs dry. The host
//! decides how to wait. Edits go straight into the buffer's last line, so
//! the screen always shows the truth; the editor only tracks the cursor
//! and the editable extent.
//!
//! If the buffer scrolled or was cleared between keys, the edit line may
//! have moved or been re-echoed with a stale marker. Each poll starts by
//! re-acquiring the last line and repairing the marker.

use crate::arena::LineMarker;
use crate::buffer::ScrollbackBuffer;
use crate::host::HistoryStore;
use crate::input::{InputQueue, Key};


/// Failure to start a read.
#[derive(Debug)]
pub enum ReadError {
    /// The buffer cannot hold a line of the configured limit even after
    /// evicting everything.
    OutOfSpace,
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::OutOfSpace => write!(f, "buffer too small for an input line"),
        }
    }
}

impl std::error::Error for ReadError {}

/// What a poll produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadProgress {
    /// The key queue ran dry; call again once the host has more input.
    NeedInput,
    /// A line was submitted, newline-terminated.
    Submitted(String),
    /// The end-of-input key arrived; the line so far, newline-terminated.
    /// The host should stop issuing reads.
    EndOfInput(String),
}

/// Cursor and extent of the read in progress.
#[derive(Debug)]
struct EditState {
    /// Bytes of the edit line that precede the editable region.
    prompt_len: usize,
    /// Cursor offset within the editable region.
    cursor: usize,
    /// Editable byte count.
    len: usize,
    /// Line count at the last poll, for scroll detection.
    seen_lines: usize,
    add_to_history: bool,
}

/// Non-blocking line editor.
#[derive(Debug)]
pub struct LineEditor {
    state: Option<EditState>,
    /// Overwrite mode persists across reads.
    overwrite: bool,
    /// Editable byte limit per line.
    limit: usize,
    bells: usize,
    needs_redraw: bool,
}

impl LineEditor {
    /// Create an editor whose lines hold at most `limit` editable bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            state: None,
            overwrite: false,
            limit: limit.max(1),
            bells: 0,
            needs_redraw: false,
        }
    }

    /// Whether a read is in progress.
    #[must_use]
    pub fn is_reading(&self) -> bool {
        self.state.is_some()
    }

    /// Whether overwrite mode is on.
    #[must_use]
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Flip between overwrite and insert mode.
    pub fn toggle_overwrite(&mut self) {
        self.overwrite = !self.overwrite;
    }

    /// Buffer column of the cursor, while reading.
    #[must_use]
    pub fn cursor_col(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.prompt_len + s.cursor)
    }

    /// The editable text and cursor offset, while reading. Used to replay
    /// a half-typed line around an injected command.
    #[must_use]
    pub fn saved_line(&self, buffer: &ScrollbackBuffer) -> Option<(Vec<u8>, usize)> {
        let state = self.state.as_ref()?;
        let last = buffer.line_count() - 1;
        let line = buffer.line(last);
        let from = state.prompt_len.min(line.len());
        Some((line[from..].to_vec(), state.cursor))
    }

    /// Bell count accumulated since the last call.
    pub(crate) fn take_bells(&mut self) -> usize {
        std::mem::take(&mut self.bells)
    }

    /// Whether a full repaint was requested since the last call.
    pub(crate) fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Start a read: echo the prompt and reserve room for a full line.
    ///
    /// # Errors
    ///
    /// [`ReadError::OutOfSpace`] when the buffer cannot make room for the
    /// line limit plus its terminator.
    pub fn begin_read(
        &mut self,
        buffer: &mut ScrollbackBuffer,
        prompt: &str,
        add_to_history: bool,
    ) -> Result<(), ReadError> {
        buffer.write(prompt.as_bytes(), false);
        if !buffer.make_room(self.limit + 1) {
            return Err(ReadError::OutOfSpace);
        }
        let last = buffer.line_count() - 1;
        let prompt_len = buffer.line_len(last);
        buffer.set_marker(last, LineMarker::UserInput(prompt_len));
        self.state = Some(EditState {
            prompt_len,
            cursor: 0,
            len: 0,
            seen_lines: buffer.line_count(),
            add_to_history,
        });
        self.needs_redraw = true;
        Ok(())
    }

    /// Drain queued keys into the edit line.
    ///
    /// Returns [`ReadProgress::NeedInput`] when the queue is empty and no
    /// line was completed. Called outside a read, returns `NeedInput`.
    pub fn poll_read(
        &mut self,
        buffer: &mut ScrollbackBuffer,
        queue: &mut InputQueue,
        history: &mut dyn HistoryStore,
    ) -> ReadProgress {
        if self.state.is_none() {
            return ReadProgress::NeedInput;
        }
        loop {
            self.reacquire(buffer);
            let Some(key) = queue.pop() else {
                buffer.fix_last_line();
                return ReadProgress::NeedInput;
            };
            if let Some(done) = self.apply_key(buffer, queue, history, key) {
                return done;
            }
        }
    }

    /// Repair state after the buffer scrolled, cleared, or re-echoed the
    /// edit line underneath us.
    fn reacquire(&mut self, buffer: &mut ScrollbackBuffer) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let lines = buffer.line_count();
        if lines == state.seen_lines {
            return;
        }
        state.seen_lines = lines;
        let last = lines - 1;
        let line_len = buffer.line_len(last);
        // A total eviction can wipe the edit line entirely.
        state.prompt_len = state.prompt_len.min(line_len);
        state.len = state.len.min(line_len - state.prompt_len);
        state.cursor = state.cursor.min(state.len);
        buffer.set_marker(last, LineMarker::UserInput(state.prompt_len));
        self.needs_redraw = true;
    }

    /// Apply one key. Returns `Some` when the read completed.
    fn apply_key(
        &mut self,
        buffer: &mut ScrollbackBuffer,
        queue: &mut InputQueue,
        history: &mut dyn HistoryStore,
        key: Key,
    ) -> Option<ReadProgress> {
        let state = self.state.as_mut()?;
        let base = state.prompt_len;
        match key {
            Key::Char(c) => {
                if state.len < self.limit {
                    if self.overwrite && state.cursor < state.len {
                        buffer.edit_overwrite(base + state.cursor, c);
                        state.cursor += 1;
                    } else if buffer.edit_insert(base + state.cursor, c) {
                        state.len += 1;
                        state.cursor += 1;
                    } else {
                        // The arena is full of this one line; nothing
                        // left to evict.
                        self.bells += 1;
                    }
                } else if state.cursor == state.len {
                    // Full line, cursor at the end: submit it and replay
                    // this key as the first of the next read.
                    queue.unpop(key);
                    return Some(self.finish(buffer, history, false));
                } else {
                    self.bells += 1;
                }
            }
            Key::Enter => return Some(self.finish(buffer, history, false)),
            Key::EndOfInput => return Some(self.finish(buffer, history, true)),
            Key::MoveToStart => state.cursor = 0,
            Key::MoveToEnd => state.cursor = state.len,
            Key::MoveLeft => state.cursor = state.cursor.saturating_sub(1),
            Key::MoveRight => {
                if state.cursor < state.len {
                    state.cursor += 1;
                }
            }
            Key::KillToEnd => {
                buffer.edit_truncate(base + state.cursor);
                state.len = state.cursor;
            }
            Key::KillLine => {
                buffer.edit_truncate(base);
                state.len = 0;
                state.cursor = 0;
            }
            Key::Backspace => {
                if state.cursor > 0 {
                    state.cursor -= 1;
                    buffer.edit_remove(base + state.cursor);
                    state.len -= 1;
                }
            }
            Key::DeleteForward => {
                if state.cursor < state.len {
                    buffer.edit_remove(base + state.cursor);
                    state.len -= 1;
                }
            }
            Key::Transpose => {
                if state.cursor >= 2 {
                    buffer.edit_swap(base + state.cursor - 2, base + state.cursor - 1);
                }
            }
            Key::HistoryPrev => {
                if let Some(entry) = history.previous() {
                    let entry = entry.to_owned();
                    self.recall(buffer, &entry);
                }
            }
            Key::HistoryNext => {
                if let Some(entry) = history.next() {
                    let entry = entry.to_owned();
                    self.recall(buffer, &entry);
                }
            }
            Key::OverwriteToggle => self.overwrite = !self.overwrite,
        }
        None
    }

    /// Replace the editable text with a history entry.
    fn recall(&mut self, buffer: &mut ScrollbackBuffer, entry: &str) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let bytes = &entry.as_bytes()[..entry.len().min(self.limit)];
        let written = buffer.edit_replace_from(state.prompt_len, bytes);
        state.len = written;
        state.cursor = written;
    }

    /// Commit the line: record history, terminate with a newline, and
    /// hand the text back.
    fn finish(
        &mut self,
        buffer: &mut ScrollbackBuffer,
        history: &mut dyn HistoryStore,
        eof: bool,
    ) -> ReadProgress {
        let state = match self.state.take() {
            Some(state) => state,
            None => return ReadProgress::NeedInput,
        };
        let last = buffer.line_count() - 1;
        let line = buffer.line(last);
        let from = state.prompt_len.min(line.len());
        let mut text = String::from_utf8_lossy(&line[from..]).into_owned();
        if state.add_to_history && !text.is_empty() {
            history.add(&text);
        }
        buffer.fix_last_line();
        text.push('\n');
        buffer.write_output(b"\n", false);
        self.needs_redraw = true;
        if eof {
            ReadProgress::EndOfInput(text)
        } else {
            ReadProgress::Submitted(text)
        }
    }
}
