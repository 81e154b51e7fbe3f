//! Traits at the host boundary.
//!
//! The core never talks to a screen, a clipboard, or an event loop
//! directly. Hosts implement these traits; tests substitute scripted
//! doubles. [`read_line_blocking`] is the one place anything waits: it
//! alternates polling the console with pumping host events.

use crate::console::{Console, RowPaint};
use crate::editor::{ReadError, ReadProgress};

/// Paints console rows on some display surface.
pub trait Renderer {
    /// Paint one visible row from its semantic segments.
    fn paint_row(&mut self, screen_row: usize, paint: &RowPaint<'_>);
    /// The window scrolled by exactly one row; move the retained region
    /// and expect a `paint_row` for the exposed row.
    fn scroll_rows(&mut self, delta: i32);
    /// Erase everything before a full repaint.
    fn clear(&mut self);
    /// Flush buffered paints to the surface.
    fn present(&mut self);
}

/// System clipboard access.
pub trait Clipboard {
    /// Current clipboard text, if any.
    fn get_text(&mut self) -> Option<String>;
    /// Replace the clipboard contents.
    fn set_text(&mut self, text: &str);
}

/// Command-line history.
pub trait HistoryStore {
    /// Step to the previous (older) entry.
    fn previous(&mut self) -> Option<&str>;
    /// Step to the next (newer) entry; past the newest, yields an empty
    /// line once so the user gets their blank prompt back.
    fn next(&mut self) -> Option<&str>;
    /// Record a submitted line and reset the recall position.
    fn add(&mut self, line: &str);
}

/// Host event loop hook. `pump` blocks until at least one event has been
/// delivered to the console (keys pushed, paste installed, resize
/// applied).
pub trait EventPump {
    /// Deliver pending host events to the console, waiting if none are
    /// ready.
    ///
    /// # Errors
    ///
    /// Propagates host I/O failures.
    fn pump(&mut self, console: &mut Console) -> std::io::Result<()>;
}

/// Failure of a blocking read.
#[derive(Debug)]
pub enum ReadLineError {
    /// The console could not start the read.
    Read(ReadError),
    /// The event pump failed.
    Io(std::io::Error),
}

impl std::fmt::Display for ReadLineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadLineError::Read(err) => write!(f, "{err}"),
            ReadLineError::Io(err) => write!(f, "event pump failed: {err}"),
        }
    }
}

impl std::error::Error for ReadLineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadLineError::Read(err) => Some(err),
            ReadLineError::Io(err) => Some(err),
        }
    }
}

impl From<ReadError> for ReadLineError {
    fn from(err: ReadError) -> Self {
        ReadLineError::Read(err)
    }
}

impl From<std::io::Error> for ReadLineError {
    fn from(err: std::io::Error) -> Self {
        ReadLineError::Io(err)
    }
}

/// Read one line, pumping host events while the console needs input.
///
/// Returns the submitted text, newline-terminated;
/// [`ReadProgress::EndOfInput`] tells the caller to stop reading.
///
/// # Errors
///
/// [`ReadLineError::Read`] when the read cannot start, [`ReadLineError::Io`]
/// when the pump fails.
pub fn read_line_blocking(
    console: &mut Console,
    pump: &mut dyn EventPump,
    prompt: &str,
    add_to_history: bool,
) -> Result<ReadProgress, ReadLineError> {
    console.begin_read(prompt, add_to_history)?;
    loop {
        match console.poll_read() {
            ReadProgress::NeedInput => pump.pump(console)?,
            done => return Ok(done),
        }
    }
}

/// Bounded in-memory history with adjacent-duplicate suppression.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: std::collections::VecDeque<String>,
    capacity: usize,
    /// Recall position; `None` means "at the blank line below history".
    cursor: Option<usize>,
}

impl MemoryHistory {
    /// Create a history retaining at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: std::collections::VecDeque::new(),
            capacity: capacity.max(1),
            cursor: None,
        }
    }

    /// Stored entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl HistoryStore for MemoryHistory {
    fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let i = match self.cursor {
            None => self.entries.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(i);
        self.entries.get(i).map(String::as_str)
    }

    fn next(&mut self) -> Option<&str> {
        let i = self.cursor?;
        if i + 1 < self.entries.len() {
            self.cursor = Some(i + 1);
            self.entries.get(i + 1).map(String::as_str)
        } else {
            self.cursor = None;
            Some("")
        }
    }

    fn add(&mut self, line: &str) {
        self.cursor = None;
        if self.entries.back().map(String::as_str) == Some(line) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_owned());
    }
}
