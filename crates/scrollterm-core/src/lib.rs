//! Core text management for an interactive scrollback console.
//!
//! A [`Console`](console::Console) owns a bounded line
//! [arena](arena::LineArena), the [viewport](viewport::Viewport) over it,
//! a mouse [selection](selection::SelectionModel), a bounded
//! [key queue](input::InputQueue), and a non-blocking
//! [line editor](editor::LineEditor). The crate draws nothing and waits
//! for nothing: hosts implement the [`host`] traits to paint rows, pump
//! events, and reach the clipboard.
//!
//! ## Quick start
//!
//! ```
//! use scrollterm_core::config::ConsoleConfig;
//! use scrollterm_core::console::Console;
//! use scrollterm_core::editor::ReadProgress;
//! use scrollterm_core::input::Key;
//!
//! let mut console = Console::new(&ConsoleConfig::default())?;
//! console.write_str("welcome\n");
//! console.begin_read("> ", true)?;
//! console.push_key(Key::Char(b'h'));
//! console.push_key(Key::Char(b'i'));
//! console.push_key(Key::Enter);
//! assert_eq!(console.poll_read(), ReadProgress::Submitted("hi\n".into()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod arena;
pub mod buffer;
pub mod config;
pub mod console;
pub mod editor;
pub mod host;
pub mod input;
pub mod selection;
pub mod viewport;

pub use arena::{ArenaError, GrowthReport, LineMarker};
pub use config::ConsoleConfig;
pub use console::{Console, RedrawPlan, RowPaint, Segment, SegmentKind};
pub use editor::{ReadError, ReadProgress};
pub use host::{Clipboard, EventPump, HistoryStore, MemoryHistory, Renderer};
pub use input::{InputQueue, Key, PushOutcome};
pub use selection::Point;
pub use viewport::{ScrollStep, Viewport};

#[cfg(test)]
mod tests;
