//! Terminal UI host for the console core, built on crossterm.
//!
//! The host owns the raw-mode terminal, translates crossterm events into
//! core keys, and paints [`RowPaint`] rows with per-segment colors. All
//! waiting happens here; the core stays event-driven.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen, ScrollDown, ScrollUp,
    },
};

use scrollterm_core::console::{Console, RowPaint, SegmentKind};
use scrollterm_core::editor::ReadProgress;
use scrollterm_core::host::{read_line_blocking, Clipboard, EventPump, Renderer};
use scrollterm_core::input::Key;
use scrollterm_core::ConsoleConfig;

use crate::clipboard::{LocalClipboard, SystemClipboard};

/// Lines per mouse wheel notch.
const WHEEL_LINES: isize = 3;

/// Restores the terminal on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste,
            cursor::Hide,
        )
        .context("entering alternate screen")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            cursor::Show,
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
        );
        let _ = disable_raw_mode();
    }
}

/// Paints rows with crossterm. I/O errors are recorded and surfaced to
/// the host loop after the frame.
struct CrosstermRenderer {
    out: Stdout,
    cursor: Option<(u16, u16)>,
    error: Option<io::Error>,
}

impl CrosstermRenderer {
    fn new() -> Self {
        Self {
            out: io::stdout(),
            cursor: None,
            error: None,
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        if self.error.is_none() {
            if let Err(err) = result {
                self.error = Some(err);
            }
        }
    }

    fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn paint_segments(&mut self, screen_row: u16, paint: &RowPaint<'_>) -> io::Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(0, screen_row),
            Clear(ClearType::CurrentLine),
        )?;
        for segment in &paint.segments {
            match segment.kind {
                SegmentKind::Output => queue!(self.out, ResetColor)?,
                SegmentKind::UserInput => queue!(self.out, SetForegroundColor(Color::Blue))?,
                SegmentKind::Highlighted => queue!(self.out, SetForegroundColor(Color::Green))?,
                SegmentKind::Selected => queue!(self.out, SetAttribute(Attribute::Reverse))?,
            }
            let text = String::from_utf8_lossy(&paint.text[segment.cols.clone()]);
            queue!(self.out, Print(text))?;
            if segment.kind == SegmentKind::Selected {
                queue!(self.out, SetAttribute(Attribute::NoReverse))?;
            }
        }
        queue!(self.out, ResetColor)?;
        if let Some(col) = paint.cursor {
            self.cursor = Some((col as u16, screen_row));
        }
        Ok(())
    }
}

impl Renderer for CrosstermRenderer {
    fn paint_row(&mut self, screen_row: usize, paint: &RowPaint<'_>) {
        let result = self.paint_segments(screen_row as u16, paint);
        self.record(result);
    }

    fn scroll_rows(&mut self, delta: i32) {
        let result = if delta > 0 {
            queue!(self.out, ScrollUp(1))
        } else {
            queue!(self.out, ScrollDown(1))
        };
        self.record(result);
    }

    fn clear(&mut self) {
        self.cursor = None;
        let result = queue!(self.out, Clear(ClearType::All));
        self.record(result);
    }

    fn present(&mut self) {
        let result = match self.cursor.take() {
            Some((col, row)) => {
                queue!(self.out, cursor::MoveTo(col, row), cursor::Show)
            }
            None => queue!(self.out, cursor::Hide),
        };
        self.record(result);
        let flush = self.out.flush();
        self.record(flush);
    }
}

/// Event pump over crossterm: renders the current state, waits for one
/// event, then drains whatever else is ready.
pub struct CrosstermHost {
    renderer: CrosstermRenderer,
    clipboard: Box<dyn Clipboard>,
}

impl CrosstermHost {
    pub fn new() -> Self {
        let clipboard: Box<dyn Clipboard> = match SystemClipboard::new() {
            Ok(clipboard) => Box::new(clipboard),
            Err(err) => {
                tracing::warn!("system clipboard unavailable, using local: {err}");
                Box::<LocalClipboard>::default()
            }
        };
        Self {
            renderer: CrosstermRenderer::new(),
            clipboard,
        }
    }

    /// Paint pending changes and ring any pending bell.
    pub fn render(&mut self, console: &mut Console) -> io::Result<()> {
        console.render(&mut self.renderer);
        self.renderer.take_error()?;
        if console.take_bell() > 0 {
            let mut out = io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        Ok(())
    }

    fn dispatch(&mut self, console: &mut Console, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.dispatch_key(console, key);
            }
            Event::Mouse(mouse) => dispatch_mouse(console, mouse),
            Event::Paste(text) => console.paste_text(&text),
            Event::Resize(cols, rows) => console.resize(rows as usize, cols as usize),
            _ => {}
        }
    }

    fn dispatch_key(&mut self, console: &mut Console, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        // Console-level shortcuts first; everything else goes to the
        // editor queue.
        match (key.code, ctrl) {
            (KeyCode::Char('l'), true) => console.clear(),
            (KeyCode::Char('c'), true) => console.copy(self.clipboard.as_mut()),
            (KeyCode::Char('v'), true) => console.paste(self.clipboard.as_mut()),
            (KeyCode::Char('w'), true) => console.toggle_lazy_update(),
            (KeyCode::PageUp, _) => console.scroll_page(true),
            (KeyCode::PageDown, _) => console.scroll_page(false),
            (KeyCode::Home, true) => console.scroll_to_top(),
            (KeyCode::End, true) => console.scroll_to_bottom(),
            (KeyCode::Esc, _) => console.clear_selection(),
            _ => {
                if let Some(key) = translate_key(key) {
                    console.push_key(key);
                }
            }
        }
    }
}

impl Default for CrosstermHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPump for CrosstermHost {
    fn pump(&mut self, console: &mut Console) -> io::Result<()> {
        self.render(console)?;
        let first = event::read()?;
        self.dispatch(console, first);
        while event::poll(Duration::ZERO)? {
            let next = event::read()?;
            self.dispatch(console, next);
        }
        Ok(())
    }
}

fn dispatch_mouse(console: &mut Console, mouse: MouseEvent) {
    let col = mouse.column as usize;
    let row = mouse.row as usize;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => console.selection_begin(col, row),
        MouseEventKind::Drag(MouseButton::Left) => console.selection_drag(col, row),
        MouseEventKind::ScrollUp => console.scroll_by(-WHEEL_LINES),
        MouseEventKind::ScrollDown => console.scroll_by(WHEEL_LINES),
        _ => {}
    }
}

/// Map a crossterm key event to a core editor key.
fn translate_key(key: KeyEvent) -> Option<Key> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('a') => Some(Key::MoveToStart),
            KeyCode::Char('b') => Some(Key::MoveLeft),
            KeyCode::Char('d') => Some(Key::DeleteForward),
            KeyCode::Char('e') => Some(Key::MoveToEnd),
            KeyCode::Char('f') => Some(Key::MoveRight),
            KeyCode::Char('k') => Some(Key::KillToEnd),
            KeyCode::Char('n') => Some(Key::HistoryNext),
            KeyCode::Char('o') => Some(Key::OverwriteToggle),
            KeyCode::Char('p') => Some(Key::HistoryPrev),
            KeyCode::Char('t') => Some(Key::Transpose),
            KeyCode::Char('u') => Some(Key::KillLine),
            KeyCode::Char('z') => Some(Key::EndOfInput),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(c) if c.is_ascii() && !c.is_ascii_control() => Some(Key::Char(c as u8)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Delete => Some(Key::DeleteForward),
        KeyCode::Left => Some(Key::MoveLeft),
        KeyCode::Right => Some(Key::MoveRight),
        KeyCode::Up => Some(Key::HistoryPrev),
        KeyCode::Down => Some(Key::HistoryNext),
        KeyCode::Home => Some(Key::MoveToStart),
        KeyCode::End => Some(Key::MoveToEnd),
        _ => None,
    }
}

/// Run the interactive echo console until end of input.
pub fn run(config: &ConsoleConfig, lazy_update: bool, prompt: &str) -> Result<()> {
    let mut console = Console::new(config)?;
    if lazy_update {
        console.toggle_lazy_update();
    }
    let _guard = TerminalGuard::enter()?;
    let (cols, rows) = terminal::size().context("querying terminal size")?;
    console.resize(rows as usize, cols as usize);
    console.write_str(
        "scrollterm echo console. Type a line to echo it; ':help' lists commands.\n",
    );

    let mut host = CrosstermHost::new();
    loop {
        match read_line_blocking(&mut console, &mut host, prompt, true) {
            Ok(ReadProgress::Submitted(line)) => {
                let command = line.trim_end();
                if command == "exit" {
                    break;
                }
                run_command(&mut console, &mut host, command);
            }
            Ok(ReadProgress::EndOfInput(_)) => break,
            Ok(ReadProgress::NeedInput) => {}
            Err(err) => return Err(err.into()),
        }
        host.render(&mut console)?;
    }
    Ok(())
}

fn run_command(console: &mut Console, host: &mut CrosstermHost, command: &str) {
    match command {
        ":help" => console.write_str(
            "commands: :help :clear :selectall :copy :save FILE :lazy :overwrite exit\n\
             keys: PgUp/PgDn scroll, Ctrl+Home/End jump, Ctrl+C/V copy/paste,\n\
             Ctrl+L clear, Ctrl+W lazy update, Ctrl+Z end of input\n",
        ),
        ":clear" => console.clear(),
        ":selectall" => console.select_all(),
        ":copy" => console.copy(host.clipboard.as_mut()),
        ":lazy" => {
            console.toggle_lazy_update();
            let state = if console.lazy_update() { "on" } else { "off" };
            console.write_str(&format!("lazy update {state}\n"));
        }
        ":overwrite" => {
            console.toggle_overwrite();
            let state = if console.overwrite() { "on" } else { "off" };
            console.write_str(&format!("overwrite {state}\n"));
        }
        "" => {}
        _ => {
            if let Some(path) = command.strip_prefix(":save ") {
                match std::fs::write(path.trim(), console.export_text()) {
                    Ok(()) => console.write_str(&format!("saved to {path}\n")),
                    Err(err) => console.write_str(&format!("save failed: {err}\n")),
                }
                return;
            }
            tracing::debug!(line = command, "echoing input");
            console.write_str(&format!("{command}\n"));
        }
    }
}
