//! Character-level scrollback buffer over the line arena.
//!
//! Adds the piece the arena does not know about: what to do when program
//! output arrives while a partial input line is on screen. The partial
//! line is erased with synthetic backspaces, the output goes in, and the
//! input is re-echoed on a fresh line, so the user's half-typed text is
//! never lost under streaming output.

use crate::arena::{ArenaError, ByteOutcome, GrowthReport, LineArena, LineMarker, WriteEffects, BS};

/// Scrollback buffer: committed output lines plus one in-progress line.
#[derive(Debug)]
pub struct ScrollbackBuffer {
    arena: LineArena,
    /// The last *output* write ended mid-line and was artificially
    /// committed so input could be re-echoed below it. The next
    /// interleaved write rejoins it.
    incomplete: bool,
}

impl ScrollbackBuffer {
    /// Create a buffer with the given arena geometry.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Allocation`] when the arena cannot be allocated.
    pub fn new(
        capacity: usize,
        max_lines: usize,
        shift: usize,
        tab_width: usize,
    ) -> Result<Self, ArenaError> {
        Ok(Self {
            arena: LineArena::new(capacity, max_lines, shift, tab_width)?,
            incomplete: false,
        })
    }

    /// Number of lines, including the in-progress last line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.arena.line_count()
    }

    /// Bytes of line `i`.
    #[must_use]
    pub fn line(&self, i: usize) -> &[u8] {
        self.arena.line(i)
    }

    /// Line `i` as text.
    #[must_use]
    pub fn line_str(&self, i: usize) -> std::borrow::Cow<'_, str> {
        self.arena.line_str(i)
    }

    /// Length of line `i` in bytes.
    #[must_use]
    pub fn line_len(&self, i: usize) -> usize {
        self.arena.line_len(i)
    }

    /// Marker of line `i`.
    #[must_use]
    pub fn marker(&self, i: usize) -> LineMarker {
        self.arena.marker(i)
    }

    /// Set or clear the pager-search highlight on line `i`.
    pub fn set_highlight(&mut self, i: usize, on: bool) {
        let marker = if on {
            LineMarker::Highlighted
        } else {
            LineMarker::Output
        };
        self.arena.set_marker(i, marker);
    }

    /// True while the last committed output line was artificially
    /// terminated to make room for re-echoed input.
    #[must_use]
    pub fn last_line_incomplete(&self) -> bool {
        self.incomplete
    }

    /// Append text directly, optionally marking it as echoed user input.
    pub fn write(&mut self, s: &[u8], user_echo: bool) -> WriteEffects {
        self.arena.push_str(s, user_echo)
    }

    /// Append program output, preserving a partial input line if one is
    /// showing (`input_active`).
    pub fn write_output(&mut self, s: &[u8], input_active: bool) -> WriteEffects {
        if s.is_empty() {
            return WriteEffects::default();
        }
        if !input_active {
            self.incomplete = false;
            return self.arena.push_str(s, false);
        }

        // Erase the visible partial input with synthetic backspaces.
        let saved = self.arena.line(self.line_count() - 1).to_vec();
        for _ in 0..saved.len() {
            self.arena.push_byte(BS);
        }
        if self.incomplete {
            self.arena.uncommit_line();
        }
        let last = self.line_count() - 1;
        self.arena.set_marker(last, LineMarker::Output);

        let mut effects = self.arena.push_str(s, false);

        // An output chunk without a trailing newline is committed anyway
        // so the input can sit on its own line; the commit is undone on
        // the next interleaved write.
        self.incomplete = s.last() != Some(&b'\n');
        if self.incomplete && self.arena.push_byte(b'\n') == ByteOutcome::Dropped {
            effects.dropped += 1;
        }
        let echo = self.arena.push_str(&saved, true);
        effects.bells += echo.bells;
        effects.dropped += echo.dropped;
        effects
    }

    /// Discard everything except the in-progress last line (clear-screen).
    pub fn clear(&mut self) {
        self.arena.evict_all_but_last();
        self.incomplete = false;
    }

    /// Ensure room for `needed` bytes and a line slot. See
    /// [`LineArena::make_room`].
    pub fn make_room(&mut self, needed: usize) -> bool {
        self.arena.make_room(needed)
    }

    /// Grow the underlying arena. See [`LineArena::grow`].
    pub fn grow(&mut self, new_capacity: usize, new_max_lines: usize) -> GrowthReport {
        self.arena.grow(new_capacity, new_max_lines)
    }

    /// Free bytes remaining in the arena.
    #[must_use]
    pub fn available(&self) -> usize {
        self.arena.available()
    }

    /// Arena byte capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Retained-line ceiling.
    #[must_use]
    pub fn max_lines(&self) -> usize {
        self.arena.max_lines()
    }

    // ------------------------------------------------------------------
    // Editor access to the in-progress line. Offsets are relative to the
    // line start; callers finish a burst with fix_last_line.
    // ------------------------------------------------------------------

    pub(crate) fn edit_insert(&mut self, at: usize, c: u8) -> bool {
        self.arena.edit_insert(at, c)
    }

    pub(crate) fn edit_overwrite(&mut self, at: usize, c: u8) {
        self.arena.edit_overwrite(at, c);
    }

    pub(crate) fn edit_remove(&mut self, at: usize) {
        self.arena.edit_remove(at);
    }

    pub(crate) fn edit_truncate(&mut self, at: usize) {
        self.arena.edit_truncate(at);
    }

    pub(crate) fn edit_replace_from(&mut self, at: usize, bytes: &[u8]) -> usize {
        self.arena.edit_replace_from(at, bytes)
    }

    pub(crate) fn edit_swap(&mut self, a: usize, b: usize) {
        self.arena.edit_swap(a, b);
    }

    pub(crate) fn fix_last_line(&mut self) {
        self.arena.fix_last_line();
    }

    pub(crate) fn set_marker(&mut self, i: usize, marker: LineMarker) {
        self.arena.set_marker(i, marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> ScrollbackBuffer {
        ScrollbackBuffer::new(4096, 64, 4, 8).expect("buffer allocation")
    }

    #[test]
    fn test_newline_commit_yields_two_lines() {
        let mut b = buffer();
        b.write(b"abc\n", false);
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(0), b"abc");
        assert_eq!(b.marker(0), LineMarker::Output);
        assert_eq!(b.line(1), b"");
    }

    #[test]
    fn test_write_output_without_input_is_plain_append() {
        let mut b = buffer();
        b.write_output(b"hello\nworld", false);
        assert_eq!(b.line(0), b"hello");
        assert_eq!(b.line(1), b"world");
        assert!(!b.last_line_incomplete());
    }

    #[test]
    fn test_interleaved_output_preserves_partial_input() {
        let mut b = buffer();
        b.write(b"> typed", true);
        b.write_output(b"output\n", true);
        assert_eq!(b.line(0), b"output");
        assert_eq!(b.line(1), b"> typed");
        assert_eq!(b.marker(1), LineMarker::UserInput(0));
        assert!(!b.last_line_incomplete());
    }

    #[test]
    fn test_interleaved_partial_output_commits_then_rejoins() {
        let mut b = buffer();
        b.write(b"> typed", true);
        b.write_output(b"part", true);
        assert!(b.last_line_incomplete());
        assert_eq!(b.line(0), b"part");
        assert_eq!(b.line(1), b"> typed");

        // The next chunk continues the same output line.
        b.write_output(b"ial\n", true);
        assert_eq!(b.line(0), b"partial");
        assert_eq!(b.line(1), b"> typed");
        assert_eq!(b.line_count(), 2);
        assert!(!b.last_line_incomplete());
    }

    #[test]
    fn test_clear_keeps_only_in_progress_line() {
        let mut b = buffer();
        b.write(b"a\nb\nc\ntail", false);
        b.clear();
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line(0), b"tail");
    }

    #[test]
    fn test_highlight_marker_roundtrip() {
        let mut b = buffer();
        b.write(b"hit\n", false);
        b.set_highlight(0, true);
        assert_eq!(b.marker(0), LineMarker::Highlighted);
        b.set_highlight(0, false);
        assert_eq!(b.marker(0), LineMarker::Output);
    }
}
