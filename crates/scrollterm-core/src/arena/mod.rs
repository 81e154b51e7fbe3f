//! Fixed-capacity line arena with batched eviction.
//!
//! ## Design
//!
//! - One contiguous byte region holds every retained line, oldest first.
//!   Committed lines are separated by a single `0` byte so that a newline
//!   costs exactly one byte of capacity.
//! - A parallel table stores each line's start *offset* into the region,
//!   plus a per-line [`LineMarker`]. Offsets are relative to the region
//!   base, so growing the region never invalidates them.
//! - When room runs out, the oldest [`eviction shift`](LineArena::new)
//!   lines are dropped as one block and the retained bytes slide to the
//!   front. Batching amortizes the move across many discarded lines.
//! - The last line is always "in progress": not yet terminated by a
//!   newline, and editable in place because it occupies the region tail.
//!
//! The arena knows nothing about rendering or cursors; it is the storage
//! layer under [`ScrollbackBuffer`](crate::buffer::ScrollbackBuffer).

use std::collections::TryReserveError;

/// Bell byte.
pub(crate) const BEL: u8 = 0x07;
/// Backspace byte.
pub(crate) const BS: u8 = 0x08;

/// Per-line tag distinguishing program output, echoed user input, and
/// highlighted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMarker {
    /// Ordinary program output.
    Output,
    /// Highlighted line (pager search hit).
    Highlighted,
    /// The line carries echoed user input starting at this byte offset;
    /// everything before the offset is prompt/output text.
    UserInput(usize),
}

impl LineMarker {
    /// Byte offset where user-typed text begins, if any.
    #[must_use]
    pub fn user_offset(self) -> Option<usize> {
        match self {
            LineMarker::UserInput(at) => Some(at),
            _ => None,
        }
    }
}

/// Arena creation failure.
#[derive(Debug)]
pub enum ArenaError {
    /// The initial byte region or line table could not be allocated.
    Allocation(TryReserveError),
}

impl std::fmt::Display for ArenaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArenaError::Allocation(err) => write!(f, "arena allocation failed: {err}"),
        }
    }
}

impl std::error::Error for ArenaError {}

impl From<TryReserveError> for ArenaError {
    fn from(err: TryReserveError) -> Self {
        ArenaError::Allocation(err)
    }
}

/// Result of a [`LineArena::grow`] request.
///
/// Each dimension is attempted independently; a failed dimension is left
/// at its prior size with no partial mutation. Partial growth is
/// observable so hosts can log or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrowthReport {
    /// The byte region now has the requested capacity.
    pub bytes_grown: bool,
    /// The line table now has the requested capacity.
    pub lines_grown: bool,
}

/// Outcome of appending one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOutcome {
    /// The byte (or its expansion) was stored.
    Written,
    /// Bell: signal the host, nothing stored.
    Bell,
    /// The byte has no buffer effect (CR, backspace on an empty line).
    Ignored,
    /// Room could not be made even after full eviction; nothing stored.
    Dropped,
}

/// Effects accumulated while appending a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteEffects {
    /// Bell bytes encountered.
    pub bells: usize,
    /// Bytes dropped because room could not be made.
    pub dropped: usize,
}

/// Growable byte arena holding contiguous lines plus their offset table.
#[derive(Debug)]
pub struct LineArena {
    /// Line text storage. `buf.len()` is the write offset.
    buf: Vec<u8>,
    /// Logical byte capacity. `buf` never grows past this.
    capacity: usize,
    /// Start offset of each line, strictly increasing.
    starts: Vec<usize>,
    /// Marker for each line, parallel to `starts`.
    markers: Vec<LineMarker>,
    /// Ceiling for `starts.len()`.
    max_lines: usize,
    /// Lines discarded per eviction block.
    shift: usize,
    /// Tab stop width for tab expansion.
    tab_width: usize,
    /// Cached free-byte count. Editor edits bypass it; call
    /// [`fix_last_line`](Self::fix_last_line) afterwards to resync.
    avail: usize,
}

impl LineArena {
    /// Create an arena with the given byte capacity, line ceiling, and
    /// eviction block size. Starts with a single empty in-progress line
    /// marked [`LineMarker::Output`].
    ///
    /// # Errors
    ///
    /// [`ArenaError::Allocation`] if the region or the line table cannot
    /// be allocated.
    pub fn new(
        capacity: usize,
        max_lines: usize,
        shift: usize,
        tab_width: usize,
    ) -> Result<Self, ArenaError> {
        let max_lines = max_lines.max(2);
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)?;
        let mut starts = Vec::new();
        starts.try_reserve_exact(max_lines)?;
        let mut markers = Vec::new();
        markers.try_reserve_exact(max_lines)?;
        starts.push(0);
        markers.push(LineMarker::Output);
        Ok(Self {
            buf,
            capacity,
            starts,
            markers,
            max_lines,
            shift: shift.max(1),
            tab_width: tab_width.max(1),
            avail: capacity,
        })
    }

    /// Number of lines, including the in-progress last line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Byte capacity of the region.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Line table ceiling.
    #[must_use]
    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Free bytes remaining.
    #[must_use]
    pub fn available(&self) -> usize {
        self.avail
    }

    /// Total stored bytes, separators included.
    #[must_use]
    pub fn used(&self) -> usize {
        self.buf.len()
    }

    /// Bytes of line `i`, without the trailing separator.
    ///
    /// # Panics
    ///
    /// Panics if `i >= line_count()`.
    #[must_use]
    pub fn line(&self, i: usize) -> &[u8] {
        let start = self.starts[i];
        let end = match self.starts.get(i + 1) {
            Some(&next) => next - 1,
            None => self.buf.len(),
        };
        &self.buf[start..end]
    }

    /// Line `i` as text. Bytes are treated as single-byte characters; any
    /// non-UTF-8 byte is replaced.
    #[must_use]
    pub fn line_str(&self, i: usize) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.line(i))
    }

    /// Length of line `i` in bytes.
    #[must_use]
    pub fn line_len(&self, i: usize) -> usize {
        self.line(i).len()
    }

    /// Marker of line `i`.
    #[must_use]
    pub fn marker(&self, i: usize) -> LineMarker {
        self.markers[i]
    }

    /// Set the marker of line `i`.
    pub fn set_marker(&mut self, i: usize, marker: LineMarker) {
        self.markers[i] = marker;
    }

    /// Length of the in-progress line.
    #[must_use]
    pub fn last_line_len(&self) -> usize {
        self.buf.len() - self.last_start()
    }

    fn last_start(&self) -> usize {
        *self.starts.last().unwrap_or(&0)
    }

    /// Attempt to enlarge the byte region and/or the line table.
    ///
    /// Dimensions not larger than the current capacity are skipped.
    /// Failure of one dimension never disturbs the other or any stored
    /// line. Offsets stay valid because they are region-relative.
    pub fn grow(&mut self, new_capacity: usize, new_max_lines: usize) -> GrowthReport {
        let mut report = GrowthReport::default();
        if new_capacity > self.capacity {
            let additional = new_capacity - self.buf.len();
            if self.buf.try_reserve_exact(additional).is_ok() {
                self.avail += new_capacity - self.capacity;
                self.capacity = new_capacity;
                report.bytes_grown = true;
            }
        }
        if new_max_lines > self.max_lines {
            let extra = new_max_lines - self.starts.len();
            if self.starts.try_reserve_exact(extra).is_ok()
                && self.markers.try_reserve_exact(extra).is_ok()
            {
                self.max_lines = new_max_lines;
                report.lines_grown = true;
            }
        }
        report
    }

    /// Ensure at least `needed` free bytes and a free line slot, evicting
    /// as many whole blocks of oldest lines as necessary.
    ///
    /// Returns `false` if the request can never fit, or if eviction has
    /// wiped everything and still cannot satisfy it. No write happens on
    /// failure.
    pub fn make_room(&mut self, needed: usize) -> bool {
        if needed > self.capacity {
            return false;
        }
        while self.avail < needed || self.starts.len() == self.max_lines {
            let before = (self.starts.len(), self.buf.len());
            self.evict();
            if (self.starts.len(), self.buf.len()) == before {
                return false;
            }
        }
        true
    }

    /// Discard the oldest block of lines.
    ///
    /// If the block covers everything retained, the arena resets to a
    /// single empty line. Otherwise the retained bytes move to the region
    /// start and every surviving offset and marker shifts down in step.
    pub fn evict(&mut self) {
        if self.shift >= self.starts.len() {
            self.buf.clear();
            self.starts.clear();
            self.starts.push(0);
            self.markers.clear();
            self.markers.push(LineMarker::Output);
            self.avail = self.capacity;
            return;
        }
        let cut = self.starts[self.shift];
        self.buf.drain(..cut);
        self.starts.drain(..self.shift);
        self.markers.drain(..self.shift);
        for start in &mut self.starts {
            *start -= cut;
        }
        self.avail += cut;
        self.debug_check();
    }

    /// Discard everything except the in-progress last line.
    ///
    /// Implements the clear-screen command: temporarily widens the
    /// eviction block to cover all committed lines, as the original
    /// console does.
    pub fn evict_all_but_last(&mut self) {
        if self.starts.len() <= 1 {
            return;
        }
        let saved = self.shift;
        self.shift = self.starts.len() - 1;
        self.evict();
        self.shift = saved;
    }

    /// Append one byte, honoring the control-character contract.
    pub fn push_byte(&mut self, c: u8) -> ByteOutcome {
        let outcome = match c {
            BEL => ByteOutcome::Bell,
            BS => {
                if self.last_line_len() > 0 {
                    self.buf.pop();
                    self.avail += 1;
                    ByteOutcome::Written
                } else {
                    ByteOutcome::Ignored
                }
            }
            b'\r' => ByteOutcome::Ignored,
            b'\t' => {
                if !self.put(b' ') {
                    return ByteOutcome::Dropped;
                }
                while self.last_line_len() % self.tab_width != 0 {
                    if !self.put(b' ') {
                        return ByteOutcome::Dropped;
                    }
                }
                ByteOutcome::Written
            }
            b'\n' => {
                // Commit: separator byte plus a fresh line slot.
                if !self.make_room(1) {
                    return ByteOutcome::Dropped;
                }
                self.buf.push(0);
                self.avail -= 1;
                self.starts.push(self.buf.len());
                self.markers.push(LineMarker::Output);
                ByteOutcome::Written
            }
            _ => {
                if self.put(c) {
                    ByteOutcome::Written
                } else {
                    ByteOutcome::Dropped
                }
            }
        };
        self.debug_check();
        outcome
    }

    /// Append a string byte by byte.
    ///
    /// With `mark_user`, the line that ends up last is marked as carrying
    /// user input from the length it had *before* this append, so a
    /// renderer can color prompt and echoed input differently.
    pub fn push_str(&mut self, s: &[u8], mark_user: bool) -> WriteEffects {
        let before = if mark_user {
            Some(self.last_line_len())
        } else {
            None
        };
        let mut effects = WriteEffects::default();
        for &c in s {
            match self.push_byte(c) {
                ByteOutcome::Bell => effects.bells += 1,
                ByteOutcome::Dropped => effects.dropped += 1,
                _ => {}
            }
        }
        let marker = match before {
            Some(len) => LineMarker::UserInput(len),
            None => LineMarker::Output,
        };
        let last = self.starts.len() - 1;
        self.markers[last] = marker;
        effects
    }

    /// Resynchronize the cached free-byte counter after the last line was
    /// edited in place.
    pub fn fix_last_line(&mut self) {
        self.avail = self.capacity - self.buf.len();
        self.debug_check();
    }

    fn put(&mut self, c: u8) -> bool {
        if !self.make_room(1) {
            return false;
        }
        self.buf.push(c);
        self.avail -= 1;
        true
    }

    // ------------------------------------------------------------------
    // In-place edits of the last line. The last line is the region tail,
    // so these shift at most one line's bytes. Callers run fix_last_line
    // when the burst is over. The growing ops make their own room by
    // evicting committed lines, since interleaved output may have eaten
    // any headroom reserved at the start of a read.
    // ------------------------------------------------------------------

    /// Free one byte for the in-progress line without touching the line
    /// itself. Evicts committed lines; returns `false` when only the
    /// edit line remains and the region is still full.
    fn edit_make_room(&mut self) -> bool {
        while self.buf.len() >= self.capacity {
            if self.starts.len() == 1 {
                return false;
            }
            let block = self.shift.min(self.starts.len() - 1);
            let saved = self.shift;
            self.shift = block;
            self.evict();
            self.shift = saved;
        }
        true
    }

    /// Insert a byte at `at` (relative to the line start). Returns
    /// `false`, storing nothing, when no room can be made.
    pub(crate) fn edit_insert(&mut self, at: usize, c: u8) -> bool {
        if !self.edit_make_room() {
            return false;
        }
        let pos = self.last_start() + at;
        self.buf.insert(pos, c);
        true
    }

    /// Overwrite the byte at `at`.
    pub(crate) fn edit_overwrite(&mut self, at: usize, c: u8) {
        let pos = self.last_start() + at;
        self.buf[pos] = c;
    }

    /// Remove the byte at `at`, shifting the tail left.
    pub(crate) fn edit_remove(&mut self, at: usize) {
        let pos = self.last_start() + at;
        self.buf.remove(pos);
    }

    /// Truncate the line to `at` bytes.
    pub(crate) fn edit_truncate(&mut self, at: usize) {
        let pos = self.last_start() + at;
        self.buf.truncate(pos);
    }

    /// Replace everything from `at` to the line end with `bytes`,
    /// making room as needed. Returns how many bytes fit.
    pub(crate) fn edit_replace_from(&mut self, at: usize, bytes: &[u8]) -> usize {
        self.edit_truncate(at);
        let mut written = 0;
        for &c in bytes {
            if !self.edit_make_room() {
                break;
            }
            self.buf.push(c);
            written += 1;
        }
        written
    }

    /// Swap the bytes at `a` and `b`.
    pub(crate) fn edit_swap(&mut self, a: usize, b: usize) {
        let base = self.last_start();
        self.buf.swap(base + a, base + b);
    }

    /// Drop an empty committed last line, rejoining the previous one as
    /// in-progress. Used when interleaving output with a partial input
    /// line.
    pub(crate) fn uncommit_line(&mut self) {
        debug_assert!(self.starts.len() > 1);
        debug_assert_eq!(self.last_line_len(), 0);
        self.starts.pop();
        self.markers.pop();
        self.buf.pop();
        self.avail += 1;
        self.debug_check();
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert!(self.starts.len() <= self.max_lines);
        debug_assert!(self.buf.len() <= self.capacity);
        debug_assert!(self.starts.windows(2).all(|w| w[0] < w[1]));
        debug_assert_eq!(self.starts.len(), self.markers.len());
        debug_assert!(self.last_start() <= self.buf.len());
    }
}
