//! Mouse selection over buffer coordinates.
//!
//! Tracks a drag anchor and the current drag point, normalizes them into
//! reading order (row-major, then column), and extracts the selected text
//! with the CRLF join contract used by copy, save, and print. The model
//! never mutates line bytes to describe a sub-range; renderers receive
//! plain column ranges.

use std::ops::Range;

use crate::buffer::ScrollbackBuffer;

/// A buffer coordinate: column within a line, line within the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    /// Column (byte offset within the line).
    pub col: usize,
    /// Row (line index).
    pub row: usize,
}

impl Point {
    /// Create a point from `(col, row)`, mirroring mouse `(x, y)` order.
    #[must_use]
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Reading-order comparison: row first, then column.
    fn reading_le(self, other: Self) -> bool {
        self.row < other.row || (self.row == other.row && self.col < other.col)
    }
}

/// Drag anchor, drag point, and active flag.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    anchor: Point,
    point: Point,
    active: bool,
}

impl SelectionModel {
    /// Create an inactive selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a non-empty selection exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start a drag: set the anchor and deactivate until the point moves.
    pub fn begin(&mut self, at: Point) {
        self.anchor = at;
        self.point = at;
        self.active = false;
    }

    /// Update the drag point; the selection becomes active once the point
    /// differs from the anchor.
    pub fn drag(&mut self, to: Point) {
        self.point = to;
        if self.point != self.anchor {
            self.active = true;
        }
    }

    /// Select the whole buffer.
    pub fn select_all(&mut self, buffer: &ScrollbackBuffer) {
        let last = buffer.line_count() - 1;
        self.anchor = Point::new(0, 0);
        self.point = Point::new(buffer.line_len(last), last);
        self.active = true;
    }

    /// Deactivate the selection.
    pub fn clear(&mut self) {
        self.active = false;
    }

    /// Anchor and point ordered into reading order, if active.
    #[must_use]
    pub fn normalized(&self) -> Option<(Point, Point)> {
        if !self.active {
            return None;
        }
        if self.anchor.reading_le(self.point) {
            Some((self.anchor, self.point))
        } else {
            Some((self.point, self.anchor))
        }
    }

    /// Columns of `row` to highlight, in buffer coordinates.
    ///
    /// Rows strictly inside the range highlight in full; the start and end
    /// rows highlight from/to their respective columns.
    #[must_use]
    pub fn highlight_span(&self, row: usize, line_len: usize) -> Option<Range<usize>> {
        let (start, end) = self.normalized()?;
        if row < start.row || row > end.row {
            return None;
        }
        let from = if row == start.row { start.col.min(line_len) } else { 0 };
        let to = if row == end.row {
            (end.col + 1).min(line_len)
        } else {
            line_len
        };
        if from >= to {
            return None;
        }
        Some(from..to)
    }

    /// Extract the selected text, CRLF-joined. Coordinates anchored on
    /// since-evicted lines clamp to the nearest valid line and column.
    #[must_use]
    pub fn extract_text(&self, buffer: &ScrollbackBuffer) -> Option<String> {
        let (start, end) = self.normalized()?;
        let (start, end) = clamp_range(buffer, start, end);
        Some(extract_range(buffer, start, end))
    }
}

/// Clamp a normalized range to lines and columns that still exist.
///
/// The start column clamps within the line (`len - 1`); the end column may
/// equal the line length, which makes the extraction include the final
/// line's CRLF terminator.
pub(crate) fn clamp_range(
    buffer: &ScrollbackBuffer,
    start: Point,
    end: Point,
) -> (Point, Point) {
    let last = buffer.line_count() - 1;
    let sr = start.row.min(last);
    let er = end.row.min(last);
    let sc = start.col.min(buffer.line_len(sr).saturating_sub(1));
    let ec = end.col.min(buffer.line_len(er));
    (Point::new(sc, sr), Point::new(ec, er))
}

/// Walk lines from `start` to `end` inclusive, emitting line bytes and a
/// CRLF pair for every line boundary crossed. Inputs must be clamped.
pub(crate) fn extract_range(buffer: &ScrollbackBuffer, start: Point, end: Point) -> String {
    let mut out = Vec::new();
    let mut row = start.row;
    let mut col = start.col;
    while row < end.row || (row == end.row && col <= end.col) {
        let line = buffer.line(row);
        if col < line.len() {
            out.push(line[col]);
            col += 1;
        } else {
            out.extend_from_slice(b"\r\n");
            row += 1;
            col = 0;
            if row >= buffer.line_count() {
                break;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(lines: &[&str]) -> ScrollbackBuffer {
        let mut b = ScrollbackBuffer::new(4096, 64, 4, 8).expect("buffer allocation");
        for line in lines {
            b.write(line.as_bytes(), false);
            b.write(b"\n", false);
        }
        b
    }

    #[test]
    fn test_drag_activates_only_on_movement() {
        let mut sel = SelectionModel::new();
        sel.begin(Point::new(3, 1));
        assert!(!sel.is_active());
        sel.drag(Point::new(3, 1));
        assert!(!sel.is_active());
        sel.drag(Point::new(4, 1));
        assert!(sel.is_active());
    }

    #[test]
    fn test_normalize_orders_reading_order() {
        let mut sel = SelectionModel::new();
        // Drag upward: anchor after the point in reading order.
        sel.begin(Point::new(1, 5));
        sel.drag(Point::new(7, 2));
        let (start, end) = sel.normalized().unwrap();
        assert_eq!(start, Point::new(7, 2));
        assert_eq!(end, Point::new(1, 5));
    }

    #[test]
    fn test_normalize_same_row_orders_by_column() {
        let mut sel = SelectionModel::new();
        sel.begin(Point::new(9, 3));
        sel.drag(Point::new(2, 3));
        let (start, end) = sel.normalized().unwrap();
        assert_eq!(start, Point::new(2, 3));
        assert_eq!(end, Point::new(9, 3));
    }

    #[test]
    fn test_extract_across_lines() {
        let b = buffer_with(&["hello", "world"]);
        let mut sel = SelectionModel::new();
        sel.begin(Point::new(2, 0));
        sel.drag(Point::new(1, 1));
        assert_eq!(sel.extract_text(&b).unwrap(), "llo\r\nwo");
    }

    #[test]
    fn test_extract_single_line_span() {
        let b = buffer_with(&["hello"]);
        let mut sel = SelectionModel::new();
        sel.begin(Point::new(1, 0));
        sel.drag(Point::new(3, 0));
        assert_eq!(sel.extract_text(&b).unwrap(), "ell");
    }

    #[test]
    fn test_extract_to_line_end_includes_crlf() {
        let b = buffer_with(&["hello"]);
        let mut sel = SelectionModel::new();
        sel.begin(Point::new(0, 0));
        sel.drag(Point::new(5, 0));
        assert_eq!(sel.extract_text(&b).unwrap(), "hello\r\n");
    }

    #[test]
    fn test_extract_clamps_evicted_coordinates() {
        let b = buffer_with(&["ab"]);
        let mut sel = SelectionModel::new();
        sel.begin(Point::new(50, 7));
        sel.drag(Point::new(0, 0));
        // Start clamps to (0,0); end clamps to the last line's length.
        let text = sel.extract_text(&b).unwrap();
        assert_eq!(text, "ab\r\n\r\n");
    }

    #[test]
    fn test_highlight_spans_by_row() {
        let mut sel = SelectionModel::new();
        sel.begin(Point::new(2, 1));
        sel.drag(Point::new(1, 3));
        assert_eq!(sel.highlight_span(0, 10), None);
        assert_eq!(sel.highlight_span(1, 10), Some(2..10));
        assert_eq!(sel.highlight_span(2, 10), Some(0..10));
        assert_eq!(sel.highlight_span(3, 10), Some(0..2));
        assert_eq!(sel.highlight_span(4, 10), None);
    }

    #[test]
    fn test_select_all_covers_buffer() {
        let b = buffer_with(&["one", "two"]);
        let mut sel = SelectionModel::new();
        sel.select_all(&b);
        let (start, end) = sel.normalized().unwrap();
        assert_eq!(start, Point::new(0, 0));
        // Trailing in-progress empty line, length 0.
        assert_eq!(end, Point::new(0, 2));
        assert_eq!(sel.extract_text(&b).unwrap(), "one\r\ntwo\r\n\r\n");
    }
}
