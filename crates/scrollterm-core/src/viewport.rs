//! Visible-window tracking and scroll-step decisions.
//!
//! The viewport owns the first visible row/column and the visible extent.
//! Its setters are the only path that invalidates rendering: every buffer
//! mutation that can change what is visible ends in a call here, and the
//! returned [`ScrollStep`] tells the caller whether an incremental blit
//! suffices or the whole window must repaint.

use std::ops::Range;

/// What a scroll request requires of the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStep {
    /// Nothing changed.
    None,
    /// The window moved exactly one row: blit the retained region and
    /// repaint only the newly exposed row. `delta` is `1` (scrolled
    /// down) or `-1` (scrolled up).
    Blit {
        /// Signed row delta, always ±1.
        delta: i32,
    },
    /// The window jumped: repaint every visible row.
    Jump,
}

/// Visible row/column origin and extent.
#[derive(Debug, Clone)]
pub struct Viewport {
    first_row: usize,
    first_col: usize,
    rows: usize,
    cols: usize,
    hscroll_step: usize,
}

impl Viewport {
    /// Create a viewport with the given extent and horizontal step.
    #[must_use]
    pub fn new(rows: usize, cols: usize, hscroll_step: usize) -> Self {
        Self {
            first_row: 0,
            first_col: 0,
            rows: rows.max(1),
            cols: cols.max(1),
            hscroll_step: hscroll_step.max(1),
        }
    }

    /// First visible row.
    #[must_use]
    pub fn first_row(&self) -> usize {
        self.first_row
    }

    /// First visible column.
    #[must_use]
    pub fn first_col(&self) -> usize {
        self.first_col
    }

    /// Visible row count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Visible column count.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Change the visible extent. The origin is left as-is; callers
    /// re-clamp with a scroll request afterwards.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
    }

    /// Greatest legal first row for `line_count` lines.
    #[must_use]
    pub fn max_first_row(&self, line_count: usize) -> usize {
        line_count.saturating_sub(self.rows)
    }

    /// Scroll vertically to `target` (clamped), returning the step the
    /// renderer must take.
    pub fn scroll_to_row(&mut self, target: isize, line_count: usize) -> ScrollStep {
        let clamped = target.clamp(0, self.max_first_row(line_count) as isize) as usize;
        let old = self.first_row;
        self.first_row = clamped;
        match clamped as isize - old as isize {
            0 => ScrollStep::None,
            1 => ScrollStep::Blit { delta: 1 },
            -1 => ScrollStep::Blit { delta: -1 },
            _ => ScrollStep::Jump,
        }
    }

    /// Scroll horizontally to `target`, clamped against the longest
    /// visible line and rounded up to the horizontal step so the view
    /// does not jitter a column at a time. Returns whether the origin
    /// changed.
    pub fn scroll_to_col(&mut self, target: isize, longest_visible: usize) -> bool {
        let mut col = target.max(0) as usize;
        if col > 0 {
            let overhang = longest_visible.saturating_sub(self.cols);
            let max_col = if overhang > 0 {
                self.hscroll_step * (overhang / self.hscroll_step + 1)
            } else {
                0
            };
            col = col.min(max_col);
        }
        let changed = col != self.first_col;
        self.first_col = col;
        changed
    }

    /// Rows of the buffer currently visible.
    #[must_use]
    pub fn visible_rows(&self, line_count: usize) -> Range<usize> {
        let end = line_count.min(self.first_row + self.rows);
        self.first_row..end.max(self.first_row)
    }

    /// Screen row of buffer line `i`, if visible.
    #[must_use]
    pub fn screen_row(&self, i: usize) -> Option<usize> {
        if i >= self.first_row && i < self.first_row + self.rows {
            Some(i - self.first_row)
        } else {
            None
        }
    }

    /// Screen column of buffer column `col`, if visible.
    #[must_use]
    pub fn screen_col(&self, col: usize) -> Option<usize> {
        if col >= self.first_col && col < self.first_col + self.cols {
            Some(col - self.first_col)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_clamps_to_valid_range() {
        let mut vp = Viewport::new(20, 80, 5);
        assert_eq!(vp.scroll_to_row(1000, 100), ScrollStep::Jump);
        assert_eq!(vp.first_row(), 80);
        assert_eq!(vp.scroll_to_row(-5, 100), ScrollStep::Jump);
        assert_eq!(vp.first_row(), 0);
    }

    #[test]
    fn test_scroll_noop_when_clamped_to_same_row() {
        let mut vp = Viewport::new(20, 80, 5);
        assert_eq!(vp.scroll_to_row(0, 10), ScrollStep::None);
        assert_eq!(vp.scroll_to_row(50, 10), ScrollStep::None);
        assert_eq!(vp.first_row(), 0);
    }

    #[test]
    fn test_single_row_delta_is_blit() {
        let mut vp = Viewport::new(20, 80, 5);
        vp.scroll_to_row(40, 100);
        assert_eq!(vp.scroll_to_row(41, 100), ScrollStep::Blit { delta: 1 });
        assert_eq!(vp.scroll_to_row(40, 100), ScrollStep::Blit { delta: -1 });
        assert_eq!(vp.scroll_to_row(42, 100), ScrollStep::Jump);
    }

    #[test]
    fn test_horizontal_clamp_rounds_to_step() {
        let mut vp = Viewport::new(20, 80, 5);
        // Longest visible line 97: overhang 17, rounded up to 20.
        assert!(vp.scroll_to_col(100, 97));
        assert_eq!(vp.first_col(), 20);
        assert!(vp.scroll_to_col(-3, 97));
        assert_eq!(vp.first_col(), 0);
    }

    #[test]
    fn test_horizontal_clamp_when_everything_fits() {
        let mut vp = Viewport::new(20, 80, 5);
        assert!(!vp.scroll_to_col(30, 40));
        assert_eq!(vp.first_col(), 0);
    }

    #[test]
    fn test_visible_rows_window() {
        let mut vp = Viewport::new(5, 80, 5);
        vp.scroll_to_row(10, 100);
        assert_eq!(vp.visible_rows(100), 10..15);
        assert_eq!(vp.visible_rows(12), 10..12);
        assert_eq!(vp.screen_row(12), Some(2));
        assert_eq!(vp.screen_row(9), None);
        assert_eq!(vp.screen_row(15), None);
    }
}
