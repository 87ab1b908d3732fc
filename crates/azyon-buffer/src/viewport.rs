//! Vertical scrolling.
//!
//! ## Learning: Minimal Adjustment
//!
//! The viewport only moves when the cursor row leaves the window, and then
//! only far enough to bring it back to the nearest edge. Scrolling up puts
//! the cursor on the first visible row; scrolling down puts it on the last.

use std::ops::Range;

/// The window of visible document rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible row
    offset: usize,
    /// Number of visible rows, at least 1
    rows: usize,
}

impl Viewport {
    /// Creates a viewport at offset 0 showing `rows` rows.
    pub fn new(rows: usize) -> Self {
        Self {
            offset: 0,
            rows: rows.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Changes the window height and keeps `cursor_row` visible.
    pub fn resize(&mut self, rows: usize, cursor_row: usize) {
        self.rows = rows.max(1);
        self.scroll_to(cursor_row);
    }

    /// Scrolls the least amount needed for `row` to be visible.
    pub fn scroll_to(&mut self, row: usize) {
        if row < self.offset {
            self.offset = row;
        } else if row >= self.offset + self.rows {
            self.offset = row + 1 - self.rows;
        }
    }

    /// Puts the window back at the top.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Returns true if `row` is inside the window.
    pub fn contains(&self, row: usize) -> bool {
        self.visible_range().contains(&row)
    }

    /// Document rows covered by the window.
    pub fn visible_range(&self) -> Range<usize> {
        self.offset..self.offset + self.rows
    }
}

impl Default for Viewport {
    fn default() -> Self {
        // 24-line terminal minus status bar and prompt line
        Self::new(22)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scroll_down_lands_cursor_on_last_row() {
        let mut vp = Viewport::new(5);
        vp.scroll_to(7);
        assert_eq!(vp.offset(), 3);
        assert_eq!(vp.visible_range(), 3..8);
    }

    #[test]
    fn test_scroll_up_lands_cursor_on_first_row() {
        let mut vp = Viewport::new(5);
        vp.scroll_to(20);
        vp.scroll_to(10);
        assert_eq!(vp.offset(), 10);
    }

    #[test]
    fn test_no_scroll_inside_window() {
        let mut vp = Viewport::new(5);
        vp.scroll_to(4);
        assert_eq!(vp.offset(), 0);
    }

    #[test]
    fn test_zero_rows_is_treated_as_one() {
        let mut vp = Viewport::new(0);
        vp.scroll_to(3);
        assert_eq!(vp.offset(), 3);
        assert!(vp.contains(3));
    }

    #[test]
    fn test_resize_keeps_cursor_visible() {
        let mut vp = Viewport::new(10);
        vp.scroll_to(9);
        vp.resize(4, 9);
        assert_eq!(vp.offset(), 6);
    }

    proptest! {
        #[test]
        fn prop_cursor_always_visible(rows in 1usize..40, moves in prop::collection::vec(0usize..500, 1..50)) {
            let mut vp = Viewport::new(rows);
            for row in moves {
                let before = vp.offset();
                vp.scroll_to(row);
                prop_assert!(vp.offset() <= row && row <= vp.offset() + vp.rows() - 1);
                if (before..before + rows).contains(&row) {
                    prop_assert_eq!(vp.offset(), before);
                }
            }
        }
    }
}
