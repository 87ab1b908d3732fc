//! Cursor position.

use crate::Document;

/// The edit position, 0-indexed, in byte columns.
///
/// `column` may equal the line length, meaning "after the last byte".
/// Fields are public because scripts may write arbitrary values; they are
/// brought back in range by [`Cursor::clamp_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    /// Line index
    pub row: usize,
    /// Byte index within the line
    pub column: usize,
}

impl Cursor {
    /// Creates a cursor at `(row, column)`.
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Applies a signed delta, stopping at zero.
    pub fn offset(&mut self, d_row: isize, d_column: isize) {
        self.row = self.row.saturating_add_signed(d_row);
        self.column = self.column.saturating_add_signed(d_column);
    }

    /// Clamps the row into the document, then the column into that row.
    ///
    /// The row goes first because the column bound depends on which line
    /// the cursor ends up on.
    pub fn clamp_to(&mut self, doc: &Document) {
        self.row = self.row.min(doc.last_row());
        self.column = self.column.min(doc.line_len(self.row));
    }

    /// Returns true if the cursor addresses a valid position in `doc`.
    pub fn is_within(&self, doc: &Document) -> bool {
        self.row < doc.len_lines() && self.column <= doc.line_len(self.row)
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ln {}, Col {}", self.row, self.column)
    }
}
