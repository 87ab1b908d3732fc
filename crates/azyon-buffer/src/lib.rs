//! # Azyon Buffer
//!
//! Line-oriented text storage for the editor.
//!
//! ## Key Concepts
//!
//! - A [`Document`] is an ordered list of byte lines. Lines never store their
//!   trailing `\n`; the newline is implied between consecutive lines.
//! - A [`Cursor`] is a `(row, column)` pair in byte units.
//! - A [`Viewport`] tracks the first visible row for a window of fixed height.
//!
//! ## Learning: Byte Columns
//!
//! Columns index bytes, not characters. Files are read and written without
//! any encoding transformation, so a column is simply an index into the
//! line's `Vec<u8>`.

mod cursor;
mod document;
mod viewport;

pub use cursor::Cursor;
pub use document::{Document, MAX_ROW_GROWTH};
pub use viewport::Viewport;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Position {row}:{column} is out of bounds")]
    PositionOutOfBounds { row: usize, column: usize },

    #[error("Row {row} is too far past the end of the document")]
    RowOutOfReach { row: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
