//! The editing session.
//!
//! ## Learning: Keeping Invariants Local
//!
//! `Session` is the only type allowed to mutate the document and cursor
//! together. Every operation starts from whatever cursor it finds (scripts
//! may have written anything), repairs it, performs the edit, and finishes
//! by scrolling the viewport to the cursor. Callers never have to remember
//! to clamp or scroll.

use std::path::{Path, PathBuf};

use azyon_buffer::{Cursor, Document, Viewport};

use crate::{CoreError, CoreResult};

/// A document bound to a cursor, a viewport and an optional file path.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Text being edited
    document: Document,

    /// Edit position
    cursor: Cursor,

    /// Scroll state
    viewport: Viewport,

    /// Save target; `None` for an untitled buffer
    file_path: Option<PathBuf>,
}

impl Session {
    /// Creates an untitled session with one empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an untitled session over existing text, cursor at the origin.
    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    // ==================== Accessors ====================

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Raw cursor access for scripts.
    ///
    /// Values written here are not validated; the next cursor-affecting
    /// operation clamps them.
    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Remembers a save target without touching the document.
    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        self.file_path = Some(path.into());
    }

    /// Changes the number of visible rows.
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.viewport.resize(rows, self.cursor.row);
    }

    // ==================== Editing ====================

    /// Inserts `byte` at the cursor and advances the column.
    ///
    /// A cursor row past the end of the document grows the document with
    /// empty lines first.
    pub fn insert_char(&mut self, byte: u8) {
        self.grow_to_cursor();
        self.cursor.clamp_to(&self.document);

        let Cursor { row, column } = self.cursor;
        if self.document.insert_byte(row, column, byte).is_ok() {
            self.cursor.column += 1;
        }
        self.scroll();
    }

    /// Removes the byte before the cursor.
    ///
    /// At column 0 this does nothing; lines are never merged.
    pub fn delete_char_before_cursor(&mut self) {
        self.cursor.clamp_to(&self.document);

        let Cursor { row, column } = self.cursor;
        if column > 0 && self.document.remove_byte(row, column - 1).is_ok() {
            self.cursor.column -= 1;
        }
        self.scroll();
    }

    /// Breaks the current line at the cursor and moves to the start of the
    /// new line.
    pub fn split_line_at_cursor(&mut self) {
        self.grow_to_cursor();
        self.cursor.clamp_to(&self.document);

        let Cursor { row, column } = self.cursor;
        if self.document.split_line(row, column).is_ok() {
            self.cursor = Cursor::new(row + 1, 0);
        }
        self.scroll();
    }

    /// Moves by a signed delta, then clamps row and column.
    pub fn move_cursor(&mut self, d_row: isize, d_column: isize) {
        self.cursor.offset(d_row, d_column);
        self.cursor.clamp_to(&self.document);
        self.scroll();
    }

    /// Extends the document down to the cursor row. A row too far away is
    /// left for the caller's clamp to pull back.
    fn grow_to_cursor(&mut self) {
        if let Err(e) = self.document.ensure_row(self.cursor.row) {
            tracing::warn!(row = self.cursor.row, error = %e, "Not extending document");
        }
    }

    fn scroll(&mut self) {
        self.viewport.scroll_to(self.cursor.row);
    }

    // ==================== Files ====================

    /// Replaces the document with the contents of `path`.
    ///
    /// On success the cursor and viewport go back to the top and `path`
    /// becomes the save target. A missing file counts as success with an
    /// empty document, so it can be created on save. Any other read error
    /// leaves the session exactly as it was.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let document = match Document::read_from(path) {
            Ok(document) => {
                tracing::debug!(path = %path.display(), lines = document.len_lines(), "Loaded file");
                document
            }
            Err(azyon_buffer::BufferError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "File does not exist yet; starting empty");
                Document::new()
            }
            Err(e) => {
                return Err(CoreError::Load {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        self.document = document;
        self.cursor = Cursor::default();
        self.viewport.reset();
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Writes the document to the current path.
    ///
    /// Returns `Ok(None)` without touching the disk when no path is set.
    /// Otherwise returns the number of bytes written: the line contents plus
    /// one newline between consecutive lines.
    pub fn save_file(&self) -> CoreResult<Option<usize>> {
        let Some(path) = self.file_path.as_deref() else {
            return Ok(None);
        };

        let written = self
            .document
            .write_to(path)
            .map_err(|e| CoreError::Save {
                path: path.to_path_buf(),
                source: e,
            })?;
        tracing::info!(path = %path.display(), bytes = written, "Saved file");
        Ok(Some(written))
    }
}
