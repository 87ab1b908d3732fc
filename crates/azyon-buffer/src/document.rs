//! Line storage.
//!
//! ## Learning: Invariants Enforced by Construction
//!
//! Every constructor produces at least one line, and no method ever removes
//! the last remaining line. An empty file is one empty line, never zero lines,
//! so callers can always index row 0.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{BufferError, BufferResult};

/// Most empty lines a single [`Document::ensure_row`] call may append.
pub const MAX_ROW_GROWTH: usize = 1 << 20;

/// An ordered sequence of byte lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Line contents without their trailing newline. Never empty.
    lines: Vec<Vec<u8>>,
}

impl Document {
    /// Creates a document holding a single empty line.
    ///
    /// # Example
    /// ```
    /// use azyon_buffer::Document;
    ///
    /// let doc = Document::new();
    /// assert_eq!(doc.len_lines(), 1);
    /// ```
    pub fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
        }
    }

    /// Splits raw bytes into lines on every `\n`.
    ///
    /// A trailing newline produces a trailing empty line, so joining the
    /// lines back with `\n` reproduces the input exactly.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            lines: bytes.split(|&b| b == b'\n').map(<[u8]>::to_vec).collect(),
        }
    }

    /// Builds a document from individual lines.
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        let lines: Vec<Vec<u8>> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            Self::new()
        } else {
            Self { lines }
        }
    }

    /// Reads a document from disk.
    pub fn read_from(path: impl AsRef<Path>) -> BufferResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Writes the document to `path`, returning the number of bytes written.
    ///
    /// The content goes to a temporary file next to the real target and is
    /// then renamed over it, so a failed write never truncates the original.
    /// Symlinks are followed and the target keeps its permissions.
    pub fn write_to(&self, path: impl AsRef<Path>) -> BufferResult<usize> {
        let target = resolve_target(path.as_ref())?;
        let file_name = target
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(".azyon-save");
        let temp_path = target.with_file_name(temp_name);

        let permissions = fs::metadata(&target).ok().map(|m| m.permissions());
        let bytes = self.to_bytes();
        if let Err(e) = replace_file(&temp_path, &target, &bytes, permissions) {
            let _ = fs::remove_file(&temp_path);
            return Err(BufferError::Io(e));
        }

        Ok(bytes.len())
    }

    // ==================== Access ====================

    /// Joins all lines with `\n`, without a newline after the last line.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.lines.join(&b'\n')
    }

    /// Number of lines. Always at least 1.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.lines.len()
    }

    /// Index of the last line.
    #[inline]
    pub fn last_row(&self) -> usize {
        self.lines.len() - 1
    }

    /// Returns a line's bytes.
    pub fn line(&self, row: usize) -> Option<&[u8]> {
        self.lines.get(row).map(Vec::as_slice)
    }

    /// Length of a line in bytes, or 0 for rows past the end.
    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, Vec::len)
    }

    /// Iterates over all lines.
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(Vec::as_slice)
    }

    // ==================== Mutations ====================

    /// Appends empty lines until `row` exists.
    ///
    /// Fails without changing the document when that would take more than
    /// [`MAX_ROW_GROWTH`] new lines or the allocation fails.
    pub fn ensure_row(&mut self, row: usize) -> BufferResult<()> {
        let len = self.lines.len();
        if row < len {
            return Ok(());
        }
        let missing = row - len + 1;
        if missing > MAX_ROW_GROWTH || self.lines.try_reserve(missing).is_err() {
            return Err(BufferError::RowOutOfReach { row });
        }
        self.lines.resize_with(row + 1, Vec::new);
        Ok(())
    }

    /// Inserts a byte at `(row, column)`.
    pub fn insert_byte(&mut self, row: usize, column: usize, byte: u8) -> BufferResult<()> {
        let line = self.line_mut(row, column)?;
        line.insert(column, byte);
        Ok(())
    }

    /// Removes and returns the byte at `(row, column)`.
    pub fn remove_byte(&mut self, row: usize, column: usize) -> BufferResult<u8> {
        let line = self.line_mut(row, column)?;
        if column >= line.len() {
            return Err(BufferError::PositionOutOfBounds { row, column });
        }
        Ok(line.remove(column))
    }

    /// Splits line `row` at `column`; the tail becomes a new line below it.
    pub fn split_line(&mut self, row: usize, column: usize) -> BufferResult<()> {
        let tail = self.line_mut(row, column)?.split_off(column);
        self.lines.insert(row + 1, tail);
        Ok(())
    }

    fn line_mut(&mut self, row: usize, column: usize) -> BufferResult<&mut Vec<u8>> {
        match self.lines.get_mut(row) {
            Some(line) if column <= line.len() => Ok(line),
            _ => Err(BufferError::PositionOutOfBounds { row, column }),
        }
    }
}

/// The file a save should replace: the symlink target if `path` is a link,
/// otherwise `path` itself.
fn resolve_target(path: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(target) => Ok(target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(e),
    }
}

fn replace_file(temp_path: &Path, target: &Path, bytes: &[u8], permissions: Option<Permissions>) -> io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    if let Some(permissions) = permissions {
        fs::set_permissions(temp_path, permissions)?;
    }
    fs::rename(temp_path, target)
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_bytes_keeps_trailing_newline_as_empty_line() {
        let doc = Document::from_bytes(b"a\nb\n");
        assert_eq!(doc.len_lines(), 3);
        assert_eq!(doc.line(2), Some(&b""[..]));
        assert_eq!(doc.to_bytes(), b"a\nb\n");
    }

    #[test]
    fn test_empty_input_is_one_line() {
        let doc = Document::from_bytes(b"");
        assert_eq!(doc.len_lines(), 1);
        assert_eq!(Document::from_lines(Vec::<Vec<u8>>::new()), Document::new());
    }

    #[test]
    fn test_carriage_returns_are_plain_bytes() {
        let doc = Document::from_bytes(b"x\r\ny");
        assert_eq!(doc.line(0), Some(&b"x\r"[..]));
        assert_eq!(doc.to_bytes(), b"x\r\ny");
    }

    #[test]
    fn test_insert_remove_split() {
        let mut doc = Document::from_lines(["abc"]);
        doc.insert_byte(0, 3, b'd').unwrap();
        assert_eq!(doc.line(0), Some(&b"abcd"[..]));

        assert_eq!(doc.remove_byte(0, 0).unwrap(), b'a');
        doc.split_line(0, 1).unwrap();
        assert_eq!(doc.to_bytes(), b"b\ncd");
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let mut doc = Document::from_lines(["ab"]);
        assert!(doc.insert_byte(0, 3, b'x').is_err());
        assert!(doc.remove_byte(0, 2).is_err());
        assert!(doc.split_line(5, 0).is_err());
    }

    #[test]
    fn test_ensure_row_extends_with_empty_lines() {
        let mut doc = Document::new();
        doc.ensure_row(3).unwrap();
        assert_eq!(doc.len_lines(), 4);
        doc.ensure_row(1).unwrap();
        assert_eq!(doc.len_lines(), 4);
    }

    #[test]
    fn test_ensure_row_refuses_unreachable_rows() {
        let mut doc = Document::from_lines(["keep"]);
        assert!(matches!(
            doc.ensure_row(usize::MAX),
            Err(BufferError::RowOutOfReach { row: usize::MAX })
        ));
        assert!(doc.ensure_row(MAX_ROW_GROWTH + 1).is_err());
        assert_eq!(doc, Document::from_lines(["keep"]));

        doc.ensure_row(MAX_ROW_GROWTH).unwrap();
        assert_eq!(doc.len_lines(), MAX_ROW_GROWTH + 1);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let doc = Document::from_lines(["first", "second"]);

        let written = doc.write_to(&path).unwrap();
        assert_eq!(written, 12);
        assert_eq!(std::fs::read(&path).unwrap(), b"first\nsecond");
        assert_eq!(Document::read_from(&path).unwrap(), doc);
        assert!(!dir.path().join("notes.txt.azyon-save").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("run.sh");
        std::fs::write(&path, "echo hi").unwrap();
        std::fs::set_permissions(&path, Permissions::from_mode(0o755)).unwrap();

        Document::from_lines(["#!/bin/sh", "echo hi"]).write_to(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(std::fs::read(&path).unwrap(), b"#!/bin/sh\necho hi");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real.txt");
        let link = dir.path().join("link.txt");
        std::fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        Document::from_lines(["new!"]).write_to(&link).unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read(&real).unwrap(), b"new!");
        assert!(!dir.path().join("real.txt.azyon-save").exists());
    }
}
