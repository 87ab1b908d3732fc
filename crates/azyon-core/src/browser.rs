//! Directory browser.
//!
//! Lists one directory at a time: a `..` entry first (when the directory
//! has a parent), then subdirectories, then files, each group sorted by
//! name. Enumeration failures never reach the user as errors; the listing
//! just shrinks to the parent entry.

use std::path::{Path, PathBuf};

/// One row of the browser listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Display name (`..` for the parent entry)
    pub name: String,
    /// Whether selecting this entry descends into it
    pub is_dir: bool,
    /// Full path of the entry
    pub path: PathBuf,
}

impl DirEntry {
    /// The `..` entry pointing at `parent`.
    pub fn parent(parent: &Path) -> Self {
        Self {
            name: "..".to_string(),
            is_dir: true,
            path: parent.to_path_buf(),
        }
    }

    pub fn is_parent(&self) -> bool {
        self.name == ".."
    }
}

/// Reads `dir` and returns its entries, directories first, then by name.
///
/// The parent entry is not included.
pub fn list_dir(dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: path.is_dir(),
            path,
        });
    }

    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// A directory listing with a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBrowser {
    /// Directory being shown
    dir: PathBuf,
    /// Listing, parent entry first when present
    entries: Vec<DirEntry>,
    /// Index into `entries`
    selected: usize,
}

impl FileBrowser {
    /// Enumerates `dir` with the selection on the first entry.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());

        let mut entries = Vec::new();
        if let Some(parent) = dir.parent() {
            entries.push(DirEntry::parent(parent));
        }

        match list_dir(&dir) {
            Ok(listing) => entries.extend(listing),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Directory enumeration failed");
            }
        }

        Self {
            dir,
            entries,
            selected: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&DirEntry> {
        self.entries.get(self.selected)
    }

    /// Moves the selection up one entry, stopping at the first.
    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Moves the selection down one entry, stopping at the last.
    pub fn select_next(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }
}
