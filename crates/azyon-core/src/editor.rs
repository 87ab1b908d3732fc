//! Mode state machine.
//!
//! ## Learning: Making Illegal States Unrepresentable
//!
//! The editor is always in exactly one [`Mode`]. Browser data lives inside
//! the `FileBrowser` variant and the save prompt lives inside `Editing`, so
//! there is no way to be "browsing while confirming a save", and no set of
//! booleans that can drift out of sync.
//!
//! ```text
//!            Enter / no splash
//!  Welcome ─────────────────────▶ FileBrowser ◀─┐
//!                                  │     ▲       │ Enter on dir
//!                    Enter on file │     │       │
//!                                  ▼     │ Esc → answer
//!                                Editing ─┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::browser::FileBrowser;
use crate::hook::KeyHook;
use crate::key::Key;
use crate::session::Session;
use crate::status::StatusMessage;

/// Rows taken by the status bar and the prompt line.
const RESERVED_ROWS: usize = 2;

/// Question asked when leaving the editing view.
pub const SAVE_PROMPT: &str = "Do you want to save changes before returning to file browser? (y/n): ";

/// The active interaction mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Startup screen. `show_browser` is a pending request to switch to the
    /// browser, honored before the next key is read.
    Welcome { show_browser: bool },

    /// Directory listing with a selection
    FileBrowser(FileBrowser),

    /// Text editing. `confirm_save` is set while the save prompt is waiting
    /// for an answer.
    Editing { confirm_save: bool },
}

impl Mode {
    fn editing() -> Self {
        Mode::Editing {
            confirm_save: false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Welcome { .. } => "welcome",
            Mode::FileBrowser(_) => "browser",
            Mode::Editing { .. } => "editing",
        }
    }
}

/// How the editor starts.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// File named on the command line
    pub file: Option<PathBuf>,

    /// Welcome screen text, if available
    pub splash: Option<String>,

    /// Directory the browser starts in
    pub browse_dir: PathBuf,
}

/// The editor: a session plus the mode that decides what keys do to it.
#[derive(Debug)]
pub struct Editor {
    /// Document, cursor, viewport and file path
    session: Session,

    /// Current mode
    mode: Mode,

    /// Directory the browser returns to
    browse_dir: PathBuf,

    /// Welcome text; `None` when no splash is available
    splash: Option<String>,

    /// Transient status-bar message
    status: Option<StatusMessage>,

    /// Set by the quit key
    should_quit: bool,
}

impl Editor {
    /// Creates the editor in its startup mode.
    ///
    /// An existing file opens straight into `Editing`. Otherwise the editor
    /// starts on the welcome screen with an empty document, remembering a
    /// named-but-missing file as the save target. A path that exists but
    /// cannot be read is reported and never becomes the save target.
    /// Without a splash the welcome screen gives way to the browser
    /// immediately.
    pub fn start(options: StartupOptions) -> Self {
        let splash = options.splash.filter(|s| !s.is_empty());
        let mut editor = Self {
            session: Session::new(),
            mode: Mode::Welcome {
                show_browser: splash.is_none(),
            },
            browse_dir: options.browse_dir,
            splash,
            status: None,
            should_quit: false,
        };

        if let Some(path) = options.file {
            if let Ok(false) = path.try_exists() {
                tracing::info!(path = %path.display(), "File does not exist; it will be created on save");
                editor.session.set_file_path(path);
            } else {
                editor.open_file(&path);
            }
        }

        editor.settle();
        editor
    }

    // ==================== Accessors ====================

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn splash(&self) -> Option<&str> {
        self.splash.as_deref()
    }

    pub fn browse_dir(&self) -> &Path {
        &self.browse_dir
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(StatusMessage::text)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // ==================== Loop Hooks ====================

    /// Per-iteration housekeeping: expires status messages and honors a
    /// pending browser request.
    pub fn tick(&mut self, now: Instant) {
        if self.status.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.status = None;
        }
        self.settle();
    }

    /// Adapts the viewport to a terminal of `height` rows.
    pub fn set_screen_height(&mut self, height: u16) {
        let rows = usize::from(height).saturating_sub(RESERVED_ROWS).max(1);
        self.session.set_visible_rows(rows);
    }

    /// Handles one decoded key.
    ///
    /// The hook sees the key first, whatever the mode. A failing hook is
    /// logged and reported in the status bar, then the key is handled as
    /// usual.
    pub fn handle_key(&mut self, key: Key, hook: &mut dyn KeyHook) {
        if let Err(e) = hook.on_key(key, &mut self.session) {
            tracing::error!(key = key.code(), error = %format!("{e:#}"), "Key hook failed");
            self.set_status(format!("[ Plugin error: {e} ]"));
        }

        tracing::trace!(key = %key, mode = self.mode.name(), "Handling key");
        match self.mode {
            Mode::Welcome { .. } => self.handle_welcome_key(key),
            Mode::FileBrowser(_) => self.handle_browser_key(key),
            Mode::Editing { confirm_save: true } => self.handle_prompt_key(key),
            Mode::Editing { confirm_save: false } => self.handle_editing_key(key),
        }
        self.settle();
    }

    // ==================== Per-Mode Handling ====================

    fn handle_welcome_key(&mut self, key: Key) {
        if key.is_enter() {
            self.mode = Mode::Welcome { show_browser: true };
        } else if key == Key::QUIT {
            self.should_quit = true;
        }
    }

    fn handle_browser_key(&mut self, key: Key) {
        let Mode::FileBrowser(browser) = &mut self.mode else {
            return;
        };

        match key {
            Key::Up => browser.select_previous(),
            Key::Down => browser.select_next(),
            Key::QUIT => self.should_quit = true,
            k if k.is_enter() => {
                let Some(entry) = browser.selected_entry().cloned() else {
                    return;
                };
                if entry.is_dir {
                    self.browse(entry.path);
                } else {
                    self.open_file(&entry.path);
                }
            }
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, key: Key) {
        match key {
            Key::Up => self.session.move_cursor(-1, 0),
            Key::Down => self.session.move_cursor(1, 0),
            Key::Left => self.session.move_cursor(0, -1),
            Key::Right => self.session.move_cursor(0, 1),
            Key::ESCAPE => {
                self.mode = Mode::Editing { confirm_save: true };
            }
            Key::SAVE => self.save(),
            k if k.is_enter() => self.session.split_line_at_cursor(),
            k if k.is_backspace() => self.session.delete_char_before_cursor(),
            k => {
                if let Some(byte) = k.printable() {
                    self.session.insert_char(byte);
                }
            }
        }
    }

    fn handle_prompt_key(&mut self, key: Key) {
        match key {
            Key::ESCAPE => self.mode = Mode::editing(),
            Key::Byte(b'y' | b'Y') => {
                self.save();
                self.browse(self.browse_dir.clone());
            }
            _ => self.browse(self.browse_dir.clone()),
        }
    }

    // ==================== Transitions ====================

    /// Replaces a pending browser request with the actual listing.
    fn settle(&mut self) {
        if self.mode == (Mode::Welcome { show_browser: true }) {
            self.browse(self.browse_dir.clone());
        }
    }

    fn browse(&mut self, dir: PathBuf) {
        let browser = FileBrowser::open(&dir);
        tracing::debug!(dir = %browser.dir().display(), entries = browser.entries().len(), "Browsing");
        self.browse_dir = browser.dir().to_path_buf();
        self.mode = Mode::FileBrowser(browser);
    }

    /// Loads `path` and starts editing it. On failure the mode is left
    /// alone and the error goes to the status bar.
    fn open_file(&mut self, path: &Path) {
        match self.session.load_file(path) {
            Ok(()) => self.mode = Mode::editing(),
            Err(e) => {
                tracing::warn!(error = %e, "Opening file failed");
                self.set_status(format!("[ {e} ]"));
            }
        }
    }

    fn save(&mut self) {
        match self.session.save_file() {
            Ok(Some(bytes)) => self.set_status(format!("[ Saved {bytes} bytes successfully ]")),
            Ok(None) => tracing::debug!("Save skipped: no file path"),
            Err(e) => {
                tracing::error!(error = %e, "Save failed");
                self.set_status(format!("[ Save failed: {e} ]"));
            }
        }
    }

    fn set_status(&mut self, text: String) {
        self.status = Some(StatusMessage::new(text, Instant::now()));
    }
}
