//! # Azyon Terminal Front End
//!
//! Owns everything that touches the real terminal: raw mode, key input,
//! drawing, and the main loop that ties them to the [`Editor`].
//!
//! ## Learning: One Synchronous Loop
//!
//! ```text
//!   tick ─▶ resize ─▶ draw ─▶ read key ─▶ hook + mode handler ─┐
//!    ▲                                                          │
//!    └──────────────────────────────────────────────────────────┘
//! ```
//!
//! There is exactly one blocking point, the key read. Everything else runs
//! to completion before the next read, so no state is ever shared between
//! threads.

pub mod input;
pub mod render;
pub mod terminal;

pub use input::{ByteSource, KeyDecoder, KeyReader};
pub use render::Renderer;
pub use terminal::TerminalGuard;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use azyon_core::{Config, Editor, KeyHook, StartupOptions};
use azyon_plugin::PluginHost;

/// Consecutive read failures tolerated before the loop gives up.
const MAX_READ_FAILURES: usize = 100;

/// Terminal errors.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Reading input failed {attempts} times in a row: {source}")]
    InputFailed { attempts: usize, source: io::Error },
}

/// Result type for terminal operations
pub type TermResult<T> = Result<T, TermError>;

/// Launch settings.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// File to open
    pub file: Option<PathBuf>,

    /// Effective configuration
    pub config: Config,
}

/// Runs the editor until the user quits or input ends.
pub fn run(flags: Flags) -> anyhow::Result<()> {
    let Flags { file, config } = flags;

    let browse_dir = std::env::current_dir().context("Cannot determine the working directory")?;
    let mut editor = Editor::start(StartupOptions {
        file,
        splash: read_splash(&config.editor.splash_file),
        browse_dir,
    });

    let mut plugins = PluginHost::new().context("Failed to start the Lua runtime")?;
    match plugins.load_dir(&config.editor.plugin_dir, editor.session_mut()) {
        Ok(count) => tracing::info!(count, dir = %config.editor.plugin_dir.display(), "Plugins loaded"),
        Err(e) => tracing::warn!(error = %e, "Could not scan plugin directory"),
    }

    let mut keys = input::open_key_reader(config.input.escape_timeout_ms).context("Failed to open terminal input")?;

    terminal::install_panic_hook();
    terminal::install_signal_handlers();
    let mut guard = TerminalGuard::acquire().context("Failed to set up the terminal")?;

    let renderer = Renderer::new(config.editor.highlight_digits);
    let mut stdout = io::stdout();
    let result = event_loop(&mut editor, keys.as_mut(), &mut plugins, &renderer, &mut stdout, || {
        crossterm::terminal::size().unwrap_or((80, 24))
    });

    guard.restore();
    tracing::info!("Editor stopped");
    Ok(result?)
}

/// The main loop: housekeeping, draw, one key, repeat.
///
/// Ends when the editor asks to quit or the key reader reports end of
/// input. A failed read is skipped unless it keeps failing.
pub fn event_loop<W: Write>(
    editor: &mut Editor,
    keys: &mut dyn KeyReader,
    hook: &mut dyn KeyHook,
    renderer: &Renderer,
    out: &mut W,
    screen_size: impl Fn() -> (u16, u16),
) -> TermResult<()> {
    let mut failures = 0;

    while !editor.should_quit() {
        editor.tick(Instant::now());
        let size = screen_size();
        editor.set_screen_height(size.1);
        renderer.draw(out, editor, size)?;

        match keys.read_key() {
            Ok(Some(key)) => {
                failures = 0;
                editor.handle_key(key, hook);
            }
            Ok(None) => {
                tracing::info!("End of input");
                break;
            }
            Err(source) => {
                failures += 1;
                tracing::warn!(error = %source, "Failed to read key");
                if failures >= MAX_READ_FAILURES {
                    return Err(TermError::InputFailed {
                        attempts: failures,
                        source,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Reads the welcome splash. Missing or unreadable means no splash.
pub fn read_splash(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "No splash file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::tests::Scripted;
    use azyon_core::{Key, Mode, NoHook};
    use tempfile::tempdir;

    struct FailingKeys;

    impl KeyReader for FailingKeys {
        fn read_key(&mut self) -> io::Result<Option<Key>> {
            Err(io::Error::other("device gone"))
        }
    }

    fn run_script(editor: &mut Editor, bytes: &[u8]) -> TermResult<Vec<u8>> {
        let mut keys = KeyDecoder::new(Scripted::bytes(bytes));
        let mut out = Vec::new();
        event_loop(editor, &mut keys, &mut NoHook, &Renderer::new(true), &mut out, || (80, 24))?;
        Ok(out)
    }

    #[test]
    fn test_edit_and_save_until_end_of_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "world").unwrap();
        let mut editor = Editor::start(StartupOptions {
            file: Some(path.clone()),
            splash: None,
            browse_dir: dir.path().to_path_buf(),
        });

        let out = run_script(&mut editor, b"hello \x1b[C\x1b[C\x1b[C\x1b[C\x1b[C\x1b[B\rnext\x13").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world\nnext");
        assert!(!out.is_empty());
        assert!(!editor.should_quit());
    }

    #[test]
    fn test_quit_key_stops_before_remaining_input() {
        let dir = tempdir().unwrap();
        let mut editor = Editor::start(StartupOptions {
            browse_dir: dir.path().to_path_buf(),
            ..Default::default()
        });
        assert!(matches!(editor.mode(), Mode::FileBrowser(_)));

        let mut keys = KeyDecoder::new(Scripted::bytes(b"\x11\r"));
        let mut out = Vec::new();
        event_loop(&mut editor, &mut keys, &mut NoHook, &Renderer::new(true), &mut out, || (80, 24)).unwrap();

        assert!(editor.should_quit());
        assert_eq!(keys.read_key().unwrap(), Some(Key::ENTER));
    }

    #[test]
    fn test_screen_height_sets_visible_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.txt");
        std::fs::write(&path, "").unwrap();
        let mut editor = Editor::start(StartupOptions {
            file: Some(path),
            splash: None,
            browse_dir: dir.path().to_path_buf(),
        });

        let mut keys = KeyDecoder::new(Scripted::bytes(b""));
        let mut out = Vec::new();
        event_loop(&mut editor, &mut keys, &mut NoHook, &Renderer::new(true), &mut out, || (80, 12)).unwrap();

        assert_eq!(editor.session().viewport().rows(), 10);
    }

    #[test]
    fn test_persistent_read_failure_ends_loop() {
        let mut editor = Editor::start(StartupOptions {
            splash: Some("hi".to_string()),
            ..Default::default()
        });
        let mut out = Vec::new();
        let err = event_loop(&mut editor, &mut FailingKeys, &mut NoHook, &Renderer::new(true), &mut out, || (80, 24))
            .unwrap_err();
        assert!(matches!(err, TermError::InputFailed { attempts: MAX_READ_FAILURES, .. }));
    }

    #[test]
    fn test_read_splash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("WELCOMESPLASH");
        assert_eq!(read_splash(&path), None);

        std::fs::write(&path, "AZYON\n").unwrap();
        assert_eq!(read_splash(&path).as_deref(), Some("AZYON\n"));
    }
}
