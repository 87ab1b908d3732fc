//! # Azyon Plugin System
//!
//! Lua scripts that watch keypresses and steer the cursor.
//!
//! ## Plugin API
//!
//! Every `*.lua` file in the plugin directory runs once at startup in one
//! shared Lua state. A script that defines a global `onKeyPress(key)` gets
//! called with the integer code of every decoded key. While a script runs
//! it can call:
//!
//! | Function | Effect |
//! |---|---|
//! | `getCursorX()` / `setCursorX(n)` | read / write the cursor column |
//! | `getCursorY()` / `setCursorY(n)` | read / write the cursor row |
//! | `getCurrentFile()` | current file path, `""` when untitled |
//! | `log(message)` | write to the editor log |
//!
//! ## Learning: Scoped Callbacks
//!
//! The cursor functions borrow the session, which lives on the Rust stack.
//! `Lua::scope` creates functions that may capture such non-`'static`
//! borrows and invalidates them when the scope ends, so the host lends the
//! session to Lua for exactly one call and keeps no global pointer to it.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use azyon_core::{Key, KeyHook, Session};
use mlua::{Lua, Value};

/// Plugin system errors.
///
/// Lua errors are kept as their rendered text, which includes the Lua
/// traceback, so the error can cross into `anyhow` and between threads.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Failed to load plugin {name}: {message}")]
    LoadFailed { name: String, message: String },

    #[error("{hook} failed: {message}")]
    HookFailed { hook: &'static str, message: String },

    #[error("Lua error: {0}")]
    Lua(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<mlua::Error> for PluginError {
    fn from(e: mlua::Error) -> Self {
        PluginError::Lua(e.to_string())
    }
}

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// File extension of plugin scripts.
pub const PLUGIN_EXTENSION: &str = "lua";

/// Global function called for every key.
pub const KEY_HANDLER: &str = "onKeyPress";

/// Plugin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Script ran to completion
    Active,
    /// Script could not be read or raised an error while loading
    Error,
}

/// Information about a plugin script.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// File name of the script
    pub name: String,
    /// Script path
    pub path: PathBuf,
    /// Load outcome
    pub state: PluginState,
    /// Error message (if state is Error)
    pub error: Option<String>,
}

/// Owns the Lua state and the plugins loaded into it.
pub struct PluginHost {
    /// Shared interpreter for all plugins
    lua: Lua,

    /// Load outcomes, in load order
    plugins: Vec<PluginInfo>,
}

impl PluginHost {
    /// Creates a Lua state with the editor API installed.
    pub fn new() -> PluginResult<Self> {
        let lua = Lua::new();

        let log = lua.create_function(|_, message: String| {
            tracing::info!(plugin = true, "{}", message);
            Ok(())
        })?;
        lua.globals().set("log", log)?;

        Ok(Self {
            lua,
            plugins: Vec::new(),
        })
    }

    /// Returns the load outcome of every plugin seen so far.
    pub fn plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }

    // ==================== Loading ====================

    /// Runs every `*.lua` script in `dir`, in file-name order.
    ///
    /// A missing directory means no plugins. A failing script is recorded
    /// and logged; the remaining scripts still load. Returns the number of
    /// scripts that loaded successfully.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>, session: &mut Session) -> PluginResult<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "No plugin directory");
            return Ok(0);
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == PLUGIN_EXTENSION))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match self.load_file(&path, session) {
                Ok(()) => loaded += 1,
                Err(e) => tracing::error!(path = %path.display(), error = %e, "Plugin failed to load"),
            }
        }
        Ok(loaded)
    }

    /// Runs one script file.
    pub fn load_file(&mut self, path: impl AsRef<Path>, session: &mut Session) -> PluginResult<()> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let result = std::fs::read(path)
            .map_err(PluginError::from)
            .and_then(|source| self.run_chunk(&name, &source, session));
        self.record(name, path.to_path_buf(), &result);
        result
    }

    /// Runs a script given as source text.
    pub fn load_source(&mut self, name: &str, source: &str, session: &mut Session) -> PluginResult<()> {
        let result = self.run_chunk(name, source.as_bytes(), session);
        self.record(name.to_string(), PathBuf::from(name), &result);
        result
    }

    fn run_chunk(&self, name: &str, source: &[u8], session: &mut Session) -> PluginResult<()> {
        self.with_session(session, |lua| lua.load(source).set_name(format!("@{name}")).exec())
            .map_err(|e| PluginError::LoadFailed {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    fn record(&mut self, name: String, path: PathBuf, result: &PluginResult<()>) {
        let (state, error) = match result {
            Ok(()) => {
                tracing::info!(plugin = %name, "Loaded plugin");
                (PluginState::Active, None)
            }
            Err(e) => (PluginState::Error, Some(e.to_string())),
        };
        self.plugins.push(PluginInfo {
            name,
            path,
            state,
            error,
        });
    }

    // ==================== Dispatch ====================

    /// Calls `onKeyPress(code)` if a plugin defined it.
    ///
    /// No handler is not an error. A Lua error inside the handler comes
    /// back as `HookFailed`; the Lua state stays usable.
    pub fn dispatch_key(&self, key: Key, session: &mut Session) -> PluginResult<()> {
        let handler = match self.lua.globals().get::<Value>(KEY_HANDLER)? {
            Value::Function(handler) => handler,
            _ => return Ok(()),
        };

        self.with_session(session, |_| handler.call::<()>(key.code()))
            .map_err(|e| PluginError::HookFailed {
                hook: KEY_HANDLER,
                message: e.to_string(),
            })
    }

    /// Installs the cursor and file accessors for the duration of `f`.
    fn with_session<R>(
        &self,
        session: &mut Session,
        f: impl FnOnce(&Lua) -> mlua::Result<R>,
    ) -> mlua::Result<R> {
        let session = RefCell::new(session);
        let session = &session;

        self.lua.scope(|scope| {
            let globals = self.lua.globals();

            globals.set(
                "getCursorX",
                scope.create_function(move |_, ()| Ok(session.borrow().cursor().column))?,
            )?;
            globals.set(
                "setCursorX",
                scope.create_function(move |_, column: i64| {
                    session.borrow_mut().cursor_mut().column = to_index(column);
                    Ok(())
                })?,
            )?;
            globals.set(
                "getCursorY",
                scope.create_function(move |_, ()| Ok(session.borrow().cursor().row))?,
            )?;
            globals.set(
                "setCursorY",
                scope.create_function(move |_, row: i64| {
                    session.borrow_mut().cursor_mut().row = to_index(row);
                    Ok(())
                })?,
            )?;
            globals.set(
                "getCurrentFile",
                scope.create_function(move |_, ()| {
                    Ok(session
                        .borrow()
                        .file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default())
                })?,
            )?;

            f(&self.lua)
        })
    }
}

impl KeyHook for PluginHost {
    fn on_key(&mut self, key: Key, session: &mut Session) -> anyhow::Result<()> {
        self.dispatch_key(key, session)?;
        Ok(())
    }
}

/// Cursor fields are unsigned; negative script values become 0.
fn to_index(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use azyon_buffer::{Cursor, Document};
    use azyon_core::{Editor, NoHook, StartupOptions};
    use tempfile::tempdir;

    fn session(lines: &[&str]) -> Session {
        Session::with_document(Document::from_lines(lines.iter().copied()))
    }

    #[test]
    fn test_handler_column_is_clamped_by_next_move() {
        let mut host = PluginHost::new().unwrap();
        let mut s = session(&["abc", "de"]);
        host.load_source("wide.lua", "function onKeyPress(key) setCursorX(99) end", &mut s)
            .unwrap();

        host.dispatch_key(Key::Byte(b'q'), &mut s).unwrap();
        assert_eq!(s.cursor().column, 99);

        s.move_cursor(0, 0);
        assert_eq!(s.cursor(), Cursor::new(0, 3));
    }

    #[test]
    fn test_handler_receives_key_code() {
        let mut host = PluginHost::new().unwrap();
        let mut s = session(&[""]);
        host.load_source("record.lua", "function onKeyPress(key) lastKey = key end", &mut s)
            .unwrap();

        host.dispatch_key(Key::Up, &mut s).unwrap();
        assert_eq!(host.lua.globals().get::<i64>("lastKey").unwrap(), 1000);
        host.dispatch_key(Key::SAVE, &mut s).unwrap();
        assert_eq!(host.lua.globals().get::<i64>("lastKey").unwrap(), 19);
    }

    #[test]
    fn test_accessors_read_and_write_cursor() {
        let mut host = PluginHost::new().unwrap();
        let mut s = session(&["one", "two", "three"]);
        *s.cursor_mut() = Cursor::new(1, 2);
        host.load_source(
            "move.lua",
            r#"
            function onKeyPress(key)
                setCursorY(getCursorY() + 1)
                setCursorX(getCursorX() - 10)
            end
            "#,
            &mut s,
        )
        .unwrap();

        host.dispatch_key(Key::Byte(b'x'), &mut s).unwrap();
        assert_eq!(s.cursor(), Cursor::new(2, 0));
    }

    #[test]
    fn test_current_file() {
        let mut host = PluginHost::new().unwrap();
        let mut s = session(&[""]);
        host.load_source("file.lua", "function onKeyPress(key) seen = getCurrentFile() end", &mut s)
            .unwrap();

        host.dispatch_key(Key::ENTER, &mut s).unwrap();
        assert_eq!(host.lua.globals().get::<String>("seen").unwrap(), "");

        s.set_file_path("notes.txt");
        host.dispatch_key(Key::ENTER, &mut s).unwrap();
        assert_eq!(host.lua.globals().get::<String>("seen").unwrap(), "notes.txt");
    }

    #[test]
    fn test_missing_handler_is_silent() {
        let host = PluginHost::new().unwrap();
        let mut s = session(&["abc"]);
        host.dispatch_key(Key::Byte(b'a'), &mut s).unwrap();
        assert_eq!(s.cursor(), Cursor::default());
    }

    #[test]
    fn test_handler_error_is_reported_and_host_survives() {
        let mut host = PluginHost::new().unwrap();
        let mut s = session(&["abc"]);
        host.load_source(
            "flaky.lua",
            r#"
            calls = 0
            function onKeyPress(key)
                calls = calls + 1
                if key == 27 then error("escape not allowed") end
            end
            "#,
            &mut s,
        )
        .unwrap();

        let err = host.dispatch_key(Key::ESCAPE, &mut s).unwrap_err();
        assert!(matches!(err, PluginError::HookFailed { hook: KEY_HANDLER, .. }));
        assert!(err.to_string().contains("escape not allowed"));

        host.dispatch_key(Key::Byte(b'a'), &mut s).unwrap();
        assert_eq!(host.lua.globals().get::<i64>("calls").unwrap(), 2);
    }

    #[test]
    fn test_load_dir_continues_after_failure() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a_broken.lua"), "this is not lua").unwrap();
        std::fs::write(dir.path().join("b_good.lua"), "loadedB = getCurrentFile()").unwrap();
        std::fs::write(dir.path().join("c_notes.txt"), "ignored").unwrap();

        let mut host = PluginHost::new().unwrap();
        let mut s = session(&[""]);
        s.set_file_path("x.txt");

        assert_eq!(host.load_dir(dir.path(), &mut s).unwrap(), 1);
        let plugins = host.plugins();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].name, "a_broken.lua");
        assert_eq!(plugins[0].state, PluginState::Error);
        assert!(plugins[0].error.as_deref().unwrap().contains("a_broken.lua"));
        assert_eq!(plugins[1].state, PluginState::Active);
        assert_eq!(host.lua.globals().get::<String>("loadedB").unwrap(), "x.txt");
    }

    #[test]
    fn test_missing_plugin_dir_loads_nothing() {
        let dir = tempdir().unwrap();
        let mut host = PluginHost::new().unwrap();
        let mut s = Session::new();
        assert_eq!(host.load_dir(dir.path().join("plugins"), &mut s).unwrap(), 0);
        assert!(host.plugins().is_empty());
    }

    #[test]
    fn test_plugins_share_one_state() {
        let mut host = PluginHost::new().unwrap();
        let mut s = Session::new();
        host.load_source("one.lua", "shared = 41", &mut s).unwrap();
        host.load_source("two.lua", "function onKeyPress(k) shared = shared + 1 end", &mut s)
            .unwrap();

        host.dispatch_key(Key::Byte(b' '), &mut s).unwrap();
        assert_eq!(host.lua.globals().get::<i64>("shared").unwrap(), 42);
    }

    #[test]
    fn test_host_as_editor_hook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "hello\nhi").unwrap();

        let mut editor = Editor::start(StartupOptions {
            file: Some(path),
            splash: None,
            browse_dir: dir.path().to_path_buf(),
        });
        let mut host = PluginHost::new().unwrap();
        host.load_source("wide.lua", "function onKeyPress(key) setCursorX(99) end", editor.session_mut())
            .unwrap();

        editor.handle_key(Key::Down, &mut host);
        assert_eq!(editor.session().cursor(), Cursor::new(1, 2));

        editor.handle_key(Key::Left, &mut NoHook);
        assert_eq!(editor.session().cursor(), Cursor::new(1, 1));
    }

    #[test]
    fn test_errors_convert_to_anyhow() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<PluginError>();

        let mut host = PluginHost::new().unwrap();
        let mut s = session(&[""]);
        host.load_source("boom.lua", "function onKeyPress(key) error('boom') end", &mut s)
            .unwrap();

        let err = anyhow::Error::from(host.dispatch_key(Key::ENTER, &mut s).unwrap_err());
        assert!(err.to_string().contains("boom"));
        assert!(err.downcast_ref::<PluginError>().is_some());
    }

    #[test]
    fn test_huge_row_from_handler_does_not_grow_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "abc").unwrap();

        let mut editor = Editor::start(StartupOptions {
            file: Some(path),
            splash: None,
            browse_dir: dir.path().to_path_buf(),
        });
        let mut host = PluginHost::new().unwrap();
        host.load_source("far.lua", "function onKeyPress(key) setCursorY(math.maxinteger) end", editor.session_mut())
            .unwrap();

        editor.handle_key(Key::Byte(b'z'), &mut host);
        assert_eq!(editor.session().document().len_lines(), 1);
        assert_eq!(editor.session().document().line(0), Some(&b"zabc"[..]));
        assert_eq!(editor.session().cursor(), Cursor::new(0, 1));
    }
}
