//! # Azyon Core
//!
//! Editing session, mode state machine and configuration.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Editor                     │
//! │   Mode: Welcome | FileBrowser | Editing       │
//! │         │                                     │
//! │  ┌──────┴───────┐   ┌──────────────────────┐  │
//! │  │   Session    │◀──│ KeyHook (plugins)    │  │
//! │  │ Document     │   └──────────────────────┘  │
//! │  │ Cursor       │                             │
//! │  │ Viewport     │                             │
//! │  └──────────────┘                             │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Every key goes to the hook first, then to the handler for the current
//! mode. Only the `Editing` mode touches the document.

pub mod browser;
pub mod config;
pub mod editor;
pub mod hook;
pub mod key;
pub mod session;
pub mod status;

pub use browser::{DirEntry, FileBrowser};
pub use config::{Config, ConfigError};
pub use editor::{Editor, Mode, SAVE_PROMPT, StartupOptions};
pub use hook::{KeyHook, NoHook};
pub use key::Key;
pub use session::Session;
pub use status::{MESSAGE_TIMEOUT, StatusMessage};

use std::path::PathBuf;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Could not open {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        source: azyon_buffer::BufferError,
    },

    #[error("Could not write {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        source: azyon_buffer::BufferError,
    },
}
