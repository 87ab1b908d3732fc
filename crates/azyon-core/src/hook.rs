//! The seam between the editor and external key handlers.
//!
//! ## Learning: Passing State Instead of Sharing It
//!
//! A hook never keeps a pointer to the session. The editor lends it a
//! `&mut Session` for the duration of one call, so the borrow checker
//! guarantees the hook cannot observe the session while the editor is
//! mutating it, and there is no global "current editor".

use crate::Session;
use crate::key::Key;

/// Receives every decoded key exactly once, before mode handling.
pub trait KeyHook {
    /// Called with the key and temporary access to the session.
    ///
    /// Errors are reported by the editor and never abort the session.
    fn on_key(&mut self, key: Key, session: &mut Session) -> anyhow::Result<()>;
}

/// A hook that ignores every key.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl KeyHook for NoHook {
    fn on_key(&mut self, _key: Key, _session: &mut Session) -> anyhow::Result<()> {
        Ok(())
    }
}
