//! Raw-mode acquisition and release.
//!
//! The terminal is switched to raw mode and the alternate screen exactly
//! once at startup. [`TerminalGuard`] puts it back when dropped. The panic
//! hook and, on Unix, the termination signal handlers put it back when the
//! process dies before the guard can.

use std::io::{Write, stdout};

use crossterm::{
    ExecutableCommand,
    cursor::Show,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};

use crate::TermResult;

/// Tracks which terminal modes are active and restores them on drop.
#[derive(Debug, Default)]
pub struct TerminalGuard {
    raw_mode: bool,
    alternate_screen: bool,
}

impl TerminalGuard {
    /// Enables raw mode (no echo, no line buffering) and enters the
    /// alternate screen.
    ///
    /// On error, anything already enabled is undone.
    pub fn acquire() -> TermResult<Self> {
        let mut guard = Self::default();

        if let Err(e) = enable_raw_mode() {
            tracing::error!("Failed to enable raw mode: {}", e);
            return Err(e.into());
        }
        guard.raw_mode = true;
        tracing::debug!("Enabled raw mode");

        if let Err(e) = stdout().execute(EnterAlternateScreen) {
            tracing::error!("Failed to enter alternate screen: {}", e);
            guard.restore();
            return Err(e.into());
        }
        guard.alternate_screen = true;
        tracing::debug!("Entered alternate screen");

        Ok(guard)
    }

    /// Puts the terminal back. Safe to call more than once.
    pub fn restore(&mut self) {
        let _ = stdout().execute(Show);

        if self.alternate_screen {
            let _ = stdout().execute(LeaveAlternateScreen);
            self.alternate_screen = false;
            tracing::debug!("Left alternate screen");
        }

        if self.raw_mode {
            let _ = disable_raw_mode();
            self.raw_mode = false;
            tracing::debug!("Disabled raw mode");
        }

        let _ = stdout().flush();
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Restores the terminal without a guard, for use from the panic hook.
pub fn emergency_cleanup() {
    let _ = stdout().execute(Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
    let _ = stdout().flush();
}

/// Chains a terminal restore in front of the current panic hook, so the
/// panic report is printed on a sane terminal.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        emergency_cleanup();
        original_hook(panic);
    }));
}

/// Restores the terminal before the process is ended by `SIGTERM`,
/// `SIGHUP`, `SIGINT` or `SIGQUIT`. A no-op off Unix.
pub fn install_signal_handlers() {
    #[cfg(unix)]
    signals::install();
}

#[cfg(unix)]
mod signals {
    use std::sync::atomic::{AtomicBool, Ordering};

    use nix::libc::c_int;
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, raise, sigaction};

    /// Signals that end the editor.
    pub(super) const TERMINATING: [Signal; 4] = [Signal::SIGTERM, Signal::SIGHUP, Signal::SIGINT, Signal::SIGQUIT];

    static SIGNAL_RECEIVED: AtomicBool = AtomicBool::new(false);

    /// Restores the terminal, then dies of the same signal so the parent
    /// sees the real exit status.
    pub(super) extern "C" fn on_terminate(signum: c_int) {
        if SIGNAL_RECEIVED.swap(true, Ordering::SeqCst) {
            return;
        }
        super::emergency_cleanup();

        match Signal::try_from(signum) {
            Ok(signal) => {
                let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
                // SAFETY: resetting to the default disposition installs no Rust code.
                let _ = unsafe { sigaction(signal, &default) };
                let _ = raise(signal);
            }
            Err(_) => std::process::exit(128 + signum),
        }
    }

    pub(super) fn install() {
        let action = SigAction::new(SigHandler::Handler(on_terminate), SaFlags::empty(), SigSet::empty());
        for signal in TERMINATING {
            // SAFETY: the handler only touches an atomic and the terminal before
            // re-raising the signal.
            if let Err(e) = unsafe { sigaction(signal, &action) } {
                tracing::error!(signal = %signal, error = %e, "Failed to set signal handler");
            }
        }
        tracing::debug!("Installed terminal restore signal handlers");
    }
}
