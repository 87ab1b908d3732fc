//! Key decoding.
//!
//! ## Learning: Decoding Over a Byte Source
//!
//! On Unix the terminal sends arrow keys as escape sequences (`ESC [ A`).
//! [`KeyDecoder`] turns a stream of bytes into [`Key`]s and only needs two
//! things from its source: a blocking read for the first byte of a key,
//! and a bounded wait for the bytes that may follow an `ESC`. Keeping that
//! behind the [`ByteSource`] trait lets the tests feed scripted bytes
//! (including "nothing arrived in time") without a terminal.
//!
//! The Windows console reports keys as events instead, so there the
//! crossterm event reader is translated to the same `Key` values.

use std::io;

use azyon_core::Key;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Longest CSI parameter string accepted before giving up on a sequence.
const MAX_CSI_PARAMS: usize = 16;

/// Produces one decoded key per call.
pub trait KeyReader {
    /// Blocks until a key is available. `Ok(None)` means end of input.
    fn read_key(&mut self) -> io::Result<Option<Key>>;
}

/// Raw input bytes.
pub trait ByteSource {
    /// Blocks for the next byte. `Ok(None)` means end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Returns the next byte if one arrives within the escape timeout.
    fn read_pending_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Decodes terminal bytes into keys.
#[derive(Debug)]
pub struct KeyDecoder<S> {
    source: S,
    /// Byte read while looking for a sequence that belongs to the next key
    pending: Option<u8>,
}

impl<S: ByteSource> KeyDecoder<S> {
    pub fn new(source: S) -> Self {
        Self { source, pending: None }
    }

    /// After `ESC`: `[` starts a CSI sequence, `O` an SS3 sequence.
    /// Nothing in time is a plain Escape. Any other byte is also a plain
    /// Escape and is kept as the start of the next key.
    fn decode_escape(&mut self) -> io::Result<Key> {
        match self.source.read_pending_byte()? {
            Some(b'[') => self.decode_csi(),
            Some(b'O') => Ok(self
                .source
                .read_pending_byte()?
                .and_then(arrow)
                .unwrap_or(Key::ESCAPE)),
            Some(byte) => {
                self.pending = Some(byte);
                Ok(Key::ESCAPE)
            }
            None => Ok(Key::ESCAPE),
        }
    }

    /// Reads parameter bytes up to the final byte of a CSI sequence.
    fn decode_csi(&mut self) -> io::Result<Key> {
        let mut params = Vec::new();
        while params.len() <= MAX_CSI_PARAMS {
            let Some(byte) = self.source.read_pending_byte()? else {
                return Ok(Key::ESCAPE);
            };
            match byte {
                // parameter and intermediate bytes
                0x20..=0x3f => params.push(byte),
                0x40..=0x7e => return Ok(csi_key(&params, byte)),
                _ => {
                    self.pending = Some(byte);
                    return Ok(Key::ESCAPE);
                }
            }
        }
        Ok(Key::ESCAPE)
    }
}

impl<S: ByteSource> KeyReader for KeyDecoder<S> {
    fn read_key(&mut self) -> io::Result<Option<Key>> {
        let next = match self.pending.take() {
            Some(byte) => Some(byte),
            None => self.source.read_byte()?,
        };
        match next {
            None => Ok(None),
            Some(0x1b) => self.decode_escape().map(Some),
            Some(byte) => Ok(Some(Key::Byte(byte))),
        }
    }
}

fn arrow(final_byte: u8) -> Option<Key> {
    match final_byte {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        _ => None,
    }
}

/// Maps a complete CSI sequence. Modifier parameters on arrows are
/// ignored; `ESC [ 3 ~` is the Delete key.
fn csi_key(params: &[u8], final_byte: u8) -> Key {
    if final_byte == b'~' {
        let first = params.split(|&b| b == b';').next().unwrap_or_default();
        return if first == b"3" { Key::BACKSPACE } else { Key::ESCAPE };
    }
    arrow(final_byte).unwrap_or(Key::ESCAPE)
}

// ==================== Unix stdin ====================

#[cfg(unix)]
pub use unix::StdinSource;

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{self, Read};
    use std::os::fd::AsFd;

    use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

    use super::ByteSource;

    /// Unbuffered standard input.
    #[derive(Debug)]
    pub struct StdinSource {
        input: File,
        escape_timeout: PollTimeout,
    }

    impl StdinSource {
        /// Opens a private handle on stdin. Continuation bytes of an escape
        /// sequence are awaited for at most `escape_timeout_ms`.
        pub fn new(escape_timeout_ms: u16) -> io::Result<Self> {
            let fd = io::stdin().as_fd().try_clone_to_owned()?;
            Ok(Self {
                input: File::from(fd),
                escape_timeout: PollTimeout::from(escape_timeout_ms),
            })
        }
    }

    impl ByteSource for StdinSource {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            let mut buf = [0u8; 1];
            loop {
                match self.input.read(&mut buf) {
                    Ok(0) => return Ok(None),
                    Ok(_) => return Ok(Some(buf[0])),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
        }

        fn read_pending_byte(&mut self) -> io::Result<Option<u8>> {
            let mut fds = [PollFd::new(self.input.as_fd(), PollFlags::POLLIN)];
            let ready = poll(&mut fds, self.escape_timeout).map_err(io::Error::from)?;
            if ready == 0 {
                return Ok(None);
            }
            self.read_byte()
        }
    }
}

// ==================== Console events ====================

/// Keys from crossterm's console event reader.
#[cfg(not(unix))]
#[derive(Debug, Default)]
pub struct ConsoleKeys;

#[cfg(not(unix))]
impl KeyReader for ConsoleKeys {
    fn read_key(&mut self) -> io::Result<Option<Key>> {
        loop {
            if let crossterm::event::Event::Key(event) = crossterm::event::read()? {
                if let Some(key) = translate_key_event(event) {
                    return Ok(Some(key));
                }
            }
        }
    }
}

/// Translates a console key event. Releases and keys with no byte
/// equivalent give `None`.
pub fn translate_key_event(event: KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let key = match event.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::ENTER,
        KeyCode::Backspace => Key::CTRL_H,
        KeyCode::Delete => Key::BACKSPACE,
        KeyCode::Esc => Key::ESCAPE,
        KeyCode::Tab => Key::Byte(b'\t'),
        KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii_alphabetic() => {
            Key::Byte(c.to_ascii_lowercase() as u8 & 0x1f)
        }
        KeyCode::Char(c) if c.is_ascii() && !c.is_ascii_control() => Key::Byte(c as u8),
        _ => return None,
    };
    Some(key)
}

/// Opens the platform's key reader.
pub fn open_key_reader(escape_timeout_ms: u16) -> io::Result<Box<dyn KeyReader>> {
    #[cfg(unix)]
    {
        Ok(Box::new(KeyDecoder::new(StdinSource::new(escape_timeout_ms)?)))
    }
    #[cfg(not(unix))]
    {
        let _ = escape_timeout_ms;
        Ok(Box::new(ConsoleKeys))
    }
}
