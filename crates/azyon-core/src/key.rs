//! Normalized key codes.
//!
//! ## Learning: Enums with Data
//!
//! Terminals send single bytes for most keys and multi-byte sequences for
//! navigation keys. `Key` keeps the two apart at the type level, while
//! [`Key::code`] still gives scripts a single integer space in which the
//! synthetic codes (>= 1000) can never collide with a byte.

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable or control byte, passed through unchanged
    Byte(u8),
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub const ESCAPE: Key = Key::Byte(0x1b);
    /// Carriage return, what raw terminals send for Enter
    pub const ENTER: Key = Key::Byte(b'\r');
    pub const LINE_FEED: Key = Key::Byte(b'\n');
    pub const BACKSPACE: Key = Key::Byte(0x7f);
    /// Ctrl+H
    pub const CTRL_H: Key = Key::Byte(0x08);
    /// Ctrl+S
    pub const SAVE: Key = Key::Byte(0x13);
    /// Ctrl+Q
    pub const QUIT: Key = Key::Byte(0x11);

    pub const UP_CODE: i64 = 1000;
    pub const DOWN_CODE: i64 = 1001;
    pub const LEFT_CODE: i64 = 1002;
    pub const RIGHT_CODE: i64 = 1003;

    /// The integer code handed to scripts.
    pub fn code(self) -> i64 {
        match self {
            Key::Byte(b) => i64::from(b),
            Key::Up => Self::UP_CODE,
            Key::Down => Self::DOWN_CODE,
            Key::Left => Self::LEFT_CODE,
            Key::Right => Self::RIGHT_CODE,
        }
    }

    /// Enter arrives as CR or LF depending on the terminal's input flags.
    pub fn is_enter(self) -> bool {
        self == Self::ENTER || self == Self::LINE_FEED
    }

    pub fn is_backspace(self) -> bool {
        self == Self::BACKSPACE || self == Self::CTRL_H
    }

    /// Printable ASCII, space through tilde.
    pub fn printable(self) -> Option<u8> {
        match self {
            Key::Byte(b @ 0x20..=0x7e) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Up => f.write_str("Up"),
            Key::Down => f.write_str("Down"),
            Key::Left => f.write_str("Left"),
            Key::Right => f.write_str("Right"),
            Key::Byte(0x1b) => f.write_str("Esc"),
            Key::Byte(b) => match self.printable() {
                Some(_) => write!(f, "'{}'", *b as char),
                None if *b < 0x20 => write!(f, "Ctrl+{}", (b + b'@') as char),
                None => write!(f, "0x{b:02x}"),
            },
        }
    }
}
