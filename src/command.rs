//! lcdi2c command definitions
//!
//! This module defines the device-control command words understood by the
//! `lcdi2c` kernel driver and the codec that splits a word into its fields.
//!
//! ## Command Word Layout
//!
//! Every command is a 32-bit word built the same way as the kernel's `_IOC`
//! macro:
//!
//! | bits  | field                                   |
//! |-------|-----------------------------------------|
//! | 0–7   | sequence number                         |
//! | 8–15  | type (driver base, `0xF5` for lcdi2c)    |
//! | 16–29 | payload length in bytes                 |
//! | 30–31 | direction (none, write, read, both)     |
//!
//! The driver publishes its table of words through the sysfs metadata file;
//! [`DEFAULT_COMMANDS`] reproduces the table compiled into the driver.
//!
//! ## Example
//!
//! ```
//! use alphalcd::command::{CommandCode, Direction};
//!
//! let decoded = CommandCode::new(0x8002_F51D).decode();
//! assert_eq!(decoded.nr, 0x1D);
//! assert_eq!(decoded.kind, 0xF5);
//! assert_eq!(decoded.length, 2);
//! assert_eq!(decoded.direction, Direction::Read);
//! ```

use core::fmt;

/// Base (type byte) used by the lcdi2c driver for all of its commands
pub const LCD_IOCTL_BASE: u8 = 0xF5;

const NR_MASK: u32 = 0xFF;
const KIND_SHIFT: u32 = 8;
const KIND_MASK: u32 = 0xFF;
const LENGTH_SHIFT: u32 = 16;
const LENGTH_MASK: u32 = 0x3FFF;
const DIRECTION_SHIFT: u32 = 30;
const DIRECTION_MASK: u32 = 0x03;

/// Data direction encoded in the top two bits of a command word
///
/// Directions are seen from userspace: `Write` sends a payload to the
/// driver, `Read` receives one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// No payload
    None = 0,
    /// Payload flows to the driver
    Write = 1,
    /// Payload flows from the driver
    Read = 2,
    /// Payload is sent, then overwritten by the driver
    WriteRead = 3,
}

impl Direction {
    /// Map the two direction bits to a variant
    ///
    /// Only the two lowest bits are considered, so every input maps.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & DIRECTION_MASK {
            0 => Self::None,
            1 => Self::Write,
            2 => Self::Read,
            _ => Self::WriteRead,
        }
    }

    /// Whether the caller has to supply a payload
    pub const fn requires_payload(self) -> bool {
        matches!(self, Self::Write | Self::WriteRead)
    }

    /// Whether the driver hands a payload back
    pub const fn returns_payload(self) -> bool {
        matches!(self, Self::Read | Self::WriteRead)
    }

    /// Upper-case name, as printed by the driver tooling
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Write => "WRITE",
            Self::Read => "READ",
            Self::WriteRead => "WRITEREAD",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields of a decoded command word
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// Sequence number (bits 0–7)
    pub nr: u8,
    /// Type or driver base (bits 8–15)
    pub kind: u8,
    /// Declared payload length in bytes (bits 16–29)
    pub length: u16,
    /// Data direction (bits 30–31)
    pub direction: Direction,
}

/// Raw 32-bit device-control command word
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandCode(u32);

impl CommandCode {
    /// Wrap a raw command word
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build a command word from its fields
    ///
    /// `length` is masked to the 14 bits the layout reserves for it.
    pub const fn compose(direction: Direction, kind: u8, nr: u8, length: u16) -> Self {
        Self(
            ((direction as u32) << DIRECTION_SHIFT)
                | (((length as u32) & LENGTH_MASK) << LENGTH_SHIFT)
                | ((kind as u32) << KIND_SHIFT)
                | nr as u32,
        )
    }

    /// Raw value passed to the kernel
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Split the word into its fields
    pub const fn decode(self) -> Decoded {
        Decoded {
            nr: (self.0 & NR_MASK) as u8,
            kind: ((self.0 >> KIND_SHIFT) & KIND_MASK) as u8,
            length: ((self.0 >> LENGTH_SHIFT) & LENGTH_MASK) as u16,
            direction: Direction::from_bits(self.0 >> DIRECTION_SHIFT),
        }
    }

    /// Declared payload length in bytes
    pub const fn length(self) -> usize {
        self.decode().length as usize
    }

    /// Data direction
    pub const fn direction(self) -> Direction {
        self.decode().direction
    }
}

impl From<u32> for CommandCode {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

/// Named operations supported by the driver
///
/// This is the closed set of commands the crate knows how to marshal.
/// Anything else found in a command table is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    /// Read the driver version string
    GetVersion,
    /// Read the character under the cursor
    GetChar,
    /// Write one character at the cursor
    SetChar,
    /// Read the line the cursor is on
    GetLine,
    /// Write the line the cursor is on
    SetLine,
    /// Read the whole display buffer
    GetBuffer,
    /// Write the whole display buffer
    SetBuffer,
    /// Re-initialise the controller
    Reset,
    /// Move the cursor to (0, 0)
    Home,
    /// Clear the display
    Clear,
    /// Read the backlight state
    GetBacklight,
    /// Switch the backlight
    SetBacklight,
    /// Read the cursor visibility
    GetCursor,
    /// Show or hide the cursor
    SetCursor,
    /// Read the cursor blink state
    GetBlink,
    /// Enable or disable cursor blink
    SetBlink,
    /// Scroll the display horizontally by one cell
    ScrollHz,
    /// Scroll the display vertically by one row
    ScrollVert,
    /// Read a custom character bitmap
    GetCustomChar,
    /// Program a custom character bitmap
    SetCustomChar,
    /// Read the cursor position
    GetPosition,
    /// Move the cursor
    SetPosition,
}

impl Command {
    /// Every supported command
    pub const ALL: [Self; 22] = [
        Self::GetVersion,
        Self::GetChar,
        Self::SetChar,
        Self::GetLine,
        Self::SetLine,
        Self::GetBuffer,
        Self::SetBuffer,
        Self::Reset,
        Self::Home,
        Self::Clear,
        Self::GetBacklight,
        Self::SetBacklight,
        Self::GetCursor,
        Self::SetCursor,
        Self::GetBlink,
        Self::SetBlink,
        Self::ScrollHz,
        Self::ScrollVert,
        Self::GetCustomChar,
        Self::SetCustomChar,
        Self::GetPosition,
        Self::SetPosition,
    ];

    /// Name under which the driver publishes the command
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetVersion => "GETVERSION",
            Self::GetChar => "GETCHAR",
            Self::SetChar => "SETCHAR",
            Self::GetLine => "GETLINE",
            Self::SetLine => "SETLINE",
            Self::GetBuffer => "GETBUFFER",
            Self::SetBuffer => "SETBUFFER",
            Self::Reset => "RESET",
            Self::Home => "HOME",
            Self::Clear => "CLEAR",
            Self::GetBacklight => "GETBACKLIGHT",
            Self::SetBacklight => "SETBACKLIGHT",
            Self::GetCursor => "GETCURSOR",
            Self::SetCursor => "SETCURSOR",
            Self::GetBlink => "GETBLINK",
            Self::SetBlink => "SETBLINK",
            Self::ScrollHz => "SCROLLHZ",
            Self::ScrollVert => "SCROLLVERT",
            Self::GetCustomChar => "GETCUSTOMCHAR",
            Self::SetCustomChar => "SETCUSTOMCHAR",
            Self::GetPosition => "GETPOSITION",
            Self::SetPosition => "SETPOSITION",
        }
    }

    /// Look a command up by name
    ///
    /// Accepts the driver's spelling (`GETCHAR`) as well as the underscored
    /// one (`GET_CHAR`), case-insensitively.
    ///
    /// ```
    /// use alphalcd::command::Command;
    ///
    /// assert_eq!(Command::from_name("SETLINE"), Some(Command::SetLine));
    /// assert_eq!(Command::from_name("scroll_vert"), Some(Command::ScrollVert));
    /// assert_eq!(Command::from_name("REBOOT"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let mut folded = [0u8; 24];
        let mut len = 0;
        for byte in name.bytes().filter(|b| *b != b'_') {
            if len == folded.len() {
                return None;
            }
            folded[len] = byte.to_ascii_uppercase();
            len += 1;
        }
        let folded = &folded[..len];
        Self::ALL
            .into_iter()
            .find(|command| command.name().as_bytes() == folded)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Argument sizes of the driver's ioctl structures

/// Line argument size (`LCD_MAX_LINE_LENGTH`)
pub const LINE_ARG_LEN: u16 = 40;
/// Buffer argument size (`LCD_BUFFER_SIZE`, 20 x 4 + 4)
pub const BUFFER_ARG_LEN: u16 = 84;
/// Custom character argument size (index + 8 bitmap rows)
pub const CUSTOM_CHAR_ARG_LEN: u16 = 9;
/// Scroll argument size (u32 direction + line)
pub const SCROLL_ARG_LEN: u16 = 4 + LINE_ARG_LEN;

/// Sequence number flag for multi-byte arguments
const IOCTLB: u8 = 1;
/// Sequence number flag for single character arguments
const IOCTLC: u8 = 2;

const fn lcd(direction: Direction, flag: u8, index: u8, length: u16) -> CommandCode {
    CommandCode::compose(direction, LCD_IOCTL_BASE, flag | (index << 2), length)
}

/// Command table compiled into the lcdi2c driver
///
/// Used when the sysfs metadata is not available. The driver does not
/// define a version command, so [`Command::GetVersion`] is absent.
pub const DEFAULT_COMMANDS: [(Command, CommandCode); 21] = [
    (Command::GetChar, lcd(Direction::Read, IOCTLC, 0x01, 1)),
    (Command::SetChar, lcd(Direction::Write, IOCTLC, 0x02, 1)),
    (Command::GetLine, lcd(Direction::Read, IOCTLB, 0x03, LINE_ARG_LEN)),
    (Command::SetLine, lcd(Direction::Write, IOCTLB, 0x04, LINE_ARG_LEN)),
    (Command::GetBuffer, lcd(Direction::Read, IOCTLB, 0x05, BUFFER_ARG_LEN)),
    (Command::SetBuffer, lcd(Direction::Write, IOCTLB, 0x06, BUFFER_ARG_LEN)),
    (Command::GetPosition, lcd(Direction::Read, IOCTLB, 0x07, 2)),
    (Command::SetPosition, lcd(Direction::Write, IOCTLB, 0x08, 2)),
    (Command::GetBacklight, lcd(Direction::Read, IOCTLC, 0x09, 1)),
    (Command::SetBacklight, lcd(Direction::Write, IOCTLC, 0x0A, 1)),
    (Command::GetCursor, lcd(Direction::Read, IOCTLC, 0x0B, 1)),
    (Command::SetCursor, lcd(Direction::Write, IOCTLC, 0x0C, 1)),
    (Command::GetBlink, lcd(Direction::Read, IOCTLC, 0x0D, 1)),
    (Command::SetBlink, lcd(Direction::Write, IOCTLC, 0x0E, 1)),
    (
        Command::GetCustomChar,
        lcd(Direction::WriteRead, IOCTLB, 0x0F, CUSTOM_CHAR_ARG_LEN),
    ),
    (
        Command::SetCustomChar,
        lcd(Direction::Write, IOCTLB, 0x10, CUSTOM_CHAR_ARG_LEN),
    ),
    (Command::ScrollHz, lcd(Direction::Write, IOCTLC, 0x11, 1)),
    (Command::ScrollVert, lcd(Direction::Write, IOCTLC, 0x12, SCROLL_ARG_LEN)),
    (Command::Clear, lcd(Direction::None, IOCTLC, 0x13, 0)),
    (Command::Reset, lcd(Direction::None, IOCTLC, 0x14, 0)),
    (Command::Home, lcd(Direction::None, IOCTLC, 0x15, 0)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_code(command: Command) -> CommandCode {
        DEFAULT_COMMANDS
            .iter()
            .find(|(c, _)| *c == command)
            .map(|(_, code)| *code)
            .unwrap()
    }

    #[test]
    fn test_default_codes_match_driver_header() {
        assert_eq!(default_code(Command::GetChar).raw(), 0x8001_F506);
        assert_eq!(default_code(Command::SetChar).raw(), 0x4001_F50A);
        assert_eq!(default_code(Command::GetLine).raw(), 0x8028_F50D);
        assert_eq!(default_code(Command::SetBuffer).raw(), 0x4054_F519);
        assert_eq!(default_code(Command::GetPosition).raw(), 0x8002_F51D);
        assert_eq!(default_code(Command::SetPosition).raw(), 0x4002_F521);
        assert_eq!(default_code(Command::GetCustomChar).raw(), 0xC009_F53D);
        assert_eq!(default_code(Command::ScrollVert).raw(), 0x402C_F54A);
        assert_eq!(default_code(Command::Clear).raw(), 0x0000_F54E);
        assert_eq!(default_code(Command::Home).raw(), 0x0000_F556);
    }

    #[test]
    fn test_decode_write_read() {
        let decoded = CommandCode::new(0xC009_F53D).decode();
        assert_eq!(
            decoded,
            Decoded {
                nr: 0x3D,
                kind: LCD_IOCTL_BASE,
                length: 9,
                direction: Direction::WriteRead,
            }
        );
    }

    #[test]
    fn test_decode_uses_fourteen_length_bits() {
        let decoded = CommandCode::new(0x3FFF_0000).decode();
        assert_eq!(decoded.length, 0x3FFF);
        assert_eq!(decoded.direction, Direction::None);
    }

    #[test]
    fn test_direction_payload_rules() {
        assert!(!Direction::None.requires_payload());
        assert!(Direction::Write.requires_payload());
        assert!(!Direction::Read.requires_payload());
        assert!(Direction::WriteRead.requires_payload());
        assert!(Direction::Read.returns_payload());
        assert!(!Direction::Write.returns_payload());
    }

    #[test]
    fn test_command_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
        assert_eq!(Command::from_name("GET_CUSTOMCHAR"), Some(Command::GetCustomChar));
        assert_eq!(Command::from_name("get_position"), Some(Command::GetPosition));
        assert_eq!(Command::from_name(""), None);
        assert_eq!(Command::from_name("A_VERY_LONG_NAME_THAT_MATCHES_NOTHING"), None);
    }

    proptest! {
        #[test]
        fn prop_compose_inverts_decode(raw in any::<u32>()) {
            let d = CommandCode::new(raw).decode();
            let rebuilt = CommandCode::compose(d.direction, d.kind, d.nr, d.length);
            prop_assert_eq!(rebuilt.raw(), raw);
        }

        #[test]
        fn prop_decode_inverts_compose(
            bits in 0u32..4,
            kind in any::<u8>(),
            nr in any::<u8>(),
            length in 0u16..0x4000,
        ) {
            let direction = Direction::from_bits(bits);
            let d = CommandCode::compose(direction, kind, nr, length).decode();
            prop_assert_eq!(d, Decoded { nr, kind, length, direction });
        }
    }
}
