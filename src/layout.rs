//! Byte layouts of the driver's ioctl arguments
//!
//! Each argument structure of the driver has a fixed size and fixed field
//! offsets. The types here mirror those structures: `encode` always succeeds,
//! `decode` checks the buffer is large enough before reading any field.
//!
//! Text travels as one byte per character (the character's ordinal value),
//! padded with spaces to the width of the field.

use core::fmt;

/// Byte used to pad text fields
pub const TEXT_PAD: u8 = b' ';

/// Byte written for a `true` flag
pub const FLAG_ON: u8 = b'1';
/// Byte written for a `false` flag
pub const FLAG_OFF: u8 = b'0';

/// Errors raised while laying out or reading back argument bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// A character has no single-byte representation
    UnencodableChar(char),
    /// The buffer is smaller than the structure being decoded
    ShortBuffer {
        /// Bytes the structure needs
        expected: usize,
        /// Bytes available
        provided: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnencodableChar(ch) => {
                write!(f, "Character {ch:?} cannot be sent to the display")
            }
            Self::ShortBuffer { expected, provided } => write!(
                f,
                "Buffer too short: expected {expected} bytes, provided {provided}"
            ),
        }
    }
}

impl core::error::Error for LayoutError {}

fn ensure_len(bytes: &[u8], expected: usize) -> Result<(), LayoutError> {
    if bytes.len() < expected {
        return Err(LayoutError::ShortBuffer {
            expected,
            provided: bytes.len(),
        });
    }
    Ok(())
}

/// Encode text as one byte per character
pub fn encode_text(text: &str) -> Result<Vec<u8>, LayoutError> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).map_err(|_| LayoutError::UnencodableChar(ch)))
        .collect()
}

/// Decode bytes into text, one character per byte
pub fn decode_text(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Write `text` into `field`
///
/// At most `width` characters are taken (and never more than the field
/// holds); the remainder of the field is filled with [`TEXT_PAD`].
pub fn write_padded(field: &mut [u8], text: &str, width: usize) -> Result<(), LayoutError> {
    let bytes = encode_text(text)?;
    let used = bytes.len().min(width).min(field.len());
    field[..used].copy_from_slice(&bytes[..used]);
    field[used..].fill(TEXT_PAD);
    Ok(())
}

/// Read up to `width` characters from `field`
pub fn read_text(field: &[u8], width: usize) -> String {
    decode_text(&field[..width.min(field.len())])
}

/// Single byte flag (`LcdBoolArgs_t`)
///
/// The driver speaks ASCII here: `'1'` switches a feature on, anything else
/// switches it off. On read, both `0` and `'0'` mean off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagArgs {
    /// Flag value
    pub value: bool,
}

impl FlagArgs {
    /// Encoded size
    pub const SIZE: usize = 1;

    /// Encode into the wire byte
    pub const fn encode(self) -> [u8; Self::SIZE] {
        [if self.value { FLAG_ON } else { FLAG_OFF }]
    }

    /// Decode from a driver buffer
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        ensure_len(bytes, Self::SIZE)?;
        Ok(Self {
            value: !matches!(bytes[0], 0 | FLAG_OFF),
        })
    }
}

/// Cursor position (`LcdPositionArgs_t`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// Column, offset 0
    pub column: u8,
    /// Row, offset 1
    pub row: u8,
}

impl Position {
    /// Offset of the column byte
    pub const COLUMN_OFFSET: usize = 0;
    /// Offset of the row byte
    pub const ROW_OFFSET: usize = 1;
    /// Encoded size
    pub const SIZE: usize = 2;

    /// Encode into wire bytes
    pub const fn encode(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[Self::COLUMN_OFFSET] = self.column;
        out[Self::ROW_OFFSET] = self.row;
        out
    }

    /// Decode from a driver buffer
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        ensure_len(bytes, Self::SIZE)?;
        Ok(Self {
            column: bytes[Self::COLUMN_OFFSET],
            row: bytes[Self::ROW_OFFSET],
        })
    }
}

/// Custom character definition (`LcdCustomCharArgs_t`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CustomCharArgs {
    /// Glyph slot, offset 0
    pub index: u8,
    /// Eight bitmap rows, offsets 1..9
    pub bitmap: [u8; 8],
}

impl CustomCharArgs {
    /// Offset of the index byte
    pub const INDEX_OFFSET: usize = 0;
    /// Offset of the first bitmap row
    pub const BITMAP_OFFSET: usize = 1;
    /// Number of bitmap rows
    pub const BITMAP_LEN: usize = 8;
    /// Encoded size
    pub const SIZE: usize = Self::BITMAP_OFFSET + Self::BITMAP_LEN;

    /// Encode into wire bytes
    pub fn encode(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[Self::INDEX_OFFSET] = self.index;
        out[Self::BITMAP_OFFSET..].copy_from_slice(&self.bitmap);
        out
    }

    /// Decode from a driver buffer
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        ensure_len(bytes, Self::SIZE)?;
        let mut bitmap = [0u8; Self::BITMAP_LEN];
        bitmap.copy_from_slice(&bytes[Self::BITMAP_OFFSET..Self::SIZE]);
        Ok(Self {
            index: bytes[Self::INDEX_OFFSET],
            bitmap,
        })
    }
}

/// Vertical scroll request (`LcdScrollArgs_t`)
///
/// The direction is a native-endian `u32`; the line that scrolls in follows
/// it. A non-zero direction scrolls down (new line enters at the top).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollArgs<'a> {
    /// Scroll direction, offset 0
    pub direction: u32,
    /// Line entering the display, offset 4
    pub line: &'a str,
}

impl ScrollArgs<'_> {
    /// Offset of the direction word
    pub const DIRECTION_OFFSET: usize = 0;
    /// Offset of the line field
    pub const LINE_OFFSET: usize = 4;

    /// Encode into `field`, taking at most `width` characters of the line
    ///
    /// A field shorter than the direction word receives only the bytes that
    /// fit.
    pub fn encode_into(&self, field: &mut [u8], width: usize) -> Result<(), LayoutError> {
        let direction = self.direction.to_ne_bytes();
        let head = field.len().min(Self::LINE_OFFSET);
        field[..head].copy_from_slice(&direction[..head]);
        if field.len() > Self::LINE_OFFSET {
            write_padded(&mut field[Self::LINE_OFFSET..], self.line, width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_padded_pads_with_spaces() {
        let mut field = [0u8; 6];
        write_padded(&mut field, "Hi", 4).unwrap();
        assert_eq!(&field, b"Hi    ");
    }

    #[test]
    fn test_write_padded_truncates_to_width() {
        let mut field = [0u8; 8];
        write_padded(&mut field, "0123456789", 5).unwrap();
        assert_eq!(&field, b"01234   ");
    }

    #[test]
    fn test_write_padded_truncates_to_field() {
        let mut field = [0u8; 3];
        write_padded(&mut field, "abcdef", 20).unwrap();
        assert_eq!(&field, b"abc");
    }

    #[test]
    fn test_encode_text_rejects_wide_chars() {
        assert_eq!(
            encode_text("a\u{263A}"),
            Err(LayoutError::UnencodableChar('\u{263A}'))
        );
        assert_eq!(encode_text("\u{FF}").unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_text_bytes_map_to_latin1() {
        assert_eq!(decode_text(&[b'A', 0xDF]), "A\u{DF}");
        assert_eq!(read_text(b"abcdef", 3), "abc");
        assert_eq!(read_text(b"ab", 10), "ab");
    }

    #[test]
    fn test_flag_protocol() {
        assert_eq!(FlagArgs { value: true }.encode(), [b'1']);
        assert_eq!(FlagArgs { value: false }.encode(), [b'0']);
        assert!(!FlagArgs::decode(&[b'0']).unwrap().value);
        assert!(!FlagArgs::decode(&[0]).unwrap().value);
        assert!(FlagArgs::decode(&[b'1']).unwrap().value);
        assert!(FlagArgs::decode(&[1]).unwrap().value);
    }

    #[test]
    fn test_position_layout() {
        let position = Position { column: 7, row: 3 };
        assert_eq!(position.encode(), [7, 3]);
        assert_eq!(Position::decode(&[7, 3, 0xAA]).unwrap(), position);
    }

    #[test]
    fn test_position_decode_short_buffer() {
        assert_eq!(
            Position::decode(&[1]),
            Err(LayoutError::ShortBuffer {
                expected: 2,
                provided: 1
            })
        );
    }

    #[test]
    fn test_custom_char_layout() {
        let args = CustomCharArgs {
            index: 6,
            bitmap: [0x00, 0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0x00, 0x00],
        };
        let bytes = args.encode();
        assert_eq!(bytes[0], 6);
        assert_eq!(&bytes[1..], &args.bitmap);
        assert_eq!(CustomCharArgs::decode(&bytes).unwrap(), args);
        assert!(CustomCharArgs::decode(&bytes[..8]).is_err());
    }

    #[test]
    fn test_scroll_layout() {
        let mut field = [0u8; 10];
        ScrollArgs {
            direction: 1,
            line: "abc",
        }
        .encode_into(&mut field, 4)
        .unwrap();
        assert_eq!(&field[..4], &1u32.to_ne_bytes());
        assert_eq!(&field[4..], b"abc   ");
    }
}
