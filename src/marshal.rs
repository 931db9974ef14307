//! Typed payloads and the marshalers that move them through a device call
//!
//! Every command has a [`PayloadShape`] (what its argument buffer holds) and a
//! [`Marshaler`] (how the buffer travels, picked from the direction bits of
//! the command word). The buffer handed to the driver is always exactly the
//! length declared in the command word.

use crate::command::{Command, Direction};
use crate::config::Geometry;
use crate::error::{ArgumentError, Error};
use crate::interface::DeviceInterface;
use crate::layout::{self, CustomCharArgs, FlagArgs, Position, ScrollArgs};
use crate::registry::CommandSpec;

/// Layout of a command's argument buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
    /// No argument
    NoPayload,
    /// One character byte
    Char,
    /// One ASCII flag byte
    Flag,
    /// One display line of text
    Line {
        /// Logical width in characters
        width: usize,
    },
    /// The whole display as text
    Buffer {
        /// Logical width in characters
        width: usize,
    },
    /// Column and row bytes
    Position,
    /// Index byte followed by eight bitmap rows
    CustomChar,
    /// Direction word followed by one line of text
    ScrollVert {
        /// Logical width of the line in characters
        width: usize,
    },
    /// Version text filling the whole buffer
    Version,
}

impl PayloadShape {
    /// Shape of `command` on a display of the given geometry
    pub const fn for_command(command: Command, geometry: Geometry) -> Self {
        let columns = geometry.columns as usize;
        match command {
            Command::Reset | Command::Home | Command::Clear => Self::NoPayload,
            Command::GetChar | Command::SetChar => Self::Char,
            Command::GetBacklight
            | Command::SetBacklight
            | Command::GetCursor
            | Command::SetCursor
            | Command::GetBlink
            | Command::SetBlink
            | Command::ScrollHz => Self::Flag,
            Command::GetLine | Command::SetLine => Self::Line { width: columns },
            Command::GetBuffer | Command::SetBuffer => Self::Buffer {
                width: columns * geometry.rows as usize,
            },
            Command::GetPosition | Command::SetPosition => Self::Position,
            Command::GetCustomChar | Command::SetCustomChar => Self::CustomChar,
            Command::ScrollVert => Self::ScrollVert { width: columns },
            Command::GetVersion => Self::Version,
        }
    }

    /// Lay `payload` out into `buf`
    ///
    /// Text is cut to the logical width and padded with spaces; binary layouts
    /// are cut to the buffer or left zero-padded.
    ///
    /// # Errors
    ///
    /// `PayloadMismatch` when the payload variant does not fit the shape,
    /// `UnencodableChar` for text outside the single-byte range.
    pub fn encode(
        self,
        command: Command,
        payload: &Payload<'_>,
        buf: &mut [u8],
    ) -> Result<(), ArgumentError> {
        match (self, payload) {
            // Trigger commands declared write-class by older drivers
            (Self::NoPayload | Self::Flag, Payload::Flag(value)) => {
                copy_truncated(buf, &FlagArgs { value: *value }.encode());
            }
            (Self::Char, Payload::Char(byte)) => copy_truncated(buf, &[*byte]),
            (
                Self::Line { width } | Self::Buffer { width } | Self::ScrollVert { width },
                Payload::Text(text),
            ) => layout::write_padded(buf, text, width)?,
            (Self::Version, Payload::Text(text)) => {
                let width = buf.len();
                layout::write_padded(buf, text, width)?;
            }
            (Self::Position, Payload::Position(position)) => {
                copy_truncated(buf, &position.encode());
            }
            (Self::CustomChar, Payload::CustomChar(args)) => copy_truncated(buf, &args.encode()),
            (Self::ScrollVert { width }, Payload::Scroll(args)) => args.encode_into(buf, width)?,
            _ => return Err(ArgumentError::PayloadMismatch(command)),
        }
        Ok(())
    }

    /// Read a value back out of `buf`
    ///
    /// # Errors
    ///
    /// `ShortBuffer` when `buf` is smaller than the shape's layout.
    pub fn decode(self, buf: &[u8]) -> Result<Value, ArgumentError> {
        let value = match self {
            Self::Char => Value::Char(
                *buf.first()
                    .ok_or(ArgumentError::ShortBuffer { expected: 1, provided: 0 })?,
            ),
            Self::Flag => Value::Flag(FlagArgs::decode(buf)?.value),
            Self::Line { width } | Self::Buffer { width } => {
                Value::Text(layout::read_text(buf, width))
            }
            Self::Version => Value::Text(
                layout::decode_text(buf)
                    .trim_end_matches(['\0', ' '])
                    .to_owned(),
            ),
            Self::Position => Value::Position(Position::decode(buf)?),
            Self::CustomChar => Value::CustomChar(CustomCharArgs::decode(buf)?),
            Self::NoPayload | Self::ScrollVert { .. } => Value::Raw(buf.to_vec()),
        };
        Ok(value)
    }
}

fn copy_truncated(buf: &mut [u8], bytes: &[u8]) {
    let used = buf.len().min(bytes.len());
    buf[..used].copy_from_slice(&bytes[..used]);
}

/// Argument passed to a command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Single character byte
    Char(u8),
    /// On/off flag
    Flag(bool),
    /// Line, buffer or version text
    Text(&'a str),
    /// Cursor position
    Position(Position),
    /// Custom character slot and bitmap
    CustomChar(CustomCharArgs),
    /// Vertical scroll request
    Scroll(ScrollArgs<'a>),
}

/// Value returned by a read-class command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Single character byte
    Char(u8),
    /// On/off flag
    Flag(bool),
    /// Decoded text, cut to the logical width
    Text(String),
    /// Cursor position
    Position(Position),
    /// Custom character slot and bitmap
    CustomChar(CustomCharArgs),
    /// Bytes of a shape with no typed reading
    Raw(Vec<u8>),
}

/// How a command's argument buffer travels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marshaler {
    /// No buffer
    NoArgs,
    /// Buffer sent to the driver
    WriteOnly,
    /// Buffer filled by the driver
    ReadOnly,
    /// Buffer sent, then read back
    WriteRead,
}

impl Marshaler {
    /// Marshaler for a direction
    pub const fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::None => Self::NoArgs,
            Direction::Write => Self::WriteOnly,
            Direction::Read => Self::ReadOnly,
            Direction::WriteRead => Self::WriteRead,
        }
    }

    /// Issue one device call for `spec`
    ///
    /// Returns the decoded reply for read-class commands and `None` otherwise.
    ///
    /// # Errors
    ///
    /// `MissingPayload` if a sending marshaler gets no payload, `InvalidArgument`
    /// for payloads that cannot be laid out, `Interface` when the call fails.
    pub fn invoke<I: DeviceInterface>(
        self,
        spec: &CommandSpec,
        device: &mut I,
        payload: Option<&Payload<'_>>,
    ) -> Result<Option<Value>, Error<I>> {
        let command = spec.command;
        match self {
            Self::NoArgs => {
                if payload.is_some() {
                    return Err(ArgumentError::UnexpectedPayload(command).into());
                }
                device.control(spec.code, None).map_err(Error::Interface)?;
                Ok(None)
            }
            Self::WriteOnly => {
                let payload = payload.ok_or(Error::MissingPayload(command))?;
                let mut buf = vec![0u8; spec.code.length()];
                spec.shape.encode(command, payload, &mut buf)?;
                device.control(spec.code, Some(&mut buf)).map_err(Error::Interface)?;
                Ok(None)
            }
            Self::ReadOnly => {
                if payload.is_some() {
                    return Err(ArgumentError::UnexpectedPayload(command).into());
                }
                let mut buf = vec![0u8; spec.code.length()];
                device.control(spec.code, Some(&mut buf)).map_err(Error::Interface)?;
                Ok(Some(spec.shape.decode(&buf)?))
            }
            Self::WriteRead => {
                let payload = payload.ok_or(Error::MissingPayload(command))?;
                let mut buf = vec![0u8; spec.code.length()];
                spec.shape.encode(command, payload, &mut buf)?;
                device.control(spec.code, Some(&mut buf)).map_err(Error::Interface)?;
                Ok(Some(spec.shape.decode(&buf)?))
            }
        }
    }
}
