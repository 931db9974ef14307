//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and display operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors while loading metadata or building a [`Config`](crate::Config)
//! - [`Error`] - Runtime errors during display operations
//! - [`ArgumentError`] - Payloads rejected before any device call is made
//! - [`ChannelError`](crate::interface::ChannelError) - Low-level device errors
//!
//! ## Example
//!
//! ```
//! use alphalcd::{Builder, BuilderError, Geometry};
//!
//! // Missing geometry
//! let result = Builder::new().default_commands().build();
//! assert!(matches!(result, Err(BuilderError::MissingGeometry)));
//!
//! // Invalid geometry
//! let result = Geometry::new(80, 4); // Too wide
//! assert!(result.is_err());
//! ```

use std::io;
use std::path::PathBuf;

use crate::command::Command;
use crate::interface::DeviceInterface;
use crate::layout::LayoutError;

/// Maximum number of columns the driver supports (`LCD_MAX_LINE_LENGTH`)
pub const MAX_COLUMNS: u8 = 40;

/// Maximum number of rows the driver supports
pub const MAX_ROWS: u8 = 4;

/// Broad classification of an [`Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The command is not in the registry
    UnknownCommand,
    /// A write-class command was called without a payload
    MissingPayload,
    /// A payload was rejected before reaching the device
    InvalidArgument,
    /// The device-control call itself failed
    Io,
}

/// Payloads rejected before any device call is made
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    /// A payload was given to a command that takes none
    UnexpectedPayload(Command),
    /// The payload (or the command's reply) does not fit the command's shape
    PayloadMismatch(Command),
    /// Custom character index outside 0..=7
    InvalidCustomCharIndex(i32),
    /// Custom character bitmap of the wrong length
    InvalidBitmapLength {
        /// Expected length
        expected: usize,
        /// Provided length
        provided: usize,
    },
    /// Text contains a character with no single-byte form
    UnencodableChar(char),
    /// The command's buffer is too short for its argument structure
    ShortBuffer {
        /// Bytes the structure needs
        expected: usize,
        /// Bytes available
        provided: usize,
    },
}

impl core::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnexpectedPayload(command) => {
                write!(f, "Command {command} does not take a payload")
            }
            Self::PayloadMismatch(command) => {
                write!(f, "Payload does not match the shape of command {command}")
            }
            Self::InvalidCustomCharIndex(index) => {
                write!(f, "Custom character number must be between 0 and 7, got {index}")
            }
            Self::InvalidBitmapLength { expected, provided } => write!(
                f,
                "Custom character data must be {expected} bytes long, got {provided}"
            ),
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

impl core::error::Error for ArgumentError {}

impl From<LayoutError> for ArgumentError {
    fn from(e: LayoutError) -> Self {
        match e {
            LayoutError::UnencodableChar(ch) => Self::UnencodableChar(ch),
            LayoutError::ShortBuffer { expected, provided } => {
                Self::ShortBuffer { expected, provided }
            }
        }
    }
}

/// Errors that can occur when interacting with the display
///
/// Generic over the interface type to preserve the specific error type.
/// This allows error handling code to match on the underlying device error.
#[derive(Debug)]
pub enum Error<I: DeviceInterface> {
    /// Interface error (open, write or device-control call failed)
    ///
    /// Wraps the underlying error from the [`DeviceInterface`] implementation,
    /// unmodified.
    Interface(I::Error),
    /// The named command is not registered
    UnknownCommand(String),
    /// A write-class command was called without a payload
    MissingPayload(Command),
    /// A payload was rejected before reaching the device
    InvalidArgument(ArgumentError),
}

impl<I: DeviceInterface> Error<I> {
    /// Classify the error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Interface(_) => ErrorKind::Io,
            Self::UnknownCommand(_) => ErrorKind::UnknownCommand,
            Self::MissingPayload(_) => ErrorKind::MissingPayload,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl<I: DeviceInterface> From<ArgumentError> for Error<I> {
    fn from(e: ArgumentError) -> Self {
        Self::InvalidArgument(e)
    }
}

impl<I: DeviceInterface> From<LayoutError> for Error<I> {
    fn from(e: LayoutError) -> Self {
        Self::InvalidArgument(e.into())
    }
}

impl<I: DeviceInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(e) => write!(f, "Interface error: {e:?}"),
            Self::UnknownCommand(name) => write!(f, "IOCTL {name} not found"),
            Self::MissingPayload(command) => write!(f, "IOCTL {command} requires a value"),
            Self::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
        }
    }
}

impl<I: DeviceInterface + core::fmt::Debug> core::error::Error for Error<I> {}

/// Errors that can occur when building configuration
///
/// These errors occur before the display is created: while loading the
/// driver metadata, discovering the device node or running the builder.
#[derive(Debug)]
pub enum BuilderError {
    /// Geometry was not specified
    ///
    /// [`Builder::geometry()`](crate::config::Builder::geometry) must be called before building.
    MissingGeometry,
    /// Invalid geometry provided
    ///
    /// See [`Geometry::new()`](crate::config::Geometry::new) for constraints.
    InvalidGeometry {
        /// Number of columns requested
        columns: u8,
        /// Number of rows requested
        rows: u8,
    },
    /// No command words were supplied
    MissingCommands,
    /// The metadata file could not be read
    MetadataUnavailable {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// The metadata is not YAML of the expected shape
    MalformedMetadata(serde_yaml::Error),
    /// A required metadata field is absent
    MissingMetadataField(&'static str),
    /// No device is registered at the given bus and address
    DeviceNotFound {
        /// I2C bus number
        bus: u32,
        /// I2C device address
        address: u16,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingGeometry => write!(f, "Geometry must be specified"),
            Self::InvalidGeometry { columns, rows } => write!(
                f,
                "Invalid geometry {columns}x{rows} (max {MAX_COLUMNS}x{MAX_ROWS})"
            ),
            Self::MissingCommands => write!(f, "At least one command must be specified"),
            Self::MetadataUnavailable { path, source } => write!(
                f,
                "Metadata file not found at {} ({source}); is the lcdi2c module loaded?",
                path.display()
            ),
            Self::MalformedMetadata(e) => write!(f, "Malformed metadata: {e}"),
            Self::MissingMetadataField(field) => {
                write!(f, "Metadata does not define `{field}`")
            }
            Self::DeviceNotFound { bus, address } => {
                write!(f, "Device not found at bus {bus} address {address:#04x}")
            }
        }
    }
}

impl core::error::Error for BuilderError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::MetadataUnavailable { source, .. } => Some(source),
            Self::MalformedMetadata(e) => Some(e),
            _ => None,
        }
    }
}
