//! lcdi2c Character LCD Driver
//!
//! Userspace access to HD44780-style character displays handled by the
//! `lcdi2c` Linux kernel driver. The driver exposes one device node; text is
//! written to it and everything else goes through `ioctl(2)` commands whose
//! 32-bit words carry the operation, the transfer direction and the argument
//! size.
//!
//! ## Features
//!
//! - Command word codec and the driver's built-in command table
//! - Typed, fixed-width argument layouts
//! - Command registry built from the driver's sysfs metadata
//! - Cursor, line, buffer, flag, scroll and custom character operations
//! - Scoped device sessions that always close the device
//!
//! ## Usage
//!
//! ```rust,no_run
//! use alphalcd::{DeviceChannel, Lcd, Metadata, metadata};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let meta = Metadata::load(metadata::META_FILE_PATH)?;
//! let device = DeviceChannel::new(meta.device_path(metadata::I2C_DEVICES_ROOT)?);
//! let config = meta.builder()?.build()?;
//!
//! let mut lcd = Lcd::new(device, config);
//! let mut session = lcd.session()?;
//! session.clear()?;
//! let end = session.print("Hello", Some(0), Some(0))?;
//! assert_eq!(end.column, 5);
//! session.finish()?;
//! # Ok(())
//! # }
//! ```

/// lcdi2c command definitions
pub mod command;
/// Display configuration types and builder
pub mod config;
/// Cached cursor position
pub mod cursor;
/// Text and cursor operations on the LCD
pub mod display;
/// Error types for the driver
pub mod error;
/// Device interface abstraction
pub mod interface;
/// Byte layouts of the driver's ioctl arguments
pub mod layout;
/// Typed payloads and marshalers
pub mod marshal;
/// Driver metadata and device discovery
pub mod metadata;
/// Registry of the commands a driver accepts
pub mod registry;

#[cfg(test)]
mod testing;

pub use command::{Command, CommandCode, DEFAULT_COMMANDS, Decoded, Direction};
pub use config::{Builder, Config, Geometry, MAX_COLUMNS, MAX_ROWS};
pub use display::{Lcd, Session};
pub use error::{ArgumentError, BuilderError, Error, ErrorKind};
pub use interface::{ChannelError, DEFAULT_DEVICE_PATH, DeviceChannel, DeviceInterface};
pub use layout::{CustomCharArgs, Position, ScrollArgs};
pub use marshal::{Marshaler, Payload, PayloadShape, Value};
pub use metadata::Metadata;
pub use registry::{CommandRegistry, CommandSpec};
