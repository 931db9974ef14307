//! Text and cursor operations on the LCD

use core::ops::{Deref, DerefMut};

use log::{debug, warn};

use crate::command::Command;
use crate::config::{Config, Geometry};
use crate::cursor::Cursor;
use crate::error::{ArgumentError, Error};
use crate::interface::DeviceInterface;
use crate::layout::{self, CustomCharArgs, Position, ScrollArgs};
use crate::marshal::{Payload, Value};
use crate::registry::CommandRegistry;

type DisplayResult<I> = core::result::Result<(), Error<I>>;

/// Character LCD driven through the lcdi2c device
///
/// Every operation is one or a few blocking calls on the device. The cursor
/// position is cached between calls and refreshed whenever the device may
/// have moved it.
pub struct Lcd<I>
where
    I: DeviceInterface,
{
    /// Device transport
    device: I,
    /// Display configuration
    config: Config,
    /// Commands available on this display
    registry: CommandRegistry,
    /// Cached cursor
    cursor: Cursor,
}

impl<I> Lcd<I>
where
    I: DeviceInterface,
{
    /// Create a new Lcd instance
    ///
    /// The device is not opened; use [`open`](Self::open) or
    /// [`session`](Self::session).
    pub fn new(device: I, config: Config) -> Self {
        let registry = CommandRegistry::new(
            config
                .commands
                .iter()
                .map(|(name, code)| (name.as_str(), *code)),
            config.geometry,
        );
        Self {
            device,
            config,
            registry,
            cursor: Cursor::default(),
        }
    }

    /// Open the device
    ///
    /// # Errors
    ///
    /// `Interface` if the device cannot be opened or is already open.
    pub fn open(&mut self) -> DisplayResult<I> {
        self.device.open().map_err(Error::Interface)
    }

    /// Flush and close the device
    ///
    /// # Errors
    ///
    /// `Interface` if the final flush fails. The device is closed regardless.
    pub fn close(&mut self) -> DisplayResult<I> {
        self.device.close().map_err(Error::Interface)
    }

    /// Open the device for the lifetime of the returned guard
    ///
    /// ```
    /// use alphalcd::{Builder, DeviceChannel, Geometry, Lcd};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Builder::new()
    ///     .geometry(Geometry::new(16, 2)?)
    ///     .default_commands()
    ///     .build()?;
    /// let mut lcd = Lcd::new(DeviceChannel::new("/nonexistent/lcdi2c"), config);
    /// assert!(lcd.session().is_err());
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// `Interface` if the device cannot be opened.
    pub fn session(&mut self) -> Result<Session<'_, I>, Error<I>> {
        self.open()?;
        Ok(Session {
            lcd: self,
            finished: false,
        })
    }

    /// Issue a command by name
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::call`].
    pub fn call(
        &mut self,
        name: &str,
        payload: Option<Payload<'_>>,
    ) -> Result<Option<Value>, Error<I>> {
        self.registry.call(name, &mut self.device, payload)
    }

    /// Re-initialise the controller
    pub fn reset(&mut self) -> DisplayResult<I> {
        self.trigger(Command::Reset)
    }

    /// Clear the display and return the cursor to the origin
    pub fn clear(&mut self) -> DisplayResult<I> {
        self.trigger(Command::Clear)
    }

    /// Return the cursor to the origin
    pub fn home(&mut self) -> DisplayResult<I> {
        self.trigger(Command::Home)
    }

    /// Print raw text, starting at the given or current position
    ///
    /// The driver interprets `\n` and wraps long text. Returns where the
    /// cursor ended up.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for characters without a single-byte form, otherwise
    /// any device error.
    pub fn print(
        &mut self,
        text: &str,
        column: Option<i32>,
        row: Option<i32>,
    ) -> Result<Position, Error<I>> {
        let bytes = layout::encode_text(text)?;
        self.set_cursor_position(column, row)?;
        self.device.write(&bytes).map_err(Error::Interface)?;
        self.device.flush().map_err(Error::Interface)?;
        self.cursor.get(&self.registry, &mut self.device)
    }

    /// Text of one row, without trailing padding
    pub fn get_line(&mut self, row: u8) -> Result<String, Error<I>> {
        self.set_cursor_position(Some(0), Some(i32::from(row)))?;
        let text = self.query_text(Command::GetLine)?;
        Ok(text.trim_end_matches([' ', '\0']).to_owned())
    }

    /// Replace one row, cutting or padding `text` to the row width
    pub fn set_line(&mut self, text: &str, row: u8) -> DisplayResult<I> {
        self.set_cursor_position(Some(0), Some(i32::from(row)))?;
        self.send(Command::SetLine, Payload::Text(text))
    }

    /// Every cell of the display, row after row
    pub fn get_buffer(&mut self) -> Result<String, Error<I>> {
        self.query_text(Command::GetBuffer)
    }

    /// Replace the whole display, cutting or padding `text` to fit
    pub fn set_buffer(&mut self, text: &str) -> DisplayResult<I> {
        self.send(Command::SetBuffer, Payload::Text(text))
    }

    /// Character at the given or current position
    pub fn get_char(&mut self, column: Option<i32>, row: Option<i32>) -> Result<char, Error<I>> {
        if column.is_some() || row.is_some() {
            self.set_cursor_position(column, row)?;
        }
        match self.query(Command::GetChar, None)? {
            Value::Char(byte) => Ok(char::from(byte)),
            _ => Err(ArgumentError::PayloadMismatch(Command::GetChar).into()),
        }
    }

    /// Write one character at the given or current position
    ///
    /// The driver advances the cursor past the character.
    pub fn set_char(&mut self, ch: char, column: Option<i32>, row: Option<i32>) -> DisplayResult<I> {
        let byte = u8::try_from(u32::from(ch)).map_err(|_| ArgumentError::UnencodableChar(ch))?;
        if column.is_some() || row.is_some() {
            self.set_cursor_position(column, row)?;
        }
        self.send(Command::SetChar, Payload::Char(byte))?;
        self.cursor.get(&self.registry, &mut self.device)?;
        Ok(())
    }

    /// Bitmap of a custom character
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `index` is in `0..=7`.
    pub fn get_custom_char_bin(&mut self, index: i32) -> Result<[u8; 8], Error<I>> {
        let index = custom_char_index(index)?;
        let args = CustomCharArgs {
            index,
            bitmap: [0; CustomCharArgs::BITMAP_LEN],
        };
        match self.query(Command::GetCustomChar, Some(Payload::CustomChar(args)))? {
            Value::CustomChar(args) => Ok(args.bitmap),
            _ => Err(ArgumentError::PayloadMismatch(Command::GetCustomChar).into()),
        }
    }

    /// Program a custom character from eight bitmap rows
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `index` is in `0..=7` and `data` holds exactly
    /// eight rows.
    pub fn set_custom_char_bin(&mut self, index: i32, data: &[u8]) -> DisplayResult<I> {
        let index = custom_char_index(index)?;
        let bitmap: [u8; CustomCharArgs::BITMAP_LEN] =
            data.try_into().map_err(|_| ArgumentError::InvalidBitmapLength {
                expected: CustomCharArgs::BITMAP_LEN,
                provided: data.len(),
            })?;
        self.send(
            Command::SetCustomChar,
            Payload::CustomChar(CustomCharArgs { index, bitmap }),
        )
    }

    /// Whether the backlight is on
    pub fn backlight(&mut self) -> Result<bool, Error<I>> {
        self.query_flag(Command::GetBacklight)
    }

    /// Switch the backlight
    pub fn set_backlight(&mut self, on: bool) -> DisplayResult<I> {
        self.send(Command::SetBacklight, Payload::Flag(on))
    }

    /// Whether the cursor is shown
    pub fn cursor(&mut self) -> Result<bool, Error<I>> {
        self.query_flag(Command::GetCursor)
    }

    /// Show or hide the cursor
    pub fn set_cursor(&mut self, on: bool) -> DisplayResult<I> {
        self.send(Command::SetCursor, Payload::Flag(on))
    }

    /// Whether the cursor blinks
    pub fn blink(&mut self) -> Result<bool, Error<I>> {
        self.query_flag(Command::GetBlink)
    }

    /// Enable or disable cursor blink
    pub fn set_blink(&mut self, on: bool) -> DisplayResult<I> {
        self.send(Command::SetBlink, Payload::Flag(on))
    }

    /// Shift the display one cell, to the right when `right` is set
    pub fn scroll(&mut self, right: bool) -> DisplayResult<I> {
        self.send(Command::ScrollHz, Payload::Flag(right))
    }

    /// Shift every row by one and bring `line` in
    ///
    /// With `down` set, rows move down and `line` becomes the first row;
    /// otherwise rows move up and `line` becomes the last row. One device
    /// call either way.
    pub fn scroll_vert(&mut self, line: &str, down: bool) -> DisplayResult<I> {
        debug!("scroll {} with {line:?}", if down { "down" } else { "up" });
        self.send(
            Command::ScrollVert,
            Payload::Scroll(ScrollArgs {
                direction: u32::from(down),
                line,
            }),
        )
    }

    /// Driver version string
    pub fn version(&mut self) -> Result<String, Error<I>> {
        self.query_text(Command::GetVersion)
    }

    /// Read the cursor position from the device
    pub fn get_position(&mut self) -> Result<Position, Error<I>> {
        self.cursor.get(&self.registry, &mut self.device)
    }

    /// Move the cursor, returning where it was
    pub fn set_position(&mut self, column: i32, row: i32) -> Result<Position, Error<I>> {
        let previous = self.cursor.get(&self.registry, &mut self.device)?;
        self.set_cursor_position(Some(column), Some(row))?;
        Ok(previous)
    }

    /// Cursor position as last seen, without a device call
    pub const fn cached_position(&self) -> Position {
        self.cursor.position()
    }

    /// Display geometry
    pub const fn geometry(&self) -> Geometry {
        self.config.geometry
    }

    /// Get reference to the configuration
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Commands available on this display
    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Get reference to the device
    pub const fn device(&self) -> &I {
        &self.device
    }

    /// Get mutable reference to the device
    pub const fn device_mut(&mut self) -> &mut I {
        &mut self.device
    }

    /// Give the device back
    pub fn into_device(self) -> I {
        self.device
    }

    fn set_cursor_position(
        &mut self,
        column: Option<i32>,
        row: Option<i32>,
    ) -> Result<Position, Error<I>> {
        let geometry = self.config.geometry;
        self.cursor
            .set(&self.registry, &mut self.device, geometry, column, row)
    }

    /// Send a payload-free command
    ///
    /// Older drivers declare these write-class and expect a `'1'` byte.
    fn trigger(&mut self, command: Command) -> DisplayResult<I> {
        let payload = self
            .registry
            .get(command)
            .filter(|spec| spec.decoded.direction.requires_payload())
            .map(|_| Payload::Flag(true));
        self.registry
            .call_command(command, &mut self.device, payload)?;
        self.cursor.home();
        Ok(())
    }

    fn send(&mut self, command: Command, payload: Payload<'_>) -> DisplayResult<I> {
        self.registry
            .call_command(command, &mut self.device, Some(payload))?;
        Ok(())
    }

    fn query(&mut self, command: Command, payload: Option<Payload<'_>>) -> Result<Value, Error<I>> {
        self.registry
            .call_command(command, &mut self.device, payload)?
            .ok_or_else(|| ArgumentError::PayloadMismatch(command).into())
    }

    fn query_flag(&mut self, command: Command) -> Result<bool, Error<I>> {
        match self.query(command, None)? {
            Value::Flag(on) => Ok(on),
            _ => Err(ArgumentError::PayloadMismatch(command).into()),
        }
    }

    fn query_text(&mut self, command: Command) -> Result<String, Error<I>> {
        match self.query(command, None)? {
            Value::Text(text) => Ok(text),
            _ => Err(ArgumentError::PayloadMismatch(command).into()),
        }
    }
}

fn custom_char_index(index: i32) -> Result<u8, ArgumentError> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 8)
        .ok_or(ArgumentError::InvalidCustomCharIndex(index))
}

/// Open device scoped to a borrow of the [`Lcd`]
///
/// Dereferences to the `Lcd`. The device is flushed and closed when the guard
/// goes out of scope; use [`finish`](Self::finish) to see the close error.
pub struct Session<'a, I>
where
    I: DeviceInterface,
{
    lcd: &'a mut Lcd<I>,
    finished: bool,
}

impl<I> Session<'_, I>
where
    I: DeviceInterface,
{
    /// Flush and close the device now
    ///
    /// # Errors
    ///
    /// `Interface` if the final flush fails.
    pub fn finish(mut self) -> DisplayResult<I> {
        self.finished = true;
        self.lcd.close()
    }
}

impl<I> Deref for Session<'_, I>
where
    I: DeviceInterface,
{
    type Target = Lcd<I>;

    fn deref(&self) -> &Self::Target {
        self.lcd
    }
}

impl<I> DerefMut for Session<'_, I>
where
    I: DeviceInterface,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.lcd
    }
}

impl<I> Drop for Session<'_, I>
where
    I: DeviceInterface,
{
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.lcd.device.close() {
            warn!("failed to close LCD device: {e:?}");
        }
    }
}
