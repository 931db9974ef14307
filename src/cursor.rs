//! Cached cursor position

use crate::command::Command;
use crate::config::Geometry;
use crate::error::{ArgumentError, Error};
use crate::interface::DeviceInterface;
use crate::layout::Position;
use crate::marshal::{Payload, Value};
use crate::registry::CommandRegistry;

/// Last cursor position seen on or sent to the device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    position: Position,
}

/// Clamp one coordinate
///
/// Values below zero or above `max` land on the last cell. `max` itself is
/// passed through unchanged.
fn clamp(value: i32, max: u8) -> u8 {
    if value < 0 || value > i32::from(max) {
        max.saturating_sub(1)
    } else {
        // 0..=max, always fits
        u8::try_from(value).unwrap_or(max)
    }
}

impl Cursor {
    /// Cached column
    pub const fn column(&self) -> u8 {
        self.position.column
    }

    /// Cached row
    pub const fn row(&self) -> u8 {
        self.position.row
    }

    /// Cached position
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Record that the device moved the cursor to the origin
    pub const fn home(&mut self) {
        self.position = Position { column: 0, row: 0 };
    }

    /// Read the position from the device and cache it
    ///
    /// # Errors
    ///
    /// Any error of the `GETPOSITION` call.
    pub fn get<I: DeviceInterface>(
        &mut self,
        registry: &CommandRegistry,
        device: &mut I,
    ) -> Result<Position, Error<I>> {
        match registry.call_command(Command::GetPosition, device, None)? {
            Some(Value::Position(position)) => {
                self.position = position;
                Ok(position)
            }
            _ => Err(ArgumentError::PayloadMismatch(Command::GetPosition).into()),
        }
    }

    /// Move the cursor
    ///
    /// A missing coordinate keeps its cached value; with both missing this is
    /// a plain [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Any error of the `SETPOSITION` or `GETPOSITION` call.
    pub fn set<I: DeviceInterface>(
        &mut self,
        registry: &CommandRegistry,
        device: &mut I,
        geometry: Geometry,
        column: Option<i32>,
        row: Option<i32>,
    ) -> Result<Position, Error<I>> {
        if column.is_none() && row.is_none() {
            return self.get(registry, device);
        }
        let position = Position {
            column: column.map_or(self.position.column, |c| clamp(c, geometry.columns)),
            row: row.map_or(self.position.row, |r| clamp(r, geometry.rows)),
        };
        registry.call_command(
            Command::SetPosition,
            device,
            Some(Payload::Position(position)),
        )?;
        self.position = position;
        Ok(position)
    }
}
