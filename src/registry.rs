//! Registry of the commands a driver accepts

use std::collections::BTreeMap;
use std::collections::btree_map;

use core::fmt;

use log::{debug, warn};

use crate::command::{Command, CommandCode, Decoded};
use crate::config::Geometry;
use crate::error::{ArgumentError, Error};
use crate::interface::DeviceInterface;
use crate::marshal::{Marshaler, Payload, PayloadShape, Value};

/// Everything needed to issue one command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    /// Named operation
    pub command: Command,
    /// Raw command word
    pub code: CommandCode,
    /// Fields of `code`
    pub decoded: Decoded,
    /// Argument layout
    pub shape: PayloadShape,
    /// Transfer strategy, from the direction bits
    pub marshaler: Marshaler,
}

impl CommandSpec {
    /// Build the spec for `command` issued with `code`
    pub const fn new(command: Command, code: CommandCode, geometry: Geometry) -> Self {
        let decoded = code.decode();
        Self {
            command,
            code,
            decoded,
            shape: PayloadShape::for_command(command, geometry),
            marshaler: Marshaler::for_direction(decoded.direction),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IOCTL Name:{} Base:{:#04X} SEQ:{:#04X} Direction:{} Length:{}",
            self.command,
            self.decoded.kind,
            self.decoded.nr,
            self.decoded.direction,
            self.decoded.length
        )
    }
}

/// Commands available on one display, keyed by operation
#[derive(Clone, Debug)]
pub struct CommandRegistry {
    commands: BTreeMap<Command, CommandSpec>,
}

impl CommandRegistry {
    /// Build the registry from a name to command-word table
    ///
    /// Names outside the supported command set are skipped. A name that
    /// appears twice keeps its last word.
    pub fn new<'a>(
        table: impl IntoIterator<Item = (&'a str, CommandCode)>,
        geometry: Geometry,
    ) -> Self {
        let mut commands = BTreeMap::new();
        for (name, code) in table {
            let Some(command) = Command::from_name(name) else {
                warn!("skipping unsupported command {name} ({code})");
                continue;
            };
            let spec = CommandSpec::new(command, code, geometry);
            debug!("{spec}");
            commands.insert(command, spec);
        }
        debug!("registered {} commands", commands.len());
        Self { commands }
    }

    /// Issue the command registered under `name`
    ///
    /// `name` is matched like [`Command::from_name`].
    ///
    /// # Errors
    ///
    /// - `UnknownCommand` when `name` is not registered
    /// - `MissingPayload` for a sending command called without a payload
    /// - `InvalidArgument` for a payload given to a command that takes none,
    ///   or one that does not fit the command
    /// - `Interface` when the device call fails
    pub fn call<I: DeviceInterface>(
        &self,
        name: &str,
        device: &mut I,
        payload: Option<Payload<'_>>,
    ) -> Result<Option<Value>, Error<I>> {
        let spec = Command::from_name(name)
            .and_then(|command| self.commands.get(&command))
            .ok_or_else(|| Error::UnknownCommand(name.to_owned()))?;
        Self::dispatch(spec, device, payload)
    }

    /// Issue `command`
    ///
    /// # Errors
    ///
    /// As [`call`](Self::call).
    pub fn call_command<I: DeviceInterface>(
        &self,
        command: Command,
        device: &mut I,
        payload: Option<Payload<'_>>,
    ) -> Result<Option<Value>, Error<I>> {
        let spec = self
            .commands
            .get(&command)
            .ok_or_else(|| Error::UnknownCommand(command.name().to_owned()))?;
        Self::dispatch(spec, device, payload)
    }

    fn dispatch<I: DeviceInterface>(
        spec: &CommandSpec,
        device: &mut I,
        payload: Option<Payload<'_>>,
    ) -> Result<Option<Value>, Error<I>> {
        let direction = spec.decoded.direction;
        match (&payload, direction.requires_payload()) {
            (None, true) => return Err(Error::MissingPayload(spec.command)),
            (Some(_), false) => {
                return Err(ArgumentError::UnexpectedPayload(spec.command).into());
            }
            _ => {}
        }
        spec.marshaler.invoke(spec, device, payload.as_ref())
    }

    /// Spec registered for `command`
    pub fn get(&self, command: Command) -> Option<&CommandSpec> {
        self.commands.get(&command)
    }

    /// Whether `command` is registered
    pub fn contains(&self, command: Command) -> bool {
        self.commands.contains_key(&command)
    }

    /// Iterate over the registered specs in command order
    pub fn iter(&self) -> btree_map::Values<'_, Command, CommandSpec> {
        self.commands.values()
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<'a> IntoIterator for &'a CommandRegistry {
    type Item = &'a CommandSpec;
    type IntoIter = btree_map::Values<'a, Command, CommandSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
