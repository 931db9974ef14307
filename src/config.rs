//! Display configuration types and builder

pub use crate::error::{BuilderError, MAX_COLUMNS, MAX_ROWS};

use crate::command::{CommandCode, DEFAULT_COMMANDS};

/// Display geometry in character cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Number of columns (characters per line)
    pub columns: u8,
    /// Number of rows (lines)
    pub rows: u8,
}

impl Geometry {
    /// Create a new geometry with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidGeometry` if:
    /// - columns == 0 or columns > MAX_COLUMNS
    /// - rows == 0 or rows > MAX_ROWS
    pub fn new(columns: u8, rows: u8) -> Result<Self, BuilderError> {
        if columns == 0 || columns > MAX_COLUMNS || rows == 0 || rows > MAX_ROWS {
            return Err(BuilderError::InvalidGeometry { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    /// Number of character cells on the display
    pub fn cells(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// Display configuration
///
/// Holds the geometry and the table of command words the driver accepts.
/// Use `Builder` to create a Config.
#[derive(Clone, Debug)]
pub struct Config {
    /// Display geometry
    pub geometry: Geometry,
    /// Command words by driver name, in table order
    pub commands: Vec<(String, CommandCode)>,
}

/// Builder for constructing display configuration
///
/// # Example
///
/// ```
/// use alphalcd::{Builder, Geometry};
///
/// let geometry = match Geometry::new(20, 4) {
///     Ok(geometry) => geometry,
///     Err(_) => return,
/// };
/// let config = match Builder::new().geometry(geometry).default_commands().build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.geometry.cells(), 80);
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    /// Display geometry (required)
    geometry: Option<Geometry>,
    /// Command words (at least one required)
    commands: Vec<(String, CommandCode)>,
}

impl Builder {
    /// Create a new Builder with no geometry and an empty command table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set display geometry (required)
    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Add one command word under its driver name
    pub fn command(mut self, name: impl Into<String>, code: CommandCode) -> Self {
        self.commands.push((name.into(), code));
        self
    }

    /// Add several command words
    pub fn commands<N, C>(mut self, commands: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<CommandCode>,
    {
        self.commands
            .extend(commands.into_iter().map(|(name, code)| (name.into(), code.into())));
        self
    }

    /// Add the command table compiled into the lcdi2c driver
    pub fn default_commands(self) -> Self {
        self.commands(
            DEFAULT_COMMANDS
                .iter()
                .map(|(command, code)| (command.name(), *code)),
        )
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::MissingGeometry` if geometry was not set and
    /// `BuilderError::MissingCommands` if the command table is empty
    pub fn build(self) -> Result<Config, BuilderError> {
        let geometry = self.geometry.ok_or(BuilderError::MissingGeometry)?;
        if self.commands.is_empty() {
            return Err(BuilderError::MissingCommands);
        }
        Ok(Config {
            geometry,
            commands: self.commands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_bounds() {
        assert!(Geometry::new(16, 2).is_ok());
        assert!(Geometry::new(40, 4).is_ok());
        assert!(matches!(
            Geometry::new(0, 2),
            Err(BuilderError::InvalidGeometry { columns: 0, rows: 2 })
        ));
        assert!(Geometry::new(41, 1).is_err());
        assert!(Geometry::new(20, 5).is_err());
        assert!(Geometry::new(20, 0).is_err());
    }

    #[test]
    fn test_geometry_cells() {
        assert_eq!(Geometry::new(20, 4).unwrap().cells(), 80);
        assert_eq!(Geometry::new(16, 2).unwrap().cells(), 32);
    }

    #[test]
    fn test_build_requires_geometry() {
        let result = Builder::new().default_commands().build();
        assert!(matches!(result, Err(BuilderError::MissingGeometry)));
    }

    #[test]
    fn test_build_requires_commands() {
        let result = Builder::new()
            .geometry(Geometry::new(16, 2).unwrap())
            .build();
        assert!(matches!(result, Err(BuilderError::MissingCommands)));
    }

    #[test]
    fn test_build_keeps_table_order() {
        let config = Builder::new()
            .geometry(Geometry::new(16, 2).unwrap())
            .command("CLEAR", CommandCode::new(0x0000_F54E))
            .commands([("HOME", 0x0000_F556_u32)])
            .build()
            .unwrap();
        let names: Vec<&str> = config.commands.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["CLEAR", "HOME"]);
        assert_eq!(config.commands[1].1, CommandCode::new(0x0000_F556));
    }

    #[test]
    fn test_default_commands_cover_driver_table() {
        let config = Builder::new()
            .geometry(Geometry::new(20, 4).unwrap())
            .default_commands()
            .build()
            .unwrap();
        assert_eq!(config.commands.len(), DEFAULT_COMMANDS.len());
        assert!(config.commands.iter().any(|(name, _)| name == "SCROLLVERT"));
    }
}
