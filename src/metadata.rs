//! Driver metadata and device discovery
//!
//! The lcdi2c driver publishes its geometry, I2C location and command table
//! as a small YAML document in sysfs:
//!
//! ```text
//! ---
//! metadata:
//!        rows: 4
//!        columns: 20
//!        busno: 1
//!        reg: 0x27
//!        ioctls:
//!                 GETCHAR: 0x8001F506
//!                 SETCHAR: 0x4001F50A
//! ...
//! ```
//!
//! Only the fields used here are read; the driver emits more (pins, topology,
//! row offsets) and those are skipped. Numbers may be plain or quoted, in
//! decimal or `0x` hexadecimal.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use serde::de::{Deserializer, Error as _, Unexpected};
use serde_yaml::Mapping;

use crate::command::CommandCode;
use crate::config::{Builder, Geometry};
use crate::error::BuilderError;

/// Metadata attribute of the first lcdi2c device
pub const META_FILE_PATH: &str = "/sys/class/alphalcd/lcdi2c/meta";

/// Root of the I2C device tree in sysfs
pub const I2C_DEVICES_ROOT: &str = "/sys/bus/i2c/devices";

/// Parsed driver metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    /// Number of columns
    pub columns: u8,
    /// Number of rows
    pub rows: u8,
    /// I2C bus number (`busno`)
    pub bus: Option<u32>,
    /// I2C device address (`reg`)
    pub address: Option<u16>,
    /// Size of the driver's screen buffer (`buffer-len`)
    pub buffer_len: Option<usize>,
    /// Command words by driver name, in published order
    pub commands: Vec<(String, CommandCode)>,
}

#[derive(Deserialize)]
struct Raw {
    metadata: Inner,
}

#[derive(Deserialize)]
struct Inner {
    rows: Option<Number<u8>>,
    columns: Option<Number<u8>>,
    busno: Option<Number<u32>>,
    reg: Option<Number<u16>>,
    #[serde(rename = "buffer-len")]
    buffer_len: Option<Number<usize>>,
    ioctls: Option<Mapping>,
}

/// Integer written plain (`0x27`, `4`) or quoted (`"0x27"`)
struct Number<T>(T);

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(u64),
    Text(String),
}

impl<'de, T: TryFrom<u64>> Deserialize<'de> for Number<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match Scalar::deserialize(deserializer)? {
            Scalar::Int(value) => value,
            Scalar::Text(text) => {
                let digits = text.trim();
                let parsed = match digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => digits.parse(),
                };
                parsed
                    .map_err(|_| D::Error::invalid_value(Unexpected::Str(&text), &"an integer"))?
            }
        };
        T::try_from(value).map(Number).map_err(|_| {
            D::Error::invalid_value(Unexpected::Unsigned(value), &"an integer in range")
        })
    }
}

fn ioctl_table(ioctls: Mapping) -> Result<Vec<(String, CommandCode)>, BuilderError> {
    ioctls
        .into_iter()
        .map(|(name, word)| {
            let name: String = serde_yaml::from_value(name)?;
            let Number(word) = serde_yaml::from_value::<Number<u32>>(word)?;
            Ok::<_, serde_yaml::Error>((name, CommandCode::new(word)))
        })
        .collect::<Result<_, _>>()
        .map_err(BuilderError::MalformedMetadata)
}

impl Metadata {
    /// Parse the text of the metadata attribute
    ///
    /// # Errors
    ///
    /// `MalformedMetadata` when the text is not YAML of the expected shape or
    /// a number is out of range; `MissingMetadataField` when `rows`,
    /// `columns` or the command table is absent.
    pub fn parse(text: &str) -> Result<Self, BuilderError> {
        let Raw { metadata } =
            serde_yaml::from_str::<Raw>(text).map_err(BuilderError::MalformedMetadata)?;
        let commands = match metadata.ioctls {
            Some(ioctls) => ioctl_table(ioctls)?,
            None => Vec::new(),
        };
        if commands.is_empty() {
            return Err(BuilderError::MissingMetadataField("ioctls"));
        }
        Ok(Self {
            columns: metadata
                .columns
                .ok_or(BuilderError::MissingMetadataField("columns"))?
                .0,
            rows: metadata
                .rows
                .ok_or(BuilderError::MissingMetadataField("rows"))?
                .0,
            bus: metadata.busno.map(|n| n.0),
            address: metadata.reg.map(|n| n.0),
            buffer_len: metadata.buffer_len.map(|n| n.0),
            commands,
        })
    }

    /// Read and parse a metadata file
    ///
    /// # Errors
    ///
    /// `MetadataUnavailable` if the file cannot be read, otherwise as
    /// [`parse`](Self::parse).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BuilderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BuilderError::MetadataUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let metadata = Self::parse(&text)?;
        debug!(
            "loaded {}: {}x{}, {} commands",
            path.display(),
            metadata.columns,
            metadata.rows,
            metadata.commands.len()
        );
        Ok(metadata)
    }

    /// Validated display geometry
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` when the published size is out of range.
    pub fn geometry(&self) -> Result<Geometry, BuilderError> {
        Geometry::new(self.columns, self.rows)
    }

    /// Builder preloaded with the geometry and command table
    ///
    /// # Errors
    ///
    /// As [`geometry`](Self::geometry).
    pub fn builder(&self) -> Result<Builder, BuilderError> {
        Ok(Builder::new()
            .geometry(self.geometry()?)
            .commands(self.commands.iter().map(|(name, code)| (name.as_str(), *code))))
    }

    /// Device node of the display described by this metadata
    ///
    /// # Errors
    ///
    /// `MissingMetadataField` without `busno` or `reg`, otherwise as
    /// [`device_path`].
    pub fn device_path(&self, sys_root: impl AsRef<Path>) -> Result<PathBuf, BuilderError> {
        let bus = self.bus.ok_or(BuilderError::MissingMetadataField("busno"))?;
        let address = self.address.ok_or(BuilderError::MissingMetadataField("reg"))?;
        device_path(sys_root, bus, address)
    }
}

/// Find the device node of the display at `bus`/`address`
///
/// The driver names its node after the I2C client, which sysfs exposes as
/// `<sys_root>/<bus>-<address>/name`.
///
/// # Errors
///
/// `DeviceNotFound` if no readable, non-empty name exists for the client.
pub fn device_path(
    sys_root: impl AsRef<Path>,
    bus: u32,
    address: u16,
) -> Result<PathBuf, BuilderError> {
    let client = sys_root
        .as_ref()
        .join(format!("{bus}-{address:04x}"))
        .join("name");
    let name = fs::read_to_string(&client)
        .ok()
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or(BuilderError::DeviceNotFound { bus, address })?;
    let path = Path::new("/dev").join(name);
    debug!("device at {bus}-{address:04x} is {}", path.display());
    Ok(path)
}

/// Load the default metadata file and locate the device node
///
/// # Errors
///
/// Any error of [`Metadata::load`] or [`Metadata::device_path`].
pub fn discover() -> Result<(Metadata, PathBuf), BuilderError> {
    let metadata = Metadata::load(META_FILE_PATH)?;
    let path = metadata.device_path(I2C_DEVICES_ROOT)?;
    Ok((metadata, path))
}
