//! Device interface abstraction
//!
//! This module provides the [`DeviceInterface`] trait and the [`DeviceChannel`]
//! struct for talking to the `lcdi2c` character device.
//!
//! ## Device Requirements
//!
//! The driver exposes a single character-special node (usually
//! `/dev/lcdi2c`) which accepts:
//! - `write(2)` of raw text, printed at the cursor
//! - `ioctl(2)` with the command words from [`crate::command`]
//!
//! All calls block until the driver answers. Nothing here locks: callers
//! must serialize access to one channel.
//!
//! ## Channel States
//!
//! A [`DeviceChannel`] is either closed or open. While closed, `write` and
//! `flush` do nothing and report that nothing was performed, while `control`
//! fails with [`ChannelError::Closed`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use alphalcd::{DeviceChannel, DeviceInterface};
//!
//! let mut channel = DeviceChannel::new("/dev/lcdi2c");
//! let _ = channel.open();
//! let _ = channel.write(b"Hello");
//! let _ = channel.close();
//! ```

use core::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::command::CommandCode;

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Trait for the transport to the LCD driver
///
/// [`Lcd`](crate::display::Lcd) is generic over this trait, so the same
/// text and cursor logic runs against the real device node or against a
/// test double.
pub trait DeviceInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Acquire the device
    fn open(&mut self) -> InterfaceResult<(), Self::Error>;

    /// Flush pending output and release the device
    ///
    /// Must tolerate being called on a closed device.
    fn close(&mut self) -> InterfaceResult<(), Self::Error>;

    /// Whether the device is currently open
    fn is_open(&self) -> bool;

    /// Issue one device-control call
    ///
    /// `arg` is the argument buffer for commands that carry a payload; the
    /// driver may overwrite it for read-class commands. Commands without a
    /// payload pass `None`.
    fn control(
        &mut self,
        code: CommandCode,
        arg: Option<&mut [u8]>,
    ) -> InterfaceResult<(), Self::Error>;

    /// Write raw text at the cursor
    ///
    /// Returns `None` when nothing was written because the device is closed.
    fn write(&mut self, data: &[u8]) -> InterfaceResult<Option<usize>, Self::Error>;

    /// Push buffered output to the driver
    ///
    /// Returns `None` when the device is closed.
    fn flush(&mut self) -> InterfaceResult<Option<()>, Self::Error>;
}

/// Errors that can occur at the channel level
#[derive(Debug)]
pub enum ChannelError {
    /// A device-control call was attempted on a closed channel
    Closed,
    /// `open` was called on an already open channel
    AlreadyOpen,
    /// The operating system reported an error
    Io(io::Error),
}

impl core::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Closed => write!(f, "Device is closed"),
            Self::AlreadyOpen => write!(f, "Device is already open"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl core::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ChannelError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Default device node created by the lcdi2c driver
pub const DEFAULT_DEVICE_PATH: &str = "/dev/lcdi2c";

/// File-backed channel to the LCD device node
///
/// Implements [`DeviceInterface`] on top of [`std::fs::File`] and the
/// `ioctl(2)` system call.
#[derive(Debug)]
pub struct DeviceChannel {
    /// Device node path
    path: PathBuf,
    /// Open file, `None` while closed
    file: Option<File>,
}

impl DeviceChannel {
    /// Create a closed channel for the device node at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    /// Device node path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for DeviceChannel {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_PATH)
    }
}

impl DeviceInterface for DeviceChannel {
    type Error = ChannelError;

    fn open(&mut self) -> InterfaceResult<(), Self::Error> {
        if self.file.is_some() {
            return Err(ChannelError::AlreadyOpen);
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)?;
        debug!("opened {}", self.path.display());
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) -> InterfaceResult<(), Self::Error> {
        // Flush first; the file is dropped (and closed) even if that fails
        let flushed = self.flush();
        if self.file.take().is_some() {
            debug!("closed {}", self.path.display());
        }
        flushed.map(|_| ())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn control(
        &mut self,
        code: CommandCode,
        arg: Option<&mut [u8]>,
    ) -> InterfaceResult<(), Self::Error> {
        let file = self.file.as_ref().ok_or(ChannelError::Closed)?;
        trace!("ioctl {code} ({} byte argument)", arg.as_deref().map_or(0, <[u8]>::len));
        sys::control(file, code, arg).map_err(ChannelError::Io)
    }

    fn write(&mut self, data: &[u8]) -> InterfaceResult<Option<usize>, Self::Error> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        file.write_all(data)?;
        Ok(Some(data.len()))
    }

    fn flush(&mut self) -> InterfaceResult<Option<()>, Self::Error> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        file.flush()?;
        Ok(Some(()))
    }
}

mod sys {
    use core::ffi::c_void;
    use core::ptr;
    use std::fs::File;
    use std::io;

    use rustix::ioctl::{Ioctl, IoctlOutput, Opcode};

    use crate::command::CommandCode;

    /// Device-control request whose opcode is only known at runtime
    struct RawControl<'a> {
        code: CommandCode,
        arg: Option<&'a mut [u8]>,
    }

    // SAFETY: `as_ptr` hands the kernel either a null pointer (no payload)
    // or a pointer to a live buffer that `control` has checked is at least
    // as long as the payload length encoded in the opcode, so the driver
    // never reads or writes past it.
    #[allow(unsafe_code)]
    unsafe impl Ioctl for RawControl<'_> {
        type Output = ();

        const IS_MUTATING: bool = true;

        fn opcode(&self) -> Opcode {
            Opcode::from(self.code.raw())
        }

        fn as_ptr(&mut self) -> *mut c_void {
            self.arg
                .as_deref_mut()
                .map_or(ptr::null_mut(), |buf| buf.as_mut_ptr().cast())
        }

        unsafe fn output_from_ptr(
            _out: IoctlOutput,
            _extract_output: *mut c_void,
        ) -> rustix::io::Result<Self::Output> {
            Ok(())
        }
    }

    #[allow(unsafe_code)]
    pub(super) fn control(
        file: &File,
        code: CommandCode,
        arg: Option<&mut [u8]>,
    ) -> io::Result<()> {
        if let Some(buf) = arg.as_deref() {
            if buf.len() < code.length() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "argument buffer shorter than the command's payload length",
                ));
            }
        }
        let request = RawControl { code, arg };
        // SAFETY: see the `Ioctl` impl above; the length check guards the
        // one assumption it makes about the buffer.
        unsafe {
            rustix::ioctl::ioctl(file, request)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_default_path() {
        assert_eq!(DeviceChannel::default().path(), Path::new(DEFAULT_DEVICE_PATH));
    }

    #[test]
    fn test_closed_channel_skips_write_and_flush() {
        let mut channel = DeviceChannel::new("/nonexistent/lcdi2c");
        assert!(!channel.is_open());
        assert_eq!(channel.write(b"abc").unwrap(), None);
        assert_eq!(channel.flush().unwrap(), None);
    }

    #[test]
    fn test_closed_channel_rejects_control() {
        let mut channel = DeviceChannel::new("/nonexistent/lcdi2c");
        let result = channel.control(CommandCode::new(0x0000_F54E), None);
        assert!(matches!(result, Err(ChannelError::Closed)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut channel = DeviceChannel::new("/nonexistent/lcdi2c");
        assert!(channel.close().is_ok());
        assert!(channel.close().is_ok());
    }

    #[test]
    fn test_open_missing_device_fails() {
        let mut channel = DeviceChannel::new("/nonexistent/lcdi2c");
        assert!(matches!(channel.open(), Err(ChannelError::Io(_))));
        assert!(!channel.is_open());
    }

    #[test]
    fn test_open_write_close_on_regular_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut channel = DeviceChannel::new(tmp.path());

        channel.open().unwrap();
        assert!(channel.is_open());
        assert!(matches!(channel.open(), Err(ChannelError::AlreadyOpen)));

        assert_eq!(channel.write(b"Hello").unwrap(), Some(5));
        assert_eq!(channel.flush().unwrap(), Some(()));
        channel.close().unwrap();
        assert!(!channel.is_open());
        assert_eq!(channel.write(b"lost").unwrap(), None);

        let mut contents = String::new();
        File::open(tmp.path())
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "Hello");
    }

    #[test]
    fn test_control_on_regular_file_reports_io_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut channel = DeviceChannel::new(tmp.path());
        channel.open().unwrap();
        let mut buf = [0u8; 2];
        let result = channel.control(CommandCode::new(0x8002_F51D), Some(&mut buf));
        assert!(matches!(result, Err(ChannelError::Io(_))));
        channel.close().unwrap();
    }

    #[test]
    fn test_control_rejects_undersized_buffer() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut channel = DeviceChannel::new(tmp.path());
        channel.open().unwrap();
        let mut buf = [0u8; 1];
        let result = channel.control(CommandCode::new(0x8002_F51D), Some(&mut buf));
        assert!(matches!(
            result,
            Err(ChannelError::Io(ref e)) if e.kind() == io::ErrorKind::InvalidInput
        ));
    }
}
