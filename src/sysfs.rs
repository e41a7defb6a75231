//! Linux sysfs GPIO backend for the line.
//!
//! Talks to the kernel's control-file hierarchy under `/sys/class/gpio`:
//! one-time acquisition through the `export` file, direction through
//! `gpioN/direction`, levels through `gpioN/value`. Both per-pin files are
//! opened once at acquisition and held for the lifetime of the handle; reads
//! rewind the value file instead of reopening it, so the timing-critical
//! poll path costs two syscalls and no path lookups.
//!
//! Logging happens only at acquisition and release. The poll path stays
//! quiet; a single log line there would outlast the 80 us windows it sits
//! between.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::line::{Direction, Level, Line};

/// Root of the kernel's GPIO control-file hierarchy.
const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Errors from the sysfs backend.
#[derive(Debug, Error)]
pub enum SysfsError {
    /// Writing the pin number to the export or unexport file failed.
    #[error("exporting gpio{pin} failed: {source}")]
    Export {
        pin: u32,
        source: std::io::Error,
    },
    /// Reading or writing a per-pin control file failed.
    #[error("gpio{pin} control file i/o failed: {source}")]
    Io {
        pin: u32,
        source: std::io::Error,
    },
    /// The value file held something other than `0` or `1`.
    #[error("gpio{pin} value file held unexpected byte {byte:#04x}")]
    BadValue { pin: u32, byte: u8 },
}

/// A digital line backed by `/sys/class/gpio/gpioN`.
///
/// Dropping the handle closes the control files but leaves the pin
/// exported, so the next acquisition finds it already there. Call
/// [`SysfsLine::unexport`] to hand the pin back to the kernel.
pub struct SysfsLine {
    pin: u32,
    value: File,
    direction_file: File,
    direction: Direction,
}

impl SysfsLine {
    /// Acquires `gpioN`: exports it unless the kernel already has, then
    /// opens its control files. The line starts as an input.
    pub fn export(pin: u32) -> Result<Self, SysfsError> {
        let dir = gpio_dir(pin);
        if dir.exists() {
            debug!("gpio{pin} already exported");
        } else {
            write_pin_number(&Path::new(SYSFS_GPIO_ROOT).join("export"), pin)?;
            debug!("exported gpio{pin}");
        }

        let mut direction_file = OpenOptions::new()
            .write(true)
            .open(dir.join("direction"))
            .map_err(|source| SysfsError::Io { pin, source })?;
        direction_file
            .write_all(b"in")
            .map_err(|source| SysfsError::Io { pin, source })?;

        let value = OpenOptions::new()
            .read(true)
            .write(true)
            .open(dir.join("value"))
            .map_err(|source| SysfsError::Io { pin, source })?;

        debug!("gpio{pin} acquired as input");
        Ok(SysfsLine {
            pin,
            value,
            direction_file,
            direction: Direction::Input,
        })
    }

    /// The pin number this handle controls.
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Releases the pin back to the kernel through the `unexport` file,
    /// consuming the handle.
    pub fn unexport(self) -> Result<(), SysfsError> {
        let pin = self.pin;
        drop(self.value);
        drop(self.direction_file);

        write_pin_number(&Path::new(SYSFS_GPIO_ROOT).join("unexport"), pin)?;
        debug!("unexported gpio{pin}");
        Ok(())
    }
}

impl Line for SysfsLine {
    type Error = SysfsError;

    fn set_direction(&mut self, direction: Direction) -> Result<(), SysfsError> {
        if self.direction == direction {
            return Ok(());
        }

        let pin = self.pin;
        let word: &[u8] = match direction {
            Direction::Input => b"in",
            Direction::Output => b"out",
        };
        self.direction_file
            .seek(SeekFrom::Start(0))
            .map_err(|source| SysfsError::Io { pin, source })?;
        self.direction_file
            .write_all(word)
            .map_err(|source| SysfsError::Io { pin, source })?;

        self.direction = direction;
        Ok(())
    }

    fn write_level(&mut self, level: Level) -> Result<(), SysfsError> {
        let pin = self.pin;
        let byte: &[u8] = match level {
            Level::Low => b"0",
            Level::High => b"1",
        };
        self.value
            .seek(SeekFrom::Start(0))
            .map_err(|source| SysfsError::Io { pin, source })?;
        self.value
            .write_all(byte)
            .map_err(|source| SysfsError::Io { pin, source })
    }

    fn read_level(&mut self) -> Result<Level, SysfsError> {
        let pin = self.pin;
        self.value
            .seek(SeekFrom::Start(0))
            .map_err(|source| SysfsError::Io { pin, source })?;

        let mut byte = [0u8; 1];
        self.value
            .read_exact(&mut byte)
            .map_err(|source| SysfsError::Io { pin, source })?;

        parse_level(byte[0]).ok_or(SysfsError::BadValue { pin, byte: byte[0] })
    }
}

/// Directory holding the control files of one exported pin.
fn gpio_dir(pin: u32) -> PathBuf {
    PathBuf::from(SYSFS_GPIO_ROOT).join(format!("gpio{pin}"))
}

/// Writes a decimal pin number to the export or unexport file.
fn write_pin_number(control: &Path, pin: u32) -> Result<(), SysfsError> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(control)
        .map_err(|source| SysfsError::Export { pin, source })?;
    file.write_all(pin.to_string().as_bytes())
        .map_err(|source| SysfsError::Export { pin, source })
}

/// Maps a value-file byte to a level. The kernel writes `0` or `1` followed
/// by a newline; only the first byte matters.
fn parse_level(byte: u8) -> Option<Level> {
    match byte {
        b'0' => Some(Level::Low),
        b'1' => Some(Level::High),
        _ => None,
    }
}
