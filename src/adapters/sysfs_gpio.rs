//! Linux sysfs GPIO lines (`/sys/class/gpio`).
//!
//! Each [`SysfsPin`] exports its line on open, sets the direction, and
//! unexports it again on drop.  Outputs are driven low before release.
//! Pull resistors are not configurable through sysfs; the board (or the
//! device tree overlay) must provide them.

use core::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::error::HwInitError;

pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// udev can take a moment to make a freshly exported line writable.
const EXPORT_SETTLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// I/O failure on an open line.
#[derive(Debug)]
pub struct GpioIoError {
    pub line: u32,
    pub source: io::Error,
}

impl fmt::Display for GpioIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO {}: {}", self.line, self.source)
    }
}

impl digital::Error for GpioIoError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct SysfsPin {
    line: u32,
    root: PathBuf,
    direction: Direction,
}

impl SysfsPin {
    pub fn input(line: u32) -> Result<Self, HwInitError> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), line, Direction::In)
    }

    pub fn output(line: u32) -> Result<Self, HwInitError> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), line, Direction::Out)
    }

    /// Open `line` under an alternative sysfs root.
    pub fn open_at(root: &Path, line: u32, direction: Direction) -> Result<Self, HwInitError> {
        let gpio = |source: io::Error| HwInitError::Gpio { pin: line, source };
        let pin = Self {
            line,
            root: root.to_path_buf(),
            direction,
        };

        if !pin.line_dir().exists() {
            fs::write(root.join("export"), line.to_string()).map_err(gpio)?;
        }
        pin.write_direction().map_err(gpio)?;
        log::debug!("GPIO {} exported as {}", line, direction.as_str());
        Ok(pin)
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    fn line_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.line))
    }

    fn write_direction(&self) -> io::Result<()> {
        let path = self.line_dir().join("direction");
        let deadline = Instant::now() + EXPORT_SETTLE;
        loop {
            match fs::write(&path, self.direction.as_str()) {
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied && Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(20));
                }
                other => return other,
            }
        }
    }

    fn read_value(&self) -> Result<bool, GpioIoError> {
        let raw = fs::read_to_string(self.line_dir().join("value")).map_err(|source| GpioIoError {
            line: self.line,
            source,
        })?;
        Ok(raw.trim() == "1")
    }

    fn write_value(&self, high: bool) -> Result<(), GpioIoError> {
        fs::write(self.line_dir().join("value"), if high { "1" } else { "0" }).map_err(|source| {
            GpioIoError {
                line: self.line,
                source,
            }
        })
    }
}

impl ErrorType for SysfsPin {
    type Error = GpioIoError;
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read_value()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read_value().map(|h| !h)
    }
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write_value(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write_value(true)
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if self.direction == Direction::Out {
            let _ = self.write_value(false);
        }
        if let Err(e) = fs::write(self.root.join("unexport"), self.line.to_string()) {
            log::debug!("GPIO {} unexport failed: {}", self.line, e);
        }
    }
}
