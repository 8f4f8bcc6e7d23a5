//! Linux `i2c-dev` bus (`/dev/i2c-N`).
//!
//! The target address is bound with the `I2C_SLAVE` ioctl; plain
//! `read`/`write` on the device file then become bus transfers.  Only
//! write and read operations are supported, which is all the display
//! needs.

use core::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::error::HwInitError;

const I2C_SLAVE: u16 = 0x0703;

nix::ioctl_write_int_bad!(set_target_address, I2C_SLAVE);

/// Transfer failure on an open bus.
#[derive(Debug)]
pub struct I2cIoError(pub io::Error);

impl fmt::Display for I2cIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i2c transfer failed: {}", self.0)
    }
}

impl i2c::Error for I2cIoError {
    fn kind(&self) -> ErrorKind {
        // i2c-dev reports a missing ACK as ENXIO/EREMOTEIO.
        match self.0.raw_os_error() {
            Some(nix::libc::ENXIO | nix::libc::EREMOTEIO) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
            }
            _ => ErrorKind::Other,
        }
    }
}

pub struct LinuxI2c {
    bus: u8,
    file: File,
    bound: Option<u8>,
}

impl LinuxI2c {
    pub fn open(bus: u8) -> Result<Self, HwInitError> {
        let path = format!("/dev/i2c-{bus}");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| HwInitError::I2c { bus, source })?;
        log::debug!("Opened {}", path);
        Ok(Self {
            bus,
            file,
            bound: None,
        })
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    fn bind(&mut self, address: u8) -> io::Result<()> {
        if self.bound == Some(address) {
            return Ok(());
        }
        // SAFETY: the fd belongs to `self.file` and stays open for the
        // duration of the call; I2C_SLAVE takes the address by value.
        unsafe { set_target_address(self.file.as_raw_fd(), i32::from(address)) }
            .map_err(io::Error::from)?;
        self.bound = Some(address);
        Ok(())
    }
}

impl ErrorType for LinuxI2c {
    type Error = I2cIoError;
}

impl I2c for LinuxI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bind(address).map_err(I2cIoError)?;
        for op in operations {
            match op {
                Operation::Write(bytes) => self.file.write_all(bytes),
                Operation::Read(buf) => self.file.read_exact(buf),
            }
            .map_err(I2cIoError)?;
        }
        Ok(())
    }
}
