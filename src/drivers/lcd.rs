//! 16x2 character LCD on I2C (AiP31068 / ST7032-style controller).
//!
//! Every byte goes out as a two-byte write: a control prefix (`0x80`
//! command, `0x40` data) followed by the payload.  Text is clipped to the
//! 16 visible columns; characters outside printable ASCII render as `?`.

use core::time::Duration;
use std::thread::sleep;

use embedded_hal::i2c::I2c;

/// Default 7-bit bus address.
pub const LCD_ADDRESS: u8 = 0x3E;
/// Visible columns per line.
pub const LCD_COLUMNS: usize = 16;

const PREFIX_COMMAND: u8 = 0x80;
const PREFIX_DATA: u8 = 0x40;

const CMD_FUNCTION_SET: u8 = 0x38; // 8-bit bus, 2 lines
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_LINE_2: u8 = 0xC0;

const SETTLE: Duration = Duration::from_millis(50);

/// One display line, already clipped.
pub type Line = heapless::String<LCD_COLUMNS>;

/// Clip `text` to the display width, replacing unprintable characters.
pub fn fit_line(text: &str) -> Line {
    let mut line = Line::new();
    for ch in text.chars().take(LCD_COLUMNS) {
        let ch = if ch.is_ascii() && !ch.is_ascii_control() {
            ch
        } else {
            '?'
        };
        // Capacity equals the char limit and every char is one byte.
        let _ = line.push(ch);
    }
    line
}

pub struct Lcd<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Lcd<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Power-on initialisation sequence.
    pub fn init(&mut self) -> Result<(), I::Error> {
        self.command(CMD_FUNCTION_SET)?;
        sleep(SETTLE);
        self.command(CMD_FUNCTION_SET)?;
        sleep(SETTLE);
        self.command(CMD_DISPLAY_ON)?;
        self.clear()?;
        self.command(CMD_ENTRY_MODE)
    }

    pub fn clear(&mut self) -> Result<(), I::Error> {
        self.command(CMD_CLEAR)?;
        sleep(SETTLE);
        Ok(())
    }

    /// Replace the screen contents. An empty `line2` leaves row 2 blank.
    pub fn show(&mut self, line1: &str, line2: &str) -> Result<(), I::Error> {
        self.clear()?;
        self.write_text(&fit_line(line1))?;
        if !line2.is_empty() {
            self.command(CMD_LINE_2)?;
            self.write_text(&fit_line(line2))?;
        }
        Ok(())
    }

    pub fn release(self) -> I {
        self.i2c
    }

    fn command(&mut self, cmd: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[PREFIX_COMMAND, cmd])
    }

    fn write_text(&mut self, text: &str) -> Result<(), I::Error> {
        for b in text.bytes() {
            self.i2c.write(self.address, &[PREFIX_DATA, b])?;
        }
        Ok(())
    }
}
