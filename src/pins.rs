//! Default pin assignments for the LinkedBench carrier board
//! (Raspberry Pi, BCM numbering).
//!
//! Single source of truth for the built-in defaults; a JSON config file
//! can override any of them through [`crate::config::PinConfig`].
//!
//! Each pressure plate is a Grove LED button: the base pin drives the
//! plate's LED, base + 1 is the switch.

// ---------------------------------------------------------------------------
// Seats (pressure plates)
// ---------------------------------------------------------------------------

/// Seat 1 switch input.
pub const SEAT1_INPUT: u32 = 19;
/// Seat 1 plate LED (mirrors the raw switch level).
pub const SEAT1_LED: u32 = 18;

/// Seat 2 switch input.
pub const SEAT2_INPUT: u32 = 17;
/// Seat 2 plate LED.
pub const SEAT2_LED: u32 = 16;

/// Plate switches read LOW when someone sits down.
pub const SEAT_ACTIVE_LOW: bool = true;

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// Side mode button, pulled down, HIGH when pressed.
pub const MODE_BUTTON: u32 = 22;
pub const MODE_BUTTON_ACTIVE_LOW: bool = false;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Status indicator LED.
pub const INDICATOR_LED: u32 = 24;
/// Piezo buzzer (active HIGH).
pub const BUZZER: u32 = 5;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// `/dev/i2c-1` on the 40-pin header.
pub const LCD_I2C_BUS: u8 = 1;
pub const LCD_I2C_ADDRESS: u8 = crate::drivers::lcd::LCD_ADDRESS;
