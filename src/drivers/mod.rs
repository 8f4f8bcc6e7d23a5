//! Output drivers, input debouncing, and thread helpers.

pub mod buzzer;
pub mod debounce;
pub mod lcd;
pub mod pattern;
pub mod task;
