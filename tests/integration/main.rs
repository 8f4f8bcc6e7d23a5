//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! mock adapters or simulated pins.  No real hardware is required.

mod control_tests;
mod controller_tests;
mod mock_hw;
mod store_tests;
