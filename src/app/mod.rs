//! Application core: bench domain logic, zero direct I/O.
//!
//! This module contains the business rules for a LinkedBench: turning
//! debounced seat and button levels into occupancy, mode, indicator and
//! display updates, and emitting events for the transitions that matter.
//! All interaction with hardware and storage happens through **port
//! traits** defined in [`ports`], keeping this layer testable without
//! real peripherals.

pub mod commands;
pub mod control;
pub mod events;
pub mod ports;
pub mod service;
