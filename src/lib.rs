//! LinkedBench controller library.
//!
//! Exposes the domain core, adapters and drivers for the binary and for
//! integration testing.  Hardware access goes through `embedded-hal`
//! traits, so everything here also runs against simulated pins.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
