//! Named thread spawning.
//!
//! Every long-lived activity (poll loop, drain loop, blink worker, buzzer,
//! health publisher, console) runs on its own OS thread with a readable
//! name and an explicit stack size, so `ps -T` and panic messages say
//! which part of the controller they belong to.

use std::io;
use std::thread::{Builder, JoinHandle};

/// Default stack for service threads.
pub const DEFAULT_STACK_KB: usize = 64;

/// Smaller stack for blink and buzzer workers (they only toggle a pin).
pub const WORKER_STACK_KB: usize = 32;

/// Spawn a named thread with the given stack size.
pub fn spawn_named<F, T>(name: &str, stack_kb: usize, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    log::debug!("Spawning '{}' (stack={}KB)", name, stack_kb);
    Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
