//! Event emission pipeline.
//!
//! Events are produced by the bench controller (single producer, always
//! from inside a transition) and consumed by one drain task that fans
//! each event out to the configured sinks.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ BenchController  │────▶│  Event Queue │────▶│  Drain loop  │──▶ log store
//! │ (under the lock) │     │  (unbounded) │     │  (consumer)  │──▶ relay
//! └──────────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The queue is unbounded so the control loop never waits on sink I/O; a
//! backlog above [`BACKLOG_WARN`] is logged.  Delivery is FIFO.  A sink
//! failure is logged and the event moves on to the next sink; nothing is
//! requeued.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::app::events::BenchEvent;
use crate::app::ports::EventSink;
use crate::drivers::task::{DEFAULT_STACK_KB, spawn_named};

/// Backlog size at which the producer starts warning.
pub const BACKLOG_WARN: usize = 256;

/// Create a connected producer/consumer pair.
pub fn event_queue() -> (EventProducer, EventConsumer) {
    let (tx, rx) = unbounded();
    (EventProducer { tx }, EventConsumer { rx })
}

/// Enqueue side, held by the controller.
#[derive(Debug, Clone)]
pub struct EventProducer {
    tx: Sender<BenchEvent>,
}

impl EventProducer {
    /// Never blocks. Returns `false` if the consumer is gone (event dropped).
    pub fn enqueue(&self, event: BenchEvent) -> bool {
        let backlog = self.tx.len();
        if backlog >= BACKLOG_WARN && backlog % BACKLOG_WARN == 0 {
            log::warn!("Event backlog at {}, sinks are falling behind", backlog);
        }
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Event queue closed, dropping {}", e.0.event_type);
                false
            }
        }
    }
}

/// Dequeue side, held by the drain task.
#[derive(Debug)]
pub struct EventConsumer {
    rx: Receiver<BenchEvent>,
}

impl EventConsumer {
    /// Events currently waiting.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Pop the next event without waiting.
    pub fn try_next(&self) -> Option<BenchEvent> {
        self.rx.try_recv().ok()
    }
}

/// Outcome counters for one drain run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub events: u64,
    pub sink_failures: u64,
}

/// Fans events out to sinks in registration order.
pub struct Dispatcher {
    sinks: Vec<Box<dyn EventSink>>,
    stats: DrainStats,
}

impl Dispatcher {
    pub fn new(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self {
            sinks,
            stats: DrainStats::default(),
        }
    }

    pub fn stats(&self) -> DrainStats {
        self.stats
    }

    /// Deliver `event` to every sink, logging (not propagating) failures.
    pub fn dispatch(&mut self, event: &BenchEvent) {
        self.stats.events += 1;
        for sink in &mut self.sinks {
            if let Err(e) = sink.emit(event) {
                self.stats.sink_failures += 1;
                log::warn!("{} sink failed for {}: {}", sink.name(), event.event_type, e);
            }
        }
        log::debug!("Event processed: {}", event.event_type);
    }
}

/// Drain `consumer` until `running` clears, then flush what is left.
///
/// `running` is checked at least once per `wait`.
pub fn run_drain_loop(
    consumer: &EventConsumer,
    dispatcher: &mut Dispatcher,
    running: &AtomicBool,
    wait: Duration,
) -> DrainStats {
    while running.load(Ordering::Acquire) {
        match consumer.rx.recv_timeout(wait) {
            Ok(event) => dispatcher.dispatch(&event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let mut flushed = 0usize;
    while let Some(event) = consumer.try_next() {
        dispatcher.dispatch(&event);
        flushed += 1;
    }
    if flushed > 0 {
        log::info!("Flushed {} queued event(s) on shutdown", flushed);
    }
    dispatcher.stats()
}

/// Drain loop running on its own thread with its own stop flag.
///
/// The flag is private so the drain outlives the producer: stop the poll
/// loop first, then call [`DrainWorker::finish`] to flush what it queued.
pub struct DrainWorker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<DrainStats>,
}

impl DrainWorker {
    /// Start draining `consumer` into `dispatcher` on a thread named "drain".
    pub fn spawn(consumer: EventConsumer, mut dispatcher: Dispatcher, wait: Duration) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = spawn_named("drain", DEFAULT_STACK_KB, move || {
            run_drain_loop(&consumer, &mut dispatcher, &flag, wait)
        })?;
        Ok(Self { running, handle })
    }

    /// Stop the loop, flush the queue and join the thread.
    pub fn finish(self) -> DrainStats {
        self.running.store(false, Ordering::Release);
        match self.handle.join() {
            Ok(stats) => stats,
            Err(_) => {
                log::error!("drain thread panicked");
                DrainStats::default()
            }
        }
    }
}
