//! Piezo buzzer driver.
//!
//! Chimes are queued to a dedicated worker thread so callers (which may be
//! holding the bench lock) never sleep through a tone.  Tones are played
//! back to back in request order.
//!
//! | Chime     | Sequence (on / gap)            | Used for                 |
//! |-----------|--------------------------------|--------------------------|
//! | `Short`   | 100 ms                         | bench occupied           |
//! | `Confirm` | 100 ms, 50 ms, 100 ms          | mode change accepted     |
//! | `Error`   | 300 ms                         | mode change rejected     |
//! | `Startup` | 50 ms, 50 ms, 50 ms            | controller started       |

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;
use std::thread::{JoinHandle, sleep};

use crossbeam_channel::{Sender, unbounded};
use embedded_hal::digital::OutputPin;

use crate::drivers::task::{WORKER_STACK_KB, spawn_named};
use crate::error::HwInitError;

/// Audible feedback kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chime {
    Short,
    Confirm,
    Error,
    Startup,
}

impl Chime {
    /// Beeps as `(on, gap_after)` pairs.
    pub const fn tones(self) -> &'static [(Duration, Duration)] {
        const MS_50: Duration = Duration::from_millis(50);
        const MS_100: Duration = Duration::from_millis(100);
        const MS_300: Duration = Duration::from_millis(300);
        match self {
            Self::Short => &[(MS_100, Duration::ZERO)],
            Self::Confirm => &[(MS_100, MS_50), (MS_100, Duration::ZERO)],
            Self::Error => &[(MS_300, Duration::ZERO)],
            Self::Startup => &[(MS_50, MS_50), (MS_50, Duration::ZERO)],
        }
    }

    /// Total time the chime occupies the buzzer.
    pub fn duration(self) -> Duration {
        self.tones().iter().map(|(on, gap)| *on + *gap).sum()
    }
}

/// Handle to the buzzer worker.
///
/// Dropping the handle lets queued chimes finish, then drives the pin low.
/// [`Buzzer::stop`] cuts them short instead.
pub struct Buzzer {
    tx: Option<Sender<Chime>>,
    worker: Option<JoinHandle<()>>,
    muted: Arc<AtomicBool>,
}

impl Buzzer {
    /// Drive `pin` low and start the worker.
    pub fn spawn<P: OutputPin + Send + 'static>(mut pin: P) -> Result<Self, HwInitError> {
        pin.set_low().map_err(|_| HwInitError::OutputInit("buzzer"))?;
        let (tx, rx) = unbounded::<Chime>();
        let muted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&muted);

        let worker = spawn_named("buzzer", WORKER_STACK_KB, move || {
            for chime in rx.iter() {
                if flag.load(Ordering::Acquire) {
                    break;
                }
                play(&mut pin, chime, &flag);
            }
            let _ = pin.set_low();
        })
        .map_err(|_| HwInitError::OutputInit("buzzer worker"))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            muted,
        })
    }

    /// Skip whatever is still queued, wait for the current tone to end and
    /// leave the pin low. Later `play` calls are ignored.
    pub fn stop(&mut self) {
        self.muted.store(true, Ordering::Release);
        self.join();
    }

    fn join(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("buzzer worker panicked");
            }
        }
    }

    /// Queue `chime`; returns immediately.
    pub fn play(&self, chime: Chime) {
        if self.muted.load(Ordering::Acquire) {
            return;
        }
        if let Some(tx) = &self.tx {
            if tx.send(chime).is_err() {
                log::warn!("buzzer worker gone, dropping {:?}", chime);
            }
        }
    }
}

impl Drop for Buzzer {
    fn drop(&mut self) {
        self.join();
    }
}

fn play<P: OutputPin>(pin: &mut P, chime: Chime, muted: &AtomicBool) {
    for (on, gap) in chime.tones() {
        if muted.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = pin.set_high() {
            log::warn!("buzzer write failed: {e:?}");
            return;
        }
        sleep(*on);
        let _ = pin.set_low();
        if !gap.is_zero() {
            sleep(*gap);
        }
    }
}
