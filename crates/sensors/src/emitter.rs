//! Background emission loop shared by thread-driven devices

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{Reading, ReadingCallback};
use tracing::{debug, trace};

/// Listening flag plus a generation counter.
///
/// A stop followed by a quick re-listen bumps the generation, so the old
/// thread exits even if it never observed `listening == false`.
#[derive(Debug, Clone, Default)]
pub(crate) struct EmitterState {
    listening: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl EmitterState {
    /// Switch to listening, returns the new generation or `None` if already listening
    pub(crate) fn begin(&self) -> Option<u64> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn end(&self) {
        self.listening.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_listening() && self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Emission period for `frequency_hz`, `None` if no positive `Duration` fits
pub(crate) fn emit_period(frequency_hz: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(frequency_hz.recip())
        .ok()
        .filter(|period| !period.is_zero())
}

/// Spawn a thread calling `produce` every `interval` until the generation ends.
///
/// The first reading is produced immediately. `produce` returning `None`
/// skips that round (e.g. a failed device read).
pub(crate) fn spawn_emitter<F>(
    device_id: String,
    interval: Duration,
    state: EmitterState,
    generation: u64,
    mut produce: F,
    callback: ReadingCallback,
) where
    F: FnMut(u64) -> Option<Reading> + Send + 'static,
{
    thread::spawn(move || {
        let mut tick: u64 = 0;

        debug!(device_id = %device_id, generation, "device emitter started");

        while state.is_current(generation) {
            tick += 1;

            if let Some(reading) = produce(tick) {
                callback(reading);
                trace!(device_id = %device_id, tick, "reading emitted");
            }

            thread::sleep(interval);
        }

        debug!(device_id = %device_id, generation, "device emitter stopped");
    });
}
