//! Session manager - the single-threaded control loop
//!
//! Each iteration drains every pending controller event, performs one tick
//! and sleeps for the frame interval. The loop ends once the translator has
//! terminated; the virtual device is then given a moment to drain before it
//! is destroyed.

use crate::backend::{BackendError, VirtualDevice};
use crate::input::InputSource;
use crate::mapping::executor::{EventTranslator, TerminationReason};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Wait between the last write and destroying the virtual device
pub const DRAIN_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Virtual device stopped accepting events")]
    DeviceLost,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct SessionManager<S: InputSource, D: VirtualDevice> {
    source: S,
    translator: EventTranslator<D>,
    tick: Duration,
    drain_delay: Duration,
}

impl<S: InputSource, D: VirtualDevice> SessionManager<S, D> {
    pub fn new(source: S, translator: EventTranslator<D>, tick: Duration) -> Self {
        Self { source, translator, tick, drain_delay: DRAIN_DELAY }
    }

    pub fn with_drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    pub fn translator(&self) -> &EventTranslator<D> {
        &self.translator
    }

    /// One loop iteration at `now`. Returns the number of events handled.
    pub fn step(&mut self, now: Instant) -> usize {
        let mut handled = 0;
        while let Some(event) = self.source.poll() {
            self.translator.process_event(&event, now);
            handled += 1;
        }
        self.translator.tick(now);
        handled
    }

    /// Run until quit, then tear the device down.
    pub fn run(mut self) -> Result<(), SessionError> {
        info!("✓ Session running ({} ms frames)", self.tick.as_millis());

        loop {
            let handled = self.step(Instant::now());
            if handled > 0 {
                debug!("Handled {} event(s)", handled);
            }
            if self.translator.is_terminated() {
                break;
            }
            thread::sleep(self.tick);
        }

        info!("Shutting down...");
        thread::sleep(self.drain_delay);
        let shutdown = self.translator.shutdown();

        match self.translator.termination_reason() {
            Some(TerminationReason::DeviceLost) => {
                if let Err(e) = shutdown {
                    warn!("Device teardown failed: {}", e);
                }
                Err(SessionError::DeviceLost)
            }
            _ => {
                shutdown?;
                info!("✓ Session ended");
                Ok(())
            }
        }
    }
}
