//! Monotonic clock sources for the transport

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time in seconds
pub trait ClockSource: Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Wall clock backed by `Instant`, zeroed at construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock advanced explicitly by its owner.
///
/// Clones share the same time value, so a host can keep one handle and give
/// another to a `Transport`.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    secs_bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, secs: f64) {
        self.secs_bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now_secs() + secs);
    }
}

impl ClockSource for ManualClock {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.secs_bits.load(Ordering::SeqCst))
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_secs(&self) -> f64 {
        (**self).now_secs()
    }
}
