//! Injected time source.
//!
//! The engine never reads the wall clock directly; its debounce and replay
//! windows are measured against a [`Clock`] supplied at construction. Tests
//! substitute a hand-advanced fake.

use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic-enough millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// The production clock, backed by system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}
