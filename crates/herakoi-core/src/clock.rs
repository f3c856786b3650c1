//! Monotonic time sources.
//!
//! The voice registry measures rate-limit intervals and release due times
//! against a [`Clock`], not against the audio sink's time. Live sessions use
//! [`MonotonicClock`]; offline rendering and tests drive a [`ManualClock`] in
//! lockstep with whatever they render.
//!
//! # Target Support
//!
//! [`ManualClock`] stores its time in an `AtomicU64` and only exists on
//! targets with native 64-bit atomics (`target_has_atomic = "64"`). On
//! others, such as `thumbv7em` or `riscv32imac`, implement [`Clock`] over a
//! hardware timer instead.

#[cfg(all(not(feature = "std"), target_has_atomic = "64"))]
use alloc::sync::Arc;
#[cfg(all(feature = "std", target_has_atomic = "64"))]
use std::sync::Arc;

#[cfg(target_has_atomic = "64")]
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

/// Monotonic time since an arbitrary origin.
pub trait Clock {
    /// Elapsed time since the clock's origin. Never decreases.
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time, origin at construction.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand.
///
/// Clones share the same time, so a test can keep a handle while the registry
/// owns another. Requires native 64-bit atomics.
///
/// ```rust
/// use core::time::Duration;
/// use herakoi_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(150));
/// assert_eq!(clock.now(), Duration::from_millis(150));
/// ```
#[cfg(target_has_atomic = "64")]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

#[cfg(target_has_atomic = "64")]
impl ManualClock {
    /// Create a clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        self.micros
            .fetch_add(duration_micros(step), Ordering::Relaxed);
    }

    /// Jump to `time`. Moving backwards is ignored.
    pub fn set(&self, time: Duration) {
        self.micros
            .fetch_max(duration_micros(time), Ordering::Relaxed);
    }
}

#[cfg(target_has_atomic = "64")]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::Relaxed))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

#[cfg(target_has_atomic = "64")]
fn duration_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
