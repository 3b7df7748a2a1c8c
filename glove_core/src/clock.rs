//! Time source used by automatic mode.
//!
//! Automatic timing only ever asks the clock to wait. Tests swap in a
//! [`VirtualClock`] that records the waits instead of sleeping.

use std::time::Duration;

/// Blocking wait primitive for automatic timing
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock implementation backed by `std::thread::sleep`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that advances instantly and remembers how far it advanced
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    elapsed: Duration,
    sleeps: usize,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total simulated time
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of individual waits requested
    pub fn sleeps(&self) -> usize {
        self.sleeps
    }
}

impl Clock for VirtualClock {
    fn sleep(&mut self, duration: Duration) {
        self.elapsed += duration;
        self.sleeps += 1;
    }
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}
