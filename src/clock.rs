//! Injectable time source for pulse-width measurement.

use embedded_hal::delay::DelayNs;

/// Monotonic time plus blocking delays, from one source.
///
/// [`DelayNs`] covers the timed holds of the protocol (the wake pulse, the
/// release, the gap after each bit); [`Clock::now_us`] supplies the
/// timestamps pulse widths are measured between. Both come from the same
/// implementation so that a simulated clock stays coherent: a delay must be
/// visible through the next `now_us`.
pub trait Clock: DelayNs {
    /// Microseconds since an arbitrary fixed origin. Never decreases.
    fn now_us(&mut self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_us(&mut self) -> u64 {
        T::now_us(self)
    }
}

/// [`Clock`] over [`std::time::Instant`].
///
/// Delays are spin-waits. Sleeping would hand the thread to the scheduler in
/// the middle of a microsecond-scale exchange, and the scheduler does not
/// give it back in time.
#[cfg(any(test, feature = "std"))]
#[derive(Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(any(test, feature = "std"))]
impl StdClock {
    pub fn new() -> Self {
        StdClock {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "std"))]
impl DelayNs for StdClock {
    fn delay_ns(&mut self, ns: u32) {
        let start = std::time::Instant::now();
        let target = core::time::Duration::from_nanos(u64::from(ns));
        while start.elapsed() < target {}
    }
}

#[cfg(any(test, feature = "std"))]
impl Clock for StdClock {
    fn now_us(&mut self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}
