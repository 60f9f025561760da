//! Collaborators the calibrator samples through: a raw analog reader and a
//! monotonic clock.

use std::time::{Duration, Instant};

/// Raw analog reader, addressed by channel number.
///
/// Implementations must be cheap enough to call in a tight loop: calibration
/// windows poll this as fast as it returns.
pub trait SampleSource {
    type Error;

    fn read(&mut self, channel: u8) -> Result<u16, Self::Error>;
}

impl<T: SampleSource + ?Sized> SampleSource for &mut T {
    type Error = T::Error;

    fn read(&mut self, channel: u8) -> Result<u16, Self::Error> {
        (**self).read(channel)
    }
}

/// Monotonic time elapsed since some fixed reference instant.
pub trait Clock {
    fn elapsed(&self) -> Duration;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// `Clock` backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.elapsed();
        let second = clock.elapsed();
        assert!(second >= first);
    }

    #[test]
    fn borrowed_clock_reads_through() {
        let clock = MonotonicClock::new();
        let borrowed = &clock;
        assert!(borrowed.elapsed() <= clock.elapsed());
    }
}
