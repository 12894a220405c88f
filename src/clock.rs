//! Millisecond time source used by the non-blocking read cycle.

/// A monotonically increasing millisecond counter.
///
/// Implemented for any `Fn() -> u32`, so a HAL timer can be wrapped in a
/// closure such as `|| timer.get_counter().ticks() as u32 / 1000`.
///
/// The counter is allowed to wrap around at `u32::MAX`. The driver only ever
/// compares two readings with [`u32::wrapping_sub`], so wraparound is harmless
/// as long as the driver is polled at least once per wrap period (~49.7 days).
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u32;
}

impl<F> Clock for F
where
    F: Fn() -> u32,
{
    fn now_ms(&self) -> u32 {
        self()
    }
}

/// Milliseconds elapsed from `since` to `now`, tolerating counter wraparound.
pub(crate) fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_closure_clock() {
        let now = Cell::new(5u32);
        let clock = || now.get();
        assert_eq!(clock.now_ms(), 5);
        now.set(42);
        assert_eq!((&clock).now_ms(), 42);
    }

    #[test]
    fn test_elapsed_across_wraparound() {
        assert_eq!(elapsed_ms(150, 50), 100);
        assert_eq!(elapsed_ms(20, u32::MAX - 79), 100);
    }
}
