use embedded_hal::blocking::delay::DelayMs;
use hal::clock::{Clock, Duration};

/// Busy-waiting delay on top of a monotonic clock.
#[derive(Copy, Clone, Debug, Default)]
pub struct ClockDelay<C>(C);

impl<C: Clock> ClockDelay<C> {
    pub fn new(clock: C) -> Self {
        Self(clock)
    }
}

impl<C: Clock> DelayMs<u16> for ClockDelay<C> {
    fn delay_ms(&mut self, ms: u16) {
        let start = self.0.now();
        let duration = Duration::millis(ms as u64);
        while self.0.now().checked_duration_since(start).map(|d| d < duration).unwrap_or(false) {
            core::hint::spin_loop();
        }
    }
}

mod test {
    #[test]
    fn test_delay() {
        use core::cell::Cell;

        use embedded_hal::blocking::delay::DelayMs;
        use hal::clock::{Clock, Instant};

        use super::ClockDelay;

        struct Ticking(Cell<u64>);

        impl Clock for Ticking {
            fn now(&self) -> Instant {
                self.0.set(self.0.get() + 1);
                Instant::from_ticks(self.0.get())
            }
        }

        let clock = Ticking(Cell::new(0));
        ClockDelay::new(&clock).delay_ms(5);
        assert_eq!(clock.0.get(), 6);
        ClockDelay::new(&clock).delay_ms(0);
        assert_eq!(clock.0.get(), 8);
    }
}
