use core::cell::Cell;

use hal::clock::{Clock, Duration, Instant};

/// Clock driven by hand, for simulation and bench runs.
#[derive(Debug, Default)]
pub struct SimulatedClock(Cell<u64>);

impl SimulatedClock {
    pub fn new(millis: u64) -> Self {
        Self(Cell::new(millis))
    }

    pub fn advance(&self, duration: Duration) {
        self.0.set(self.0.get() + duration.to_millis());
    }

    pub fn set(&self, millis: u64) {
        if millis >= self.0.get() {
            self.0.set(millis)
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.0.get())
    }
}

mod test {
    #[test]
    fn test_simulated_clock() {
        use hal::clock::{Clock, Duration, Instant};

        use super::SimulatedClock;

        let clock = SimulatedClock::new(100);
        clock.advance(Duration::millis(250));
        assert_eq!(clock.now(), Instant::from_ticks(350));
        clock.set(10);
        assert_eq!(clock.now(), Instant::from_ticks(350));
        clock.set(1000);
        assert_eq!((&clock).now(), Instant::from_ticks(1000));
    }
}
