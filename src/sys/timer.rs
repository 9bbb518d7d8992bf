use hal::clock::{Duration, Instant};

/// Fires once `period` has elapsed since the last firing.
#[derive(Copy, Clone, Debug)]
pub struct IntervalTimer {
    period: Duration,
    marker: Option<Instant>,
}

impl IntervalTimer {
    /// Period shorter than 1ms is rounded up to 1ms.
    pub fn new(period: Duration) -> Self {
        let period = if period.to_millis() == 0 { Duration::millis(1) } else { period };
        Self { period, marker: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn marker(&self) -> Option<Instant> {
        self.marker
    }

    pub fn arm(&mut self, now: Instant) {
        self.marker = Some(now);
    }

    /// Returns actual elapsed time since last firing if `now - marker >= period`,
    /// the marker then moves to `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = now.checked_duration_since(self.marker?)?;
        if elapsed < self.period {
            return None;
        }
        self.marker = Some(now);
        Some(elapsed)
    }
}

mod test {
    #[test]
    fn test_interval_timer() {
        use hal::clock::{Duration, Instant};

        use super::IntervalTimer;

        let mut timer = IntervalTimer::new(Duration::millis(1000));
        assert_eq!(timer.poll(Instant::from_ticks(5000)), None);
        timer.arm(Instant::from_ticks(0));
        assert_eq!(timer.poll(Instant::from_ticks(999)), None);
        assert_eq!(timer.poll(Instant::from_ticks(1000)), Some(Duration::millis(1000)));
        assert_eq!(timer.poll(Instant::from_ticks(1500)), None);
        assert_eq!(timer.poll(Instant::from_ticks(2300)), Some(Duration::millis(1300)));
        assert_eq!(timer.marker(), Some(Instant::from_ticks(2300)));
    }

    #[test]
    fn test_zero_period() {
        use hal::clock::{Duration, Instant};

        use super::IntervalTimer;

        let mut timer = IntervalTimer::new(Duration::millis(0));
        assert_eq!(timer.period(), Duration::millis(1));
        timer.arm(Instant::from_ticks(10));
        assert_eq!(timer.poll(Instant::from_ticks(10)), None);
        assert_eq!(timer.poll(Instant::from_ticks(11)), Some(Duration::millis(1)));
    }

    #[test]
    fn test_independent_timers() {
        use hal::clock::{Duration, Instant};

        use super::IntervalTimer;

        let mut fast = IntervalTimer::new(Duration::millis(100));
        let mut slow = IntervalTimer::new(Duration::millis(1000));
        fast.arm(Instant::from_ticks(0));
        slow.arm(Instant::from_ticks(0));
        let (mut fast_fires, mut slow_fires) = (0, 0);
        for tick in 1..=3 {
            let now = Instant::from_ticks(tick * 100);
            fast_fires += fast.poll(now).is_some() as usize;
            slow_fires += slow.poll(now).is_some() as usize;
        }
        assert_eq!((fast_fires, slow_fires), (3, 0));
    }
}
