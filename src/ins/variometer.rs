use hal::clock::Duration;

use crate::collection::RingBuffer;
use crate::types::measurement::feet_per_minute;

/// Window size of the vertical speed moving average.
pub const VS_AVERAGING_FACTOR: usize = 4;

/// Smoothed climb rate below this magnitude reads as level flight, m/s
const DEADBAND: f32 = 0.1;

/// Vertical speed from successive altitude samples, averaged over `N` samples.
pub struct Variometer<const N: usize = VS_AVERAGING_FACTOR> {
    window: RingBuffer<f32, N>,
    previous: f32,
}

impl<const N: usize> Default for Variometer<N> {
    fn default() -> Self {
        Self { window: RingBuffer::new(), previous: 0.0 }
    }
}

impl<const N: usize> Variometer<N> {
    /// Zero-fill the window and take `altitude` as baseline.
    pub fn reset(&mut self, altitude: f32) {
        self.window.clear();
        self.previous = altitude;
    }

    pub fn previous(&self) -> f32 {
        self.previous
    }

    /// Feed altitude in meters sampled `elapsed` after the previous one,
    /// returns smoothed vertical speed in ft/min.
    pub fn update(&mut self, altitude: f32, elapsed: Duration) -> f32 {
        let millis = core::cmp::max(elapsed.to_millis(), 1);
        let speed = (altitude - self.previous) / millis as f32 * 1000.0;
        self.window.push(speed);
        self.previous = altitude;
        let mean = self.window.mean();
        if mean > -DEADBAND && mean < DEADBAND {
            return 0.0;
        }
        feet_per_minute(mean)
    }
}

mod test {
    #[test]
    fn test_window_fills_with_zeros() {
        use hal::clock::Duration;

        use super::Variometer;

        let mut variometer = Variometer::<4>::default();
        variometer.reset(100.0);
        let expected = [0.25, 0.5, 0.75, 1.0, 1.0];
        for (i, mean) in expected.iter().enumerate() {
            let vs = variometer.update(100.0 + (i + 1) as f32, Duration::millis(1000));
            assert!((vs - mean * 196.85).abs() < 0.01, "{} != {}", vs, mean * 196.85);
        }
    }

    #[test]
    fn test_deadband() {
        use hal::clock::Duration;

        use super::Variometer;

        let mut variometer = Variometer::<4>::default();
        variometer.reset(0.0);
        let mut altitude = 0.0;
        for _ in 0..8 {
            altitude += 0.09;
            assert_eq!(variometer.update(altitude, Duration::millis(1000)), 0.0);
        }
        for _ in 0..8 {
            altitude -= 0.09;
            assert_eq!(variometer.update(altitude, Duration::millis(1000)), 0.0);
        }
        altitude += 1.0;
        assert!(variometer.update(altitude, Duration::millis(1000)) > 0.0);
    }

    #[test]
    fn test_deadband_edges() {
        use hal::clock::Duration;

        use super::Variometer;

        let mut variometer = Variometer::<4>::default();
        variometer.reset(0.0);
        let vs = variometer.update(0.4, Duration::millis(1000));
        assert!((vs - 19.685).abs() < 0.001, "{}", vs);

        variometer.reset(0.4);
        let vs = variometer.update(0.0, Duration::millis(1000));
        assert!((vs + 19.685).abs() < 0.001, "{}", vs);

        variometer.reset(0.0);
        assert_eq!(variometer.update(0.396, Duration::millis(1000)), 0.0);
        variometer.reset(0.396);
        assert_eq!(variometer.update(0.0, Duration::millis(1000)), 0.0);
    }

    #[test]
    fn test_jittered_climb() {
        use hal::clock::Duration;

        use super::Variometer;

        let mut variometer = Variometer::<4>::default();
        variometer.reset(500.0);
        let intervals = [1000u64, 1013, 997, 1042, 1005, 990, 1021, 1000];
        let (mut altitude, mut vs) = (500.0f32, 0.0);
        for interval in intervals {
            altitude += interval as f32 / 1000.0;
            vs = variometer.update(altitude, Duration::millis(interval));
        }
        assert!((vs - 196.85).abs() < 0.5, "{}", vs);
    }

    #[test]
    fn test_descent() {
        use hal::clock::Duration;

        use super::Variometer;

        let mut variometer = Variometer::<2>::default();
        variometer.reset(1000.0);
        variometer.update(998.0, Duration::millis(500));
        let vs = variometer.update(996.0, Duration::millis(500));
        assert!((vs + 4.0 * 196.85).abs() < 0.1);
        assert_eq!(variometer.previous(), 996.0);
    }
}
