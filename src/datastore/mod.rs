use concat_idents::concat_idents;
use hal::clock::{Duration, Instant};

use crate::sync::ReadSpinLock;
use crate::sys::jiffies;

#[derive(Copy, Clone, Default)]
struct Entry<T: Default> {
    timestamp: u64,
    data: Option<T>,
}

impl<T: Copy + Default> Entry<T> {
    fn read(&self) -> T {
        self.data.unwrap_or_default()
    }

    fn read_within(&self, now: Instant, max_age: Duration) -> Option<T> {
        let age = now.checked_duration_since(Instant::from_ticks(self.timestamp))?;
        if age > max_age {
            return None;
        }
        self.data
    }
}

fn store<T: Copy + Default>(lock: &ReadSpinLock<Entry<T>>, name: &str, data: T, now: Instant) {
    let entry = Entry { timestamp: now.ticks(), data: Some(data) };
    if lock.write(entry).is_err() {
        error!("Write {} conflict", name)
    }
}

macro_rules! datastore {
    ($($names:ident: $types:ty),+) => {
        /// Values shared with the rest of the firmware, each one stamped
        /// with the time of its last write.
        #[derive(Default)]
        pub struct AircraftState {
            $($names: ReadSpinLock<Entry<$types>>),+
        }

        impl AircraftState {
            $(
                concat_idents!(getter = read_, $names, _within {
                    pub fn getter(&self, now: Instant, max_age: Duration) -> Option<$types> {
                        self.$names.read().read_within(now, max_age)
                    }
                });

                concat_idents!(getter = try_read_, $names {
                    pub fn getter(&self) -> Option<$types> {
                        self.$names.read().data
                    }
                });

                concat_idents!(getter = read_, $names {
                    pub fn getter(&self) -> $types {
                        self.$names.read().read()
                    }
                });

                concat_idents!(setter = write_, $names, _at {
                    pub fn setter(&self, data: $types, now: Instant) {
                        store(&self.$names, stringify!($names), data, now)
                    }
                });

                concat_idents!(setter = write_, $names {
                    pub fn setter(&self, data: $types) {
                        store(&self.$names, stringify!($names), data, jiffies::get())
                    }
                });
            )+
        }
    }
}

datastore! {
    altitude: f32,
    pressure_altitude: f32,
    baro_alt_diff: f32,
    vertical_speed: f32
}

mod test {
    #[cfg(test)]
    use serial_test::serial;

    #[test]
    fn test_read_write() {
        use super::AircraftState;

        let state = AircraftState::default();
        assert_eq!(state.try_read_vertical_speed(), None);
        assert_eq!(state.read_vertical_speed(), 0.0);
        state.write_vertical_speed(-120.5);
        assert_eq!(state.try_read_vertical_speed(), Some(-120.5));
        state.write_altitude(300.0);
        assert_eq!(state.read_altitude(), 300.0);
        assert_eq!(state.read_pressure_altitude(), 0.0);
    }

    #[test]
    fn test_read_within() {
        use hal::clock::{Duration, Instant};

        use super::AircraftState;

        let state = AircraftState::default();
        let max_age = Duration::millis(100);
        assert_eq!(state.read_baro_alt_diff_within(Instant::from_ticks(10_000), max_age), None);
        state.write_baro_alt_diff_at(12.0, Instant::from_ticks(10_000));
        let value = state.read_baro_alt_diff_within(Instant::from_ticks(10_100), max_age);
        assert_eq!(value, Some(12.0));
        assert_eq!(state.read_baro_alt_diff_within(Instant::from_ticks(10_101), max_age), None);
        assert_eq!(state.read_baro_alt_diff_within(Instant::from_ticks(9_999), max_age), None);
    }

    #[test]
    #[serial]
    fn test_write_stamps_jiffies() {
        use hal::clock::{Duration, Instant};

        use super::AircraftState;
        use crate::sys::jiffies;

        jiffies::init(|| Instant::from_ticks(10_000));
        let state = AircraftState::default();
        state.write_altitude(300.0);
        let value = state.read_altitude_within(Instant::from_ticks(10_050), Duration::millis(50));
        assert_eq!(value, Some(300.0));
        let value = state.read_altitude_within(Instant::from_ticks(10_051), Duration::millis(50));
        assert_eq!(value, None);
    }
}
