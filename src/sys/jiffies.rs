use hal::clock::{Clock, Instant};
use spin::Mutex;

static SOURCE: Mutex<Option<fn() -> Instant>> = Mutex::new(None);

/// Install the board's monotonic millisecond counter.
pub fn init(source: fn() -> Instant) {
    *SOURCE.lock() = Some(source);
}

/// Milliseconds since boot, zero until a counter is installed.
pub fn get() -> Instant {
    let source = *SOURCE.lock();
    source.map(|get_jiffies| get_jiffies()).unwrap_or(Instant::from_ticks(0))
}

/// Board clock backed by the installed counter.
#[derive(Copy, Clone, Debug, Default)]
pub struct Jiffies;

impl Clock for Jiffies {
    fn now(&self) -> Instant {
        get()
    }
}

mod test {
    #[cfg(test)]
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_installed_counter() {
        use hal::clock::{Clock, Instant};

        use super::Jiffies;

        super::init(|| Instant::from_ticks(42_000));
        assert_eq!(Jiffies.now(), Instant::from_ticks(42_000));
        assert_eq!(super::get().ticks(), 42_000);
    }
}
