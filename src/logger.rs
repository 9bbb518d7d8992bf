use alloc::string::String;
use core::fmt::{self, Display, Formatter, Write};

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

use crate::sys::jiffies;

pub const LOG_BUFFER_SIZE: usize = 2048;

/// Byte ring keeping the most recent `N` bytes of log text.
pub struct LogBuffer<const N: usize> {
    buffer: [u8; N],
    index: usize,
}

impl<const N: usize> LogBuffer<N> {
    pub const fn new() -> Self {
        Self { buffer: [0u8; N], index: 0 }
    }
}

impl<const N: usize> Write for LogBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if N == 0 {
            return Ok(());
        }
        let mut bytes = s.as_bytes();
        if bytes.len() > N {
            self.index += bytes.len() - N;
            bytes = &bytes[bytes.len() - N..];
        }
        let index = self.index % N;
        let partial_size = core::cmp::min(N - index, bytes.len());
        self.buffer[index..index + partial_size].copy_from_slice(&bytes[..partial_size]);
        self.buffer[..bytes.len() - partial_size].copy_from_slice(&bytes[partial_size..]);
        self.index += bytes.len();
        Ok(())
    }
}

impl<const N: usize> Display for LogBuffer<N> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.index <= N {
            return write!(f, "{}", String::from_utf8_lossy(&self.buffer[..self.index]));
        }
        let index = self.index % N;
        write!(f, "{}", String::from_utf8_lossy(&self.buffer[index..]))?;
        write!(f, "{}", String::from_utf8_lossy(&self.buffer[..index]))
    }
}

static LOG_BUFFER: Mutex<LogBuffer<LOG_BUFFER_SIZE>> = Mutex::new(LogBuffer::new());

pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let millis = jiffies::get().ticks();
        let mut log_buffer = LOG_BUFFER.lock();
        writeln!(log_buffer, "[{:5}.{:03}] {}", millis / 1000, millis % 1000, record.args()).ok();
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

/// Buffered log text, oldest first.
pub fn get() -> String {
    let mut string = String::new();
    write!(string, "{}", *LOG_BUFFER.lock()).ok();
    string
}

pub fn init(level: LevelFilter) {
    log::set_max_level(level);
    log::set_logger(&LOGGER).ok();
}

mod test {
    #[cfg(test)]
    use serial_test::serial;

    #[test]
    fn test_log_buffer_wrap() {
        use core::fmt::Write;
        use std::string::ToString;

        use super::LogBuffer;

        let mut buffer = LogBuffer::<8>::new();
        write!(buffer, "abc").unwrap();
        assert_eq!(buffer.to_string(), "abc");
        write!(buffer, "defgh").unwrap();
        assert_eq!(buffer.to_string(), "abcdefgh");
        write!(buffer, "ij").unwrap();
        assert_eq!(buffer.to_string(), "cdefghij");
        write!(buffer, "0123456789").unwrap();
        assert_eq!(buffer.to_string(), "23456789");
    }

    #[test]
    #[serial]
    fn test_logger() {
        use hal::clock::Instant;
        use log::LevelFilter;

        use crate::sys::jiffies;

        jiffies::init(|| Instant::from_ticks(12_345));
        super::init(LevelFilter::Info);
        info!("BMP280 barometric pressure sensor is detected.");
        debug!("hidden");
        let text = super::get();
        assert!(text.contains("[   12.345] BMP280 barometric pressure sensor is detected.\n"));
        assert!(!text.contains("hidden"));
    }
}
