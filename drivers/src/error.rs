use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Error<E> {
    Bus(E),
    UnsupportedChip(u8),
    NotInitialized,
    Timeout,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "Bus error: {:?}", e),
            Self::UnsupportedChip(id) => write!(f, "Unexpected chip id 0x{:02x}", id),
            Self::NotInitialized => write!(f, "Chip not initialized"),
            Self::Timeout => write!(f, "Conversion not ready in time"),
        }
    }
}
