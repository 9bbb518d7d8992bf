use core::str::Split;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SetError {
    MalformedPath,
    UnexpectedValue,
}

impl core::fmt::Display for SetError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::MalformedPath => f.write_str("Unknown configuration entry"),
            Self::UnexpectedValue => f.write_str("Value rejected, expect a positive integer"),
        }
    }
}

/// Path based update, e.g. `barometer.altitude-interval`. A `None` value
/// resets the entry to its default.
pub trait Setter {
    fn set(&mut self, path: &mut Split<char>, value: Option<&str>) -> Result<(), SetError>;
}
