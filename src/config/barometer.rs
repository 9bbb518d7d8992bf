use core::str::Split;

use hal::clock::Duration;
use serde::{Deserialize, Serialize};

use super::setter::{SetError, Setter};

const DEFAULT_ALTITUDE_INTERVAL: u16 = 1000;
const DEFAULT_PRESSURE_TEMPERATURE_INTERVAL: u16 = 2000;

/// Sampling periods in milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Barometer {
    pub altitude_interval: u16,
    pub pressure_temperature_interval: u16,
}

impl Default for Barometer {
    fn default() -> Self {
        Self {
            altitude_interval: DEFAULT_ALTITUDE_INTERVAL,
            pressure_temperature_interval: DEFAULT_PRESSURE_TEMPERATURE_INTERVAL,
        }
    }
}

impl Barometer {
    pub fn altitude_period(&self) -> Duration {
        Duration::millis(self.altitude_interval as u64)
    }

    pub fn pressure_temperature_period(&self) -> Duration {
        Duration::millis(self.pressure_temperature_interval as u64)
    }
}

fn parse_interval(value: Option<&str>, default: u16) -> Result<u16, SetError> {
    let value = match value {
        Some(value) => value.parse().map_err(|_| SetError::UnexpectedValue)?,
        None => default,
    };
    match value {
        0 => Err(SetError::UnexpectedValue),
        _ => Ok(value),
    }
}

impl Setter for Barometer {
    fn set(&mut self, path: &mut Split<char>, value: Option<&str>) -> Result<(), SetError> {
        match path.next().ok_or(SetError::MalformedPath)? {
            "altitude-interval" => {
                self.altitude_interval = parse_interval(value, DEFAULT_ALTITUDE_INTERVAL)?
            }
            "pressure-temperature-interval" => {
                let default = DEFAULT_PRESSURE_TEMPERATURE_INTERVAL;
                self.pressure_temperature_interval = parse_interval(value, default)?
            }
            _ => return Err(SetError::MalformedPath),
        }
        Ok(())
    }
}
