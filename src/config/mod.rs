pub mod barometer;
pub mod setter;

use core::str::Split;

use serde::{Deserialize, Serialize};

pub use barometer::Barometer;
use setter::{SetError, Setter};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub barometer: Barometer,
}

impl Config {
    pub fn set_value(&mut self, path: &str, value: Option<&str>) -> Result<(), SetError> {
        self.set(&mut path.split('.'), value)
    }
}

impl Setter for Config {
    fn set(&mut self, path: &mut Split<char>, value: Option<&str>) -> Result<(), SetError> {
        match path.next().ok_or(SetError::MalformedPath)? {
            "barometer" => self.barometer.set(path, value),
            _ => Err(SetError::MalformedPath),
        }
    }
}

mod test {
    #[test]
    fn test_set_intervals() {
        use super::setter::SetError;
        use super::Config;

        let mut config = Config::default();
        assert_eq!(config.barometer.altitude_interval, 1000);
        assert_eq!(config.barometer.pressure_temperature_interval, 2000);

        config.set_value("barometer.altitude-interval", Some("200")).unwrap();
        assert_eq!(config.barometer.altitude_interval, 200);
        config.set_value("barometer.pressure-temperature-interval", Some("5000")).unwrap();
        assert_eq!(config.barometer.pressure_temperature_interval, 5000);
        config.set_value("barometer.altitude-interval", None).unwrap();
        assert_eq!(config.barometer.altitude_interval, 1000);

        let result = config.set_value("barometer.altitude-interval", Some("0"));
        assert_eq!(result, Err(SetError::UnexpectedValue));
        let result = config.set_value("barometer.altitude-interval", Some("fast"));
        assert_eq!(result, Err(SetError::UnexpectedValue));
        assert_eq!(config.set_value("barometer.qnh", Some("1013")), Err(SetError::MalformedPath));
        assert_eq!(config.set_value("barometer", Some("1")), Err(SetError::MalformedPath));
        assert_eq!(config.barometer.pressure_temperature_interval, 5000);
    }

    #[test]
    fn test_serde() {
        use serde_json::json;

        use super::{Barometer, Config};

        let config = Config::default();
        let barometer = json!({"altitude-interval": 1000, "pressure-temperature-interval": 2000});
        let expected = json!({ "barometer": barometer });
        assert_eq!(expected, serde_json::to_value(&config).unwrap());

        let json =
            r#"{"barometer": {"altitude-interval": 250, "pressure-temperature-interval": 3000}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let expected = Barometer { altitude_interval: 250, pressure_temperature_interval: 3000 };
        assert_eq!(config.barometer, expected);

        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
