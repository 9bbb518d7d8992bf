#[allow(unused_imports)]
use alloc::boxed::Box;
use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use pro_baro::barometer::registry::ChipRegistry;

use crate::bus::Buses;

#[cfg(feature = "bmp180")]
pub mod bmp180;
#[cfg(feature = "bmp280")]
pub mod bmp280;
#[cfg(feature = "mpl3115a2")]
pub mod mpl3115a2;

#[cfg(test)]
pub(crate) mod fake;

const SELF_TEST_SETTLE_MS: u16 = 500;

/// Last good readings of a chip, zero until the first successful conversion.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Readings {
    pub pressure: f32,
    pub temperature: f32,
    pub altitude: f32,
}

/// International barometric formula, pressure in Pa and sea level pressure in hPa.
pub fn pressure_altitude(pressure: f32, sea_level_pressure: f32) -> f32 {
    44330.0 * (1.0 - libm::powf(pressure / 100.0 / sea_level_pressure, 0.1903))
}

pub(crate) fn report(name: &str, readings: &Readings) {
    info!("{} self test", name);
    info!("Temperature = {} *C", readings.temperature);
    info!("Pressure = {} Pa", readings.pressure);
    info!("Approx altitude = {} m", readings.altitude);
}

/// Build the registry of every chip driver compiled in, in probing priority.
#[allow(unused_mut)]
pub fn registry<'a, E, I, D>(buses: Buses<'a, I>, delay: D) -> ChipRegistry<'a>
where
    E: Debug + 'a,
    I: Write<Error = E> + WriteRead<Error = E> + 'a,
    D: DelayMs<u16> + Clone + 'a,
{
    let mut registry = ChipRegistry::new();
    #[cfg(feature = "bmp180")]
    registry.register(Box::new(bmp180::BMP180::new(buses.clone(), delay.clone()))).ok();
    #[cfg(feature = "bmp280")]
    registry.register(Box::new(bmp280::BMP280::new(buses.clone(), delay.clone()))).ok();
    #[cfg(feature = "mpl3115a2")]
    registry.register(Box::new(mpl3115a2::MPL3115A2::new(buses.clone(), delay.clone()))).ok();
    drop((buses, delay));
    registry
}

mod test {
    #[test]
    fn test_pressure_altitude() {
        use super::pressure_altitude;

        assert!(pressure_altitude(101325.0, 1013.25).abs() < 0.01);
        let altitude = pressure_altitude(100653.27, 1013.25);
        assert!((altitude - 56.08).abs() < 0.1);
        assert!(pressure_altitude(89874.6, 1013.25) > 999.0);
    }

    #[test]
    #[cfg(all(feature = "bmp180", feature = "bmp280", feature = "mpl3115a2"))]
    fn test_registry_probes_in_priority_order() {
        use core::cell::RefCell;

        use hal::barometer::ChipKind;

        use super::fake::{FakeBus, NoDelay};
        use crate::bus::Buses;

        let bus = FakeBus::default().device(0x60, 0x0C, &[0xC4]).device(0x76, 0xD0, &[0x58]);
        let bus = RefCell::new(bus);
        let mut registry = super::registry(Buses::new(&bus), NoDelay);
        assert_eq!(registry.len(), 3);
        assert!(registry.probe());
        assert_eq!(registry.active_kind(), ChipKind::BMP280);
    }

    #[test]
    #[cfg(feature = "bmp280")]
    fn test_altimeter_over_bus() {
        use core::cell::RefCell;

        use hal::barometer::ChipKind;
        use hal::clock::Duration;
        use pro_baro::barometer::Altimeter;
        use pro_baro::config;
        use pro_baro::datastore::AircraftState;
        use pro_baro::sys::clock::SimulatedClock;

        use super::fake::{FakeBus, NoDelay};
        use crate::bus::Buses;

        let calibration = [
            0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, //
            0x27, 0x0B, 0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17,
        ];
        let data = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00];
        let bus = FakeBus::default().device(0x76, 0xD0, &[0x58]).device(0x76, 0x88, &calibration);
        let bus = RefCell::new(bus.device(0x76, 0xF7, &data));

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let registry = super::registry(Buses::new(&bus), NoDelay);
        let config = config::Barometer::default();
        let mut altimeter: Altimeter<_> = Altimeter::new(registry, &clock, &config);
        assert_eq!(altimeter.setup(&state), ChipKind::BMP280);
        assert_eq!(altimeter.pressure(), 100655.0);
        assert!((altimeter.temperature() - 25.08).abs() < 0.001);
        assert!((altimeter.altitude() - 55.93).abs() < 0.1);

        clock.advance(Duration::millis(1000));
        altimeter.update(&state);
        assert_eq!(state.read_vertical_speed(), 0.0);
        assert!((state.read_pressure_altitude() - 55.93).abs() < 0.1);
    }

    #[test]
    #[cfg(not(any(feature = "bmp180", feature = "bmp280", feature = "mpl3115a2")))]
    fn test_registry_without_drivers() {
        use core::cell::RefCell;

        use hal::barometer::ChipKind;
        use hal::clock::Duration;
        use pro_baro::barometer::Altimeter;
        use pro_baro::config;
        use pro_baro::datastore::AircraftState;
        use pro_baro::sys::clock::SimulatedClock;

        use super::fake::{FakeBus, NoDelay};
        use crate::bus::Buses;

        let bus = RefCell::new(FakeBus::default().device(0x77, 0xD0, &[0x58]));
        let registry = super::registry(Buses::new(&bus), NoDelay);
        assert!(registry.is_empty());

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let config = config::Barometer::default();
        let mut altimeter: Altimeter<_> = Altimeter::new(registry, &clock, &config);
        assert_eq!(altimeter.setup(&state), ChipKind::None);
        for _ in 0..3 {
            clock.advance(Duration::millis(2000));
            altimeter.update(&state);
        }
        assert_eq!(altimeter.chip(), ChipKind::None);
        assert_eq!(altimeter.altitude(), 0.0);
        assert_eq!(altimeter.pressure(), 0.0);
        assert_eq!(altimeter.temperature(), 0.0);
        assert_eq!(state.try_read_pressure_altitude(), None);
        assert_eq!(state.try_read_vertical_speed(), None);
        assert_eq!(bus.borrow().transactions, 0);
    }

    #[test]
    #[cfg(all(feature = "bmp180", feature = "bmp280", feature = "mpl3115a2"))]
    fn test_registry_without_sensor() {
        use core::cell::RefCell;

        use hal::barometer::ChipKind;

        use super::fake::{FakeBus, NoDelay};
        use crate::bus::Buses;

        let bus = RefCell::new(FakeBus::default());
        let mut registry = super::registry(Buses::new(&bus), NoDelay);
        assert!(!registry.probe());
        assert_eq!(registry.active_kind(), ChipKind::None);
    }
}
