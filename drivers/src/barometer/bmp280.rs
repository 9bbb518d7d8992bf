use core::fmt::Debug;

use bmp280::bus::Bus;
use bmp280::measurement::Calibration;
use bmp280::registers::{PressureOversampling, Register, StandbyTime, TemperatureOversampling};
use bmp280::{Mode, BMP280 as Device};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use hal::barometer::{Barometer, ChipKind, STANDARD_SEA_LEVEL_PRESSURE};

use super::{pressure_altitude, report, Readings, SELF_TEST_SETTLE_MS};
use crate::bus::{BusId, Buses};
use crate::Error;

pub const ADDRESS: u8 = 0x77;
pub const ALTERNATIVE_ADDRESS: u8 = 0x76;
pub const CHIP_ID: u8 = 0x58;
pub const BME280_CHIP_ID: u8 = 0x60;

/// Address and chip id combinations tried on each bus, in order.
const ATTEMPTS: [(u8, u8); 4] = [
    (ADDRESS, CHIP_ID),
    (ALTERNATIVE_ADDRESS, CHIP_ID),
    (ADDRESS, BME280_CHIP_ID),
    (ALTERNATIVE_ADDRESS, BME280_CHIP_ID),
];

/// Register access to one chip address on whichever bus is selected.
struct Target<'b, 'a, I> {
    buses: &'b mut Buses<'a, I>,
    address: u8,
}

impl<'b, 'a, E, I> Bus for Target<'b, 'a, I>
where
    I: Write<Error = E> + WriteRead<Error = E>,
{
    type Error = Error<E>;

    fn write(&mut self, reg: Register, value: u8) -> Result<(), Error<E>> {
        self.buses.write_register(self.address, reg as u8, value)
    }

    fn read(&mut self, reg: Register) -> Result<u8, Error<E>> {
        self.buses.read_register(self.address, reg as u8)
    }

    fn reads(&mut self, reg: Register, output: &mut [u8]) -> Result<(), Error<E>> {
        self.buses.read_registers(self.address, reg as u8, output)
    }
}

struct Millis<'d, D>(&'d mut D);

impl<'d, D: DelayMs<u16>> DelayMs<u8> for Millis<'d, D> {
    fn delay_ms(&mut self, ms: u8) {
        self.0.delay_ms(ms as u16)
    }
}

pub struct BMP280<'a, I, D> {
    buses: Buses<'a, I>,
    delay: D,
    address: u8,
    chip_id: u8,
    calibration: Option<Calibration>,
    last: Readings,
}

impl<'a, E, I, D> BMP280<'a, I, D>
where
    E: Debug,
    I: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u16>,
{
    pub fn new(buses: Buses<'a, I>, delay: D) -> Self {
        let last = Readings::default();
        Self { buses, delay, address: ADDRESS, chip_id: CHIP_ID, calibration: None, last }
    }

    fn begin(&mut self, address: u8, chip_id: u8) -> Result<(), Error<E>> {
        let mut target = Target { buses: &mut self.buses, address };
        let id = target.read(Register::Id)?;
        if id != chip_id {
            return Err(Error::UnsupportedChip(id));
        }
        let mut device = Device::new(target);
        device.reset(&mut Millis(&mut self.delay))?;
        device.set_standby_time(StandbyTime::Hertz2000)?;
        device.set_iir_filter(0)?;
        device.set_temperature_oversampling(TemperatureOversampling::LowPower)?;
        device.set_pressure_oversampling(PressureOversampling::UltraHighResolution)?;
        device.set_mode(Mode::Normal)?;
        let calibration = device.read_calibration()?;
        self.address = address;
        self.chip_id = chip_id;
        self.calibration = Some(calibration);
        Ok(())
    }

    fn measure(&mut self) -> Result<(f32, f32), Error<E>> {
        let calibration = self.calibration.ok_or(Error::NotInitialized)?;
        let mut device = Device::new(Target { buses: &mut self.buses, address: self.address });
        let (raw_pressure, raw_temperature) = device.read_measurements()?;
        let t_fine = raw_temperature.t_fine(&calibration);
        let temperature = t_fine.degree_celsuis_x100() as f32 / 100.0;
        let pressure = raw_pressure.compensated(t_fine, &calibration) as f32;
        Ok((temperature, pressure))
    }

    fn update(&mut self) -> bool {
        match self.measure() {
            Ok((temperature, pressure)) => {
                self.last.temperature = temperature;
                self.last.pressure = pressure;
                true
            }
            Err(e) => {
                warn!("{} read failed: {}", self.name(), e);
                false
            }
        }
    }
}

impl<'a, E, I, D> Barometer for BMP280<'a, I, D>
where
    E: Debug,
    I: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u16>,
{
    fn kind(&self) -> ChipKind {
        ChipKind::BMP280
    }

    fn name(&self) -> &'static str {
        match self.chip_id {
            BME280_CHIP_ID => "BME280",
            _ => "BMP280",
        }
    }

    fn probe(&mut self) -> bool {
        for id in self.buses.candidates().into_iter().flatten() {
            self.buses.select(id);
            if id == BusId::Secondary {
                debug!("Looking for BMP280 on secondary bus");
            }
            for (address, chip_id) in ATTEMPTS {
                match self.begin(address, chip_id) {
                    Ok(()) => return true,
                    Err(e) => trace!("No {:#x} at {:#x} on {:?} bus: {}", chip_id, address, id, e),
                }
            }
        }
        self.buses.select(BusId::Primary);
        self.calibration = None;
        false
    }

    fn self_test(&mut self) {
        self.update();
        self.last.altitude = pressure_altitude(self.last.pressure, STANDARD_SEA_LEVEL_PRESSURE);
        report(self.name(), &self.last);
        self.delay.delay_ms(SELF_TEST_SETTLE_MS);
    }

    fn altitude(&mut self, sea_level_pressure: f32) -> f32 {
        if self.update() {
            self.last.altitude = pressure_altitude(self.last.pressure, sea_level_pressure);
        }
        self.last.altitude
    }

    fn pressure(&mut self) -> f32 {
        self.update();
        self.last.pressure
    }

    fn temperature(&mut self) -> f32 {
        self.update();
        self.last.temperature
    }
}

mod test {
    #[cfg(test)]
    use super::super::fake::FakeBus;

    #[cfg(test)]
    const CALIBRATION: [u8; 24] = [
        0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C,
        0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17,
    ];

    #[cfg(test)]
    const DATA: [u8; 6] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00];

    #[cfg(test)]
    fn datasheet_chip(bus: FakeBus, address: u8, chip_id: u8) -> FakeBus {
        let bus = bus.device(address, 0xD0, &[chip_id]).device(address, 0x88, &CALIBRATION);
        bus.device(address, 0xF7, &DATA)
    }

    #[test]
    fn test_compensation() {
        use bmp280::measurement::{Calibration, RawPressure, RawTemperature};

        let calibration = Calibration::from_bytes(&CALIBRATION);
        let t_fine = RawTemperature::from_bytes(&DATA[3..]).t_fine(&calibration);
        assert_eq!(t_fine.degree_celsuis_x100(), 2508);
        assert_eq!(RawPressure::from_bytes(&DATA).compensated(t_fine, &calibration), 100655);
    }

    #[test]
    fn test_read() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;

        use super::super::fake::NoDelay;
        use super::BMP280;
        use crate::bus::Buses;

        let bus = RefCell::new(datasheet_chip(FakeBus::default(), 0x77, 0x58));
        let mut bmp280 = BMP280::new(Buses::new(&bus), NoDelay);
        assert!(bmp280.probe());
        assert_eq!(bus.borrow().register(0x77, 0xF4), Some(0x57));
        assert_eq!(bus.borrow().register(0x77, 0xF5), Some(0x00));
        assert_eq!(bus.borrow().register(0x77, 0xE0), Some(0xB6));
        assert_eq!(bmp280.name(), "BMP280");
        assert!((bmp280.temperature() - 25.08).abs() < 0.001);
        assert_eq!(bmp280.pressure(), 100655.0);
        assert!((bmp280.altitude(1013.25) - 55.93).abs() < 0.1);
    }

    #[test]
    fn test_bme280_on_alternative_address() {
        use core::cell::RefCell;

        use hal::barometer::{Barometer, ChipKind};

        use super::super::fake::NoDelay;
        use super::BMP280;
        use crate::bus::Buses;

        let bus = RefCell::new(datasheet_chip(FakeBus::default(), 0x76, 0x60));
        let mut bmp280 = BMP280::new(Buses::new(&bus), NoDelay);
        assert!(bmp280.probe());
        // three failed identifications, then id, reset, five read-modify-writes and calibration
        assert_eq!(bus.borrow().transactions, 3 + 1 + 1 + 5 * 2 + 1);
        assert_eq!(bmp280.address, 0x76);
        assert_eq!(bmp280.kind(), ChipKind::BMP280);
        assert_eq!(bmp280.name(), "BME280");
        assert_eq!(bmp280.pressure(), 100655.0);
    }

    #[test]
    fn test_secondary_bus_fallback() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;
        use hal::platform::{HardwareModel, Platform};

        use super::super::fake::NoDelay;
        use super::BMP280;
        use crate::bus::{BusId, Buses};

        let primary = RefCell::new(FakeBus::default());
        let secondary = RefCell::new(datasheet_chip(FakeBus::default(), 0x76, 0x58));

        let platform = Platform::new(HardwareModel::Skywatch);
        let buses = Buses::with_secondary(&primary, &secondary, &platform);
        let mut bmp280 = BMP280::new(buses, NoDelay);
        assert!(!bmp280.probe());
        assert_eq!(bmp280.pressure(), 0.0);

        let platform = Platform::new(HardwareModel::PrimeMk2);
        let buses = Buses::with_secondary(&primary, &secondary, &platform);
        let mut bmp280 = BMP280::new(buses, NoDelay);
        assert!(bmp280.probe());
        assert_eq!(bmp280.buses.selected(), BusId::Secondary);
        assert_eq!(primary.borrow().transactions, 8);
        assert_eq!(bmp280.pressure(), 100655.0);
    }

    #[test]
    fn test_keeps_last_good_reading() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;

        use super::super::fake::NoDelay;
        use super::BMP280;
        use crate::bus::Buses;

        let bus = RefCell::new(datasheet_chip(FakeBus::default(), 0x77, 0x58));
        let mut bmp280 = BMP280::new(Buses::new(&bus), NoDelay);
        assert!(bmp280.probe());
        let altitude = bmp280.altitude(1013.25);
        bus.borrow_mut().failing = true;
        assert_eq!(bmp280.altitude(1013.25), altitude);
        assert!((bmp280.temperature() - 25.08).abs() < 0.001);
    }
}
