use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use hal::barometer::{Barometer, ChipKind, STANDARD_SEA_LEVEL_PRESSURE};

use super::{pressure_altitude, report, Readings, SELF_TEST_SETTLE_MS};
use crate::bus::{BusId, Buses};
use crate::Error;

pub const ADDRESS: u8 = 0x77;
pub const CHIP_ID: u8 = 0x55;

const REG_CALIBRATION: u8 = 0xAA;
const REG_CHIP_ID: u8 = 0xD0;
const REG_CONTROL: u8 = 0xF4;
const REG_DATA: u8 = 0xF6;

const COMMAND_TEMPERATURE: u8 = 0x2E;
const COMMAND_PRESSURE: u8 = 0x34;

#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Oversampling {
    UltraLowPower = 0,
    Standard = 1,
    HighResolution = 2,
    UltraHighResolution = 3,
}

impl Oversampling {
    fn conversion_time(self) -> u16 {
        match self {
            Self::UltraLowPower => 5,
            Self::Standard => 8,
            Self::HighResolution => 14,
            Self::UltraHighResolution => 26,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Calibration {
    ac1: i16,
    ac2: i16,
    ac3: i16,
    ac4: u16,
    ac5: u16,
    ac6: u16,
    b1: i16,
    b2: i16,
    #[allow(dead_code)]
    mb: i16,
    mc: i16,
    md: i16,
}

impl From<&[u8; 22]> for Calibration {
    fn from(bytes: &[u8; 22]) -> Self {
        let u = |n: usize| u16::from_be_bytes([bytes[n * 2], bytes[n * 2 + 1]]);
        let i = |n: usize| u(n) as i16;
        Self {
            ac1: i(0),
            ac2: i(1),
            ac3: i(2),
            ac4: u(3),
            ac5: u(4),
            ac6: u(5),
            b1: i(6),
            b2: i(7),
            mb: i(8),
            mc: i(9),
            md: i(10),
        }
    }
}

impl Calibration {
    fn b5(&self, ut: i32) -> i32 {
        let x1 = ((ut - self.ac6 as i32) * self.ac5 as i32) >> 15;
        let x2 = ((self.mc as i32) << 11).checked_div(x1 + self.md as i32).unwrap_or(0);
        x1 + x2
    }

    /// Temperature in 0.1 degrees celsius.
    pub fn temperature(&self, ut: i32) -> i32 {
        (self.b5(ut) + 8) >> 4
    }

    /// Pressure in Pa.
    pub fn pressure(&self, ut: i32, up: i32, oss: Oversampling) -> i32 {
        let oss = oss as u8;
        let b6 = self.b5(ut) - 4000;
        let x1 = (self.b2 as i32 * ((b6 * b6) >> 12)) >> 11;
        let x2 = (self.ac2 as i32 * b6) >> 11;
        let x3 = x1 + x2;
        let b3 = ((((self.ac1 as i32) * 4 + x3) << oss) + 2) / 4;
        let x1 = (self.ac3 as i32 * b6) >> 13;
        let x2 = (self.b1 as i32 * ((b6 * b6) >> 12)) >> 16;
        let x3 = ((x1 + x2) + 2) >> 2;
        let b4 = (self.ac4 as u32).wrapping_mul((x3 + 32768) as u32) >> 15;
        let b7 = (up as u32).wrapping_sub(b3 as u32).wrapping_mul(50000 >> oss);
        if b4 == 0 {
            return 0;
        }
        let p = (if b7 < 0x8000_0000 { (b7 * 2) / b4 } else { (b7 / b4) * 2 }) as i32;
        let x1 = (p >> 8) * (p >> 8);
        let x1 = (x1 * 3038) >> 16;
        let x2 = (-7357 * p) >> 16;
        p + ((x1 + x2 + 3791) >> 4)
    }
}

pub struct BMP180<'a, I, D> {
    buses: Buses<'a, I>,
    delay: D,
    oversampling: Oversampling,
    calibration: Option<Calibration>,
    last: Readings,
}

impl<'a, E, I, D> BMP180<'a, I, D>
where
    E: Debug,
    I: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u16>,
{
    pub fn new(buses: Buses<'a, I>, delay: D) -> Self {
        let oversampling = Oversampling::Standard;
        Self { buses, delay, oversampling, calibration: None, last: Readings::default() }
    }

    pub fn with_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    fn begin(&mut self) -> Result<(), Error<E>> {
        let id = self.buses.read_register(ADDRESS, REG_CHIP_ID)?;
        if id != CHIP_ID {
            return Err(Error::UnsupportedChip(id));
        }
        let mut bytes = [0u8; 22];
        self.buses.read_registers(ADDRESS, REG_CALIBRATION, &mut bytes)?;
        self.calibration = Some(Calibration::from(&bytes));
        Ok(())
    }

    fn read_raw_temperature(&mut self) -> Result<i32, Error<E>> {
        self.buses.write_register(ADDRESS, REG_CONTROL, COMMAND_TEMPERATURE)?;
        self.delay.delay_ms(Oversampling::UltraLowPower.conversion_time());
        let mut bytes = [0u8; 2];
        self.buses.read_registers(ADDRESS, REG_DATA, &mut bytes)?;
        Ok(u16::from_be_bytes(bytes) as i32)
    }

    fn read_raw_pressure(&mut self) -> Result<i32, Error<E>> {
        let oss = self.oversampling;
        self.buses.write_register(ADDRESS, REG_CONTROL, COMMAND_PRESSURE + ((oss as u8) << 6))?;
        self.delay.delay_ms(oss.conversion_time());
        let mut bytes = [0u8; 3];
        self.buses.read_registers(ADDRESS, REG_DATA, &mut bytes)?;
        let raw = (bytes[0] as i32) << 16 | (bytes[1] as i32) << 8 | bytes[2] as i32;
        Ok(raw >> (8 - oss as u8))
    }

    /// Temperature in celsius and pressure in Pa, pressure compensation needs
    /// a fresh temperature conversion anyway.
    fn measure(&mut self) -> Result<(f32, f32), Error<E>> {
        let calibration = self.calibration.ok_or(Error::NotInitialized)?;
        let ut = self.read_raw_temperature()?;
        let up = self.read_raw_pressure()?;
        let temperature = calibration.temperature(ut) as f32 / 10.0;
        let pressure = calibration.pressure(ut, up, self.oversampling) as f32;
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
                warn!("BMP180 read failed: {}", e);
                false
            }
        }
    }
}

impl<'a, E, I, D> Barometer for BMP180<'a, I, D>
where
    E: Debug,
    I: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u16>,
{
    fn kind(&self) -> ChipKind {
        ChipKind::BMP180
    }

    fn probe(&mut self) -> bool {
        for id in self.buses.candidates().into_iter().flatten() {
            self.buses.select(id);
            if id == BusId::Secondary {
                debug!("Looking for BMP180 on secondary bus");
            }
            match self.begin() {
                Ok(()) => return true,
                Err(e) => trace!("BMP180 not found on {:?} bus: {}", id, e),
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
    const CALIBRATION: [u8; 22] = [
        0x01, 0x98, 0xFF, 0xB8, 0xC7, 0xD1, 0x7F, 0xE5, 0x7F, 0xF5, 0x5A, 0x71, 0x18, 0x2E, 0x00,
        0x04, 0x80, 0x00, 0xDD, 0xF9, 0x0B, 0x34,
    ];

    #[cfg(test)]
    fn datasheet_chip(bus: FakeBus, address: u8) -> FakeBus {
        bus.device(address, 0xD0, &[0x55])
            .device(address, 0xAA, &CALIBRATION)
            .conversion(address, 0xF4, 0xFF, 0x2E, 0xF6, &[0x6C, 0xFA])
            .conversion(address, 0xF4, 0xFF, 0x34, 0xF6, &[0x5D, 0x23, 0x00])
    }

    #[test]
    fn test_compensation() {
        use super::{Calibration, Oversampling};

        let calibration = Calibration::from(&CALIBRATION);
        assert_eq!(calibration.temperature(27898), 150);
        assert_eq!(calibration.pressure(27898, 23843, Oversampling::UltraLowPower), 69964);
    }

    #[test]
    fn test_read() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;

        use super::super::fake::NoDelay;
        use super::{Oversampling, BMP180};
        use crate::bus::Buses;

        let bus = RefCell::new(datasheet_chip(FakeBus::default(), 0x77));
        let bmp180 = BMP180::new(Buses::new(&bus), NoDelay);
        let mut bmp180 = bmp180.with_oversampling(Oversampling::UltraLowPower);
        assert!(bmp180.probe());
        assert_eq!(bmp180.temperature(), 15.0);
        assert_eq!(bmp180.pressure(), 69964.0);
        let altitude = bmp180.altitude(1013.25);
        assert!((altitude - 3016.7).abs() < 1.0);
    }

    #[test]
    fn test_secondary_bus_fallback() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;
        use hal::platform::{HardwareModel, Platform};

        use super::super::fake::NoDelay;
        use super::{Oversampling, BMP180};
        use crate::bus::{BusId, Buses};

        let primary = RefCell::new(FakeBus::default());
        let secondary = RefCell::new(datasheet_chip(FakeBus::default(), 0x77));

        let buses = Buses::with_secondary(&primary, &secondary, &Platform::default());
        let mut bmp180 = BMP180::new(buses, NoDelay);
        assert!(!bmp180.probe());

        let platform = Platform::new(HardwareModel::PrimeMk2);
        let buses = Buses::with_secondary(&primary, &secondary, &platform);
        let mut bmp180 = BMP180::new(buses, NoDelay).with_oversampling(Oversampling::UltraLowPower);
        assert!(bmp180.probe());
        assert_eq!(bmp180.buses.selected(), BusId::Secondary);
        assert_eq!(bmp180.pressure(), 69964.0);
    }

    #[test]
    fn test_wrong_chip_id() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;

        use super::super::fake::NoDelay;
        use super::BMP180;
        use crate::bus::Buses;

        let bus = RefCell::new(FakeBus::default().device(0x77, 0xD0, &[0x58]));
        let mut bmp180 = BMP180::new(Buses::new(&bus), NoDelay);
        assert!(!bmp180.probe());
        assert_eq!(bmp180.pressure(), 0.0);
    }

    #[test]
    fn test_keeps_last_good_reading() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;

        use super::super::fake::NoDelay;
        use super::{Oversampling, BMP180};
        use crate::bus::Buses;

        let bus = RefCell::new(datasheet_chip(FakeBus::default(), 0x77));
        let bmp180 = BMP180::new(Buses::new(&bus), NoDelay);
        let mut bmp180 = bmp180.with_oversampling(Oversampling::UltraLowPower);
        assert!(bmp180.probe());
        assert_eq!(bmp180.pressure(), 69964.0);
        bus.borrow_mut().failing = true;
        assert_eq!(bmp180.pressure(), 69964.0);
        assert_eq!(bmp180.temperature(), 15.0);
    }
}
