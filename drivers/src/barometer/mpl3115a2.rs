use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use hal::barometer::{Barometer, ChipKind, STANDARD_SEA_LEVEL_PRESSURE};

use super::{report, Readings, SELF_TEST_SETTLE_MS};
use crate::bus::{BusId, Buses};
use crate::Error;

pub const ADDRESS: u8 = 0x60;
pub const WHO_AM_I: u8 = 0xC4;

const REG_STATUS: u8 = 0x00;
const REG_WHO_AM_I: u8 = 0x0C;
const REG_PT_DATA_CFG: u8 = 0x13;
const REG_BAR_IN: u8 = 0x14;
const REG_CTRL_REG1: u8 = 0x26;

const STATUS_PTDR: u8 = 0x08;

const PT_DATA_CFG_TDEFE: u8 = 0x01;
const PT_DATA_CFG_PDEFE: u8 = 0x02;
const PT_DATA_CFG_DREM: u8 = 0x04;

const CTRL_REG1_OST: u8 = 0x02;
const CTRL_REG1_OS128: u8 = 0x38;
const CTRL_REG1_ALT: u8 = 0x80;

const POLL_ATTEMPTS: usize = 20;
const POLL_INTERVAL_MS: u16 = 30;

const PASCALS_PER_INCH_HG: f32 = 3377.0;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Mode {
    Barometer,
    Altimeter,
}

/// Q18.2 pascals, left aligned in 3 bytes.
fn pressure(bytes: &[u8]) -> f32 {
    let raw = (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32;
    (raw >> 4) as f32 / 4.0
}

/// Signed Q16.4 meters, left aligned in 3 bytes.
fn altitude(bytes: &[u8]) -> f32 {
    let raw = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], 0]);
    (raw >> 12) as f32 / 16.0
}

/// Signed Q8.4 celsius, left aligned in 2 bytes.
fn temperature(bytes: &[u8]) -> f32 {
    (i16::from_be_bytes([bytes[0], bytes[1]]) >> 4) as f32 / 16.0
}

pub struct MPL3115A2<'a, I, D> {
    buses: Buses<'a, I>,
    delay: D,
    initialized: bool,
    last: Readings,
}

impl<'a, E, I, D> MPL3115A2<'a, I, D>
where
    E: Debug,
    I: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u16>,
{
    pub fn new(buses: Buses<'a, I>, delay: D) -> Self {
        Self { buses, delay, initialized: false, last: Readings::default() }
    }

    fn begin(&mut self) -> Result<(), Error<E>> {
        let id = self.buses.read_register(ADDRESS, REG_WHO_AM_I)?;
        if id != WHO_AM_I {
            return Err(Error::UnsupportedChip(id));
        }
        self.buses.write_register(ADDRESS, REG_CTRL_REG1, CTRL_REG1_OS128)?;
        let flags = PT_DATA_CFG_TDEFE | PT_DATA_CFG_PDEFE | PT_DATA_CFG_DREM;
        self.buses.write_register(ADDRESS, REG_PT_DATA_CFG, flags)?;
        self.initialized = true;
        Ok(())
    }

    /// Trigger a one-shot conversion and return status followed by the
    /// pressure or altitude and temperature output registers.
    fn one_shot(&mut self, mode: Mode) -> Result<[u8; 6], Error<E>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let ctrl = match mode {
            Mode::Barometer => CTRL_REG1_OS128,
            Mode::Altimeter => CTRL_REG1_OS128 | CTRL_REG1_ALT,
        };
        self.buses.write_register(ADDRESS, REG_CTRL_REG1, ctrl | CTRL_REG1_OST)?;
        let mut bytes = [0u8; 6];
        for _ in 0..POLL_ATTEMPTS {
            self.buses.read_registers(ADDRESS, REG_STATUS, &mut bytes)?;
            if bytes[0] & STATUS_PTDR > 0 {
                return Ok(bytes);
            }
            self.delay.delay_ms(POLL_INTERVAL_MS);
        }
        Err(Error::Timeout)
    }

    fn read_pressure(&mut self) -> Result<(), Error<E>> {
        let bytes = self.one_shot(Mode::Barometer)?;
        self.last.pressure = pressure(&bytes[1..4]);
        self.last.temperature = temperature(&bytes[4..]);
        Ok(())
    }

    fn read_altitude(&mut self, sea_level_pressure: f32) -> Result<(), Error<E>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let bar_in = (sea_level_pressure * 100.0 / 2.0) as u16;
        self.buses.write_registers(ADDRESS, REG_BAR_IN, &bar_in.to_be_bytes())?;
        let bytes = self.one_shot(Mode::Altimeter)?;
        self.last.altitude = altitude(&bytes[1..4]);
        self.last.temperature = temperature(&bytes[4..]);
        Ok(())
    }
}

impl<'a, E, I, D> Barometer for MPL3115A2<'a, I, D>
where
    E: Debug,
    I: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u16>,
{
    fn kind(&self) -> ChipKind {
        ChipKind::MPL3115A2
    }

    fn probe(&mut self) -> bool {
        for id in self.buses.candidates().into_iter().flatten() {
            self.buses.select(id);
            if id == BusId::Secondary {
                debug!("Looking for MPL3115A2 on secondary bus");
            }
            match self.begin() {
                Ok(()) => return true,
                Err(e) => trace!("MPL3115A2 not found on {:?} bus: {}", id, e),
            }
        }
        self.buses.select(BusId::Primary);
        self.initialized = false;
        false
    }

    fn self_test(&mut self) {
        self.pressure();
        self.altitude(STANDARD_SEA_LEVEL_PRESSURE);
        report(self.name(), &self.last);
        info!("Pressure = {} Inches (Hg)", self.last.pressure / PASCALS_PER_INCH_HG);
        self.delay.delay_ms(SELF_TEST_SETTLE_MS);
    }

    fn altitude(&mut self, sea_level_pressure: f32) -> f32 {
        if let Err(e) = self.read_altitude(sea_level_pressure) {
            warn!("MPL3115A2 altitude read failed: {}", e);
        }
        self.last.altitude
    }

    fn pressure(&mut self) -> f32 {
        if let Err(e) = self.read_pressure() {
            warn!("MPL3115A2 pressure read failed: {}", e);
        }
        self.last.pressure
    }

    fn temperature(&mut self) -> f32 {
        if let Err(e) = self.read_pressure() {
            warn!("MPL3115A2 temperature read failed: {}", e);
        }
        self.last.temperature
    }
}

mod test {
    #[cfg(test)]
    use super::super::fake::FakeBus;

    #[cfg(test)]
    fn chip(altitude: &[u8]) -> FakeBus {
        let barometer = [0x0E, 0x62, 0xF3, 0x40, 0x19, 0x80];
        let mut altimeter = barometer;
        altimeter[1..4].copy_from_slice(altitude);
        FakeBus::default()
            .device(0x60, 0x0C, &[0xC4])
            .conversion(0x60, 0x26, 0x82, 0x02, 0x00, &barometer)
            .conversion(0x60, 0x26, 0x82, 0x82, 0x00, &altimeter)
    }

    #[test]
    fn test_fixed_point_outputs() {
        use super::{altitude, pressure, temperature};

        assert_eq!(pressure(&[0x62, 0xF3, 0x40]), 101325.0);
        assert_eq!(pressure(&[0x62, 0xF3, 0x70]), 101325.75);
        assert_eq!(altitude(&[0x00, 0x7B, 0x80]), 123.5);
        assert_eq!(altitude(&[0xFF, 0xF5, 0xC0]), -10.25);
        assert_eq!(temperature(&[0x19, 0x80]), 25.5);
        assert_eq!(temperature(&[0xFB, 0x00]), -5.0);
    }

    #[test]
    fn test_read() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;

        use super::super::fake::NoDelay;
        use super::MPL3115A2;
        use crate::bus::Buses;

        let bus = RefCell::new(chip(&[0x00, 0x7B, 0x80]));
        let mut mpl = MPL3115A2::new(Buses::new(&bus), NoDelay);
        assert!(mpl.probe());
        assert_eq!(bus.borrow().register(0x60, 0x13), Some(0x07));
        assert_eq!(mpl.pressure(), 101325.0);
        assert_eq!(mpl.temperature(), 25.5);
        assert_eq!(mpl.altitude(1013.25), 123.5);
        assert_eq!(bus.borrow().register(0x60, 0x14), Some(0xC5));
        assert_eq!(bus.borrow().register(0x60, 0x15), Some(0xE6));
    }

    #[test]
    fn test_conversion_timeout() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;

        use super::super::fake::NoDelay;
        use super::MPL3115A2;
        use crate::bus::Buses;

        let bus = RefCell::new(FakeBus::default().device(0x60, 0x0C, &[0xC4]));
        let mut mpl = MPL3115A2::new(Buses::new(&bus), NoDelay);
        assert!(mpl.probe());
        let before = bus.borrow().transactions;
        assert_eq!(mpl.pressure(), 0.0);
        // trigger, then every status poll
        assert_eq!(bus.borrow().transactions - before, 1 + 20);
    }

    #[test]
    fn test_not_present() {
        use core::cell::RefCell;

        use hal::barometer::Barometer;
        use hal::platform::{HardwareModel, Platform};

        use super::super::fake::NoDelay;
        use super::MPL3115A2;
        use crate::bus::Buses;

        let primary = RefCell::new(FakeBus::default().device(0x60, 0x0C, &[0x00]));
        let secondary = RefCell::new(FakeBus::default());
        let platform = Platform::new(HardwareModel::PrimeMk2);
        let buses = Buses::with_secondary(&primary, &secondary, &platform);
        let mut mpl = MPL3115A2::new(buses, NoDelay);
        assert!(!mpl.probe());
        assert_eq!(secondary.borrow().transactions, 1);
        let before = primary.borrow().transactions;
        assert_eq!(mpl.altitude(1013.25), 0.0);
        assert_eq!(primary.borrow().transactions, before);
    }
}
