use core::cell::RefCell;

use embedded_hal::blocking::i2c::{Read, Write, WriteRead};
use hal::platform::Platform;

use crate::Error;

/// Handle to an I2C controller shared by several drivers.
///
/// Borrows the controller for the duration of a single transaction only, so
/// drivers probed one after another never contend for it.
pub struct SharedBus<'a, I>(&'a RefCell<I>);

impl<'a, I> SharedBus<'a, I> {
    pub fn new(bus: &'a RefCell<I>) -> Self {
        Self(bus)
    }
}

impl<'a, I> Clone for SharedBus<'a, I> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl<'a, I> Copy for SharedBus<'a, I> {}

impl<'a, I: Read> Read for SharedBus<'a, I> {
    type Error = I::Error;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.0.borrow_mut().read(address, buffer)
    }
}

impl<'a, I: Write> Write for SharedBus<'a, I> {
    type Error = I::Error;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.borrow_mut().write(address, bytes)
    }
}

impl<'a, I: WriteRead> WriteRead for SharedBus<'a, I> {
    type Error = I::Error;

    fn write_read(&mut self, addr: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.0.borrow_mut().write_read(addr, bytes, buffer)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusId {
    Primary,
    Secondary,
}

/// The buses a sensor may be wired to, primary first.
pub struct Buses<'a, I> {
    primary: SharedBus<'a, I>,
    secondary: Option<SharedBus<'a, I>>,
    selected: BusId,
}

impl<'a, I> Clone for Buses<'a, I> {
    fn clone(&self) -> Self {
        Self { primary: self.primary, secondary: self.secondary, selected: self.selected }
    }
}

impl<'a, I> Buses<'a, I> {
    pub fn new(primary: &'a RefCell<I>) -> Self {
        Self { primary: SharedBus::new(primary), secondary: None, selected: BusId::Primary }
    }

    /// Secondary bus is only kept when the hardware model routes one to the sensor.
    pub fn with_secondary(
        primary: &'a RefCell<I>,
        secondary: &'a RefCell<I>,
        platform: &Platform,
    ) -> Self {
        let mut buses = Self::new(primary);
        if platform.has_secondary_bus() {
            buses.secondary = Some(SharedBus::new(secondary));
        }
        buses
    }

    pub fn candidates(&self) -> [Option<BusId>; 2] {
        [Some(BusId::Primary), self.secondary.as_ref().map(|_| BusId::Secondary)]
    }

    pub fn select(&mut self, id: BusId) -> bool {
        if id == BusId::Secondary && self.secondary.is_none() {
            return false;
        }
        self.selected = id;
        true
    }

    pub fn selected(&self) -> BusId {
        self.selected
    }

    pub fn current(&mut self) -> &mut SharedBus<'a, I> {
        match (self.selected, self.secondary.as_mut()) {
            (BusId::Secondary, Some(bus)) => bus,
            _ => &mut self.primary,
        }
    }
}

impl<'a, E, I: Write<Error = E> + WriteRead<Error = E>> Buses<'a, I> {
    pub fn read_registers(&mut self, addr: u8, reg: u8, buffer: &mut [u8]) -> Result<(), Error<E>> {
        self.current().write_read(addr, &[reg], buffer).map_err(Error::Bus)
    }

    pub fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Error<E>> {
        let mut buffer = [0u8; 1];
        self.read_registers(address, register, &mut buffer)?;
        Ok(buffer[0])
    }

    pub fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Error<E>> {
        self.current().write(address, &[register, value]).map_err(Error::Bus)
    }

    /// Burst write of up to 7 registers.
    pub fn write_registers(&mut self, addr: u8, reg: u8, values: &[u8]) -> Result<(), Error<E>> {
        let mut bytes = [0u8; 8];
        let size = core::cmp::min(values.len(), bytes.len() - 1);
        bytes[0] = reg;
        bytes[1..size + 1].copy_from_slice(&values[..size]);
        self.current().write(addr, &bytes[..size + 1]).map_err(Error::Bus)
    }
}

mod test {
    #[test]
    fn test_secondary_bus_requires_platform() {
        use core::cell::RefCell;

        use hal::platform::{HardwareModel, Platform};

        use super::{BusId, Buses};
        use crate::barometer::fake::FakeBus;

        let primary = RefCell::new(FakeBus::default());
        let secondary = RefCell::new(FakeBus::default());

        let mut buses = Buses::with_secondary(&primary, &secondary, &Platform::default());
        assert_eq!(buses.candidates(), [Some(BusId::Primary), None]);
        assert!(!buses.select(BusId::Secondary));
        assert_eq!(buses.selected(), BusId::Primary);

        let platform = Platform::new(HardwareModel::PrimeMk2);
        let mut buses = Buses::with_secondary(&primary, &secondary, &platform);
        assert_eq!(buses.candidates(), [Some(BusId::Primary), Some(BusId::Secondary)]);
        assert!(buses.select(BusId::Secondary));
        assert_eq!(buses.selected(), BusId::Secondary);
    }

    #[test]
    fn test_register_access() {
        use core::cell::RefCell;

        use super::Buses;
        use crate::barometer::fake::FakeBus;
        use crate::Error;

        let bus = RefCell::new(FakeBus::default().device(0x42, 0x10, &[1, 2, 3]));
        let mut buses = Buses::new(&bus);
        assert_eq!(buses.read_register(0x42, 0x11), Ok(2));
        buses.write_registers(0x42, 0x20, &[7, 8]).unwrap();
        let mut buffer = [0u8; 2];
        buses.read_registers(0x42, 0x20, &mut buffer).unwrap();
        assert_eq!(buffer, [7, 8]);
        assert!(matches!(buses.read_register(0x43, 0x00), Err(Error::Bus(_))));
    }
}
