use core::fmt;

/// Sea level reference pressure in hPa used for pressure altitude.
pub const STANDARD_SEA_LEVEL_PRESSURE: f32 = 1013.25;

/// Barometric chips known to the firmware, in probing priority order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ChipKind {
    #[default]
    None = 0,
    BMP180 = 1,
    BMP280 = 2,
    MPL3115A2 = 3,
}

impl ChipKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::BMP180 => "BMP180",
            Self::BMP280 => "BMP280",
            Self::MPL3115A2 => "MPL3115A2",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform operations of a barometric pressure chip.
///
/// Readings never fail: on a bus error an implementation returns its last
/// good value, or zero if it never had one.
pub trait Barometer {
    fn kind(&self) -> ChipKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Look for the chip on the bus and initialize it, returns whether it
    /// responded. May switch to another bus or address while doing so.
    fn probe(&mut self) -> bool;

    /// One diagnostic read-and-report cycle.
    fn self_test(&mut self);

    /// Altitude in meters, given sea level pressure in hPa.
    fn altitude(&mut self, sea_level_pressure: f32) -> f32;

    /// Pressure in Pa.
    fn pressure(&mut self) -> f32;

    /// Temperature in degrees celsius.
    fn temperature(&mut self) -> f32;
}

mod test {
    #[test]
    fn test_chip_kind_priority() {
        use super::ChipKind;

        assert!(ChipKind::BMP180 < ChipKind::BMP280);
        assert!(ChipKind::BMP280 < ChipKind::MPL3115A2);
        assert_eq!(ChipKind::default(), ChipKind::None);
        assert_eq!(ChipKind::MPL3115A2.as_u8(), 3);
    }

    #[test]
    fn test_secondary_bus() {
        use crate::platform::{HardwareModel, Platform};

        assert!(Platform::new(HardwareModel::PrimeMk2).has_secondary_bus());
        assert!(!Platform::default().has_secondary_bus());
        assert!(!Platform::new(HardwareModel::PrimeMk3).has_secondary_bus());
    }
}
