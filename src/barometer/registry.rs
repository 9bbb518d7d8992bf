use alloc::boxed::Box;

use hal::barometer::{Barometer, ChipKind};
use heapless::Vec;

/// One slot per supported chip type.
pub const MAX_CHIPS: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProbeState {
    Unprobed,
    Selected(usize),
    Unselected,
}

/// Compiled-in chip drivers kept in probing priority order, plus which one
/// answered the last probe.
pub struct ChipRegistry<'a> {
    chips: Vec<Box<dyn Barometer + 'a>, MAX_CHIPS>,
    state: ProbeState,
}

impl<'a> Default for ChipRegistry<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ChipRegistry<'a> {
    pub fn new() -> Self {
        Self { chips: Vec::new(), state: ProbeState::Unprobed }
    }

    /// Hands the chip back when the registry is full.
    pub fn register(
        &mut self,
        chip: Box<dyn Barometer + 'a>,
    ) -> Result<(), Box<dyn Barometer + 'a>> {
        self.chips.push(chip)?;
        let mut index = self.chips.len() - 1;
        while index > 0 && self.chips[index - 1].kind() > self.chips[index].kind() {
            self.chips.swap(index - 1, index);
            index -= 1;
        }
        self.state = ProbeState::Unprobed;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// First chip answering in priority order becomes active.
    pub fn probe(&mut self) -> bool {
        for (index, chip) in self.chips.iter_mut().enumerate() {
            trace!("Probing {}", chip.name());
            if chip.probe() {
                self.state = ProbeState::Selected(index);
                return true;
            }
        }
        self.state = ProbeState::Unselected;
        false
    }

    pub fn active(&mut self) -> Option<&mut (dyn Barometer + 'a)> {
        match self.state {
            ProbeState::Selected(index) => self.chips.get_mut(index).map(|chip| &mut **chip),
            _ => None,
        }
    }

    pub fn active_kind(&self) -> ChipKind {
        let kind = match self.state {
            ProbeState::Selected(index) => self.chips.get(index).map(|chip| chip.kind()),
            _ => None,
        };
        kind.unwrap_or_default()
    }
}

mod test {
    #[test]
    fn test_priority_order() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;

        use super::super::mock::MockChip;
        use super::{ChipRegistry, ProbeState};

        let (mpl, mpl_probe) = MockChip::new(ChipKind::MPL3115A2, true);
        let (bmp280, bmp280_probe) = MockChip::new(ChipKind::BMP280, true);
        let (bmp180, bmp180_probe) = MockChip::new(ChipKind::BMP180, false);

        let mut registry = ChipRegistry::new();
        registry.register(Box::new(mpl)).ok();
        registry.register(Box::new(bmp280)).ok();
        registry.register(Box::new(bmp180)).ok();
        assert_eq!(registry.state(), ProbeState::Unprobed);

        assert!(registry.probe());
        assert_eq!(registry.state(), ProbeState::Selected(1));
        assert_eq!(registry.active_kind(), ChipKind::BMP280);
        assert_eq!(registry.active().map(|chip| chip.kind()), Some(ChipKind::BMP280));
        assert_eq!((bmp180_probe.probes(), bmp280_probe.probes(), mpl_probe.probes()), (1, 1, 0));
    }

    #[test]
    fn test_no_chip_answers() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;

        use super::super::mock::MockChip;
        use super::{ChipRegistry, ProbeState};

        let mut registry = ChipRegistry::new();
        for kind in [ChipKind::BMP180, ChipKind::BMP280, ChipKind::MPL3115A2] {
            registry.register(Box::new(MockChip::new(kind, false).0)).ok();
        }
        let (extra, _) = MockChip::new(ChipKind::BMP280, true);
        assert!(registry.register(Box::new(extra)).is_err());

        assert!(!registry.probe());
        assert_eq!(registry.state(), ProbeState::Unselected);
        assert_eq!(registry.active_kind(), ChipKind::None);
        assert!(registry.active().is_none());
    }

    #[test]
    fn test_empty_registry() {
        use hal::barometer::ChipKind;

        use super::ChipRegistry;

        let mut registry = ChipRegistry::default();
        assert!(registry.is_empty());
        assert!(!registry.probe());
        assert_eq!(registry.active_kind(), ChipKind::None);
    }
}
