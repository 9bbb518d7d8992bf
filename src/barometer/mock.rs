//! Scripted chip with call counters shared with the test body.

use alloc::rc::Rc;
use core::cell::Cell;

use hal::barometer::{Barometer, ChipKind};

#[derive(Clone, Default)]
pub struct Probe {
    probes: Rc<Cell<usize>>,
    reads: Rc<Cell<usize>>,
    pressure_reads: Rc<Cell<usize>>,
    altitude_reads: Rc<Cell<usize>>,
    self_tests: Rc<Cell<usize>>,
    altitude: Rc<Cell<f32>>,
    sea_level_pressure: Rc<Cell<f32>>,
}

impl Probe {
    pub fn probes(&self) -> usize {
        self.probes.get()
    }

    /// Every altitude, pressure and temperature call.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn pressure_reads(&self) -> usize {
        self.pressure_reads.get()
    }

    pub fn altitude_reads(&self) -> usize {
        self.altitude_reads.get()
    }

    pub fn self_tests(&self) -> usize {
        self.self_tests.get()
    }

    pub fn sea_level_pressure(&self) -> f32 {
        self.sea_level_pressure.get()
    }

    pub fn set_altitude(&self, altitude: f32) {
        self.altitude.set(altitude)
    }
}

pub struct MockChip {
    kind: ChipKind,
    present: bool,
    pressure: f32,
    temperature: f32,
    probe: Probe,
}

impl MockChip {
    pub fn new(kind: ChipKind, present: bool) -> (Self, Probe) {
        let probe = Probe::default();
        let (pressure, temperature) = (101325.0, 15.0);
        let chip = Self { kind, present, pressure, temperature, probe: probe.clone() };
        (chip, probe)
    }

    pub fn with_readings(mut self, pressure: f32, temperature: f32, altitude: f32) -> Self {
        self.pressure = pressure;
        self.temperature = temperature;
        self.probe.altitude.set(altitude);
        self
    }

    fn read(&self) {
        self.probe.reads.set(self.probe.reads.get() + 1);
    }
}

impl Barometer for MockChip {
    fn kind(&self) -> ChipKind {
        self.kind
    }

    fn probe(&mut self) -> bool {
        self.probe.probes.set(self.probe.probes.get() + 1);
        self.present
    }

    fn self_test(&mut self) {
        self.probe.self_tests.set(self.probe.self_tests.get() + 1);
    }

    fn altitude(&mut self, sea_level_pressure: f32) -> f32 {
        self.read();
        self.probe.altitude_reads.set(self.probe.altitude_reads.get() + 1);
        self.probe.sea_level_pressure.set(sea_level_pressure);
        self.probe.altitude.get()
    }

    fn pressure(&mut self) -> f32 {
        self.read();
        self.probe.pressure_reads.set(self.probe.pressure_reads.get() + 1);
        self.pressure
    }

    fn temperature(&mut self) -> f32 {
        self.read();
        self.temperature
    }
}
