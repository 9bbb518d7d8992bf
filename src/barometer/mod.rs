pub mod cache;
#[cfg(test)]
mod mock;
pub mod registry;

use hal::barometer::{ChipKind, STANDARD_SEA_LEVEL_PRESSURE};
use hal::clock::Clock;

use crate::config;
use crate::datastore::AircraftState;
use crate::ins::variometer::{Variometer, VS_AVERAGING_FACTOR};
use crate::sys::timer::IntervalTimer;

use cache::ReadingCache;
use registry::ChipRegistry;

/// Pressure altitude is always referenced to standard atmosphere.
pub const SEA_LEVEL_PRESSURE_HPA: f32 = STANDARD_SEA_LEVEL_PRESSURE;

/// Samples the detected barometric chip at two independent rates and derives
/// pressure altitude and smoothed vertical speed from it.
pub struct Altimeter<'a, C, const N: usize = VS_AVERAGING_FACTOR> {
    registry: ChipRegistry<'a>,
    clock: C,
    cache: ReadingCache,
    variometer: Variometer<N>,
    altitude_timer: IntervalTimer,
    pressure_temperature_timer: IntervalTimer,
}

impl<'a, C: Clock, const N: usize> Altimeter<'a, C, N> {
    pub fn new(registry: ChipRegistry<'a>, clock: C, config: &config::Barometer) -> Self {
        Self {
            registry,
            clock,
            cache: ReadingCache::default(),
            variometer: Variometer::default(),
            altitude_timer: IntervalTimer::new(config.altitude_period()),
            pressure_temperature_timer: IntervalTimer::new(config.pressure_temperature_period()),
        }
    }

    pub fn probe(&mut self) -> bool {
        self.registry.probe()
    }

    /// Detect the chip and take the first readings, the sampling loop does
    /// nothing unless this found a chip.
    pub fn setup(&mut self, state: &AircraftState) -> ChipKind {
        if !self.probe() {
            info!("Barometric pressure sensor was NOT detected.");
            return ChipKind::None;
        }
        let chip = match self.registry.active() {
            Some(chip) => chip,
            None => return ChipKind::None,
        };
        info!("{} barometric pressure sensor is detected.", chip.name());
        chip.self_test();

        let pressure = chip.pressure();
        let temperature = chip.temperature();
        let now = self.clock.now();
        self.cache.update_pressure_temperature(pressure, temperature, now);
        self.pressure_temperature_timer.arm(now);

        let altitude = chip.altitude(SEA_LEVEL_PRESSURE_HPA);
        let now = self.clock.now();
        self.cache.update_altitude(altitude, now);
        state.write_pressure_altitude_at(altitude, now);
        self.variometer.reset(altitude);
        self.altitude_timer.arm(now);
        chip.kind()
    }

    /// Called repeatedly by the scheduler, samples whichever timer elapsed.
    pub fn update(&mut self, state: &AircraftState) {
        let chip = match self.registry.active() {
            Some(chip) => chip,
            None => return,
        };
        let now = self.clock.now();

        if let Some(elapsed) = self.altitude_timer.poll(now) {
            let altitude = chip.altitude(SEA_LEVEL_PRESSURE_HPA);
            state.write_pressure_altitude_at(altitude, now);
            state.write_baro_alt_diff_at(state.read_altitude() - altitude, now);
            let vertical_speed = self.variometer.update(altitude, elapsed);
            state.write_vertical_speed_at(vertical_speed, now);
            self.cache.update_altitude(altitude, now);
        }

        if self.pressure_temperature_timer.poll(now).is_some() {
            let pressure = chip.pressure();
            let temperature = chip.temperature();
            self.cache.update_pressure_temperature(pressure, temperature, now);
        }
    }

    /// Pressure altitude in meters.
    pub fn altitude(&self) -> f32 {
        self.cache.altitude
    }

    /// Pressure in Pa.
    pub fn pressure(&self) -> f32 {
        self.cache.pressure
    }

    /// Temperature in celsius.
    pub fn temperature(&self) -> f32 {
        self.cache.temperature
    }

    pub fn chip(&self) -> ChipKind {
        self.registry.active_kind()
    }

    pub fn cache(&self) -> &ReadingCache {
        &self.cache
    }
}

mod test {
    #[cfg(test)]
    use super::registry::ChipRegistry;
    #[cfg(test)]
    use super::Altimeter;
    #[cfg(test)]
    use crate::config;
    #[cfg(test)]
    use crate::sys::clock::SimulatedClock;

    #[cfg(test)]
    fn altimeter<'a>(
        registry: ChipRegistry<'a>,
        clock: &'a SimulatedClock,
    ) -> Altimeter<'a, &'a SimulatedClock> {
        Altimeter::new(registry, clock, &config::Barometer::default())
    }

    #[test]
    fn test_setup_selects_by_priority() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;
        use hal::clock::Instant;

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (mpl, mpl_probe) = MockChip::new(ChipKind::MPL3115A2, true);
        let (bmp280, probe) = MockChip::new(ChipKind::BMP280, true);
        let bmp280 = bmp280.with_readings(100000.0, 20.5, 110.0);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(mpl)).ok();
        registry.register(Box::new(bmp280)).ok();

        let clock = SimulatedClock::new(5000);
        let state = AircraftState::default();
        let mut altimeter = altimeter(registry, &clock);
        assert_eq!(altimeter.setup(&state), ChipKind::BMP280);
        assert_eq!(altimeter.chip(), ChipKind::BMP280);
        assert_eq!(mpl_probe.probes(), 0);
        assert_eq!(probe.self_tests(), 1);
        assert_eq!(probe.sea_level_pressure(), 1013.25);

        assert_eq!(altimeter.pressure(), 100000.0);
        assert_eq!(altimeter.temperature(), 20.5);
        assert_eq!(altimeter.altitude(), 110.0);
        assert_eq!(state.read_pressure_altitude(), 110.0);
        assert_eq!(altimeter.cache().altitude_timestamp, Some(Instant::from_ticks(5000)));
        let timestamp = altimeter.cache().pressure_temperature_timestamp;
        assert_eq!(timestamp, Some(Instant::from_ticks(5000)));
    }

    #[test]
    fn test_readers_use_cache() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (chip, probe) = MockChip::new(ChipKind::BMP180, true);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(chip.with_readings(95000.0, -3.0, 540.0))).ok();

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let mut altimeter = altimeter(registry, &clock);
        altimeter.setup(&state);
        let reads = probe.reads();
        assert_eq!(reads, 3);
        for _ in 0..5 {
            assert_eq!(altimeter.altitude(), 540.0);
            assert_eq!(altimeter.pressure(), 95000.0);
            assert_eq!(altimeter.temperature(), -3.0);
        }
        assert_eq!(probe.reads(), reads);
    }

    #[test]
    fn test_without_sensor() {
        use hal::barometer::ChipKind;
        use hal::clock::Duration;

        use crate::datastore::AircraftState;

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let mut altimeter = altimeter(ChipRegistry::new(), &clock);
        assert!(!altimeter.probe());
        assert_eq!(altimeter.setup(&state), ChipKind::None);
        assert_eq!(altimeter.chip(), ChipKind::None);
        for _ in 0..5 {
            clock.advance(Duration::millis(1000));
            altimeter.update(&state);
        }
        let readings = (altimeter.altitude(), altimeter.pressure(), altimeter.temperature());
        assert_eq!(readings, (0.0, 0.0, 0.0));
        assert_eq!(state.try_read_vertical_speed(), None);
        assert_eq!(state.try_read_pressure_altitude(), None);
        assert_eq!(altimeter.cache().altitude_timestamp, None);
    }

    #[test]
    fn test_absent_chip() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;
        use hal::clock::Duration;

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (chip, probe) = MockChip::new(ChipKind::BMP280, false);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(chip)).ok();

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let mut altimeter = altimeter(registry, &clock);
        assert_eq!(altimeter.setup(&state), ChipKind::None);
        clock.advance(Duration::millis(5000));
        altimeter.update(&state);
        assert_eq!((probe.probes(), probe.self_tests(), probe.reads()), (1, 0, 0));
        assert_eq!(altimeter.altitude(), 0.0);
    }

    #[test]
    fn test_state_stamped_by_clock() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;
        use hal::clock::{Clock, Duration};

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (chip, _) = MockChip::new(ChipKind::BMP280, true);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(chip.with_readings(100000.0, 20.0, 110.0))).ok();

        let clock = SimulatedClock::new(50_000);
        let state = AircraftState::default();
        let mut altimeter = altimeter(registry, &clock);
        altimeter.setup(&state);
        let fresh = Duration::millis(0);
        assert_eq!(state.read_pressure_altitude_within(clock.now(), fresh), Some(110.0));

        clock.advance(Duration::millis(999));
        let max_age = Duration::millis(998);
        assert_eq!(state.read_pressure_altitude_within(clock.now(), max_age), None);
        altimeter.update(&state);
        assert_eq!(state.try_read_vertical_speed(), None);

        clock.advance(Duration::millis(1));
        altimeter.update(&state);
        assert_eq!(state.read_pressure_altitude_within(clock.now(), fresh), Some(110.0));
        assert_eq!(state.read_vertical_speed_within(clock.now(), fresh), Some(0.0));
        assert_eq!(state.read_baro_alt_diff_within(clock.now(), fresh), Some(-110.0));
    }

    #[test]
    fn test_independent_timers() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;
        use hal::clock::Duration;

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (chip, probe) = MockChip::new(ChipKind::MPL3115A2, true);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(chip)).ok();

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let config =
            config::Barometer { altitude_interval: 100, pressure_temperature_interval: 1000 };
        let mut altimeter: Altimeter<_> = Altimeter::new(registry, &clock, &config);
        altimeter.setup(&state);
        let (altitude_reads, pressure_reads) = (probe.altitude_reads(), probe.pressure_reads());

        altimeter.update(&state);
        assert_eq!(probe.altitude_reads(), altitude_reads);
        for _ in 0..3 {
            clock.advance(Duration::millis(100));
            altimeter.update(&state);
        }
        assert_eq!(probe.altitude_reads(), altitude_reads + 3);
        assert_eq!(probe.pressure_reads(), pressure_reads);

        clock.advance(Duration::millis(700));
        altimeter.update(&state);
        assert_eq!(probe.altitude_reads(), altitude_reads + 4);
        assert_eq!(probe.pressure_reads(), pressure_reads + 1);
    }

    #[test]
    fn test_both_timers_fire_together() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;
        use hal::clock::{Duration, Instant};

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (chip, probe) = MockChip::new(ChipKind::BMP280, true);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(chip)).ok();

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let mut altimeter = altimeter(registry, &clock);
        altimeter.setup(&state);
        let (altitude_reads, pressure_reads) = (probe.altitude_reads(), probe.pressure_reads());
        clock.advance(Duration::millis(2000));
        altimeter.update(&state);
        assert_eq!(probe.altitude_reads(), altitude_reads + 1);
        assert_eq!(probe.pressure_reads(), pressure_reads + 1);
        assert_eq!(altimeter.cache().altitude_timestamp, Some(Instant::from_ticks(2000)));
        let timestamp = altimeter.cache().pressure_temperature_timestamp;
        assert_eq!(timestamp, Some(Instant::from_ticks(2000)));
    }

    #[test]
    fn test_steady_climb() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;
        use hal::clock::Duration;

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (chip, probe) = MockChip::new(ChipKind::BMP280, true);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(chip.with_readings(101325.0, 15.0, 200.0))).ok();

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        state.write_altitude(230.0);
        let mut altimeter = altimeter(registry, &clock);
        altimeter.setup(&state);

        let mut altitude = 200.0f32;
        let intervals = [1000u64, 1004, 996, 1020, 1000, 985, 1010, 1000];
        for (i, interval) in intervals.iter().enumerate() {
            clock.advance(Duration::millis(*interval));
            altitude += *interval as f32 / 1000.0;
            probe.set_altitude(altitude);
            altimeter.update(&state);
            if i == 0 {
                assert!((state.read_vertical_speed() - 196.85 / 4.0).abs() < 0.1);
            }
        }
        assert!((state.read_vertical_speed() - 196.85).abs() < 0.5);
        assert_eq!(state.read_pressure_altitude(), altitude);
        assert_eq!(state.read_baro_alt_diff(), 230.0 - altitude);
        assert_eq!(altimeter.altitude(), altitude);
    }

    #[test]
    fn test_level_flight_reads_zero() {
        use alloc::boxed::Box;

        use hal::barometer::ChipKind;
        use hal::clock::Duration;

        use super::mock::MockChip;
        use crate::datastore::AircraftState;

        let (chip, probe) = MockChip::new(ChipKind::BMP180, true);
        let mut registry = ChipRegistry::new();
        registry.register(Box::new(chip.with_readings(101325.0, 15.0, 300.0))).ok();

        let clock = SimulatedClock::default();
        let state = AircraftState::default();
        let mut altimeter = altimeter(registry, &clock);
        altimeter.setup(&state);

        for (i, noise) in [0.05f32, -0.05, 0.08, 0.0, -0.08, 0.03].iter().enumerate() {
            clock.advance(Duration::millis(1000 + i as u64 * 7));
            probe.set_altitude(300.0 + noise);
            altimeter.update(&state);
            assert_eq!(state.read_vertical_speed(), 0.0);
        }
    }
}
