use hal::clock::Instant;

/// Most recent readings taken by the sampling loop, reads never touch the bus.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ReadingCache {
    pub altitude: f32,
    pub pressure: f32,
    pub temperature: f32,
    pub altitude_timestamp: Option<Instant>,
    pub pressure_temperature_timestamp: Option<Instant>,
}

impl ReadingCache {
    pub fn update_altitude(&mut self, altitude: f32, now: Instant) {
        self.altitude = altitude;
        self.altitude_timestamp = Some(now);
    }

    pub fn update_pressure_temperature(&mut self, pressure: f32, temperature: f32, now: Instant) {
        self.pressure = pressure;
        self.temperature = temperature;
        self.pressure_temperature_timestamp = Some(now);
    }
}
