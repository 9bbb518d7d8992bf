pub const FEET_PER_METER: f32 = 3.28084;
pub const SECONDS_PER_MINUTE: f32 = 60.0;

/// Meters per second to feet per minute.
pub fn feet_per_minute(meters_per_second: f32) -> f32 {
    meters_per_second * FEET_PER_METER * SECONDS_PER_MINUTE
}

mod test {
    #[test]
    fn test_conversion() {
        use super::feet_per_minute;

        assert!((feet_per_minute(1.0) - 196.85).abs() < 0.01);
        assert_eq!(feet_per_minute(0.0), 0.0);
        assert!((feet_per_minute(-0.5) + 98.43).abs() < 0.01);
    }
}
