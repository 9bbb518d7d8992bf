/// Milliseconds since boot.
pub type Instant = fugit::TimerInstantU64<1000>;
pub type Duration = fugit::MillisDurationU64;

pub trait Clock {
    /// Monotonic, never goes backwards.
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
