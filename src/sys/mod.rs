pub mod clock;
pub mod delay;
pub mod jiffies;
pub mod timer;
