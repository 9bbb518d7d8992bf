#![no_std]

pub mod barometer;
pub mod clock;
pub mod platform;

#[cfg(test)]
extern crate std;
