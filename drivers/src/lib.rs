#![no_std]

extern crate alloc;
extern crate hal;
#[macro_use]
extern crate log;
extern crate pro_baro;

pub mod barometer;
pub mod bus;
mod error;

pub use error::Error;

#[cfg(test)]
extern crate std;

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;
