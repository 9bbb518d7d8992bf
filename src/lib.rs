#![no_std]

extern crate alloc;
extern crate concat_idents;
extern crate hal;
#[macro_use]
extern crate log;
extern crate serde;

pub mod barometer;
pub mod collection;
pub mod config;
pub mod datastore;
pub mod ins;
pub mod logger;
pub mod sync;
pub mod sys;
pub mod types;

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;
