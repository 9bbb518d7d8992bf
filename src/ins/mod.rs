pub mod variometer;

pub use variometer::{Variometer, VS_AVERAGING_FACTOR};
