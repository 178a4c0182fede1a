//! Byte sources the scenarios push through a limiter.

mod gate;
mod network;
mod synthetic;

pub use gate::DurationGate;
pub use network::{Emission, LocalLink, SpikePlan};
pub use synthetic::{SyntheticCounter, SyntheticSource};
