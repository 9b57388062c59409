//! Synthetic measurement generation

pub mod noise;
pub mod simulator;

pub use noise::{NoiseSource, RandomNoise, ZeroNoise};
pub use simulator::{DataSimulator, SimulatorConfig};
