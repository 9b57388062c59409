//! Radio direction finding triangulation
//!
//! Fuses bearing observations from direction-finding ground stations into a
//! location estimate with a 0-10 confidence and a normalized heatmap, and
//! simulates such observations from station/target geometry.

pub mod core;
pub mod algorithms;
pub mod simulation;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{
    AntennaType, BearingSample, DoaSpectrum, GeoPoint, HeatmapTile, Station, TriangulationResult,
};
pub use algorithms::{HeatmapRenderer, SolverConfig, TriangulationEngine};
pub use simulation::{DataSimulator, NoiseSource, RandomNoise, SimulatorConfig, ZeroNoise};
pub use validation::{RdfError, RdfResult, SampleValidator};
pub use utils::{ConfigurationManager, SystemConfig};
pub use api::{BearingUpdate, OutputFormat, RdfPipeline, ResultFormatter};
