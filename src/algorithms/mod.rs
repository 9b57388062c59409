//! Core direction-finding algorithms

pub mod geodesy;
pub mod gdop;
pub mod heatmap;
pub mod triangulation;

pub use gdop::{DispersionAssessment, GdopQuality};
pub use heatmap::HeatmapRenderer;
pub use triangulation::{FixMethod, Solution, SolverConfig, TriangulationEngine};
