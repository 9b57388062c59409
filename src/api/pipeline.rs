//! Generate-then-compute orchestration used by the demo binary and by any
//! transport that serves the periodic update or the on-demand compute call.

use log::{debug, info};
use serde::Deserialize;

use crate::algorithms::triangulation::TriangulationEngine;
use crate::api::formatting::BearingUpdate;
use crate::core::{BearingSample, Station, TriangulationResult};
use crate::simulation::noise::{NoiseSource, RandomNoise};
use crate::simulation::simulator::DataSimulator;
use crate::utils::config::SystemConfig;
use crate::validation::error::RdfResult;

/// Body of an on-demand compute request
#[derive(Debug, Default, Deserialize)]
struct ComputeRequest {
    #[serde(default)]
    bearings: Vec<BearingSample>,
}

/// Simulator plus fusion engine
pub struct RdfPipeline<N: NoiseSource = RandomNoise> {
    simulator: DataSimulator<N>,
    engine: TriangulationEngine,
    cycles: u64,
}

impl RdfPipeline<RandomNoise> {
    /// Pipeline for `config` with entropy-seeded noise
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_noise(config, RandomNoise::new())
    }
}

impl<N: NoiseSource> RdfPipeline<N> {
    pub fn with_noise(config: &SystemConfig, noise: N) -> Self {
        Self {
            simulator: DataSimulator::with_noise(config.simulator.clone(), noise),
            engine: TriangulationEngine::with_config(config.solver.clone()),
            cycles: 0,
        }
    }

    /// Number of completed update cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One update: simulate every active station, then fuse the bearings
    pub fn cycle(&mut self, stations: &[Station]) -> BearingUpdate {
        let bearings = self.simulator.generate(stations);
        let result = self.engine.compute(&bearings);
        self.cycles += 1;

        if result.is_degenerate() {
            info!("cycle {}: {} bearing(s), no fix", self.cycles, bearings.len());
        } else {
            info!(
                "cycle {}: fix {:.6}, {:.6} from {} station(s), confidence {:.2}",
                self.cycles,
                result.estimated_location.latitude,
                result.estimated_location.longitude,
                result.stations_used.len(),
                result.confidence
            );
        }

        BearingUpdate { bearings, result }
    }

    /// Fuse externally supplied bearings
    pub fn compute(&self, bearings: &[BearingSample]) -> TriangulationResult {
        self.engine.compute(bearings)
    }

    /// Fuse bearings from a `{"bearings": [...]}` request body.
    ///
    /// A missing `bearings` key counts as an empty list.
    pub fn compute_from_json(&self, body: &str) -> RdfResult<TriangulationResult> {
        let request: ComputeRequest = serde_json::from_str(body)?;
        debug!("compute request with {} bearing(s)", request.bearings.len());
        Ok(self.engine.compute(&request.bearings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::geodesy::distance_km;
    use crate::simulation::noise::ZeroNoise;
    use crate::validation::error::RdfError;

    #[test]
    fn test_cycle_with_default_deployment() {
        let config = SystemConfig::default();
        let mut pipeline = RdfPipeline::with_noise(&config, RandomNoise::seeded(42));

        let update = pipeline.cycle(&config.stations);
        assert_eq!(update.bearings.len(), 2);
        assert_eq!(update.result.stations_used, vec![3826, 3827]);
        assert!((0.0..=10.0).contains(&update.result.confidence));
        assert!(!update.result.heatmap_tiles.is_empty());
        assert_eq!(pipeline.cycles(), 1);
    }

    #[test]
    fn test_noise_free_cycle_finds_target() {
        let config = SystemConfig::default();
        let mut pipeline = RdfPipeline::with_noise(&config, ZeroNoise);

        let update = pipeline.cycle(&config.stations);
        let miss = distance_km(&update.result.estimated_location, &config.simulator.target);
        assert!(miss < 1.0, "estimate {} km from target", miss);
    }

    #[test]
    fn test_cycle_without_active_stations() {
        let mut config = SystemConfig::default();
        for s in &mut config.stations {
            s.active = false;
        }
        let mut pipeline = RdfPipeline::with_noise(&config, ZeroNoise);
        let update = pipeline.cycle(&config.stations);
        assert!(update.bearings.is_empty());
        assert!(update.result.is_degenerate());
    }

    #[test]
    fn test_compute_from_json_missing_bearings() {
        let pipeline = RdfPipeline::with_noise(&SystemConfig::default(), ZeroNoise);
        assert!(pipeline.compute_from_json("{}").unwrap().is_degenerate());
        assert!(pipeline
            .compute_from_json(r#"{"bearings": []}"#)
            .unwrap()
            .is_degenerate());
    }

    #[test]
    fn test_compute_from_json_malformed() {
        let pipeline = RdfPipeline::with_noise(&SystemConfig::default(), ZeroNoise);
        assert!(matches!(
            pipeline.compute_from_json("{\"bearings\": ["),
            Err(RdfError::Json(_))
        ));
    }

    #[test]
    fn test_compute_from_json_matches_direct() {
        let config = SystemConfig::default();
        let mut pipeline = RdfPipeline::with_noise(&config, RandomNoise::seeded(8));
        let update = pipeline.cycle(&config.stations);

        let body = serde_json::json!({ "bearings": update.bearings }).to_string();
        let result = pipeline.compute_from_json(&body).unwrap();

        assert_eq!(result.stations_used, update.result.stations_used);
        let d = distance_km(&result.estimated_location, &update.result.estimated_location);
        assert!(d < 1e-6);
        assert!((result.confidence - update.result.confidence).abs() < 1e-6);
    }
}
