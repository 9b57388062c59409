//! Bearing-only triangulation: pairwise ray intersection with a weighted
//! least-squares fallback, dispersion-based confidence and a heatmap.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::algorithms::gdop::{assess_dispersion, weight_confidence, DispersionAssessment};
use crate::algorithms::geodesy::{centroid, destination, normalize_angle, segment_intersection};
use crate::algorithms::heatmap::HeatmapRenderer;
use crate::core::{
    BearingSample, GeoPoint, TriangulationResult, DEFAULT_BBOX_PADDING_DEG, DEFAULT_GRID_CELLS,
    DEFAULT_RAY_LENGTH_KM,
};
use crate::validation::data::SampleValidator;

/// Determinants smaller than this are replaced before inverting
const SINGULAR_EPSILON: f64 = 1e-9;

/// Tunables of the fusion solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Length of each bearing ray used for intersection testing (km)
    pub ray_length_km: f64,
    /// Heatmap cells along the longer axis
    pub grid_cells: usize,
    /// Heatmap bounding box padding (degrees)
    pub bbox_padding_deg: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            ray_length_km: DEFAULT_RAY_LENGTH_KM,
            grid_cells: DEFAULT_GRID_CELLS,
            bbox_padding_deg: DEFAULT_BBOX_PADDING_DEG,
        }
    }
}

/// How the location estimate was obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixMethod {
    /// Weighted centroid of this many ray intersections
    Intersection { points: usize },
    /// No rays crossed; least-squares fit of the bearing lines
    LeastSquares,
}

/// Estimate plus the intermediate quantities that produced it
#[derive(Debug, Clone)]
pub struct Solution {
    pub estimate: GeoPoint,
    pub confidence: f64,
    pub method: FixMethod,
    pub intersections: Vec<GeoPoint>,
    /// Per-sample weights in input order
    pub weights: Vec<f64>,
    /// Present when at least two intersections were found
    pub dispersion: Option<DispersionAssessment>,
}

/// Geometric fusion solver. Stateless between calls.
#[derive(Debug, Clone, Default)]
pub struct TriangulationEngine {
    config: SolverConfig,
    renderer: HeatmapRenderer,
    validator: SampleValidator,
}

impl TriangulationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        let renderer = HeatmapRenderer::new(config.grid_cells, config.bbox_padding_deg);
        Self {
            config,
            renderer,
            validator: SampleValidator::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Fuse `samples` into a location, confidence and heatmap.
    ///
    /// Fewer than two usable samples produce [`TriangulationResult::degenerate`].
    pub fn compute(&self, samples: &[BearingSample]) -> TriangulationResult {
        let usable = self.validator.usable_samples(samples);
        let Some(solution) = self.solve(&usable) else {
            return TriangulationResult::degenerate();
        };

        let heatmap_tiles = self.renderer.render(&usable, &solution.estimate);
        TriangulationResult {
            estimated_location: solution.estimate,
            confidence: solution.confidence,
            stations_used: usable.iter().map(|s| s.station_id).collect(),
            heatmap_tiles,
        }
    }

    /// Location and confidence without the heatmap. `None` below two samples.
    ///
    /// Samples are used as given; [`compute`](Self::compute) filters them first.
    pub fn solve(&self, samples: &[BearingSample]) -> Option<Solution> {
        if samples.len() < 2 {
            debug!("{} bearing(s), need at least 2", samples.len());
            return None;
        }

        let weights: Vec<f64> = samples.iter().map(sample_weight).collect();
        let intersections = self.intersections(samples);

        let (estimate, method) = if intersections.is_empty() {
            debug!("no ray intersections among {} bearings, least-squares fallback", samples.len());
            (self.least_squares_fix(samples), FixMethod::LeastSquares)
        } else {
            let estimate = weighted_centroid(&intersections, &weights);
            (estimate, FixMethod::Intersection { points: intersections.len() })
        };

        let estimate = if estimate.is_finite() {
            estimate
        } else {
            warn!("non-finite estimate {:?}, using station centroid", estimate);
            let stations: Vec<GeoPoint> = samples.iter().map(BearingSample::position).collect();
            centroid(&stations).unwrap_or_default()
        };

        let dispersion = assess_dispersion(&intersections, &estimate);
        let confidence = match &dispersion {
            Some(assessment) => {
                debug!(
                    "intersections {:.3} km from estimate (sd {:.3} km), gdop {:.3}: {}",
                    assessment.mean_distance_km,
                    assessment.std_distance_km,
                    assessment.gdop,
                    assessment.quality.description()
                );
                assessment.confidence
            }
            None => weight_confidence(&weights),
        };

        Some(Solution {
            estimate,
            confidence,
            method,
            intersections,
            weights,
            dispersion,
        })
    }

    /// Bearing ray of each sample as a (station, far end) segment
    pub fn rays(&self, samples: &[BearingSample]) -> Vec<(GeoPoint, GeoPoint)> {
        samples
            .iter()
            .map(|s| {
                let start = s.position();
                let end = destination(&start, self.config.ray_length_km, s.radio_bearing);
                (start, end)
            })
            .collect()
    }

    /// Every point where two bearing rays cross, pair order (i < j)
    pub fn intersections(&self, samples: &[BearingSample]) -> Vec<GeoPoint> {
        let rays = self.rays(samples);
        let mut points = Vec::new();
        for (i, (a1, a2)) in rays.iter().enumerate() {
            for (b1, b2) in rays.iter().skip(i + 1) {
                if let Some(p) = segment_intersection(a1, a2, b1, b2) {
                    points.push(p);
                }
            }
        }
        points
    }

    /// Weighted least-squares solution of the bearing-line constraints
    /// `sin(theta)*lon + cos(theta)*lat = c` in raw lon/lat units.
    ///
    /// A near-singular normal matrix is inverted with a clamped reciprocal
    /// determinant so the result stays finite.
    pub fn least_squares_fix(&self, samples: &[BearingSample]) -> GeoPoint {
        let n = samples.len();
        let mut a = DMatrix::<f64>::zeros(n, 2);
        let mut b = DVector::<f64>::zeros(n);

        for (row, s) in samples.iter().enumerate() {
            let theta = normalize_angle(s.radio_bearing).to_radians();
            let (nx, ny) = (theta.sin(), theta.cos());
            let c = nx * s.longitude + ny * s.latitude;
            let w = (s.confidence + 0.1).max(1e-3).sqrt();
            a[(row, 0)] = w * nx;
            a[(row, 1)] = w * ny;
            b[row] = w * c;
        }

        let at = a.transpose();
        let at_a = &at * &a;
        let at_b = &at * &b;

        let normal = Matrix2::new(at_a[(0, 0)], at_a[(0, 1)], at_a[(1, 0)], at_a[(1, 1)]);
        let rhs = Vector2::new(at_b[0], at_b[1]);
        let x = guarded_inverse(&normal) * rhs;

        GeoPoint::new(x[1], x[0])
    }
}

/// Sample weight: stronger, more confident signals dominate
pub fn sample_weight(sample: &BearingSample) -> f64 {
    let power = sample.power.clamp(-150.0, -30.0);
    ((sample.confidence + 0.1) * (power + 160.0)).max(0.001)
}

/// Centroid of the intersections, each weighted by the mean sample weight
fn weighted_centroid(points: &[GeoPoint], weights: &[f64]) -> GeoPoint {
    let w = weights.iter().sum::<f64>() / weights.len() as f64;
    let (sum_w, sum_lat, sum_lon) = points.iter().fold((0.0, 0.0, 0.0), |(sw, slat, slon), p| {
        (sw + w, slat + p.latitude * w, slon + p.longitude * w)
    });
    GeoPoint::new(sum_lat / sum_w, sum_lon / sum_w)
}

/// 2x2 inverse via the adjugate, with |det| < 1e-9 replaced by a 1e9 reciprocal
fn guarded_inverse(m: &Matrix2<f64>) -> Matrix2<f64> {
    let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
    let f = if det.abs() < SINGULAR_EPSILON {
        warn!("near-singular normal matrix (det {:e}), clamping reciprocal", det);
        1.0 / SINGULAR_EPSILON
    } else {
        1.0 / det
    };
    Matrix2::new(m[(1, 1)] * f, -m[(0, 1)] * f, -m[(1, 0)] * f, m[(0, 0)] * f)
}
