//! Spatial power heatmap built by projecting each station's DOA spectrum
//! onto a regular lon/lat grid.

use log::{debug, trace};
use rayon::prelude::*;

use crate::algorithms::geodesy::{bearing, distance_km, square_grid, BoundingBox};
use crate::core::{BearingSample, GeoPoint, HeatmapTile, DEFAULT_BBOX_PADDING_DEG, DEFAULT_GRID_CELLS};

/// Distance falloff coefficient, per km squared
const FALLOFF_PER_KM2: f64 = 0.1;

/// Renders normalized heatmaps around a station set and an estimate
#[derive(Debug, Clone)]
pub struct HeatmapRenderer {
    /// Cells along the longer axis of the padded bounding box
    pub grid_cells: usize,
    /// Padding added on each side of the bounding box (degrees)
    pub padding_deg: f64,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self {
            grid_cells: DEFAULT_GRID_CELLS,
            padding_deg: DEFAULT_BBOX_PADDING_DEG,
        }
    }
}

/// Per-sample values that do not depend on the cell
struct Contributor<'a> {
    sample: &'a BearingSample,
    position: GeoPoint,
    weight: f64,
}

impl HeatmapRenderer {
    pub fn new(grid_cells: usize, padding_deg: f64) -> Self {
        Self { grid_cells, padding_deg }
    }

    /// Padded box around every sample position and the estimate
    pub fn bounds(&self, samples: &[BearingSample], estimate: &GeoPoint) -> Option<BoundingBox> {
        let points: Vec<GeoPoint> = samples
            .iter()
            .map(BearingSample::position)
            .chain(std::iter::once(*estimate))
            .collect();
        BoundingBox::from_points(&points).map(|b| b.expand(self.padding_deg))
    }

    /// Score every grid cell and normalize so the hottest cell is 1.0.
    ///
    /// Tiles come back in grid order (west to east columns, south to north
    /// within a column). If every raw score is zero the scores are left at zero.
    pub fn render(&self, samples: &[BearingSample], estimate: &GeoPoint) -> Vec<HeatmapTile> {
        let Some(bbox) = self.bounds(samples, estimate) else {
            return Vec::new();
        };
        if self.grid_cells == 0 {
            return Vec::new();
        }

        let cell_side = bbox.width().max(bbox.height()) / self.grid_cells as f64;
        let centers = square_grid(&bbox, cell_side);

        let contributors: Vec<Contributor> = samples
            .iter()
            .map(|sample| Contributor {
                sample,
                position: sample.position(),
                weight: spectrum_weight(sample),
            })
            .collect();

        let scores: Vec<f64> = centers
            .par_iter()
            .map(|center| cell_score(&contributors, center))
            .collect();

        let max = scores.iter().copied().fold(0.0, f64::max);
        debug!(
            "heatmap {} cells of {:.5} deg, raw max {:.4}",
            centers.len(),
            cell_side,
            max
        );

        centers
            .iter()
            .zip(scores)
            .map(|(center, score)| HeatmapTile {
                latitude: center.latitude,
                longitude: center.longitude,
                power: if max > 0.0 { score / max } else { score },
            })
            .collect()
    }
}

/// Confidence and power weighting applied to a station's spectrum
fn spectrum_weight(sample: &BearingSample) -> f64 {
    sample.confidence.max(0.1) * ((sample.power + 160.0) / 130.0).max(0.1)
}

fn cell_score(contributors: &[Contributor], center: &GeoPoint) -> f64 {
    contributors
        .iter()
        .map(|c| {
            let angle = bearing(&c.position, center);
            let response = c.sample.doa_array.at_degree(angle);
            let dist = distance_km(&c.position, center);
            let falloff = 1.0 / (1.0 + dist * dist * FALLOFF_PER_KM2);
            let contribution = response * falloff * c.weight;
            if contribution.is_finite() {
                contribution
            } else {
                trace!("dropping non-finite contribution from station {}", c.sample.station_id);
                0.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::geodesy::circular_delta;
    use crate::core::{DoaSpectrum, DOA_BINS};

    fn sample_toward(station_id: u32, position: GeoPoint, target: &GeoPoint) -> BearingSample {
        let true_bearing = bearing(&position, target);
        let mut doa = DoaSpectrum::from_fn(|deg| {
            let d = circular_delta(deg, true_bearing);
            (-(d * d) / (2.0 * 15.0 * 15.0)).exp()
        });
        doa.normalize();
        BearingSample {
            timestamp: 0,
            station_id,
            latitude: position.latitude,
            longitude: position.longitude,
            radio_bearing: true_bearing,
            confidence: 6.0,
            power: -70.0,
            frequency: 433_420_000.0,
            doa_array: doa,
        }
    }

    #[test]
    fn test_tiles_normalized_with_a_peak() {
        let target = GeoPoint::new(50.85, 7.05);
        let samples = vec![
            sample_toward(1, GeoPoint::new(50.73698963565033, 7.009624403772563), &target),
            sample_toward(2, GeoPoint::new(50.75053003467639, 7.130660264638948), &target),
        ];
        let renderer = HeatmapRenderer::new(40, 0.2);
        let tiles = renderer.render(&samples, &target);

        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| (0.0..=1.0).contains(&t.power)));
        assert!(tiles.iter().any(|t| t.power == 1.0));
    }

    #[test]
    fn test_grid_covers_padded_bounds() {
        let target = GeoPoint::new(50.85, 7.05);
        let samples = vec![sample_toward(1, GeoPoint::new(50.74, 7.01), &target)];
        let renderer = HeatmapRenderer::new(50, 0.2);
        let bbox = renderer.bounds(&samples, &target).unwrap();
        let tiles = renderer.render(&samples, &target);

        // Longer axis gets the full cell count
        let per_column = tiles
            .iter()
            .filter(|t| t.longitude == tiles[0].longitude)
            .count();
        let columns = tiles.len() / per_column;
        assert_eq!(per_column.max(columns), 50);
        for t in &tiles {
            assert!(bbox.contains(&GeoPoint::new(t.latitude, t.longitude)));
        }
    }

    #[test]
    fn test_all_zero_spectra_left_unscaled() {
        let target = GeoPoint::new(50.85, 7.05);
        let mut sample = sample_toward(1, GeoPoint::new(50.74, 7.01), &target);
        sample.doa_array = DoaSpectrum::from_fn(|_| 0.0);
        let tiles = HeatmapRenderer::new(20, 0.2).render(&[sample], &target);

        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.power == 0.0));
    }

    fn contributor(sample: &BearingSample) -> Contributor<'_> {
        Contributor {
            sample,
            position: sample.position(),
            weight: spectrum_weight(sample),
        }
    }

    fn flat_sample(value: f64, confidence: f64, power: f64) -> BearingSample {
        BearingSample {
            timestamp: 0,
            station_id: 1,
            latitude: 50.0,
            longitude: 7.0,
            radio_bearing: 0.0,
            confidence,
            power,
            frequency: 433_420_000.0,
            doa_array: DoaSpectrum::from_fn(|_| value),
        }
    }

    #[test]
    fn test_cell_score_closed_form() {
        use crate::algorithms::geodesy::destination;

        // 3 km east of the station: falloff 1/(1 + 9 * 0.1)
        let strong = flat_sample(0.5, 4.0, -30.0);
        let center = destination(&strong.position(), 3.0, 90.0);
        let expected = 0.5 * (1.0 / 1.9) * 4.0 * 1.0;
        let score = cell_score(&[contributor(&strong)], &center);
        assert!((score - expected).abs() < 1e-9, "score {} vs {}", score, expected);

        // Confidence and power terms floor at 0.1 each
        let weak = flat_sample(0.5, 0.05, -200.0);
        let weak_score = cell_score(&[contributor(&weak)], &center);
        assert!((weak_score - 0.5 / 1.9 * 0.01).abs() < 1e-12);
        assert!((score / weak_score - 400.0).abs() < 1e-6);

        // Contributions add
        let both = cell_score(&[contributor(&strong), contributor(&weak)], &center);
        assert!((both - (score + weak_score)).abs() < 1e-12);
    }

    #[test]
    fn test_cell_score_reads_bin_toward_cell() {
        use crate::algorithms::geodesy::destination;

        let mut sample = flat_sample(0.0, 4.0, -30.0);
        let mut bins = vec![0.0; DOA_BINS];
        bins[90] = 0.8;
        sample.doa_array = DoaSpectrum::from_values(bins);
        let station = sample.position();

        let east = destination(&station, 3.0, 90.0);
        let north = destination(&station, 3.0, 0.0);
        let score = cell_score(&[contributor(&sample)], &east);
        assert!((score - 0.8 / 1.9 * 4.0).abs() < 1e-9);
        assert_eq!(cell_score(&[contributor(&sample)], &north), 0.0);
    }

    #[test]
    fn test_negative_spectrum_keeps_tiles_in_unit_range() {
        let target = GeoPoint::new(50.85, 7.05);
        let mut sample = sample_toward(1, GeoPoint::new(50.74, 7.01), &target);
        let mut bins = vec![-1.0; DOA_BINS];
        bins[0] = 0.5;
        sample.doa_array = DoaSpectrum::from_values(bins);

        let tiles = HeatmapRenderer::new(20, 0.2).render(&[sample], &target);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| (0.0..=1.0).contains(&t.power)));
    }

    #[test]
    fn test_hot_region_lies_along_bearing() {
        let station = GeoPoint::new(50.74, 7.01);
        let target = GeoPoint::new(50.85, 7.05);
        let sample = sample_toward(1, station, &target);
        let tiles = HeatmapRenderer::new(60, 0.2).render(&[sample], &target);

        let hottest = tiles
            .iter()
            .max_by(|a, b| a.power.partial_cmp(&b.power).unwrap())
            .unwrap();
        let toward = bearing(&station, &GeoPoint::new(hottest.latitude, hottest.longitude));
        assert!(circular_delta(toward, bearing(&station, &target)).abs() < 45.0);
    }
}
