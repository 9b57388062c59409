//! Core data types for the direction-finding system

use serde::{Deserialize, Serialize};

use crate::core::constants::DOA_BINS;

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Antenna array fitted to a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntennaType {
    /// Uniform circular array
    #[serde(rename = "UCA")]
    Uca,
    /// Uniform linear array
    #[serde(rename = "ULA")]
    Ula,
    Custom,
}

/// Direction-finding ground station as held by the station registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: u32,
    pub name: String,
    pub apikey: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Tuned frequency (Hz)
    pub freq: f64,
    pub antenna_type: AntennaType,
    pub active: bool,
    pub group_id: u32,
}

impl Station {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Relative array response per integer degree, 0..359
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoaSpectrum(Vec<f64>);

impl DoaSpectrum {
    /// Build a spectrum by evaluating `response` at every integer degree
    pub fn from_fn<F: FnMut(f64) -> f64>(mut response: F) -> Self {
        Self((0..DOA_BINS).map(|deg| response(deg as f64)).collect())
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest bin value, 0.0 for an empty spectrum
    pub fn peak(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// Value at the bin nearest to `angle_deg`, clamped to [0, 1].
    /// Missing and non-finite bins read as 0.0.
    pub fn at_degree(&self, angle_deg: f64) -> f64 {
        let index = (angle_deg.round() as i64).rem_euclid(DOA_BINS as i64) as usize;
        match self.0.get(index) {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Rescale so the peak becomes exactly 1.0. All-zero spectra are left alone.
    pub fn normalize(&mut self) {
        let max = self.peak();
        if max > 0.0 {
            for v in self.0.iter_mut() {
                *v /= max;
            }
        }
    }
}

/// One station's noisy bearing observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingSample {
    /// Generation time (ms since Unix epoch)
    pub timestamp: u64,
    pub station_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Measured bearing in degrees [0, 360)
    #[serde(rename = "radioBearing")]
    pub radio_bearing: f64,
    /// 0-10 scale
    pub confidence: f64,
    /// Received power (dBm)
    pub power: f64,
    /// Hz
    pub frequency: f64,
    #[serde(rename = "doaArray")]
    pub doa_array: DoaSpectrum,
}

impl BearingSample {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// One heatmap grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapTile {
    pub latitude: f64,
    pub longitude: f64,
    /// Normalized accumulated power in [0, 1]
    pub power: f64,
}

/// Location estimate fused from a set of bearings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangulationResult {
    pub estimated_location: GeoPoint,
    /// 0-10 scale
    pub confidence: f64,
    pub stations_used: Vec<u32>,
    pub heatmap_tiles: Vec<HeatmapTile>,
}

impl TriangulationResult {
    /// Zeroed result returned when there is not enough input to solve
    pub fn degenerate() -> Self {
        Self {
            estimated_location: GeoPoint::default(),
            confidence: 0.0,
            stations_used: Vec::new(),
            heatmap_tiles: Vec::new(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.stations_used.is_empty()
    }
}
