use crate::algorithms::geodesy::distance_km;
use crate::core::GeoPoint;

/// Confidence is reported on a 0-10 scale
pub const MAX_CONFIDENCE: f64 = 10.0;

/// Floor added to the dispersion so a perfect cluster still has finite GDOP
const GDOP_FLOOR: f64 = 0.001;

/// Geometry quality grading for a dispersion-based GDOP value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GdopQuality {
    /// Excellent geometry (GDOP < 2)
    Excellent,
    /// Good geometry (GDOP < 5)
    Good,
    /// Moderate geometry (GDOP < 10)
    Moderate,
    /// Fair geometry (GDOP < 20)
    Fair,
    /// Poor geometry (GDOP >= 20)
    Poor,
}

impl GdopQuality {
    /// Create quality assessment from GDOP value
    pub fn from_gdop(gdop: f64) -> Self {
        if gdop < 2.0 {
            GdopQuality::Excellent
        } else if gdop < 5.0 {
            GdopQuality::Good
        } else if gdop < 10.0 {
            GdopQuality::Moderate
        } else if gdop < 20.0 {
            GdopQuality::Fair
        } else {
            GdopQuality::Poor
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GdopQuality::Excellent => "Excellent geometry (tight intersection cluster)",
            GdopQuality::Good => "Good geometry (suitable for most fixes)",
            GdopQuality::Moderate => "Moderate geometry (usable, expect some spread)",
            GdopQuality::Fair => "Fair geometry (limited accuracy, use with caution)",
            GdopQuality::Poor => "Poor geometry (bearings barely agree)",
        }
    }
}

/// Spread of bearing intersections around the final estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispersionAssessment {
    /// Population mean of intersection-to-estimate distances (km)
    pub mean_distance_km: f64,
    /// Population standard deviation of those distances (km)
    pub std_distance_km: f64,
    /// Standard deviation plus a small floor
    pub gdop: f64,
    /// 0-10, higher for tighter clusters
    pub confidence: f64,
    pub quality: GdopQuality,
}

/// Assess how tightly `intersections` cluster around `estimate`.
///
/// Needs at least two intersections; a single point carries no dispersion
/// information and yields `None`.
pub fn assess_dispersion(intersections: &[GeoPoint], estimate: &GeoPoint) -> Option<DispersionAssessment> {
    if intersections.len() < 2 {
        return None;
    }

    let distances: Vec<f64> = intersections
        .iter()
        .map(|p| distance_km(estimate, p))
        .collect();
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    let gdop = std + GDOP_FLOOR;

    Some(DispersionAssessment {
        mean_distance_km: mean,
        std_distance_km: std,
        gdop,
        confidence: (MAX_CONFIDENCE / (1.0 + gdop)).clamp(0.0, MAX_CONFIDENCE),
        quality: GdopQuality::from_gdop(gdop),
    })
}

/// Crude confidence used when there is no intersection cluster to measure:
/// proportional to the mean sample weight.
pub fn weight_confidence(weights: &[f64]) -> f64 {
    if weights.is_empty() {
        return 0.0;
    }
    let mean = weights.iter().sum::<f64>() / weights.len() as f64;
    if !mean.is_finite() {
        return 0.0;
    }
    (mean / 100.0).clamp(0.0, MAX_CONFIDENCE)
}
