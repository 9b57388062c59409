//! Spherical geodesy helpers and the planar lon/lat utilities used for ray
//! intersection and heatmap tiling.
//!
//! Distances and bearings use a spherical Earth of radius
//! [`EARTH_RADIUS_KM`]. Intersection and grid tiling deliberately treat
//! longitude/latitude as planar Cartesian coordinates, which is accurate
//! enough over the regional extents a station network covers.

use crate::core::{GeoPoint, COINCIDENT_DISTANCE_KM, EARTH_RADIUS_KM};

/// Segments whose cross product falls below this are treated as parallel
const PARALLEL_EPSILON: f64 = 1e-12;

/// Absorbs floating error when counting how many cells fit along an axis
const GRID_COUNT_EPSILON: f64 = 1e-9;

/// Reduce any angle to [0, 360)
pub fn normalize_angle(angle_deg: f64) -> f64 {
    let a = angle_deg % 360.0;
    let a = if a < 0.0 { a + 360.0 } else { a };
    // -1e-17 % 360 + 360 rounds to exactly 360
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Shortest signed angular difference `x - mu`, in (-180, 180]
pub fn circular_delta(x_deg: f64, mu_deg: f64) -> f64 {
    let d = normalize_angle(x_deg - mu_deg);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Great-circle distance between two points (km), haversine formula
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push antipodal pairs just past 1
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial great-circle bearing from `from` to `to`, degrees [0, 360).
///
/// Coincident points (closer than a metre) have no defined direction and
/// yield 0.0.
pub fn bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    if distance_km(from, to) < COINCIDENT_DISTANCE_KM {
        return 0.0;
    }

    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_angle(x.atan2(y).to_degrees())
}

/// Point reached travelling `distance_km` from `origin` along initial `bearing_deg`
pub fn destination(origin: &GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Axis-aligned lon/lat box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Smallest box containing every point, `None` for an empty slice
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            west: first.longitude,
            south: first.latitude,
            east: first.longitude,
            north: first.latitude,
        };
        Some(points.iter().skip(1).fold(init, |b, p| Self {
            west: b.west.min(p.longitude),
            south: b.south.min(p.latitude),
            east: b.east.max(p.longitude),
            north: b.north.max(p.latitude),
        }))
    }

    /// Grow the box by `padding_deg` on every side
    pub fn expand(&self, padding_deg: f64) -> Self {
        Self {
            west: self.west - padding_deg,
            south: self.south - padding_deg,
            east: self.east + padding_deg,
            north: self.north + padding_deg,
        }
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.longitude >= self.west
            && point.longitude <= self.east
            && point.latitude >= self.south
            && point.latitude <= self.north
    }
}

/// Arithmetic mean of the points, `None` for an empty slice
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));
    Some(GeoPoint::new(lat / n, lon / n))
}

/// Centers of a square grid of `cell_side_deg` cells laid over `bbox`.
///
/// As many whole cells as fit along each axis are used and the grid is
/// centered in the box. Cells are emitted column by column from west to
/// east, each column from south to north.
pub fn square_grid(bbox: &BoundingBox, cell_side_deg: f64) -> Vec<GeoPoint> {
    if !(cell_side_deg > 0.0) || !cell_side_deg.is_finite() {
        return Vec::new();
    }

    let columns = (bbox.width().abs() / cell_side_deg + GRID_COUNT_EPSILON).floor() as usize;
    let rows = (bbox.height().abs() / cell_side_deg + GRID_COUNT_EPSILON).floor() as usize;
    let delta_x = (bbox.width() - columns as f64 * cell_side_deg) / 2.0;
    let delta_y = (bbox.height() - rows as f64 * cell_side_deg) / 2.0;
    let half = cell_side_deg / 2.0;

    let mut centers = Vec::with_capacity(columns * rows);
    for column in 0..columns {
        let lon = bbox.west + delta_x + column as f64 * cell_side_deg + half;
        for row in 0..rows {
            let lat = bbox.south + delta_y + row as f64 * cell_side_deg + half;
            centers.push(GeoPoint::new(lat, lon));
        }
    }
    centers
}

/// Planar intersection of segments `a1-a2` and `b1-b2` in lon/lat space.
///
/// Endpoints count as touching. Parallel or nearly parallel segments never
/// intersect.
pub fn segment_intersection(
    a1: &GeoPoint,
    a2: &GeoPoint,
    b1: &GeoPoint,
    b2: &GeoPoint,
) -> Option<GeoPoint> {
    let (x1, y1, x2, y2) = (a1.longitude, a1.latitude, a2.longitude, a2.latitude);
    let (x3, y3, x4, y4) = (b1.longitude, b1.latitude, b2.longitude, b2.latitude);

    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if denom.abs() < PARALLEL_EPSILON || !denom.is_finite() {
        return None;
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(GeoPoint::new(y1 + ua * (y2 - y1), x1 + ua * (x2 - x1)))
    } else {
        None
    }
}
