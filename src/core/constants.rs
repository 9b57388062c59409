//! Physical constants and system parameters

/// Mean Earth radius (km), same sphere the geodesic helpers use everywhere
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Number of bins in a direction-of-arrival spectrum, one per integer degree
pub const DOA_BINS: usize = 360;

/// Free-space path loss constant for metres and hertz (dB)
pub const FSPL_CONSTANT_DB: f64 = 147.55;

/// Transmit power assumed for the simulated emitter (dBm)
pub const DEFAULT_TRANSMIT_POWER_DBM: f64 = 20.0;

/// Assumed emitter latitude for the simulator (degrees)
pub const DEFAULT_TARGET_LATITUDE: f64 = 50.85;

/// Assumed emitter longitude for the simulator (degrees)
pub const DEFAULT_TARGET_LONGITUDE: f64 = 7.05;

/// Length of the bearing rays used for intersection testing (km)
pub const DEFAULT_RAY_LENGTH_KM: f64 = 100.0;

/// Target number of heatmap cells along the longer bbox axis
pub const DEFAULT_GRID_CELLS: usize = 250;

/// Padding added on each side of the heatmap bounding box (degrees)
pub const DEFAULT_BBOX_PADDING_DEG: f64 = 0.2;

/// Points closer than this are treated as coincident by `bearing` (km)
pub const COINCIDENT_DISTANCE_KM: f64 = 0.001;
