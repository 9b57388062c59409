//! Synthetic bearing, power and DOA spectrum generation from station/target
//! geometry.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::algorithms::geodesy::{bearing, circular_delta, distance_km, normalize_angle};
use crate::core::{
    BearingSample, DoaSpectrum, GeoPoint, Station, DEFAULT_TARGET_LATITUDE, DEFAULT_TARGET_LONGITUDE,
    DEFAULT_TRANSMIT_POWER_DBM, FSPL_CONSTANT_DB,
};
use crate::simulation::noise::{NoiseSource, RandomNoise};
use crate::validation::data::SampleValidator;

/// Path loss is evaluated no closer than this to avoid log10(0) (metres)
const MIN_PATH_DISTANCE_M: f64 = 1.0;

/// Simulated emitter and measurement model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Assumed emitter position
    pub target: GeoPoint,
    /// Emitter transmit power (dBm)
    pub transmit_power_dbm: f64,
    /// Bearing noise is uniform in +/- this many degrees
    pub bearing_noise_deg: f64,
    /// Shadowing is uniform in +/- this many dB
    pub shadowing_db: f64,
    /// Width of the simulated array response (degrees)
    pub doa_sigma_deg: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            target: GeoPoint::new(DEFAULT_TARGET_LATITUDE, DEFAULT_TARGET_LONGITUDE),
            transmit_power_dbm: DEFAULT_TRANSMIT_POWER_DBM,
            bearing_noise_deg: 5.0,
            shadowing_db: 1.0,
            doa_sigma_deg: 15.0,
        }
    }
}

/// Free-space path loss (dB) for a distance in metres and a frequency in Hz
pub fn free_space_path_loss_db(distance_m: f64, freq_hz: f64) -> f64 {
    20.0 * distance_m.log10() + 20.0 * freq_hz.log10() - FSPL_CONSTANT_DB
}

/// 0-10 confidence from range and received power.
///
/// Closer stations and stronger signals score higher; power maps roughly
/// -150..-70 dBm onto 0..1.
pub fn signal_confidence(distance_km: f64, received_power_dbm: f64) -> f64 {
    let distance_factor = (1.0 / (1.0 + distance_km / 5.0)).clamp(0.0, 1.0);
    let power_factor = ((received_power_dbm + 150.0) / 80.0).clamp(0.0, 1.0);
    10.0 * (0.4 * distance_factor + 0.6 * power_factor).clamp(0.0, 1.0)
}

/// Wrapped Gaussian array response peaked at `center_deg`, normalized to a
/// maximum of 1.0
pub fn doa_spectrum(center_deg: f64, sigma_deg: f64) -> DoaSpectrum {
    let two_sigma_sq = 2.0 * sigma_deg * sigma_deg;
    let mut spectrum = DoaSpectrum::from_fn(|angle| {
        let d = circular_delta(angle, center_deg);
        (-(d * d) / two_sigma_sq).exp()
    });
    spectrum.normalize();
    spectrum
}

/// Produces one noisy bearing sample per active station with a usable
/// position and frequency
pub struct DataSimulator<N: NoiseSource = RandomNoise> {
    config: SimulatorConfig,
    noise: N,
    validator: SampleValidator,
}

impl DataSimulator<RandomNoise> {
    /// Default model with entropy-seeded noise
    pub fn new() -> Self {
        Self::with_noise(SimulatorConfig::default(), RandomNoise::new())
    }
}

impl Default for DataSimulator<RandomNoise> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NoiseSource> DataSimulator<N> {
    pub fn with_noise(config: SimulatorConfig, noise: N) -> Self {
        Self {
            config,
            noise,
            validator: SampleValidator::new(),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Generate samples stamped with the current wall-clock time.
    ///
    /// Same skipping rules as [`generate_at`](Self::generate_at).
    pub fn generate(&mut self, stations: &[Station]) -> Vec<BearingSample> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.generate_at(stations, now_ms)
    }

    /// Generate samples sharing `timestamp_ms`, in station order.
    ///
    /// Normally one sample per active station. Inactive stations are skipped.
    /// The exception: an active station with a non-finite or out-of-range
    /// position, or a non-finite or non-positive frequency, yields no sample
    /// and logs a warning, so the output may be shorter than the active
    /// station count.
    pub fn generate_at(&mut self, stations: &[Station], timestamp_ms: u64) -> Vec<BearingSample> {
        let mut out = Vec::with_capacity(stations.len());

        for station in stations.iter().filter(|s| s.active) {
            if let Err(e) = self.validator.validate_station(station) {
                warn!("skipping station in simulation: {}", e);
                continue;
            }
            out.push(self.sample_station(station, timestamp_ms));
        }

        debug!(
            "generated {} sample(s) from {} station(s)",
            out.len(),
            stations.len()
        );
        out
    }

    fn sample_station(&mut self, station: &Station, timestamp_ms: u64) -> BearingSample {
        let position = station.position();
        let target = self.config.target;

        let true_bearing = bearing(&position, &target);
        let bearing_noise = self
            .noise
            .uniform(-self.config.bearing_noise_deg, self.config.bearing_noise_deg);
        let measured_bearing = normalize_angle(true_bearing + bearing_noise);

        let dist_km = distance_km(&position, &target);
        let dist_m = (dist_km * 1000.0).max(MIN_PATH_DISTANCE_M);
        let path_loss = free_space_path_loss_db(dist_m, station.freq);
        let shadowing = self
            .noise
            .uniform(-self.config.shadowing_db, self.config.shadowing_db);
        let received_power = self.config.transmit_power_dbm - path_loss + shadowing;

        // The spectrum follows the true bearing: it is the array's raw response,
        // independent of the bearing-estimation noise.
        let doa_array = doa_spectrum(true_bearing, self.config.doa_sigma_deg);

        BearingSample {
            timestamp: timestamp_ms,
            station_id: station.station_id,
            latitude: station.latitude,
            longitude: station.longitude,
            radio_bearing: measured_bearing,
            confidence: signal_confidence(dist_km, received_power),
            power: received_power,
            frequency: station.freq,
            doa_array,
        }
    }
}
