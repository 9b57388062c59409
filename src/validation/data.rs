use std::borrow::Cow;

use log::{debug, warn};
use thiserror::Error;

use crate::core::{BearingSample, Station, DOA_BINS};

/// Reasons a station or bearing sample cannot take part in a fix
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("station {station_id}: non-finite {field}")]
    NonFinite { station_id: u32, field: &'static str },
    #[error("station {station_id}: latitude {latitude} outside [-90, 90]")]
    LatitudeOutOfRange { station_id: u32, latitude: f64 },
    #[error("station {station_id}: longitude {longitude} outside [-180, 180]")]
    LongitudeOutOfRange { station_id: u32, longitude: f64 },
    #[error("station {station_id}: frequency {freq} Hz must be positive")]
    InvalidFrequency { station_id: u32, freq: f64 },
}

/// Screens stations and bearing samples before they reach the numeric core.
///
/// Anything that would turn the solver output into NaN is rejected here, so
/// a bad sample simply contributes nothing.
#[derive(Debug, Clone, Default)]
pub struct SampleValidator;

impl SampleValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_station(&self, station: &Station) -> Result<(), ValidationError> {
        check_position(station.station_id, station.latitude, station.longitude)?;
        if !station.freq.is_finite() || station.freq <= 0.0 {
            return Err(ValidationError::InvalidFrequency {
                station_id: station.station_id,
                freq: station.freq,
            });
        }
        Ok(())
    }

    pub fn validate_sample(&self, sample: &BearingSample) -> Result<(), ValidationError> {
        let id = sample.station_id;
        check_position(id, sample.latitude, sample.longitude)?;
        for (field, value) in [
            ("bearing", sample.radio_bearing),
            ("confidence", sample.confidence),
            ("power", sample.power),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { station_id: id, field });
            }
        }
        Ok(())
    }

    /// Samples that passed validation, in input order. Borrows when nothing
    /// had to be dropped.
    pub fn usable_samples<'a>(&self, samples: &'a [BearingSample]) -> Cow<'a, [BearingSample]> {
        for s in samples {
            if s.doa_array.len() != DOA_BINS {
                debug!(
                    "station {}: DOA spectrum has {} bins, missing bins read as 0",
                    s.station_id,
                    s.doa_array.len()
                );
            }
        }

        let rejected = samples
            .iter()
            .filter_map(|s| self.validate_sample(s).err())
            .inspect(|e| warn!("dropping bearing sample: {}", e))
            .count();
        if rejected == 0 {
            return Cow::Borrowed(samples);
        }

        Cow::Owned(
            samples
                .iter()
                .filter(|s| self.validate_sample(s).is_ok())
                .cloned()
                .collect(),
        )
    }
}

fn check_position(station_id: u32, latitude: f64, longitude: f64) -> Result<(), ValidationError> {
    if !latitude.is_finite() {
        return Err(ValidationError::NonFinite { station_id, field: "latitude" });
    }
    if !longitude.is_finite() {
        return Err(ValidationError::NonFinite { station_id, field: "longitude" });
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::LatitudeOutOfRange { station_id, latitude });
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::LongitudeOutOfRange { station_id, longitude });
    }
    Ok(())
}
