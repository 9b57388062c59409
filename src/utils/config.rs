use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::algorithms::triangulation::SolverConfig;
use crate::core::{AntennaType, Station};
use crate::simulation::simulator::SimulatorConfig;
use crate::validation::data::SampleValidator;
use crate::validation::error::{RdfError, RdfResult};

/// Default cadence of the generate/compute/broadcast loop (milliseconds)
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 2000;

/// System-wide configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Simulated emitter and measurement model
    pub simulator: SimulatorConfig,
    /// Fusion solver tunables
    pub solver: SolverConfig,
    /// Station registry, in broadcast order
    pub stations: Vec<Station>,
    /// Delay between update cycles (milliseconds)
    pub update_interval_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            solver: SolverConfig::default(),
            stations: default_stations(),
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
        }
    }
}

/// The two KrakenSDR receivers of the reference deployment near Bonn
pub fn default_stations() -> Vec<Station> {
    let kraken = |station_id: u32, name: &str, apikey: &str, latitude: f64, longitude: f64| Station {
        station_id,
        name: name.to_string(),
        apikey: apikey.to_string(),
        latitude,
        longitude,
        freq: 433_420_000.0,
        antenna_type: AntennaType::Uca,
        active: true,
        group_id: 1531,
    };

    vec![
        kraken(3826, "kraken_one", "c7301b17829fd3d6", 50.73698963565033, 7.009624403772563),
        kraken(3827, "kraken_two", "6c72753aaae0141b", 50.75053003467639, 7.130660264638948),
    ]
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Problems that make the configuration unusable
    pub errors: Vec<RdfError>,
    /// Accepted but suspicious settings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error, if any
    pub fn into_result(self) -> RdfResult<()> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Main configuration manager
#[derive(Debug)]
pub struct ConfigurationManager {
    /// Current system configuration
    system_config: SystemConfig,
    /// Configuration file path
    config_file_path: Option<String>,
    /// Whether configuration has been modified
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self {
            system_config: SystemConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RdfResult<Self> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    /// Get current system configuration
    pub fn get_system_config(&self) -> &SystemConfig {
        &self.system_config
    }

    /// Replace the system configuration after validation
    pub fn update_system_config(&mut self, config: SystemConfig) -> RdfResult<()> {
        self.validate_system_config(&config).into_result()?;
        self.system_config = config;
        self.is_modified = true;
        Ok(())
    }

    pub fn stations(&self) -> &[Station] {
        &self.system_config.stations
    }

    pub fn get_station(&self, station_id: u32) -> Option<&Station> {
        self.system_config
            .stations
            .iter()
            .find(|s| s.station_id == station_id)
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> RdfResult<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|source| RdfError::Io {
            path: path_str.clone(),
            source,
        })?;
        let config: SystemConfig = serde_json::from_str(&content)?;

        let validation = self.validate_system_config(&config);
        for w in &validation.warnings {
            warn!("{}: {}", path_str, w);
        }
        validation.into_result()?;

        info!(
            "loaded configuration from {} ({} station(s))",
            path_str,
            config.stations.len()
        );
        self.system_config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> RdfResult<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.system_config)?;
        fs::write(&path, content).map_err(|source| RdfError::Io {
            path: path_str.clone(),
            source,
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> RdfResult<()> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(RdfError::invalid_parameter(
                "config_file_path",
                "<none>",
                "no file path set for saving configuration",
            )),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Retune a station. Returns the previous frequency.
    pub fn set_station_frequency(&mut self, station_id: u32, freq_hz: f64) -> RdfResult<f64> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(RdfError::invalid_parameter(
                "freq",
                freq_hz,
                "frequency must be positive",
            ));
        }

        let station = self.station_mut(station_id)?;
        let old_value = station.freq;
        station.freq = freq_hz;
        self.is_modified = true;
        info!("station {} retuned {} Hz -> {} Hz", station_id, old_value, freq_hz);
        Ok(old_value)
    }

    /// Enable or disable a station. Returns the previous state.
    pub fn set_station_active(&mut self, station_id: u32, active: bool) -> RdfResult<bool> {
        let station = self.station_mut(station_id)?;
        let old_value = station.active;
        station.active = active;
        self.is_modified = true;
        Ok(old_value)
    }

    fn station_mut(&mut self, station_id: u32) -> RdfResult<&mut Station> {
        self.system_config
            .stations
            .iter_mut()
            .find(|s| s.station_id == station_id)
            .ok_or(RdfError::UnknownStation(station_id))
    }

    /// Validate a system configuration without applying it
    pub fn validate_system_config(&self, config: &SystemConfig) -> ValidationResult {
        let mut result = ValidationResult::default();
        let validator = SampleValidator::new();

        let mut seen = HashSet::new();
        for station in &config.stations {
            if !seen.insert(station.station_id) {
                result.errors.push(RdfError::DuplicateStation(station.station_id));
            }
            if let Err(e) = validator.validate_station(station) {
                result.errors.push(e.into());
            }
        }
        if config.stations.iter().filter(|s| s.active).count() < 2 {
            result
                .warnings
                .push("fewer than 2 active stations, every fix will be degenerate".to_string());
        }

        let solver = &config.solver;
        if !(solver.ray_length_km.is_finite() && solver.ray_length_km > 0.0) {
            result.errors.push(RdfError::invalid_parameter(
                "ray_length_km",
                solver.ray_length_km,
                "must be positive",
            ));
        }
        if solver.grid_cells == 0 {
            result.errors.push(RdfError::invalid_parameter(
                "grid_cells",
                solver.grid_cells,
                "must be non-zero",
            ));
        } else if solver.grid_cells > 1000 {
            result
                .warnings
                .push("more than 1000 heatmap cells per axis is slow to render".to_string());
        }
        if !(solver.bbox_padding_deg.is_finite() && solver.bbox_padding_deg >= 0.0) {
            result.errors.push(RdfError::invalid_parameter(
                "bbox_padding_deg",
                solver.bbox_padding_deg,
                "must be non-negative",
            ));
        }

        let sim = &config.simulator;
        let target = sim.target;
        if !target.is_finite() || target.latitude.abs() > 90.0 || target.longitude.abs() > 180.0 {
            result.errors.push(RdfError::invalid_parameter(
                "simulator.target",
                format!("({}, {})", target.latitude, target.longitude),
                "latitude must be within [-90, 90] and longitude within [-180, 180]",
            ));
        }
        for (parameter, value) in [
            ("bearing_noise_deg", sim.bearing_noise_deg),
            ("shadowing_db", sim.shadowing_db),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                result
                    .errors
                    .push(RdfError::invalid_parameter(parameter, value, "must be non-negative"));
            }
        }
        if !(sim.doa_sigma_deg.is_finite() && sim.doa_sigma_deg > 0.0) {
            result.errors.push(RdfError::invalid_parameter(
                "doa_sigma_deg",
                sim.doa_sigma_deg,
                "must be positive",
            ));
        }
        if !sim.transmit_power_dbm.is_finite() {
            result.errors.push(RdfError::invalid_parameter(
                "transmit_power_dbm",
                sim.transmit_power_dbm,
                "must be finite",
            ));
        }

        if config.update_interval_ms == 0 {
            result.errors.push(RdfError::invalid_parameter(
                "update_interval_ms",
                config.update_interval_ms,
                "must be non-zero",
            ));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rdf_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_default_system_config() {
        let config = SystemConfig::default();
        assert_eq!(config.update_interval_ms, 2000);
        assert_eq!(config.stations.len(), 2);
        assert_eq!(config.stations[0].station_id, 3826);
        assert_eq!(config.stations[1].name, "kraken_two");
        assert_eq!(config.stations[0].apikey, "c7301b17829fd3d6");
        assert_eq!(config.stations[1].apikey, "6c72753aaae0141b");
        assert!(config.stations.iter().all(|s| s.active && s.freq == 433_420_000.0));
    }

    #[test]
    fn test_default_config_is_valid() {
        let manager = ConfigurationManager::new();
        let validation = manager.validate_system_config(manager.get_system_config());
        assert!(validation.is_valid());
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn test_invalid_solver_rejected() {
        let mut manager = ConfigurationManager::new();
        let mut config = SystemConfig::default();
        config.solver.ray_length_km = -1.0;
        config.solver.grid_cells = 0;

        let validation = manager.validate_system_config(&config);
        assert_eq!(validation.errors.len(), 2);
        assert!(manager.update_system_config(config).is_err());
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_duplicate_station_rejected() {
        let manager = ConfigurationManager::new();
        let mut config = SystemConfig::default();
        config.stations[1].station_id = 3826;
        let err = manager.validate_system_config(&config).into_result().unwrap_err();
        assert!(matches!(err, RdfError::DuplicateStation(3826)));
    }

    #[test]
    fn test_bad_station_position_rejected() {
        let manager = ConfigurationManager::new();
        let mut config = SystemConfig::default();
        config.stations[0].latitude = 95.0;
        let err = manager.validate_system_config(&config).into_result().unwrap_err();
        assert!(matches!(err, RdfError::InvalidStation(_)));
    }

    #[test]
    fn test_single_station_warns() {
        let manager = ConfigurationManager::new();
        let mut config = SystemConfig::default();
        config.stations.truncate(1);
        let validation = manager.validate_system_config(&config);
        assert!(validation.is_valid());
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_change_frequency() {
        let mut manager = ConfigurationManager::new();
        let old = manager.set_station_frequency(3827, 145_500_000.0).unwrap();
        assert_eq!(old, 433_420_000.0);
        assert_eq!(manager.get_station(3827).unwrap().freq, 145_500_000.0);
        assert!(manager.is_modified());

        assert!(matches!(
            manager.set_station_frequency(1, 1.0),
            Err(RdfError::UnknownStation(1))
        ));
        assert!(matches!(
            manager.set_station_frequency(3826, 0.0),
            Err(RdfError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_station_enable_disable() {
        let mut manager = ConfigurationManager::new();
        assert_eq!(manager.set_station_active(3826, false).unwrap(), true);
        assert!(!manager.get_station(3826).unwrap().active);
        assert!(manager.set_station_active(9999, true).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let path = temp_path("roundtrip");
        let mut manager = ConfigurationManager::new();
        manager.set_station_frequency(3826, 144_800_000.0).unwrap();
        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        let (a, b) = (loaded.get_system_config(), manager.get_system_config());
        assert_eq!(a.stations.len(), b.stations.len());
        for (x, y) in a.stations.iter().zip(&b.stations) {
            assert_eq!(x.station_id, y.station_id);
            assert_eq!(x.name, y.name);
            assert_eq!(x.antenna_type, y.antenna_type);
            assert!((x.latitude - y.latitude).abs() < 1e-12);
            assert!((x.freq - y.freq).abs() < 1e-3);
        }
        assert_eq!(loaded.get_station(3826).map(|s| s.freq), Some(144_800_000.0));
        assert_eq!(a.solver, b.solver);
        assert_eq!(a.update_interval_ms, b.update_interval_ms);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_path("partial");
        fs::write(&path, r#"{"update_interval_ms": 500}"#).unwrap();

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.get_system_config().update_interval_ms, 500);
        assert_eq!(loaded.stations().len(), 2);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_load_errors() {
        let missing = ConfigurationManager::from_file(temp_path("does_not_exist"));
        assert!(matches!(missing, Err(RdfError::Io { .. })));

        let path = temp_path("malformed");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ConfigurationManager::from_file(&path),
            Err(RdfError::Json(_))
        ));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_save_without_path() {
        let mut manager = ConfigurationManager::new();
        assert!(manager.save().is_err());
    }
}
