//! Configuration loading and management for the mototaxi tracker
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to the zone catalog and peak-hour policy
//! - Default configuration carries the built-in city zones and rush-hour windows
//! - Validation rejects catalogs and windows the rule engine cannot evaluate

use crate::domain::routes::{names_match, TimeOfDay, TrackerError, TrackerResult};
use crate::rules::PeakWindow;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Configuration file names looked up in the working directory
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["mototaxi.yaml", "mototaxi.yml", ".mototaxi.yaml"];

/// Fewest distinct zones any route may visit; configuration can only raise it
pub const MIN_ZONES_PER_ROUTE: usize = 3;

/// Main configuration structure for the tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Configuration format version
    pub version: String,
    /// Zone catalog definition
    pub zones: ZoneConfig,
    /// Half-open peak-hour windows; an end of "00:00" means the window runs to midnight
    #[serde(default = "default_peak_hours")]
    pub peak_hours: Vec<PeakWindow>,
    /// Minimum number of distinct zones a route must visit, at least [`MIN_ZONES_PER_ROUTE`]
    #[serde(default = "default_min_zones")]
    pub min_zones_per_route: usize,
}

/// Known zones and the restricted subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Every zone a route may visit, in menu order
    pub all: Vec<String>,
    /// Zones where mototaxi circulation is prohibited
    #[serde(default)]
    pub restricted: Vec<String>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        let all = [
            "Av. Balta",
            "Calle San Jose",
            "Elias Aguirre",
            "Vicente de la vega",
            "Saenz Penia",
            "Av Leguia",
            "Av Chilayo",
            "Lora y Lora",
            "La Victoria",
            "Mariscal Nieto",
            "Belaunde",
            "La Despensa",
        ];
        // Historic centre
        let restricted = [
            "Av. Balta",
            "Calle San Jose",
            "Elias Aguirre",
            "Vicente de la vega",
            "Saenz Penia",
        ];

        Self {
            all: all.iter().map(|z| z.to_string()).collect(),
            restricted: restricted.iter().map(|z| z.to_string()).collect(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            TrackerError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            TrackerError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> TrackerResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| TrackerError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Look for one of [`DEFAULT_CONFIG_FILES`] under `dir`, falling back to defaults
    pub fn discover<P: AsRef<Path>>(dir: P) -> TrackerResult<Self> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if candidate.exists() {
                tracing::debug!("Loading configuration from {}", candidate.display());
                return Self::load_from_file(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Get default configuration with the built-in zone catalog
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            zones: ZoneConfig::default(),
            peak_hours: default_peak_hours(),
            min_zones_per_route: default_min_zones(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> TrackerResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(TrackerError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.zones.all.is_empty() {
            return Err(TrackerError::config("Zone catalog must not be empty"));
        }

        for (i, zone) in self.zones.all.iter().enumerate() {
            if zone.trim().is_empty() {
                return Err(TrackerError::config(format!("Zone #{} has an empty name", i + 1)));
            }
            if self.zones.all[..i].iter().any(|earlier| names_match(earlier, zone)) {
                return Err(TrackerError::config(format!("Duplicate zone '{zone}'")));
            }
        }

        for zone in &self.zones.restricted {
            if !self.zones.all.iter().any(|known| names_match(known, zone)) {
                return Err(TrackerError::config(format!(
                    "Restricted zone '{zone}' is not in the zone catalog"
                )));
            }
        }

        for window in &self.peak_hours {
            if !window.is_well_formed() {
                return Err(TrackerError::config(format!(
                    "Peak window {}-{} must start before it ends",
                    window.start, window.end
                )));
            }
        }

        if self.min_zones_per_route < MIN_ZONES_PER_ROUTE {
            return Err(TrackerError::config(format!(
                "min_zones_per_route ({}) must be at least {}",
                self.min_zones_per_route, MIN_ZONES_PER_ROUTE
            )));
        }

        if self.min_zones_per_route > self.zones.all.len() {
            return Err(TrackerError::config(format!(
                "min_zones_per_route ({}) exceeds the {} zones in the catalog",
                self.min_zones_per_route,
                self.zones.all.len()
            )));
        }

        Ok(())
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> TrackerResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TrackerError::serialization(format!("Failed to serialize config: {e}")))
    }

    /// Stable fingerprint of the rule-relevant configuration
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        hasher.update(self.version.as_bytes());
        for zone in &self.zones.all {
            hasher.update(b"zone:");
            hasher.update(zone.to_lowercase().as_bytes());
        }

        // Restricted membership is a set, so order must not matter
        let mut restricted: Vec<String> =
            self.zones.restricted.iter().map(|z| z.to_lowercase()).collect();
        restricted.sort();
        for zone in restricted {
            hasher.update(b"restricted:");
            hasher.update(zone.as_bytes());
        }

        let mut windows: Vec<(u16, u16)> = self
            .peak_hours
            .iter()
            .map(|w| (w.start.minutes(), w.end.minutes()))
            .collect();
        windows.sort_unstable();
        for (start, end) in windows {
            hasher.update(start.to_be_bytes());
            hasher.update(end.to_be_bytes());
        }
        hasher.update(self.min_zones_per_route.to_be_bytes());

        let digest = hasher.finalize();
        digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_peak_hours() -> Vec<PeakWindow> {
    vec![
        PeakWindow::new(hm(7, 0), hm(9, 0)),
        PeakWindow::new(hm(17, 0), hm(19, 0)),
    ]
}

fn default_min_zones() -> usize {
    MIN_ZONES_PER_ROUTE
}

fn hm(hour: u16, minute: u16) -> TimeOfDay {
    TimeOfDay::from_minutes(hour * 60 + minute).unwrap_or(TimeOfDay::MIDNIGHT)
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: TrackerConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }

    /// Replace the zone catalog
    pub fn zones(mut self, all: Vec<String>, restricted: Vec<String>) -> Self {
        self.config.zones = ZoneConfig { all, restricted };
        self
    }

    /// Mark an existing zone as restricted
    pub fn restrict(mut self, zone: impl Into<String>) -> Self {
        self.config.zones.restricted.push(zone.into());
        self
    }

    /// Replace the peak-hour windows
    pub fn peak_hours(mut self, windows: Vec<PeakWindow>) -> Self {
        self.config.peak_hours = windows;
        self
    }

    pub fn min_zones_per_route(mut self, min: usize) -> Self {
        self.config.min_zones_per_route = min;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> TrackerResult<TrackerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
