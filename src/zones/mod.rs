//! Zone catalog: the known city zones and the restricted subset
//!
//! Architecture: Reference Data - Built once from configuration, read-only afterwards
//! - All lookups are case-insensitive
//! - Canonical spellings come from the catalog, never from user input

use crate::config::ZoneConfig;
use crate::domain::routes::names_match;
use serde::Serialize;

/// Immutable set of known zones with restricted-zone membership
#[derive(Debug, Clone, Serialize)]
pub struct ZoneCatalog {
    all_zones: Vec<String>,
    restricted_zones: Vec<String>,
}

impl ZoneCatalog {
    /// Create a catalog from zone names; `restricted` should be a subset of `all`
    pub fn new(all: Vec<String>, restricted: Vec<String>) -> Self {
        Self {
            all_zones: all,
            restricted_zones: restricted,
        }
    }

    /// Create a catalog from the `zones` section of the configuration
    pub fn from_config(config: &ZoneConfig) -> Self {
        Self::new(config.all.clone(), config.restricted.clone())
    }

    /// Every known zone, in catalog order
    pub fn all_zones(&self) -> &[String] {
        &self.all_zones
    }

    pub fn restricted_zones(&self) -> &[String] {
        &self.restricted_zones
    }

    /// Whether `zone` is restricted
    pub fn is_restricted(&self, zone: &str) -> bool {
        self.restricted_zones.iter().any(|r| names_match(r, zone))
    }

    pub fn contains(&self, zone: &str) -> bool {
        self.resolve(zone).is_some()
    }

    /// Canonical catalog spelling for `zone`
    pub fn resolve(&self, zone: &str) -> Option<&str> {
        self.all_zones
            .iter()
            .find(|known| names_match(known, zone.trim()))
            .map(String::as_str)
    }

    /// Zone for a 1-based menu option
    pub fn zone_at(&self, option: usize) -> Option<&str> {
        option
            .checked_sub(1)
            .and_then(|index| self.all_zones.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.all_zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_zones.is_empty()
    }
}

impl Default for ZoneCatalog {
    fn default() -> Self {
        Self::from_config(&ZoneConfig::default())
    }
}
