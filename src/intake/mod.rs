//! Validation of raw route requests coming from the terminal or batch files
//!
//! Architecture: Anti-Corruption Layer - Untrusted text becomes checked route input
//! - Every failure names the constraint it broke
//! - Zone names are replaced by their canonical catalog spelling
//! - Nothing here touches the registry, so a rejection cannot leave partial state

use crate::domain::routes::{names_match, RejectedInput, TimeOfDay, TrackerError, TrackerResult};
use crate::zones::ZoneCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// How a request refers to a zone: by catalog name or by 1-based menu option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneSelector {
    Index(usize),
    Name(String),
}

impl ZoneSelector {
    /// Parse terminal text: digits select a menu option, anything else is a name
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(text.to_string()),
        }
    }

    /// Canonical zone name, or why the selector does not name a zone
    pub fn resolve<'a>(&self, catalog: &'a ZoneCatalog) -> Result<&'a str, RejectedInput> {
        match self {
            Self::Index(index) => {
                catalog
                    .zone_at(*index)
                    .ok_or(RejectedInput::ZoneIndexOutOfRange {
                        index: *index,
                        available: catalog.len(),
                    })
            }
            Self::Name(name) => catalog
                .resolve(name)
                .ok_or_else(|| RejectedInput::UnknownZone { zone: name.clone() }),
        }
    }
}

impl fmt::Display for ZoneSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for ZoneSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<usize> for ZoneSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Unvalidated request to register a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Driver name as typed
    pub driver: String,
    /// Departure time as "HH:mm" text
    pub time: String,
    /// Zones in visit order
    pub zones: Vec<ZoneSelector>,
}

impl RouteRequest {
    pub fn new(
        driver: impl Into<String>,
        time: impl Into<String>,
        zones: impl IntoIterator<Item = impl Into<ZoneSelector>>,
    ) -> Self {
        Self {
            driver: driver.into(),
            time: time.into(),
            zones: zones.into_iter().map(Into::into).collect(),
        }
    }
}

/// Route input that passed every check and can be classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRoute {
    pub driver_name: String,
    pub time_of_day: TimeOfDay,
    pub zones_visited: Vec<String>,
}

/// Check a request against the catalog and minimum zone count
pub fn validate(
    request: &RouteRequest,
    catalog: &ZoneCatalog,
    min_zones: usize,
) -> Result<ValidatedRoute, RejectedInput> {
    let driver_name = request.driver.trim();
    if driver_name.is_empty() {
        return Err(RejectedInput::EmptyDriverName);
    }

    let time_of_day: TimeOfDay = request.time.parse()?;

    if request.zones.len() < min_zones {
        return Err(RejectedInput::TooFewZones {
            found: request.zones.len(),
            required: min_zones,
        });
    }

    let mut zones_visited: Vec<String> = Vec::with_capacity(request.zones.len());
    for selector in &request.zones {
        let zone = selector.resolve(catalog)?;
        if zones_visited.iter().any(|seen| names_match(seen, zone)) {
            return Err(RejectedInput::DuplicateZone {
                zone: zone.to_string(),
            });
        }
        zones_visited.push(zone.to_string());
    }

    Ok(ValidatedRoute {
        driver_name: driver_name.to_string(),
        time_of_day,
        zones_visited,
    })
}

/// A list of route requests read from a YAML or JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteBatch {
    pub routes: Vec<RouteRequest>,
}

impl RouteBatch {
    /// Load a batch file; JSON documents parse as YAML
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let contents = fs::read_to_string(&path)?;
        Self::load_from_str(&contents).map_err(|e| {
            TrackerError::serialization(format!(
                "Failed to parse route batch '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn load_from_str(content: &str) -> TrackerResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| TrackerError::serialization(format!("Invalid route batch: {e}")))
    }
}
