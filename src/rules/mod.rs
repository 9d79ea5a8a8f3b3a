//! Rule engine: classifies routes against restricted zones and peak hours
//!
//! Architecture: Domain Services - Pure evaluation with no side effects
//! - One infraction point per visited zone that is restricted
//! - One extra point when the route time falls inside a peak-hour window
//! - Explanations are derived from the same checks as the count

use crate::config::TrackerConfig;
use crate::domain::routes::{InfractionBreakdown, Route, TimeOfDay};
use crate::zones::ZoneCatalog;
use serde::{Deserialize, Serialize};

/// Half-open time window `[start, end)`
///
/// An `end` of midnight closes the window at the end of the day, so
/// `22:00-00:00` covers `22:00` through `23:59`. Windows never wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl PeakWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn ends_at_midnight(&self) -> bool {
        self.end == TimeOfDay::MIDNIGHT
    }

    /// Whether the window covers at least one minute
    pub fn is_well_formed(&self) -> bool {
        if self.ends_at_midnight() {
            self.start != TimeOfDay::MIDNIGHT
        } else {
            self.start < self.end
        }
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start <= time && (self.ends_at_midnight() || time < self.end)
    }
}

/// Set of peak-hour windows; a time is peak if any window contains it
#[derive(Debug, Clone, Default)]
pub struct PeakHourPolicy {
    windows: Vec<PeakWindow>,
}

impl PeakHourPolicy {
    pub fn new(windows: Vec<PeakWindow>) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &[PeakWindow] {
        &self.windows
    }

    pub fn is_peak(&self, time: TimeOfDay) -> bool {
        self.windows.iter().any(|w| w.contains(time))
    }
}

/// Evaluates routes against a zone catalog and a peak-hour policy
#[derive(Debug, Clone)]
pub struct RuleEngine {
    catalog: ZoneCatalog,
    peak_hours: PeakHourPolicy,
}

impl RuleEngine {
    pub fn new(catalog: ZoneCatalog, peak_hours: PeakHourPolicy) -> Self {
        Self { catalog, peak_hours }
    }

    /// Build the engine described by a configuration
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            ZoneCatalog::from_config(&config.zones),
            PeakHourPolicy::new(config.peak_hours.clone()),
        )
    }

    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    pub fn peak_hours(&self) -> &PeakHourPolicy {
        &self.peak_hours
    }

    pub fn is_peak_hour(&self, time: TimeOfDay) -> bool {
        self.peak_hours.is_peak(time)
    }

    /// Infraction points for a route
    pub fn count_infractions(&self, route: &Route) -> u32 {
        self.count_for(route.time_of_day(), route.zones_visited())
    }

    /// A route is legal iff it has no infraction points
    pub fn is_legal(&self, route: &Route) -> bool {
        self.count_infractions(route) == 0
    }

    /// Restricted zones hit and the peak-hour flag for a route
    pub fn explain_infractions(&self, route: &Route) -> InfractionBreakdown {
        self.explain(route.time_of_day(), route.zones_visited())
    }

    /// Infraction points for a time and zone list that is not yet a route
    pub fn count_for<S: AsRef<str>>(&self, time: TimeOfDay, zones: &[S]) -> u32 {
        // Each visited zone scores at most once, however many restricted entries it matches
        let zone_hits = zones
            .iter()
            .map(|zone| zone.as_ref())
            .filter(|zone| self.catalog.is_restricted(zone))
            .count() as u32;

        zone_hits + u32::from(self.is_peak_hour(time))
    }

    /// Breakdown for a time and zone list that is not yet a route
    pub fn explain<S: AsRef<str>>(&self, time: TimeOfDay, zones: &[S]) -> InfractionBreakdown {
        InfractionBreakdown {
            restricted_zones_hit: zones
                .iter()
                .map(|zone| zone.as_ref())
                .filter(|zone| self.catalog.is_restricted(zone))
                .map(str::to_string)
                .collect(),
            is_peak_hour: self.is_peak_hour(time),
        }
    }

    /// Build a route with its legality fixed from its contents
    pub fn classify(
        &self,
        driver_name: impl Into<String>,
        time_of_day: TimeOfDay,
        zones_visited: Vec<String>,
    ) -> Route {
        let driver_name = driver_name.into();
        let infractions = self.count_for(time_of_day, &zones_visited);
        tracing::debug!(
            driver = %driver_name,
            time = %time_of_day,
            infractions,
            "Classified route"
        );
        Route::classified(driver_name, time_of_day, zones_visited, infractions == 0)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}
