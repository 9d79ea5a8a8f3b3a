//! Mototaxi Tracker - Route legality and infraction reporting for city mototaxis
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure rule evaluation separated from terminal and file concerns
//! - Raw requests are validated before anything reaches the registry
//! - The tracker facade is the single entry point used by the CLI

pub mod config;
pub mod domain;
pub mod intake;
pub mod registry;
pub mod report;
pub mod rules;
pub mod zones;

// Re-export main types for convenient access
pub use domain::routes::{
    InfractionBreakdown, RejectedInput, Route, TimeOfDay, TrackerError, TrackerResult,
};

pub use config::{ConfigBuilder, TrackerConfig, ZoneConfig};

pub use intake::{RouteBatch, RouteRequest, ValidatedRoute, ZoneSelector};

pub use registry::RouteRegistry;

pub use report::{DriverInfractions, InfractionReporter, OutputFormat, ReportFormatter, ReportOptions};

pub use rules::{PeakHourPolicy, PeakWindow, RuleEngine};

pub use zones::ZoneCatalog;

use std::path::Path;

/// Main tracker: owns the rule engine, the route registry and the formatter
pub struct RouteTracker {
    config: TrackerConfig,
    engine: RuleEngine,
    registry: RouteRegistry,
    report_formatter: ReportFormatter,
}

/// Outcome of registering a batch of requests
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Number of routes added to the registry
    pub registered: usize,
    /// Requests that failed validation, with their position in the batch
    pub rejected: Vec<(usize, RejectedInput)>,
}

impl RouteTracker {
    /// Create a new tracker with the given configuration
    pub fn new_with_config(config: TrackerConfig) -> TrackerResult<Self> {
        config.validate()?;
        let engine = RuleEngine::from_config(&config);

        Ok(Self {
            config,
            engine,
            registry: RouteRegistry::new(),
            report_formatter: ReportFormatter::default(),
        })
    }

    /// Create a tracker with default configuration
    pub fn new() -> TrackerResult<Self> {
        Self::new_with_config(TrackerConfig::default())
    }

    /// Create a tracker loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let config = TrackerConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &ZoneCatalog {
        self.engine.catalog()
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn formatter(&self) -> &ReportFormatter {
        &self.report_formatter
    }

    /// Check a raw request without registering it
    pub fn validate(&self, request: &RouteRequest) -> Result<ValidatedRoute, RejectedInput> {
        intake::validate(request, self.catalog(), self.config.min_zones_per_route)
    }

    /// Validate, classify and store a raw request
    ///
    /// On rejection the registry is left untouched.
    pub fn register(&mut self, request: &RouteRequest) -> TrackerResult<&Route> {
        let validated = self.validate(request).map_err(|rejection| {
            tracing::warn!(driver = %request.driver, "Route rejected: {}", rejection);
            rejection
        })?;
        Ok(self.register_validated(validated))
    }

    /// Classify and store input that already passed validation
    pub fn register_validated(&mut self, route: ValidatedRoute) -> &Route {
        let route = self
            .engine
            .classify(route.driver_name, route.time_of_day, route.zones_visited);
        self.registry.add(route)
    }

    /// Register every request of a batch, collecting rejections instead of stopping
    pub fn register_batch(&mut self, batch: &RouteBatch) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (position, request) in batch.routes.iter().enumerate() {
            match self.validate(request) {
                Ok(validated) => {
                    self.register_validated(validated);
                    outcome.registered += 1;
                }
                Err(rejection) => {
                    tracing::warn!(position, driver = %request.driver, "Skipping route: {}", rejection);
                    outcome.rejected.push((position, rejection));
                }
            }
        }
        outcome
    }

    /// Every registered route in insertion order
    pub fn routes(&self) -> &[Route] {
        self.registry.all()
    }

    pub fn infracting_routes(&self) -> Vec<&Route> {
        self.registry.filter_by_legality(false)
    }

    pub fn legal_routes(&self) -> Vec<&Route> {
        self.registry.filter_by_legality(true)
    }

    /// Routes registered under `driver`, ignoring case
    pub fn routes_for_driver(&self, driver: &str) -> Vec<&Route> {
        self.registry.find_by_driver(driver)
    }

    pub fn explain(&self, route: &Route) -> InfractionBreakdown {
        self.engine.explain_infractions(route)
    }

    /// Drivers ranked by total infractions
    pub fn infraction_report(&self) -> Vec<DriverInfractions> {
        InfractionReporter::report(&self.registry, &self.engine)
    }

    /// Format a route with its infraction breakdown
    pub fn format_route(&self, route: &Route, format: OutputFormat) -> TrackerResult<String> {
        self.report_formatter
            .format_route(route, &self.explain(route), format)
    }

    /// Format a titled list of routes
    pub fn format_routes(
        &self,
        title: &str,
        routes: &[&Route],
        empty_message: &str,
        format: OutputFormat,
    ) -> TrackerResult<String> {
        self.report_formatter
            .format_routes(title, routes, &self.engine, empty_message, format)
    }

    /// Format the current infraction ranking
    pub fn format_infraction_report(&self, format: OutputFormat) -> TrackerResult<String> {
        self.report_formatter
            .format_ranking(&self.infraction_report(), format)
    }

    pub fn config_fingerprint(&self) -> String {
        self.config.fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn request(driver: &str, time: &str, zones: [&str; 3]) -> RouteRequest {
        RouteRequest::new(driver, time, zones)
    }

    #[test]
    fn test_register_classifies_route() {
        let mut tracker = RouteTracker::new().unwrap();

        let route = tracker
            .register(&request("Carlos", "08:00", ["Av. Balta", "Belaunde", "Calle San Jose"]))
            .unwrap();
        assert!(!route.is_legal());
        assert_eq!(tracker.engine().count_infractions(&tracker.routes()[0]), 3);

        let route = tracker
            .register(&request("Ana", "12:00", ["Av Leguia", "Mariscal Nieto", "Belaunde"]))
            .unwrap();
        assert!(route.is_legal());

        assert_eq!(tracker.routes().len(), 2);
        assert_eq!(tracker.infracting_routes().len(), 1);
        assert_eq!(tracker.legal_routes().len(), 1);
    }

    #[test]
    fn test_rejection_leaves_registry_unchanged() {
        let mut tracker = RouteTracker::new().unwrap();
        tracker
            .register(&request("Ana", "12:00", ["Av Leguia", "Mariscal Nieto", "Belaunde"]))
            .unwrap();

        let bad_requests = [
            request("", "12:00", ["Av Leguia", "Mariscal Nieto", "Belaunde"]),
            request("Ana", "25:00", ["Av Leguia", "Mariscal Nieto", "Belaunde"]),
            request("Ana", "12:00", ["Av Leguia", "Av Leguia", "Belaunde"]),
            request("Ana", "12:00", ["Av Leguia", "Mariscal Nieto", "Atlantis"]),
            RouteRequest::new("Ana", "12:00", ["Belaunde"]),
        ];
        for bad in &bad_requests {
            let error = tracker.register(bad).unwrap_err();
            assert!(error.as_rejection().is_some(), "expected rejection for {bad:?}");
        }

        assert_eq!(tracker.routes().len(), 1);
    }

    #[test]
    fn test_end_to_end_report() {
        let mut tracker = RouteTracker::new().unwrap();
        tracker
            .register(&request("A", "07:30", ["Av. Balta", "Belaunde", "La Victoria"]))
            .unwrap();
        tracker
            .register(&request("B", "08:00", ["Av. Balta", "Calle San Jose", "Belaunde"]))
            .unwrap();
        tracker
            .register(&request("b", "10:00", ["Elias Aguirre", "Saenz Penia", "Belaunde"]))
            .unwrap();
        tracker
            .register(&request("C", "10:00", ["Av. Balta", "Elias Aguirre", "Belaunde"]))
            .unwrap();

        let report: Vec<(String, u32)> = tracker
            .infraction_report()
            .into_iter()
            .map(|row| (row.driver_name, row.total_infractions))
            .collect();
        assert_eq!(
            report,
            vec![("B".to_string(), 5), ("A".to_string(), 2), ("C".to_string(), 2)]
        );
        assert_eq!(tracker.routes_for_driver("B").len(), 2);
    }

    #[test]
    fn test_register_batch_collects_rejections() {
        let mut tracker = RouteTracker::new().unwrap();
        let batch = RouteBatch {
            routes: vec![
                request("A", "10:00", ["Av. Balta", "Belaunde", "La Victoria"]),
                request("B", "bad", ["Av. Balta", "Belaunde", "La Victoria"]),
                request("C", "12:00", ["Belaunde", "La Victoria", "La Despensa"]),
            ],
        };

        let outcome = tracker.register_batch(&batch);
        assert_eq!(outcome.registered, 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, 1);
        assert_eq!(tracker.routes().len(), 2);
    }

    #[test]
    fn test_custom_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mototaxi.yaml");
        fs::write(
            &path,
            r#"
version: "1.0"
zones:
  all: [Centro, Norte, Sur, Este]
  restricted: [Centro]
peak_hours: []
"#,
        )
        .unwrap();

        let mut tracker = RouteTracker::from_config_file(&path).unwrap();
        let route = tracker
            .register(&RouteRequest::new("A", "08:00", ["norte", "sur", "este"]))
            .unwrap();
        assert!(route.is_legal());
        assert_eq!(route.zones_visited(), ["Norte", "Sur", "Este"]);

        let route = tracker
            .register(&RouteRequest::new("A", "08:00", ["centro", "sur", "este"]))
            .unwrap();
        assert!(!route.is_legal());
    }

    #[test]
    fn test_config_cannot_lower_zone_minimum() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mototaxi.yaml");
        fs::write(
            &path,
            "version: \"1.0\"\nzones:\n  all: [Centro, Norte, Sur]\nmin_zones_per_route: 2\n",
        )
        .unwrap();

        let error = RouteTracker::from_config_file(&path).err().unwrap();
        assert!(matches!(error, TrackerError::Configuration { .. }));

        let lowered = TrackerConfig {
            min_zones_per_route: 1,
            ..TrackerConfig::default()
        };
        assert!(RouteTracker::new_with_config(lowered).is_err());

        let mut tracker = RouteTracker::new().unwrap();
        let error = tracker
            .register(&RouteRequest::new("A", "10:00", ["Av. Balta", "Belaunde"]))
            .unwrap_err();
        assert_eq!(
            error.as_rejection(),
            Some(&RejectedInput::TooFewZones { found: 2, required: 3 })
        );
        assert!(tracker.routes().is_empty());
    }

    #[test]
    fn test_formatted_output() {
        let mut tracker = RouteTracker::new()
            .unwrap()
            .with_report_formatter(ReportFormatter::new(ReportOptions {
                use_colors: false,
                ..Default::default()
            }));
        tracker
            .register(&request("Carlos", "18:30", ["Av. Balta", "Belaunde", "La Victoria"]))
            .unwrap();

        let human = tracker.format_infraction_report(OutputFormat::Human).unwrap();
        assert!(human.contains("1. Carlos - 2 infractions"));

        let json = tracker.format_infraction_report(OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["drivers"][0]["total_infractions"], 2);

        let route = &tracker.routes()[0];
        let rendered = tracker.format_route(route, OutputFormat::Human).unwrap();
        assert!(rendered.contains("Peak-hour departure: 18:30"));

        let infracting = tracker.infracting_routes();
        let listed = tracker
            .format_routes("Infracting routes", &infracting, "none", OutputFormat::Human)
            .unwrap();
        assert!(listed.contains("Driver: Carlos"));
        assert!(!tracker.config_fingerprint().is_empty());
    }
}
