//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - Routes, infraction breakdowns and driver rankings are rendered for terminals or tools
//! - Each format encapsulates its own layout rules
//! - Domain values stay free of presentation concerns

pub mod ranking;

pub use ranking::{DriverInfractions, InfractionReporter};

use crate::domain::routes::{InfractionBreakdown, Route, TrackerError, TrackerResult};
use crate::rules::RuleEngine;
use chrono::Utc;
use serde_json::Value as JsonValue;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with optional colors
    Human,
    /// JSON format for programmatic consumption
    Json,
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to explain why illegal routes were flagged
    pub show_breakdown: bool,
    /// Maximum number of drivers to include in a ranking
    pub max_drivers: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_breakdown: true,
            max_drivers: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Bad,
    Heading,
    Dim,
}

/// Renders routes and infraction rankings
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Render one route together with its infraction breakdown
    pub fn format_route(
        &self,
        route: &Route,
        breakdown: &InfractionBreakdown,
        format: OutputFormat,
    ) -> TrackerResult<String> {
        match format {
            OutputFormat::Human => Ok(self.human_route(route, breakdown)),
            OutputFormat::Json => to_pretty_json(&route_json(route, breakdown)?),
        }
    }

    /// Render a titled list of routes; `empty_message` is shown when there are none
    pub fn format_routes(
        &self,
        title: &str,
        routes: &[&Route],
        engine: &RuleEngine,
        empty_message: &str,
        format: OutputFormat,
    ) -> TrackerResult<String> {
        match format {
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str(&self.paint(&format!("--- {title} ---"), Tone::Heading));
                output.push('\n');

                if routes.is_empty() {
                    output.push_str(empty_message);
                    output.push('\n');
                    return Ok(output);
                }

                for route in routes {
                    output.push_str(&self.human_route(route, &engine.explain_infractions(route)));
                    output.push_str("--------------------\n");
                }
                Ok(output)
            }
            OutputFormat::Json => {
                let json_routes = routes
                    .iter()
                    .map(|route| route_json(route, &engine.explain_infractions(route)))
                    .collect::<TrackerResult<Vec<JsonValue>>>()?;
                to_pretty_json(&serde_json::json!({
                    "title": title,
                    "routes": json_routes,
                }))
            }
        }
    }

    /// Render the ranked infraction report
    pub fn format_ranking(
        &self,
        ranking: &[DriverInfractions],
        format: OutputFormat,
    ) -> TrackerResult<String> {
        let rows = match self.options.max_drivers {
            Some(max) if max < ranking.len() => &ranking[..max],
            _ => ranking,
        };

        match format {
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str(&self.paint("--- Infraction report ---", Tone::Heading));
                output.push('\n');

                if rows.is_empty() {
                    output.push_str(&self.paint("No infractions recorded.", Tone::Good));
                    output.push('\n');
                    return Ok(output);
                }

                for (position, row) in rows.iter().enumerate() {
                    output.push_str(&format!(
                        "{}. {} - {} infraction{} ({} route{})\n",
                        position + 1,
                        row.driver_name,
                        self.paint(&row.total_infractions.to_string(), Tone::Bad),
                        plural(row.total_infractions as usize),
                        row.routes,
                        plural(row.routes)
                    ));
                }
                Ok(output)
            }
            OutputFormat::Json => to_pretty_json(&serde_json::json!({
                "generated_at": Utc::now().to_rfc3339(),
                "drivers": rows,
                "total_infractions": rows.iter().map(|r| r.total_infractions).sum::<u32>(),
            })),
        }
    }

    fn human_route(&self, route: &Route, breakdown: &InfractionBreakdown) -> String {
        let status = if route.is_legal() {
            self.paint(route.status_label(), Tone::Good)
        } else {
            self.paint(route.status_label(), Tone::Bad)
        };

        let mut output = format!(
            "Route:\n Driver: {}\n Time: {}\n Zones: {}\n Status: {}\n",
            route.driver_name(),
            route.time_of_day(),
            route.zones_display(),
            status
        );

        if self.options.show_breakdown && !breakdown.is_clean() {
            if !breakdown.restricted_zones_hit.is_empty() {
                output.push_str(&format!(
                    " - Restricted zones: {}\n",
                    breakdown.restricted_zones_hit.join(", ")
                ));
            }
            if breakdown.is_peak_hour {
                output.push_str(&format!(" - Peak-hour departure: {}\n", route.time_of_day()));
            }
            output.push_str(&self.paint(
                &format!(" {} infraction{}\n", breakdown.total(), plural(breakdown.total() as usize)),
                Tone::Dim,
            ));
        }

        output
    }

    #[cfg(feature = "colors")]
    fn paint(&self, text: &str, tone: Tone) -> String {
        use colored::Colorize;

        if !self.options.use_colors {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Bad => text.red().bold().to_string(),
            Tone::Heading => text.bold().to_string(),
            Tone::Dim => text.dimmed().to_string(),
        }
    }

    #[cfg(not(feature = "colors"))]
    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

fn route_json(route: &Route, breakdown: &InfractionBreakdown) -> TrackerResult<JsonValue> {
    let mut json = serde_json::to_value(route)
        .map_err(|e| TrackerError::serialization(format!("Failed to serialize route: {e}")))?;

    if let Some(fields) = json.as_object_mut() {
        fields.insert("minutes".into(), route.time_of_day().minutes().into());
        fields.insert(
            "infractions".into(),
            serde_json::json!({
                "restricted_zones_hit": breakdown.restricted_zones_hit,
                "is_peak_hour": breakdown.is_peak_hour,
                "total": breakdown.total(),
            }),
        );
    }
    Ok(json)
}

fn to_pretty_json(value: &JsonValue) -> TrackerResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TrackerError::serialization(format!("JSON serialization failed: {e}")))
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::routes::TimeOfDay;
    use crate::registry::RouteRegistry;

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        })
    }

    fn illegal_route(engine: &RuleEngine) -> Route {
        engine.classify(
            "Carlos",
            "08:05".parse::<TimeOfDay>().unwrap(),
            vec!["Av. Balta".into(), "Belaunde".into(), "Elias Aguirre".into()],
        )
    }

    #[test]
    fn test_human_route_with_breakdown() {
        let engine = RuleEngine::default();
        let route = illegal_route(&engine);
        let output = plain()
            .format_route(&route, &engine.explain_infractions(&route), OutputFormat::Human)
            .unwrap();

        assert!(output.contains(" Driver: Carlos"));
        assert!(output.contains(" Time: 08:05"));
        assert!(output.contains(" Zones: Av. Balta, Belaunde, Elias Aguirre"));
        assert!(output.contains(" Status: Illegal"));
        assert!(output.contains("Restricted zones: Av. Balta, Elias Aguirre"));
        assert!(output.contains("Peak-hour departure: 08:05"));
        assert!(output.contains("3 infractions"));
    }

    #[test]
    fn test_legal_route_has_no_breakdown() {
        let engine = RuleEngine::default();
        let route = engine.classify(
            "Ana",
            "12:00".parse::<TimeOfDay>().unwrap(),
            vec!["Belaunde".into(), "La Victoria".into(), "La Despensa".into()],
        );
        let output = plain()
            .format_route(&route, &engine.explain_infractions(&route), OutputFormat::Human)
            .unwrap();

        assert!(output.contains(" Status: Legal"));
        assert!(!output.contains("Restricted zones"));
    }

    #[test]
    fn test_json_route() {
        let engine = RuleEngine::default();
        let route = illegal_route(&engine);
        let output = ReportFormatter::default()
            .format_route(&route, &engine.explain_infractions(&route), OutputFormat::Json)
            .unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["minutes"], 485);
        assert_eq!(json["time_of_day"], "08:05");
        assert_eq!(json["is_legal"], false);
        assert_eq!(json["infractions"]["total"], 3);
        assert_eq!(json["infractions"]["restricted_zones_hit"][1], "Elias Aguirre");
        assert_eq!(json["driver_name"], "Carlos");
        assert_eq!(json["zones_visited"][2], "Elias Aguirre");
        assert_eq!(json["id"], route.id().to_string());
        let day = route.registered_at().format("%Y-%m-%d").to_string();
        assert!(json["registered_at"].as_str().unwrap().starts_with(&day));
    }

    #[test]
    fn test_route_list_empty_message() {
        let engine = RuleEngine::default();
        let output = plain()
            .format_routes("Infracting routes", &[], &engine, "No infracting routes.", OutputFormat::Human)
            .unwrap();
        assert!(output.contains("--- Infracting routes ---"));
        assert!(output.contains("No infracting routes."));
    }

    #[test]
    fn test_route_list_json() {
        let engine = RuleEngine::default();
        let mut registry = RouteRegistry::new();
        registry.add(illegal_route(&engine));
        let routes = registry.filter_by_legality(false);

        let output = plain()
            .format_routes("Infracting routes", &routes, &engine, "none", OutputFormat::Json)
            .unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["routes"].as_array().unwrap().len(), 1);
        assert_eq!(json["routes"][0]["driver_name"], "Carlos");
    }

    fn sample_ranking() -> Vec<DriverInfractions> {
        vec![
            DriverInfractions { driver_name: "B".into(), total_infractions: 5, routes: 2 },
            DriverInfractions { driver_name: "A".into(), total_infractions: 1, routes: 1 },
        ]
    }

    #[test]
    fn test_human_ranking() {
        let output = plain().format_ranking(&sample_ranking(), OutputFormat::Human).unwrap();
        assert!(output.contains("1. B - 5 infractions (2 routes)"));
        assert!(output.contains("2. A - 1 infraction (1 route)"));
    }

    #[test]
    fn test_empty_ranking() {
        let output = plain().format_ranking(&[], OutputFormat::Human).unwrap();
        assert!(output.contains("No infractions recorded."));
    }

    #[test]
    fn test_json_ranking_respects_limit() {
        let formatter = ReportFormatter::new(ReportOptions {
            max_drivers: Some(1),
            ..Default::default()
        });
        let output = formatter.format_ranking(&sample_ranking(), OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();

        assert_eq!(json["drivers"].as_array().unwrap().len(), 1);
        assert_eq!(json["drivers"][0]["driver_name"], "B");
        assert_eq!(json["total_infractions"], 5);
    }
}
