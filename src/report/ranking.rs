//! Per-driver infraction aggregation and ranking
//!
//! Totals are grouped case-insensitively in first-seen order and then stably
//! sorted by total, so drivers with equal totals keep their first-seen order.

use crate::domain::routes::names_match;
use crate::registry::RouteRegistry;
use crate::rules::RuleEngine;
use serde::{Deserialize, Serialize};

/// One row of the infraction ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInfractions {
    /// Driver name as first registered
    pub driver_name: String,
    pub total_infractions: u32,
    /// Number of infracting routes folded into the total
    pub routes: usize,
}

/// Builds the ranked infraction report from the registry
#[derive(Debug, Clone, Copy, Default)]
pub struct InfractionReporter;

impl InfractionReporter {
    /// Drivers with at least one infraction, most infractions first
    pub fn report(registry: &RouteRegistry, engine: &RuleEngine) -> Vec<DriverInfractions> {
        let mut totals: Vec<DriverInfractions> = Vec::new();

        for route in registry.all() {
            let infractions = engine.count_infractions(route);
            if infractions == 0 {
                continue;
            }

            match totals
                .iter_mut()
                .find(|entry| names_match(&entry.driver_name, route.driver_name()))
            {
                Some(entry) => {
                    entry.total_infractions += infractions;
                    entry.routes += 1;
                }
                None => totals.push(DriverInfractions {
                    driver_name: route.driver_name().to_string(),
                    total_infractions: infractions,
                    routes: 1,
                }),
            }
        }

        // sort_by is stable: equal totals stay in first-seen order
        totals.sort_by(|a, b| b.total_infractions.cmp(&a.total_infractions));

        tracing::debug!(drivers = totals.len(), routes = registry.len(), "Built infraction report");
        totals
    }
}
