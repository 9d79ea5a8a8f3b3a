//! Append-only store of registered routes
//!
//! Insertion order is the only order: queries return routes as they were added
//! and nothing is ever removed or edited in place.

use crate::domain::routes::Route;

/// Ordered collection of every registered route
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: Vec<Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route and return a reference to the stored copy
    pub fn add(&mut self, route: Route) -> &Route {
        let position = self.routes.len();
        tracing::info!(
            driver = route.driver_name(),
            legal = route.is_legal(),
            position,
            "Route registered"
        );
        self.routes.push(route);
        &self.routes[position]
    }

    /// Every route in insertion order
    pub fn all(&self) -> &[Route] {
        &self.routes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Routes whose driver name equals `name`, ignoring case
    pub fn find_by_driver(&self, name: &str) -> Vec<&Route> {
        self.routes.iter().filter(|r| r.is_driven_by(name)).collect()
    }

    pub fn filter_by_legality(&self, legal: bool) -> Vec<&Route> {
        self.routes.iter().filter(|r| r.is_legal() == legal).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::routes::TimeOfDay;
    use crate::rules::RuleEngine;

    fn route(engine: &RuleEngine, driver: &str, time: &str, zones: [&str; 3]) -> Route {
        engine.classify(
            driver,
            time.parse::<TimeOfDay>().unwrap(),
            zones.iter().map(|z| z.to_string()).collect(),
        )
    }

    fn sample_registry() -> RouteRegistry {
        let engine = RuleEngine::default();
        let mut registry = RouteRegistry::new();
        registry.add(route(&engine, "Pedro", "10:00", ["Belaunde", "La Victoria", "La Despensa"]));
        registry.add(route(&engine, "Maria", "08:00", ["Av. Balta", "Belaunde", "Av Leguia"]));
        registry.add(route(&engine, "pedro", "18:00", ["Belaunde", "La Victoria", "La Despensa"]));
        registry.add(route(&engine, "Jose", "12:00", ["Av Leguia", "Lora y Lora", "Belaunde"]));
        registry
    }

    #[test]
    fn test_add_preserves_order() {
        let engine = RuleEngine::default();
        let mut registry = RouteRegistry::new();
        assert!(registry.is_empty());

        for (i, driver) in ["A", "B", "C", "D"].iter().enumerate() {
            let stored = registry.add(route(&engine, driver, "10:00", ["Belaunde", "La Victoria", "La Despensa"]));
            assert_eq!(stored.driver_name(), *driver);
            assert_eq!(registry.len(), i + 1);
        }

        let drivers: Vec<&str> = registry.all().iter().map(Route::driver_name).collect();
        assert_eq!(drivers, vec!["A", "B", "C", "D"]);
        assert_eq!(registry.iter().count(), 4);
    }

    #[test]
    fn test_find_by_driver_ignores_case() {
        let registry = sample_registry();

        let pedro = registry.find_by_driver("PEDRO");
        assert_eq!(pedro.len(), 2);
        assert_eq!(pedro[0].time_of_day().to_string(), "10:00");
        assert_eq!(pedro[1].time_of_day().to_string(), "18:00");

        assert!(registry.find_by_driver("Pedr").is_empty());
        assert!(registry.find_by_driver("Nobody").is_empty());
    }

    #[test]
    fn test_filter_by_legality() {
        let registry = sample_registry();

        let legal: Vec<&str> = registry.filter_by_legality(true).iter().map(|r| r.driver_name()).collect();
        let illegal: Vec<&str> = registry.filter_by_legality(false).iter().map(|r| r.driver_name()).collect();

        assert_eq!(legal, vec!["Pedro", "Jose"]);
        assert_eq!(illegal, vec!["Maria", "pedro"]);
    }
}
