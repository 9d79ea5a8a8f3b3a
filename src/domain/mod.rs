//! Domain layer for the mototaxi tracker
//!
//! Architecture: Domain Model - Pure values for routes, times and rule outcomes
//! - Contains the route entity, time-of-day value object and error vocabulary
//! - Independent of configuration files, terminals or any other I/O
//! - Expresses the ubiquitous language of routes, zones and infractions

pub mod routes;

// Re-export main domain types for convenience
pub use routes::*;
