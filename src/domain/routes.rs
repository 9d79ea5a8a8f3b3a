//! Core domain models for mototaxi routes and their rule outcomes
//!
//! Architecture: Rich Domain Models - Routes are immutable entities with derived state
//! - A route's legality is fixed when it is built and has no setter
//! - TimeOfDay owns the "HH:mm" text format so callers never re-derive it
//! - Rejected input is a value describing which constraint failed

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

lazy_static! {
    static ref TIME_TEXT: Regex = Regex::new(r"^(\d{1,2}):(\d{1,2})$").expect("static time pattern");
}

/// Minutes in a day; valid times are `0..MINUTES_PER_DAY`
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Case-insensitive name comparison used for zones and driver names
pub fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Time of day as minutes since midnight, always within `[0, 1439]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Midnight
    pub const MIDNIGHT: Self = Self(0);

    /// Build from raw minutes since midnight
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Build from an hour in `[0, 23]` and a minute in `[0, 59]`
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, RejectedInput> {
        if hour > 23 {
            return Err(RejectedInput::HourOutOfRange { hour });
        }
        if minute > 59 {
            return Err(RejectedInput::MinuteOutOfRange { minute });
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Minutes since midnight
    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = RejectedInput;

    /// Parse "HH:mm" text; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = TIME_TEXT
            .captures(s.trim())
            .ok_or_else(|| RejectedInput::MalformedTime { input: s.to_string() })?;

        // At most two digits per group, so these parses cannot overflow
        let hour: u32 = captures[1]
            .parse()
            .map_err(|_| RejectedInput::MalformedTime { input: s.to_string() })?;
        let minute: u32 = captures[2]
            .parse()
            .map_err(|_| RejectedInput::MalformedTime { input: s.to_string() })?;

        Self::from_hm(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = RejectedInput;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// One registered mototaxi trip
///
/// Built only through [`crate::rules::RuleEngine::classify`], which fixes
/// `is_legal` from the route contents. There is no way to change it later.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    id: Uuid,
    driver_name: String,
    time_of_day: TimeOfDay,
    zones_visited: Vec<String>,
    is_legal: bool,
    registered_at: DateTime<Utc>,
}

impl Route {
    pub(crate) fn classified(
        driver_name: String,
        time_of_day: TimeOfDay,
        zones_visited: Vec<String>,
        is_legal: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_name,
            time_of_day,
            zones_visited,
            is_legal,
            registered_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    /// Zones in visit order
    pub fn zones_visited(&self) -> &[String] {
        &self.zones_visited
    }

    pub fn is_legal(&self) -> bool {
        self.is_legal
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Whether this route belongs to `name`, ignoring case
    pub fn is_driven_by(&self, name: &str) -> bool {
        names_match(&self.driver_name, name)
    }

    /// Visited zones joined for display
    pub fn zones_display(&self) -> String {
        self.zones_visited.join(", ")
    }

    /// Legality as a display word
    pub fn status_label(&self) -> &'static str {
        if self.is_legal {
            "Legal"
        } else {
            "Illegal"
        }
    }

    /// Format route for a single-line display
    pub fn format_display(&self) -> String {
        format!(
            "{} @ {} [{}] {}",
            self.driver_name,
            self.time_of_day,
            self.status_label(),
            self.zones_display()
        )
    }
}

/// Why a route was flagged: the restricted zones it hit and the peak-hour test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfractionBreakdown {
    /// Restricted zones in visit order, one entry per visited zone
    pub restricted_zones_hit: Vec<String>,
    /// Whether the route started inside a peak-hour window
    pub is_peak_hour: bool,
}

impl InfractionBreakdown {
    /// Infraction points this breakdown accounts for
    pub fn total(&self) -> u32 {
        self.restricted_zones_hit.len() as u32 + u32::from(self.is_peak_hour)
    }

    pub fn is_clean(&self) -> bool {
        self.restricted_zones_hit.is_empty() && !self.is_peak_hour
    }
}

/// Raw route input that failed validation, naming the violated constraint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectedInput {
    #[error("Time '{input}' is not in HH:mm format")]
    MalformedTime { input: String },

    #[error("Hour {hour} is outside 0-23")]
    HourOutOfRange { hour: u32 },

    #[error("Minute {minute} is outside 0-59")]
    MinuteOutOfRange { minute: u32 },

    #[error("Driver name must not be empty")]
    EmptyDriverName,

    #[error("Route needs at least {required} zones, got {found}")]
    TooFewZones { found: usize, required: usize },

    #[error("Unknown zone '{zone}'")]
    UnknownZone { zone: String },

    #[error("Zone option {index} is not in the catalog (1-{available})")]
    ZoneIndexOutOfRange { index: usize, available: usize },

    #[error("Zone '{zone}' appears more than once in the route")]
    DuplicateZone { zone: String },
}

/// Error types that can occur while running the tracker
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Configuration file could not be loaded, parsed or validated
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or written
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Output or input document could not be (de)serialized
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A route request failed validation
    #[error("Route rejected: {source}")]
    Rejected {
        #[from]
        source: RejectedInput,
    },
}

impl TrackerError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// The rejected input, when this error is a validation failure
    pub fn as_rejection(&self) -> Option<&RejectedInput> {
        match self {
            Self::Rejected { source } => Some(source),
            _ => None,
        }
    }
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_parsing() {
        let time: TimeOfDay = "08:30".parse().unwrap();
        assert_eq!(time.minutes(), 510);
        assert_eq!(time.hour(), 8);
        assert_eq!(time.minute(), 30);

        let time: TimeOfDay = " 7:05 ".parse().unwrap();
        assert_eq!(time.minutes(), 425);

        assert_eq!("23:59".parse::<TimeOfDay>().unwrap().minutes(), 1439);
        assert_eq!("00:00".parse::<TimeOfDay>().unwrap(), TimeOfDay::MIDNIGHT);
    }

    #[test]
    fn test_time_rejections() {
        assert_eq!(
            "24:00".parse::<TimeOfDay>(),
            Err(RejectedInput::HourOutOfRange { hour: 24 })
        );
        assert_eq!(
            "12:60".parse::<TimeOfDay>(),
            Err(RejectedInput::MinuteOutOfRange { minute: 60 })
        );
        for bad in ["1230", "ab:cd", "12:30:00", "", "-1:30", "123:00"] {
            assert!(
                matches!(bad.parse::<TimeOfDay>(), Err(RejectedInput::MalformedTime { .. })),
                "expected '{bad}' to be malformed"
            );
        }
    }

    #[test]
    fn test_time_display_is_zero_padded() {
        assert_eq!(TimeOfDay::from_minutes(65).unwrap().to_string(), "01:05");
        assert_eq!(TimeOfDay::from_minutes(1439).unwrap().to_string(), "23:59");
        assert!(TimeOfDay::from_minutes(1440).is_none());
    }

    #[test]
    fn test_time_serde_uses_text() {
        let time = TimeOfDay::from_hm(17, 0).unwrap();
        assert_eq!(serde_json::to_string(&time).unwrap(), "\"17:00\"");

        let parsed: TimeOfDay = serde_json::from_str("\"09:15\"").unwrap();
        assert_eq!(parsed.minutes(), 555);
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }

    #[test]
    fn test_names_match_ignores_case() {
        assert!(names_match("Av. Balta", "av. balta"));
        assert!(names_match("SAENZ PENIA", "Saenz Penia"));
        assert!(!names_match("Av. Balta", "Av Balta"));
    }

    #[test]
    fn test_route_accessors() {
        let route = Route::classified(
            "Pedro".to_string(),
            TimeOfDay::from_hm(10, 0).unwrap(),
            vec!["Belaunde".into(), "La Victoria".into(), "La Despensa".into()],
            true,
        );

        assert!(route.is_driven_by("pedro"));
        assert!(!route.is_driven_by("Pedr"));
        assert_eq!(route.zones_display(), "Belaunde, La Victoria, La Despensa");
        assert_eq!(route.status_label(), "Legal");
        assert_eq!(
            route.format_display(),
            "Pedro @ 10:00 [Legal] Belaunde, La Victoria, La Despensa"
        );
    }

    #[test]
    fn test_breakdown_total() {
        let breakdown = InfractionBreakdown {
            restricted_zones_hit: vec!["Av. Balta".into(), "Elias Aguirre".into()],
            is_peak_hour: true,
        };
        assert_eq!(breakdown.total(), 3);
        assert!(!breakdown.is_clean());
        assert!(InfractionBreakdown::default().is_clean());
    }

    #[test]
    fn test_rejection_converts_to_tracker_error() {
        let error: TrackerError = RejectedInput::EmptyDriverName.into();
        assert_eq!(error.as_rejection(), Some(&RejectedInput::EmptyDriverName));
        assert!(TrackerError::config("bad").as_rejection().is_none());
    }
}
