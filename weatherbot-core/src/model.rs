use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Literal written into the subscriber file when the upstream quota was
/// exhausted while resolving a location. Compatible with existing data files.
pub const RATE_LIMIT_SENTINEL: &str = "API_LIMIT_EXCEEDED";

/// Current conditions for one city, already normalized across providers.
/// Transient; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temperature_c: f64,
    pub condition: String,
    pub icon: &'static str,
    /// Only set by providers whose payload carries a day/night flag.
    pub is_day: Option<bool>,
}

/// One day of a multi-day forecast, in the order the provider returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub condition: String,
    pub icon: &'static str,
}

/// Cached location reference for providers with two-step lookup.
///
/// `RateLimited` marks a reference whose resolution hit the upstream quota;
/// it stays in place until the subscriber re-registers a city. On disk both
/// variants are plain strings, the sentinel spelled as [`RATE_LIMIT_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationRef {
    Key(String),
    RateLimited,
}

impl LocationRef {
    pub fn key(&self) -> Option<&str> {
        match self {
            LocationRef::Key(k) => Some(k),
            LocationRef::RateLimited => None,
        }
    }
}

impl From<String> for LocationRef {
    fn from(s: String) -> Self {
        if s == RATE_LIMIT_SENTINEL { LocationRef::RateLimited } else { LocationRef::Key(s) }
    }
}

impl From<LocationRef> for String {
    fn from(r: LocationRef) -> Self {
        match r {
            LocationRef::Key(k) => k,
            LocationRef::RateLimited => RATE_LIMIT_SENTINEL.to_string(),
        }
    }
}

/// One subscriber's registration: the city they chose and, for providers
/// with two-step lookup, the cached location reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub city_name: String,
    #[serde(rename = "location_key", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationRef>,
}

impl Subscriber {
    pub fn new(city_name: impl Into<String>, location: Option<LocationRef>) -> Self {
        Self { city_name: city_name.into(), location }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.location, Some(LocationRef::RateLimited))
    }

    pub fn location_key(&self) -> Option<&str> {
        self.location.as_ref().and_then(LocationRef::key)
    }
}
