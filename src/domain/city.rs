use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::RouteId;

/// Unique city identifier (database primary key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub i64);

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A delivery destination, optionally assigned to one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    /// Informational only, never used for pricing
    pub province: String,
    pub route_id: Option<RouteId>,
    pub updated_at: DateTime<Utc>,
}

/// City to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCity {
    pub name: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub route_id: Option<RouteId>,
}

impl NewCity {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("City name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Normalize a city name for directory matching.
///
/// Trims surrounding whitespace and uppercases with Unicode case mapping.
/// Diacritics are kept: "Alausí" and "ALAUSI" are different keys.
pub fn normalize_city_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}
