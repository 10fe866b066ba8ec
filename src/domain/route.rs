use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique route identifier (database primary key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub i64);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named shipping pricing tier.
///
/// `start_price` covers the first two kilograms; every whole kilogram above
/// that (rounded up) adds `extra_price_per_kg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,

    /// Human-readable name, unique across routes (e.g. "Local", "Regional")
    pub name: String,

    /// Price for the first 2 kg, inclusive
    pub start_price: Decimal,

    /// Price per extra kilogram above 2 kg
    pub extra_price_per_kg: Decimal,

    pub updated_at: DateTime<Utc>,
}

/// Pricing pair shared by route creation and price updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePrices {
    pub start_price: Decimal,
    pub extra_price_per_kg: Decimal,
}

impl RoutePrices {
    pub fn new(start_price: Decimal, extra_price_per_kg: Decimal) -> Self {
        RoutePrices {
            start_price,
            extra_price_per_kg,
        }
    }

    /// Returns the name of the first negative price field, if any.
    pub fn negative_field(&self) -> Option<&'static str> {
        if self.start_price.is_sign_negative() && !self.start_price.is_zero() {
            Some("start_price")
        } else if self.extra_price_per_kg.is_sign_negative() && !self.extra_price_per_kg.is_zero() {
            Some("extra_price_per_kg")
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.negative_field() {
            Some(field) => Err(format!("{} cannot be negative", field)),
            None => Ok(()),
        }
    }
}

/// Route to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoute {
    pub name: String,
    #[serde(flatten)]
    pub prices: RoutePrices,
}

impl NewRoute {
    pub fn new(name: impl Into<String>, start_price: Decimal, extra_price_per_kg: Decimal) -> Self {
        NewRoute {
            name: name.into(),
            prices: RoutePrices::new(start_price, extra_price_per_kg),
        }
    }

    /// Check name and prices, returning a message for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Route name cannot be empty".to_string());
        }
        self.prices.validate()
    }
}
