use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{LineItem, RoutePrices};

/// Carrier-service rate callback body.
///
/// Only the fields used for pricing are modelled; everything else the
/// platform sends (origin, currency, locale, ...) is ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct RateRequest {
    pub rate: RatePayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatePayload {
    #[serde(default)]
    pub destination: Option<Destination>,

    pub items: Vec<ItemRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub city: Option<String>,
}

/// One cart line: unit weight in grams and quantity.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemRequest {
    pub grams: Decimal,
    pub quantity: u32,
}

impl RateRequest {
    /// Parse a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Destination city, if the request carries one.
    pub fn city(&self) -> Option<&str> {
        self.rate
            .destination
            .as_ref()
            .and_then(|d| d.city.as_deref())
    }

    /// Convert to line items for the rate engine.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.rate
            .items
            .iter()
            .map(|item| LineItem::new(item.grams, item.quantity))
            .collect()
    }
}

/// Body of `PUT /admin/routes/:id` price updates.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRouteRequest {
    pub start_price: Decimal,
    pub extra_price_per_kg: Decimal,
}

impl UpdateRouteRequest {
    pub fn prices(&self) -> RoutePrices {
        RoutePrices::new(self.start_price, self.extra_price_per_kg)
    }
}
