use rust_decimal::Decimal;
use tracing::debug;

use crate::directory::CityDirectory;
use crate::domain::cart::total_weight_kg;
use crate::domain::{normalize_city_name, LineItem, Quote, RoutePrices};

use super::pricing::{price_for_weight, to_minor_units, BASE_WEIGHT_KG};

/// Fixed parts of every quote.
#[derive(Debug, Clone)]
pub struct RateSettings {
    /// ISO 4217 currency code
    pub currency: String,

    /// Weight covered by the start price
    pub base_weight_kg: Decimal,

    /// Prefix of the service code, followed by `-<route id>`
    pub service_code_prefix: String,
}

impl Default for RateSettings {
    fn default() -> Self {
        RateSettings {
            currency: "USD".to_string(),
            base_weight_kg: BASE_WEIGHT_KG,
            service_code_prefix: "ESTANDAR".to_string(),
        }
    }
}

/// Why a rate evaluation did or did not produce a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateOutcome {
    Quoted(Quote),
    /// City name blank after trimming
    NoCity,
    /// No directory entry for the city
    Unmatched,
    /// City known but has no route assigned
    NoRoute,
    /// Negative weight or arithmetic overflow
    InvalidCart,
}

impl RateOutcome {
    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RateOutcome::Quoted(_) => "quoted",
            RateOutcome::NoCity => "no_city",
            RateOutcome::Unmatched => "unmatched",
            RateOutcome::NoRoute => "no_route",
            RateOutcome::InvalidCart => "invalid_cart",
        }
    }

    pub fn into_quotes(self) -> Vec<Quote> {
        match self {
            RateOutcome::Quoted(quote) => vec![quote],
            _ => Vec::new(),
        }
    }
}

/// Computes shipping quotes from a directory snapshot.
///
/// Pure: the same inputs and directory always give the same output.
#[derive(Debug, Clone, Default)]
pub struct RateEngine {
    settings: RateSettings,
}

impl RateEngine {
    pub fn new(settings: RateSettings) -> Self {
        RateEngine { settings }
    }

    /// Quote a cart for a destination city. Zero or one quotes.
    pub fn compute_rate(
        &self,
        city_name: &str,
        items: &[LineItem],
        directory: &dyn CityDirectory,
    ) -> Vec<Quote> {
        self.evaluate(city_name, items, directory).into_quotes()
    }

    /// Like [`compute_rate`](Self::compute_rate) but reports why no quote was produced.
    pub fn evaluate(
        &self,
        city_name: &str,
        items: &[LineItem],
        directory: &dyn CityDirectory,
    ) -> RateOutcome {
        let key = normalize_city_name(city_name);
        if key.is_empty() {
            return RateOutcome::NoCity;
        }

        let Some(entry) = directory.find_by_normalized_name(&key) else {
            debug!(city = %key, "No directory entry for city");
            return RateOutcome::Unmatched;
        };

        let Some(route) = entry.route.as_ref() else {
            debug!(city = %entry.name, "City has no route assigned");
            return RateOutcome::NoRoute;
        };

        let Some(total_kg) = total_weight_kg(items) else {
            return RateOutcome::InvalidCart;
        };

        let prices = RoutePrices::new(route.start_price, route.extra_price_per_kg);
        let total_price = price_for_weight(&prices, total_kg, self.settings.base_weight_kg)
            .and_then(to_minor_units);
        let Some(total_price) = total_price else {
            return RateOutcome::InvalidCart;
        };

        RateOutcome::Quoted(Quote {
            service_name: format!("Envío Estándar ({})", route.name),
            service_code: format!("{}-{}", self.settings.service_code_prefix, route.id),
            total_price,
            currency: self.settings.currency.clone(),
            description: format!("Entrega en {}", entry.name),
        })
    }
}
