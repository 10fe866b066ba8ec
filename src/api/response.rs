use serde::Serialize;

use crate::domain::{City, Quote, Route};

/// Rate callback response. An empty list means "no shipping option offered".
#[derive(Debug, Default, Serialize)]
pub struct RatesResponse {
    pub rates: Vec<Quote>,
}

impl RatesResponse {
    pub fn empty() -> Self {
        RatesResponse::default()
    }

    pub fn new(rates: Vec<Quote>) -> Self {
        RatesResponse { rates }
    }
}

#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<Route>,
}

#[derive(Debug, Serialize)]
pub struct CitiesResponse<T> {
    pub cities: Vec<T>,
}

/// City with the name of its assigned route, for admin listings.
#[derive(Debug, Serialize)]
pub struct CityView {
    #[serde(flatten)]
    pub city: City,
    pub route_name: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub directory_mode: String,
    pub uptime_secs: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub routes: usize,
    pub cities: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "BAD_REQUEST")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "NOT_FOUND")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "CONFLICT")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "INTERNAL_ERROR")
    }
}
