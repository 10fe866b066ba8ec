//! Initial routes and cities loaded from a YAML file.
//!
//! Seeding is idempotent: routes are matched by name and cities by
//! name + province, so re-running the same file creates nothing new.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{NewCity, NewRoute};
use crate::storage::{Storage, StorageError};

/// Errors that can occur while seeding.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRoute {
    pub name: String,
    pub start_price: Decimal,
    pub extra_price_per_kg: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCity {
    pub name: String,
    #[serde(default)]
    pub province: String,
    /// Route name; omitted for unassigned cities
    #[serde(default)]
    pub route: Option<String>,
}

/// Contents of a seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub routes: Vec<SeedRoute>,
    #[serde(default)]
    pub cities: Vec<SeedCity>,
}

/// What a seeding run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub routes_created: usize,
    pub routes_existing: usize,
    pub cities_created: usize,
    pub cities_existing: usize,
    /// Cities skipped because their route does not exist
    pub cities_skipped: Vec<String>,
}

/// Load seed data from a YAML file.
pub fn load_seed(path: impl AsRef<Path>) -> Result<SeedData, SeedError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Create missing routes, then missing cities.
pub async fn apply_seed(storage: &dyn Storage, seed: &SeedData) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for route in &seed.routes {
        if storage.find_route_by_name(&route.name).await?.is_some() {
            report.routes_existing += 1;
            continue;
        }
        storage
            .create_route(&NewRoute::new(
                route.name.clone(),
                route.start_price,
                route.extra_price_per_kg,
            ))
            .await?;
        report.routes_created += 1;
    }

    for city in &seed.cities {
        let route_id = match &city.route {
            Some(name) => match storage.find_route_by_name(name).await? {
                Some(route) => Some(route.id),
                None => {
                    warn!(city = %city.name, route = %name, "Route not found for seeded city");
                    report.cities_skipped.push(city.name.clone());
                    continue;
                }
            },
            None => None,
        };

        if storage.find_city(&city.name, &city.province).await?.is_some() {
            report.cities_existing += 1;
            continue;
        }

        storage
            .create_city(&NewCity {
                name: city.name.clone(),
                province: city.province.clone(),
                route_id,
            })
            .await?;
        report.cities_created += 1;
    }

    info!(
        routes_created = report.routes_created,
        routes_existing = report.routes_existing,
        cities_created = report.cities_created,
        cities_existing = report.cities_existing,
        cities_skipped = report.cities_skipped.len(),
        "Seeding finished"
    );

    Ok(report)
}
