use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::domain::{City, CityId, NewCity, NewRoute, Route, RouteId, RoutePrices};

use super::error::{StorageError, StorageResult};
use super::traits::Storage;

#[derive(Debug, Default)]
struct Tables {
    routes: BTreeMap<RouteId, Route>,
    cities: BTreeMap<CityId, City>,
    next_route_id: i64,
    next_city_id: i64,
}

/// In-process storage, used for development and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_name<T>(items: impl Iterator<Item = T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by(|a, b| name(a).cmp(name(b)));
    items
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list_routes(&self) -> StorageResult<Vec<Route>> {
        let tables = self.tables.lock();
        Ok(sorted_by_name(tables.routes.values().cloned(), |r| r.name.as_str()))
    }

    async fn get_route(&self, id: RouteId) -> StorageResult<Option<Route>> {
        Ok(self.tables.lock().routes.get(&id).cloned())
    }

    async fn find_route_by_name(&self, name: &str) -> StorageResult<Option<Route>> {
        let name = name.trim();
        Ok(self
            .tables
            .lock()
            .routes
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn create_route(&self, route: &NewRoute) -> StorageResult<Route> {
        route.validate().map_err(StorageError::Validation)?;
        let name = route.name.trim();

        let mut tables = self.tables.lock();
        if tables.routes.values().any(|r| r.name == name) {
            return Err(StorageError::DuplicateRoute(name.to_string()));
        }

        tables.next_route_id += 1;
        let created = Route {
            id: RouteId(tables.next_route_id),
            name: name.to_string(),
            start_price: route.prices.start_price,
            extra_price_per_kg: route.prices.extra_price_per_kg,
            updated_at: Utc::now(),
        };
        tables.routes.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update_route_prices(&self, id: RouteId, prices: &RoutePrices) -> StorageResult<Route> {
        prices.validate().map_err(StorageError::Validation)?;

        let mut tables = self.tables.lock();
        let route = tables
            .routes
            .get_mut(&id)
            .ok_or_else(|| StorageError::route_not_found(id))?;

        route.start_price = prices.start_price;
        route.extra_price_per_kg = prices.extra_price_per_kg;
        route.updated_at = Utc::now();

        Ok(route.clone())
    }

    async fn delete_route(&self, id: RouteId) -> StorageResult<()> {
        let mut tables = self.tables.lock();
        if tables.routes.remove(&id).is_none() {
            return Err(StorageError::route_not_found(id));
        }

        let now = Utc::now();
        for city in tables.cities.values_mut() {
            if city.route_id == Some(id) {
                city.route_id = None;
                city.updated_at = now;
            }
        }

        Ok(())
    }

    async fn list_cities(&self) -> StorageResult<Vec<City>> {
        let tables = self.tables.lock();
        Ok(sorted_by_name(tables.cities.values().cloned(), |c| c.name.as_str()))
    }

    async fn find_city(&self, name: &str, province: &str) -> StorageResult<Option<City>> {
        let (name, province) = (name.trim(), province.trim());
        Ok(self
            .tables
            .lock()
            .cities
            .values()
            .find(|c| c.name == name && c.province == province)
            .cloned())
    }

    async fn create_city(&self, city: &NewCity) -> StorageResult<City> {
        city.validate().map_err(StorageError::Validation)?;

        let mut tables = self.tables.lock();
        if let Some(route_id) = city.route_id {
            if !tables.routes.contains_key(&route_id) {
                return Err(StorageError::UnknownRoute(route_id));
            }
        }

        tables.next_city_id += 1;
        let created = City {
            id: CityId(tables.next_city_id),
            name: city.name.trim().to_string(),
            province: city.province.trim().to_string(),
            route_id: city.route_id,
            updated_at: Utc::now(),
        };
        tables.cities.insert(created.id, created.clone());

        Ok(created)
    }

    async fn delete_city(&self, id: CityId) -> StorageResult<()> {
        match self.tables.lock().cities.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::city_not_found(id.0)),
        }
    }
}
