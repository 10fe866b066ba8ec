use async_trait::async_trait;

use crate::domain::{City, CityId, NewCity, NewRoute, Route, RouteId, RoutePrices};

use super::error::StorageResult;

/// Storage trait for routes and cities.
///
/// Backends validate inputs with the domain `validate` helpers and enforce
/// route name uniqueness. Deleting a route unassigns its cities.
#[async_trait]
pub trait Storage: Send + Sync {
    // Routes, ordered by name
    async fn list_routes(&self) -> StorageResult<Vec<Route>>;
    async fn get_route(&self, id: RouteId) -> StorageResult<Option<Route>>;
    async fn find_route_by_name(&self, name: &str) -> StorageResult<Option<Route>>;
    async fn create_route(&self, route: &NewRoute) -> StorageResult<Route>;
    async fn update_route_prices(&self, id: RouteId, prices: &RoutePrices) -> StorageResult<Route>;
    async fn delete_route(&self, id: RouteId) -> StorageResult<()>;

    // Cities, ordered by name
    async fn list_cities(&self) -> StorageResult<Vec<City>>;
    async fn find_city(&self, name: &str, province: &str) -> StorageResult<Option<City>>;
    async fn create_city(&self, city: &NewCity) -> StorageResult<City>;
    async fn delete_city(&self, id: CityId) -> StorageResult<()>;
}
