use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::domain::{City, CityId, NewCity, NewRoute, Route, RouteId, RoutePrices};

use super::error::{StorageError, StorageResult};
use super::traits::Storage;

/// PostgreSQL implementation of the Storage trait.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Create a new PostgresStorage instance with a connection pool.
    pub async fn connect(
        database_url: &str,
        min_connections: u32,
        max_connections: u32,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn route_from_row(row: &PgRow) -> Route {
    Route {
        id: RouteId(row.get("id")),
        name: row.get("name"),
        start_price: row.get("start_price"),
        extra_price_per_kg: row.get("extra_price_per_kg"),
        updated_at: row.get("updated_at"),
    }
}

fn city_from_row(row: &PgRow) -> City {
    let route_id: Option<i64> = row.get("route_id");
    City {
        id: CityId(row.get("id")),
        name: row.get("name"),
        province: row.get("province"),
        route_id: route_id.map(RouteId),
        updated_at: row.get("updated_at"),
    }
}

/// Map constraint violations to domain errors.
fn classify(err: sqlx::Error, route_name: Option<&str>, route_id: Option<RouteId>) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            if let Some(name) = route_name {
                return StorageError::DuplicateRoute(name.to_string());
            }
        }
        if db.is_foreign_key_violation() {
            if let Some(id) = route_id {
                return StorageError::UnknownRoute(id);
            }
        }
        if db.is_check_violation() {
            return StorageError::Validation(db.message().to_string());
        }
    }
    StorageError::Database(err)
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn list_routes(&self) -> StorageResult<Vec<Route>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, start_price, extra_price_per_kg, updated_at
            FROM shipping_routes
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(route_from_row).collect())
    }

    async fn get_route(&self, id: RouteId) -> StorageResult<Option<Route>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, start_price, extra_price_per_kg, updated_at
            FROM shipping_routes
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(route_from_row))
    }

    async fn find_route_by_name(&self, name: &str) -> StorageResult<Option<Route>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, start_price, extra_price_per_kg, updated_at
            FROM shipping_routes
            WHERE name = $1
            "#,
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(route_from_row))
    }

    async fn create_route(&self, route: &NewRoute) -> StorageResult<Route> {
        route.validate().map_err(StorageError::Validation)?;
        let name = route.name.trim();

        let row = sqlx::query(
            r#"
            INSERT INTO shipping_routes (name, start_price, extra_price_per_kg)
            VALUES ($1, $2, $3)
            RETURNING id, name, start_price, extra_price_per_kg, updated_at
            "#,
        )
        .bind(name)
        .bind(route.prices.start_price)
        .bind(route.prices.extra_price_per_kg)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, Some(name), None))?;

        Ok(route_from_row(&row))
    }

    async fn update_route_prices(&self, id: RouteId, prices: &RoutePrices) -> StorageResult<Route> {
        prices.validate().map_err(StorageError::Validation)?;

        let row = sqlx::query(
            r#"
            UPDATE shipping_routes
            SET start_price = $2,
                extra_price_per_kg = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, start_price, extra_price_per_kg, updated_at
            "#,
        )
        .bind(id.0)
        .bind(prices.start_price)
        .bind(prices.extra_price_per_kg)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, None, None))?;

        row.as_ref()
            .map(route_from_row)
            .ok_or_else(|| StorageError::route_not_found(id))
    }

    async fn delete_route(&self, id: RouteId) -> StorageResult<()> {
        // cities.route_id is ON DELETE SET NULL
        let result = sqlx::query(
            r#"
            DELETE FROM shipping_routes
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::route_not_found(id));
        }
        Ok(())
    }

    async fn list_cities(&self) -> StorageResult<Vec<City>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, province, route_id, updated_at
            FROM cities
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(city_from_row).collect())
    }

    async fn find_city(&self, name: &str, province: &str) -> StorageResult<Option<City>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, province, route_id, updated_at
            FROM cities
            WHERE name = $1 AND province = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(name.trim())
        .bind(province.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(city_from_row))
    }

    async fn create_city(&self, city: &NewCity) -> StorageResult<City> {
        city.validate().map_err(StorageError::Validation)?;

        let row = sqlx::query(
            r#"
            INSERT INTO cities (name, province, route_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, province, route_id, updated_at
            "#,
        )
        .bind(city.name.trim())
        .bind(city.province.trim())
        .bind(city.route_id.map(|id| id.0))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, None, city.route_id))?;

        Ok(city_from_row(&row))
    }

    async fn delete_city(&self, id: CityId) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM cities
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::city_not_found(id.0));
        }
        Ok(())
    }
}
