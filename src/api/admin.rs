//! Route and city administration.
//!
//! Every successful mutation invalidates the directory provider so the next
//! rate request prices with fresh data.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::{CityId, NewCity, NewRoute, RouteId};
use crate::storage::StorageError;

use super::error::ApiError;
use super::request::UpdateRouteRequest;
use super::response::{CitiesResponse, CityView, RoutesResponse};
use super::routes::AppState;

/// Admin routes, nested under `/admin`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/:id", get(get_route).put(update_route).delete(delete_route))
        .route("/cities", get(list_cities).post(create_city))
        .route("/cities/:id", delete(delete_city))
}

fn mutated(state: &AppState) {
    state.directory.invalidate();
    state.metrics.record_admin_mutation();
}

async fn list_routes(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let routes = state.storage.list_routes().await?;
    Ok(Json(RoutesResponse { routes }))
}

async fn create_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewRoute>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_route) = payload?;
    let route = state.storage.create_route(&new_route).await?;
    mutated(&state);

    info!(route_id = %route.id, name = %route.name, "Route created");
    Ok((StatusCode::CREATED, Json(route)))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let id = RouteId(id);
    let route = state
        .storage
        .get_route(id)
        .await?
        .ok_or_else(|| StorageError::route_not_found(id))?;
    Ok(Json(route))
}

async fn update_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateRouteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(update) = payload?;
    let route = state
        .storage
        .update_route_prices(RouteId(id), &update.prices())
        .await?;
    mutated(&state);

    info!(
        route_id = %route.id,
        start_price = %route.start_price,
        extra_price_per_kg = %route.extra_price_per_kg,
        "Route prices updated"
    );
    Ok(Json(route))
}

async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.storage.delete_route(RouteId(id)).await?;
    mutated(&state);

    info!(route_id = id, "Route deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_cities(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let (routes, cities) = tokio::try_join!(state.storage.list_routes(), state.storage.list_cities())?;
    let names: HashMap<RouteId, String> = routes.into_iter().map(|r| (r.id, r.name)).collect();

    let cities = cities
        .into_iter()
        .map(|city| CityView {
            route_name: city.route_id.and_then(|id| names.get(&id).cloned()),
            city,
        })
        .collect();

    Ok(Json(CitiesResponse { cities }))
}

async fn create_city(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewCity>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_city) = payload?;
    let city = state.storage.create_city(&new_city).await?;
    mutated(&state);

    info!(city_id = %city.id, name = %city.name, "City created");
    Ok((StatusCode::CREATED, Json(city)))
}

async fn delete_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.storage.delete_city(CityId(id)).await?;
    mutated(&state);

    info!(city_id = id, "City deleted");
    Ok(StatusCode::NO_CONTENT)
}
