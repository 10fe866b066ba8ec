use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::directory::{DirectoryProvider, DirectorySnapshot};
use crate::observability::metrics::TimingGuard;
use crate::observability::MetricsRegistry;
use crate::rating::{RateEngine, RateOutcome};
use crate::storage::Storage;

use super::admin;
use super::error::ApiError;
use super::request::RateRequest;
use super::response::{CitiesResponse, ErrorResponse, HealthResponse, RatesResponse, ReadyResponse};

/// Shared application state.
pub struct AppState {
    /// Storage backend for routes and cities
    pub storage: Arc<dyn Storage>,

    /// Directory snapshots under the configured caching policy
    pub directory: Arc<dyn DirectoryProvider>,

    pub engine: RateEngine,

    pub metrics: Arc<MetricsRegistry>,

    /// Upper bound on loading a directory snapshot
    pub directory_timeout: Duration,

    /// Maximum number of requests served concurrently
    pub max_concurrent_requests: usize,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    /// Fetch the current directory snapshot, bounded by the directory timeout.
    async fn snapshot(&self) -> anyhow::Result<Arc<DirectorySnapshot>> {
        let result = match timeout(self.directory_timeout, self.directory.snapshot()).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "directory load timed out after {}ms",
                self.directory_timeout.as_millis()
            )),
        };
        self.metrics.record_directory_load(result.is_ok());
        result
    }
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/shipping-rates", post(handle_shipping_rates))
        .route("/api/shipping-rates", post(handle_shipping_rates))
        .route("/api/cities", get(handle_list_cities))
        .layer(CorsLayer::permissive());

    Router::new()
        .merge(public)
        .nest("/admin", admin::router())
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(GlobalConcurrencyLimitLayer::new(state.max_concurrent_requests))
        .with_state(state)
}

/// Handle carrier-service rate callbacks.
///
/// Always answers 200. Malformed bodies, unknown cities and internal
/// failures all produce an empty rate list.
async fn handle_shipping_rates(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Json<RatesResponse> {
    let _timing = TimingGuard::new(&state.metrics);
    let request_id = Uuid::new_v4();

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            debug!(%request_id, error = %e, "Unreadable rate request body");
            state.metrics.record_malformed();
            return Json(RatesResponse::empty());
        }
    };

    let request = match RateRequest::parse(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(%request_id, error = %e, "Malformed rate request");
            state.metrics.record_malformed();
            return Json(RatesResponse::empty());
        }
    };

    let Some(city) = request.city() else {
        debug!(%request_id, "Rate request without destination city");
        state.metrics.record_outcome(&RateOutcome::NoCity);
        return Json(RatesResponse::empty());
    };

    let snapshot = match state.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(%request_id, city = city, error = %e, "Directory unavailable, returning no rates");
            state.metrics.record_failed();
            return Json(RatesResponse::empty());
        }
    };

    let items = request.line_items();
    let outcome = state.engine.evaluate(city, &items, snapshot.as_ref());
    state.metrics.record_outcome(&outcome);

    match &outcome {
        RateOutcome::Quoted(quote) => info!(
            %request_id,
            city = city,
            service_code = %quote.service_code,
            total_price = quote.total_price,
            items = items.len(),
            "Rate calculated"
        ),
        RateOutcome::InvalidCart => warn!(
            %request_id,
            city = city,
            items = items.len(),
            "Cart weight invalid, returning no rates"
        ),
        other => info!(%request_id, city = city, outcome = other.label(), "No rate for destination"),
    }

    Json(RatesResponse::new(outcome.into_quotes()))
}

/// Public city list for the checkout city picker.
async fn handle_list_cities(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let cities = state.storage.list_cities().await?;
    Ok(Json(CitiesResponse { cities }))
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        directory_mode: state.directory.mode().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> axum::response::Response {
    match state.snapshot().await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                routes: snapshot.route_count(),
                cities: snapshot.city_count(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Directory unavailable", "NOT_READY")),
            )
                .into_response()
        }
    }
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = format!(
        r#"# HELP ecuship_uptime_seconds Application uptime in seconds
# TYPE ecuship_uptime_seconds counter
ecuship_uptime_seconds {}

{}"#,
        state.start_time.elapsed().as_secs(),
        state.metrics.to_prometheus(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{CachedProvider, PerRequestProvider};
    use crate::domain::{NewCity, NewRoute};
    use crate::observability::tracing::init_test_tracing;
    use crate::storage::{MemoryStorage, StorageError, StorageResult};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    async fn seeded_storage() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        let local = storage
            .create_route(&NewRoute::new("Local", Decimal::new(255, 2), Decimal::new(35, 2)))
            .await
            .unwrap();
        for (name, province, route_id) in [
            ("Guayaquil", "Guayas", Some(local.id)),
            ("Quito", "Pichincha", None),
        ] {
            storage
                .create_city(&NewCity {
                    name: name.to_string(),
                    province: province.to_string(),
                    route_id,
                })
                .await
                .unwrap();
        }
        storage
    }

    fn app_state(storage: Arc<dyn Storage>, directory: Arc<dyn DirectoryProvider>) -> Arc<AppState> {
        app_state_with_timeout(storage, directory, Duration::from_millis(500))
    }

    fn app_state_with_timeout(
        storage: Arc<dyn Storage>,
        directory: Arc<dyn DirectoryProvider>,
        directory_timeout: Duration,
    ) -> Arc<AppState> {
        init_test_tracing();
        Arc::new(AppState {
            storage,
            directory,
            engine: RateEngine::default(),
            metrics: Arc::new(MetricsRegistry::new()),
            directory_timeout,
            max_concurrent_requests: 64,
            start_time: Instant::now(),
            version: "0.1.0-test".to_string(),
        })
    }

    async fn test_app_state() -> Arc<AppState> {
        let storage: Arc<dyn Storage> = seeded_storage().await;
        let directory = Arc::new(PerRequestProvider::new(storage.clone()));
        app_state(storage, directory)
    }

    async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    fn rate_body(city: &str, grams: u32) -> String {
        format!(
            r#"{{"rate": {{"destination": {{"city": "{}"}}, "items": [{{"grams": {}, "quantity": 1}}]}}}}"#,
            city, grams
        )
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_app_state().await);

        let (status, json) = send(app, Method::GET, "/health", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["directory_mode"], "per-request");
    }

    #[tokio::test]
    async fn test_rate_for_assigned_city() {
        let app = create_router(test_app_state().await);

        let (status, json) =
            send(app, Method::POST, "/shipping-rates", &rate_body(" guayaquil ", 2500)).await;

        assert_eq!(status, StatusCode::OK);
        let rates = json["rates"].as_array().unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0]["total_price"], 290);
        assert_eq!(rates[0]["service_code"], "ESTANDAR-1");
        assert_eq!(rates[0]["service_name"], "Envío Estándar (Local)");
        assert_eq!(rates[0]["description"], "Entrega en Guayaquil");
        assert_eq!(rates[0]["currency"], "USD");
    }

    #[tokio::test]
    async fn test_callback_alias_path() {
        let app = create_router(test_app_state().await);
        let (_, json) =
            send(app, Method::POST, "/api/shipping-rates", &rate_body("GUAYAQUIL", 100)).await;
        assert_eq!(json["rates"][0]["total_price"], 255);
    }

    #[tokio::test]
    async fn test_empty_rates_are_still_ok() {
        let state = test_app_state().await;

        let cases = [
            rate_body("Quito", 1000),
            rate_body("Loja", 1000),
            rate_body("   ", 1000),
            r#"{"rate": {"destination": {}, "items": []}}"#.to_string(),
            r#"{"rate": {"items": [{"grams": 10, "quantity": 1}]}}"#.to_string(),
            r#"{"rate": {"destination": {"city": "Guayaquil"}}}"#.to_string(),
            "this is not json".to_string(),
            r#"{"rate": {"destination": {"city": "Guayaquil"}, "items": [{"grams": "x", "quantity": 1}]}}"#
                .to_string(),
        ];

        for body in cases {
            let app = create_router(state.clone());
            let (status, json) = send(app, Method::POST, "/shipping-rates", &body).await;
            assert_eq!(status, StatusCode::OK, "body: {}", body);
            assert_eq!(json, serde_json::json!({"rates": []}), "body: {}", body);
        }

        assert_eq!(
            state
                .metrics
                .rates_malformed
                .load(std::sync::atomic::Ordering::Relaxed),
            3
        );
    }

    #[tokio::test]
    async fn test_oversized_body_still_ok() {
        let state = test_app_state().await;
        let body = format!(
            r#"{{"rate": {{"destination": {{"city": "Guayaquil"}}, "items": []}}, "note": "{}"}}"#,
            "x".repeat(3 * 1024 * 1024)
        );

        let (status, json) = send(create_router(state.clone()), Method::POST, "/shipping-rates", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"rates": []}));
        assert_eq!(
            state
                .metrics
                .rates_malformed
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    struct FailingStorage;

    #[async_trait::async_trait]
    impl Storage for FailingStorage {
        async fn list_routes(&self) -> StorageResult<Vec<crate::domain::Route>> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn get_route(&self, _: crate::domain::RouteId) -> StorageResult<Option<crate::domain::Route>> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn find_route_by_name(&self, _: &str) -> StorageResult<Option<crate::domain::Route>> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn create_route(&self, _: &NewRoute) -> StorageResult<crate::domain::Route> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn update_route_prices(
            &self,
            _: crate::domain::RouteId,
            _: &crate::domain::RoutePrices,
        ) -> StorageResult<crate::domain::Route> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn delete_route(&self, _: crate::domain::RouteId) -> StorageResult<()> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn list_cities(&self) -> StorageResult<Vec<crate::domain::City>> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn find_city(&self, _: &str, _: &str) -> StorageResult<Option<crate::domain::City>> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn create_city(&self, _: &NewCity) -> StorageResult<crate::domain::City> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn delete_city(&self, _: crate::domain::CityId) -> StorageResult<()> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_to_empty_rates() {
        let storage: Arc<dyn Storage> = Arc::new(FailingStorage);
        let directory = Arc::new(PerRequestProvider::new(storage.clone()));
        let state = app_state(storage, directory);

        let (status, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/shipping-rates",
            &rate_body("Guayaquil", 100),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"rates": []}));

        let (status, json) = send(create_router(state.clone()), Method::GET, "/ready", "").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "NOT_READY");

        let (status, _) = send(create_router(state), Method::GET, "/admin/routes", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// Memory storage whose route listing outlasts the directory timeout.
    struct SlowStorage {
        inner: MemoryStorage,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl Storage for SlowStorage {
        async fn list_routes(&self) -> StorageResult<Vec<crate::domain::Route>> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_routes().await
        }
        async fn get_route(&self, id: crate::domain::RouteId) -> StorageResult<Option<crate::domain::Route>> {
            self.inner.get_route(id).await
        }
        async fn find_route_by_name(&self, name: &str) -> StorageResult<Option<crate::domain::Route>> {
            self.inner.find_route_by_name(name).await
        }
        async fn create_route(&self, route: &NewRoute) -> StorageResult<crate::domain::Route> {
            self.inner.create_route(route).await
        }
        async fn update_route_prices(
            &self,
            id: crate::domain::RouteId,
            prices: &crate::domain::RoutePrices,
        ) -> StorageResult<crate::domain::Route> {
            self.inner.update_route_prices(id, prices).await
        }
        async fn delete_route(&self, id: crate::domain::RouteId) -> StorageResult<()> {
            self.inner.delete_route(id).await
        }
        async fn list_cities(&self) -> StorageResult<Vec<crate::domain::City>> {
            self.inner.list_cities().await
        }
        async fn find_city(&self, name: &str, province: &str) -> StorageResult<Option<crate::domain::City>> {
            self.inner.find_city(name, province).await
        }
        async fn create_city(&self, city: &NewCity) -> StorageResult<crate::domain::City> {
            self.inner.create_city(city).await
        }
        async fn delete_city(&self, id: crate::domain::CityId) -> StorageResult<()> {
            self.inner.delete_city(id).await
        }
    }

    #[tokio::test]
    async fn test_directory_timeout_degrades_to_empty_rates() {
        let inner = MemoryStorage::new();
        let local = inner
            .create_route(&NewRoute::new("Local", Decimal::new(255, 2), Decimal::new(35, 2)))
            .await
            .unwrap();
        inner
            .create_city(&NewCity {
                name: "Guayaquil".to_string(),
                province: "Guayas".to_string(),
                route_id: Some(local.id),
            })
            .await
            .unwrap();

        let storage: Arc<dyn Storage> = Arc::new(SlowStorage {
            inner,
            delay: Duration::from_millis(50),
        });
        let directory = Arc::new(PerRequestProvider::new(storage.clone()));
        let state = app_state_with_timeout(storage, directory, Duration::from_millis(10));

        let (status, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/shipping-rates",
            &rate_body("Guayaquil", 100),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"rates": []}));
        let errors = state
            .metrics
            .directory_load_errors
            .load(std::sync::atomic::Ordering::Relaxed);
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_admin_update_refreshes_cached_rates() {
        let storage: Arc<dyn Storage> = seeded_storage().await;
        let directory = Arc::new(CachedProvider::new(storage.clone()));
        let state = app_state(storage, directory);

        let (_, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/shipping-rates",
            &rate_body("Guayaquil", 2500),
        )
        .await;
        assert_eq!(json["rates"][0]["total_price"], 290);

        let (status, json) = send(
            create_router(state.clone()),
            Method::PUT,
            "/admin/routes/1",
            r#"{"start_price": "3.00", "extra_price_per_kg": "0.50"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Local");

        let (_, json) = send(
            create_router(state),
            Method::POST,
            "/shipping-rates",
            &rate_body("Guayaquil", 2500),
        )
        .await;
        assert_eq!(json["rates"][0]["total_price"], 350);
    }

    #[tokio::test]
    async fn test_admin_route_lifecycle() {
        let state = test_app_state().await;

        let (status, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/admin/routes",
            r#"{"name": "Regional", "start_price": 4.44, "extra_price_per_kg": 0.72}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let route_id = json["id"].as_i64().unwrap();

        let (status, json) = send(
            create_router(state.clone()),
            Method::GET,
            &format!("/admin/routes/{}", route_id),
            "",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Regional");

        let (status, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/admin/routes",
            r#"{"name": "Regional", "start_price": 1, "extra_price_per_kg": 1}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");

        let (status, _) = send(
            create_router(state.clone()),
            Method::POST,
            "/admin/cities",
            &format!(r#"{{"name": "Ambato", "province": "Tungurahua", "route_id": {}}}"#, route_id),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/shipping-rates",
            &rate_body("ambato", 500),
        )
        .await;
        assert_eq!(json["rates"][0]["total_price"], 444);

        let (status, _) = send(
            create_router(state.clone()),
            Method::DELETE,
            &format!("/admin/routes/{}", route_id),
            "",
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/shipping-rates",
            &rate_body("ambato", 500),
        )
        .await;
        assert_eq!(json, serde_json::json!({"rates": []}));

        let (status, json) = send(
            create_router(state.clone()),
            Method::GET,
            &format!("/admin/routes/{}", route_id),
            "",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");

        let (_, json) = send(create_router(state), Method::GET, "/admin/cities", "").await;
        let ambato = json["cities"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == "Ambato")
            .unwrap();
        assert!(ambato["route_id"].is_null());
        assert!(ambato["route_name"].is_null());
    }

    #[tokio::test]
    async fn test_admin_validation_errors() {
        let state = test_app_state().await;

        let (status, json) = send(
            create_router(state.clone()),
            Method::POST,
            "/admin/routes",
            r#"{"name": "Bad", "start_price": -1, "extra_price_per_kg": 0}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");

        let (status, _) = send(
            create_router(state.clone()),
            Method::POST,
            "/admin/routes",
            r#"{"name": "Missing prices"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            create_router(state.clone()),
            Method::POST,
            "/admin/cities",
            r#"{"name": "Loja", "province": "Loja", "route_id": 77}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) =
            send(create_router(state), Method::DELETE, "/admin/cities/999", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_public_city_list_sorted() {
        let app = create_router(test_app_state().await);

        let (status, json) = send(app, Method::GET, "/api/cities", "").await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json["cities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Guayaquil", "Quito"]);
    }

    #[tokio::test]
    async fn test_ready_and_metrics() {
        let state = test_app_state().await;

        let (status, json) = send(create_router(state.clone()), Method::GET, "/ready", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["routes"], 1);
        assert_eq!(json["cities"], 2);

        send(
            create_router(state.clone()),
            Method::POST,
            "/shipping-rates",
            &rate_body("Guayaquil", 100),
        )
        .await;

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("ecuship_rates{outcome=\"quoted\"} 1"));
    }
}
