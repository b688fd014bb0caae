//! HTTP API server with observability for the fleet tracker.
//!
//! Provides REST endpoints for vehicle registration, rentals, status
//! transitions, and proximity queries, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{VehicleCommandService, VehicleQueryService, VehicleRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::vehicles::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: VehicleRepository + Clone + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/vehicles", post(routes::vehicles::register::<R>))
        .route("/vehicles/nearby", get(routes::vehicles::nearby::<R>))
        .route(
            "/vehicles/{id}/status",
            put(routes::vehicles::update_status::<R>),
        )
        .route("/vehicles/{id}/rent", post(routes::vehicles::rent::<R>))
        .route(
            "/vehicles/{id}/return",
            post(routes::vehicles::return_vehicle::<R>),
        )
        .route(
            "/users/{user_id}/vehicles",
            get(routes::vehicles::user_vehicles::<R>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state from any repository implementation.
///
/// The repository is cloned into both services; implementations share
/// their backing store across clones (pool or `Arc`-held map).
pub fn create_state<R: VehicleRepository + Clone + 'static>(repository: R) -> Arc<AppState<R>> {
    Arc::new(AppState {
        commands: VehicleCommandService::new(repository.clone()),
        queries: VehicleQueryService::new(repository.clone()),
        repository,
    })
}
