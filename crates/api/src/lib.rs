//! HTTP API server with observability for the order engine.
//!
//! Provides REST endpoints for catalog and order management, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use catalog::{CatalogStore, InMemoryCatalogStore};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{InMemoryOrderStore, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    state: Arc<AppState<C, O>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create::<C, O>))
        .route("/products", get(routes::products::list::<C, O>))
        .route("/products/{id}", get(routes::products::get::<C, O>))
        .route("/orders", post(routes::orders::create::<C, O>))
        .route("/orders", get(routes::orders::list::<C, O>))
        .route("/orders/{id}", get(routes::orders::get::<C, O>))
        .route("/orders/{id}", delete(routes::orders::delete::<C, O>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<C, O>))
        .route("/orders/{id}/pay", post(routes::orders::pay::<C, O>))
        .route(
            "/orders/{id}/status",
            put(routes::orders::update_status::<C, O>),
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

/// Creates application state backed by in-memory stores.
pub fn create_default_state() -> Arc<AppState<InMemoryCatalogStore, InMemoryOrderStore>> {
    Arc::new(AppState::new(
        InMemoryCatalogStore::new(),
        InMemoryOrderStore::new(),
    ))
}
