//! HTTP API server for the storefront.
//!
//! Exposes checkout, order management, catalog browsing and voucher
//! validation, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use checkout::{Notifier, OrderWorkflow, WorkflowConfig};
use document_store::DocumentStore;
use domain::{CatalogRepository, OrderService, VoucherRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{code}", get(routes::orders::get::<S>))
        .route(
            "/orders/{code}/status",
            patch(routes::orders::update_status::<S>),
        )
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/vouchers/validate", post(routes::vouchers::validate::<S>))
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

/// Creates the application state over a store and a notifier.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(
    store: S,
    config: WorkflowConfig,
    notifier: Arc<dyn Notifier>,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        workflow: OrderWorkflow::new(store.clone(), notifier, config),
        orders: OrderService::new(store.clone()),
        catalog: CatalogRepository::new(store.clone()),
        vouchers: VoucherRepository::new(store.clone()),
        store,
    })
}
