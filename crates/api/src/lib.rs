//! HTTP API server for the marketplace cart.
//!
//! Provides REST endpoints for the authenticated user's cart and read-only
//! catalog lookups, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use document_store::DocumentStore;
use domain::{CartService, Catalog, DocumentCatalog};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;
use seed::{CatalogSeed, SeedError};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C>(state: Arc<AppState<S, C>>, metrics_handle: PrometheusHandle) -> Router
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route(
            "/cart",
            get(routes::cart::get::<S, C>).delete(routes::cart::clear::<S, C>),
        )
        .route("/cart/address", put(routes::cart::set_address::<S, C>))
        .route("/cart/products", post(routes::cart::add_product::<S, C>))
        .route(
            "/cart/products/{id}",
            delete(routes::cart::remove_product::<S, C>),
        )
        .route("/products/{id}", get(routes::catalog::get_product::<S, C>))
        .route("/markets/{id}", get(routes::catalog::get_market::<S, C>))
        .route(
            "/markets/{id}/products",
            get(routes::catalog::list_market_products::<S, C>),
        )
        .route(
            "/categories/{id}",
            get(routes::catalog::get_category::<S, C>),
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

/// Creates the application state with carts and catalog sharing one store.
pub fn create_default_state<S>(
    store: S,
    max_conflict_retries: u32,
) -> Arc<AppState<S, DocumentCatalog<S>>>
where
    S: DocumentStore + Clone + 'static,
{
    let catalog = DocumentCatalog::new(store.clone());
    let cart_service =
        CartService::new(store, catalog).with_max_conflict_retries(max_conflict_retries);

    Arc::new(AppState { cart_service })
}

/// Builds the application over `store`, loading `config.seed_file` into the
/// catalog first when one is configured.
pub async fn build_app<S>(
    store: S,
    config: &Config,
    metrics_handle: PrometheusHandle,
) -> Result<Router, SeedError>
where
    S: DocumentStore + Clone + 'static,
{
    let state = create_default_state(store, config.max_conflict_retries);

    if let Some(path) = &config.seed_file {
        tracing::info!(path = %path.display(), "loading catalog seed");
        CatalogSeed::from_path(path)
            .await?
            .apply(state.catalog())
            .await?;
    }

    Ok(create_app(state, metrics_handle))
}
