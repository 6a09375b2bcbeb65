//! Read-only catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{CategoryId, MarketId, ProductId};
use document_store::DocumentStore;
use domain::Catalog;

use crate::dto::{
    CategoryResponse, ListProductsQuery, MarketResponse, ProductResponse, ProductSummaryResponse,
};
use crate::error::ApiError;

use super::AppState;

/// GET /products/{id}: a product with its option elements resolved.
/// Accepts the internal or the external id.
#[tracing::instrument(skip(state))]
pub async fn get_product<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let product = state
        .catalog()
        .find_product_by_id(&ProductId::new(id.as_str()))
        .await
        .map_err(domain::DomainError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(ProductResponse::from(product)))
}

/// GET /markets/{id}
#[tracing::instrument(skip(state))]
pub async fn get_market<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
) -> Result<Json<MarketResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let market = state
        .catalog()
        .find_market_by_id(&MarketId::new(id.as_str()))
        .await
        .map_err(domain::DomainError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Market {id} not found")))?;

    Ok(Json(MarketResponse::from(market)))
}

/// GET /markets/{id}/products: the market's purchasable products, plus
/// subproducts when `?subproducts=true`.
#[tracing::instrument(skip(state))]
pub async fn list_market_products<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductSummaryResponse>>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let products = state
        .catalog()
        .list_products(&MarketId::new(id), query.subproducts)
        .await
        .map_err(domain::DomainError::from)?;

    Ok(Json(
        products
            .into_iter()
            .map(ProductSummaryResponse::from)
            .collect(),
    ))
}

/// GET /categories/{id}
#[tracing::instrument(skip(state))]
pub async fn get_category<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let category = state
        .catalog()
        .find_category_by_id(&CategoryId::new(id.as_str()))
        .await
        .map_err(domain::DomainError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Category {id} not found")))?;

    Ok(Json(CategoryResponse::from(category)))
}
