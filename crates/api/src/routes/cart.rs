//! Cart endpoints. Every route acts on the authenticated user's cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::ProductId;
use document_store::DocumentStore;
use domain::{Catalog, ClearCart, SetAddress};

use crate::auth::CurrentUser;
use crate::dto::{AddressRequest, CartResponse, PickProductRequest};
use crate::error::ApiError;

use super::AppState;

/// GET /cart: the user's cart, created empty on first access.
#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn get<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    user: CurrentUser,
) -> Result<Json<CartResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let cart = state.cart_service.get_or_create(&user.0).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /cart: removes every order from the cart.
#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn clear<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    user: CurrentUser,
) -> Result<Json<CartResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let result = state.cart_service.clear_cart(ClearCart::new(user.0)).await?;
    Ok(Json(CartResponse::from(&result.aggregate)))
}

/// PUT /cart/address: sets the delivery address.
#[tracing::instrument(skip(state, payload), fields(user_id = %user.0))]
pub async fn set_address<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    user: CurrentUser,
    payload: Result<Json<AddressRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let Json(request) = payload?;
    let address = request.into_address()?;

    let result = state
        .cart_service
        .set_address(SetAddress::new(user.0, address))
        .await?;
    Ok(Json(CartResponse::from(&result.aggregate)))
}

/// POST /cart/products: picks a product with its options and adds it.
#[tracing::instrument(skip(state, payload), fields(user_id = %user.0))]
pub async fn add_product<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    user: CurrentUser,
    payload: Result<Json<PickProductRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let Json(request) = payload?;
    let cmd = request.into_command()?;

    let result = state.cart_service.add_to_cart(&user.0, cmd).await?;
    Ok(Json(CartResponse::from(&result.aggregate)))
}

/// DELETE /cart/products/{id}: removes a product. Removing a product the
/// cart doesn't hold succeeds without changes.
#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn remove_product<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError>
where
    S: DocumentStore + 'static,
    C: Catalog + 'static,
{
    let result = state
        .cart_service
        .remove_from_cart(&user.0, &ProductId::new(id))
        .await?;
    Ok(Json(CartResponse::from(&result.aggregate)))
}
