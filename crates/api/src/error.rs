//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError};
use serde::Serialize;
use serde_json::{Value, json};

/// A rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Malformed request body.
    #[error("{0}")]
    BadRequest(String),
    /// Request fields failed validation.
    #[error("Request validation failed")]
    Validation(Vec<FieldError>),
    /// No authenticated user on the request.
    #[error("Authentication required")]
    Unauthorized,
    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, Value::Null),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, Value::Null),
            ApiError::Validation(fields) => {
                metrics::counter!("cart_validation_failures_total", "code" => "VALIDATION_FAILED")
                    .increment(1);
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_FAILED",
                    "Request validation failed".to_string(),
                    json!(fields),
                )
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                Value::Null,
            ),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = json!({ "error": message, "code": code, "details": details });
        (status, Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, &'static str, String, Value) {
    if err.is_conflict() {
        return (
            StatusCode::CONFLICT,
            "CONCURRENCY_CONFLICT",
            "The cart was modified concurrently, please retry".to_string(),
            Value::Null,
        );
    }

    let DomainError::Cart(cart_err) = &err else {
        return internal(&err);
    };

    let status = match cart_err {
        CartError::CartNotFound | CartError::ProductNotFound { .. } => StatusCode::NOT_FOUND,
        CartError::AlreadyCreated => StatusCode::CONFLICT,
        CartError::InvalidQuantity { .. }
        | CartError::ProductNotPurchasable { .. }
        | CartError::MissingRequiredOption { .. }
        | CartError::OptionQuantityOutOfBounds { .. }
        | CartError::UnknownOptionElement { .. }
        | CartError::PriceOutOfRange => StatusCode::BAD_REQUEST,
        CartError::UnresolvedOptionElement { .. } => return internal(&err),
    };

    (
        status,
        cart_err.code(),
        cart_err.to_string(),
        cart_error_details(cart_err),
    )
}

/// Logs the full error and hides it from the client.
fn internal(err: &DomainError) -> (StatusCode, &'static str, String, Value) {
    tracing::error!(error = %err, details = ?err, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL",
        "Internal server error".to_string(),
        Value::Null,
    )
}

fn cart_error_details(err: &CartError) -> Value {
    match err {
        CartError::ProductNotFound { product_id }
        | CartError::ProductNotPurchasable { product_id } => json!({ "productID": product_id }),
        CartError::InvalidQuantity { quantity } => json!({ "quantity": quantity }),
        CartError::MissingRequiredOption { group_id, label } => {
            json!({ "groupID": group_id, "label": label })
        }
        CartError::OptionQuantityOutOfBounds {
            group_id,
            label,
            min,
            max,
            actual,
        } => json!({
            "groupID": group_id,
            "label": label,
            "min": min,
            "max": max,
            "actual": actual,
        }),
        CartError::UnknownOptionElement {
            group_id,
            element_id,
        } => json!({ "groupID": group_id, "elementID": element_id }),
        CartError::CartNotFound
        | CartError::AlreadyCreated
        | CartError::PriceOutOfRange
        | CartError::UnresolvedOptionElement { .. } => Value::Null,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Domain(DomainError::Cart(err))
    }
}

#[cfg(test)]
mod tests {
    use common::{OptionGroupId, ProductId};
    use document_store::{DocumentKey, DocumentStoreError, Version};

    use super::*;

    async fn parts(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_bounds_error_is_bad_request_with_details() {
        let err = ApiError::from(CartError::OptionQuantityOutOfBounds {
            group_id: OptionGroupId::new("toppings"),
            label: "Toppings".to_string(),
            min: 1,
            max: 2,
            actual: 3,
        });

        let (status, body) = parts(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "OPTION_QUANTITY_OUT_OF_BOUNDS");
        assert_eq!(body["details"]["groupID"], "toppings");
        assert_eq!(body["details"]["actual"], 3);
    }

    #[tokio::test]
    async fn test_not_found_errors() {
        let (status, body) = parts(ApiError::from(CartError::CartNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "CART_NOT_FOUND");

        let (status, body) = parts(ApiError::from(CartError::ProductNotFound {
            product_id: ProductId::new("p1"),
        }))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["details"]["productID"], "p1");
    }

    #[tokio::test]
    async fn test_price_out_of_range_is_bad_request() {
        let (status, body) = parts(ApiError::from(CartError::PriceOutOfRange)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PRICE_OUT_OF_RANGE");
        assert!(body["details"].is_null());
    }

    #[tokio::test]
    async fn test_unresolved_element_is_opaque() {
        let err = ApiError::from(CartError::UnresolvedOptionElement {
            group_id: OptionGroupId::new("secret-group"),
            element_id: ProductId::new("secret-element"),
        });

        let (status, body) = parts(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL");
        assert!(!body.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_conflict_maps_to_409() {
        let err = ApiError::from(DomainError::DocumentStore(
            DocumentStoreError::ConcurrencyConflict {
                collection: "carts".to_string(),
                key: DocumentKey::new("u1"),
                expected: Version::new(1),
                actual: Version::new(2),
            },
        ));

        let (status, body) = parts(err).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONCURRENCY_CONFLICT");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let err = ApiError::Validation(vec![
            FieldError::new("productID", "must not be empty"),
            FieldError::new("quantity", "must be greater than 0"),
        ]);

        let (status, body) = parts(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
        assert_eq!(body["details"][1]["field"], "quantity");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (status, body) = parts(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}
