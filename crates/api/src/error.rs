//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use orders::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order domain error.
    Order(OrderError),
    /// Catalog error.
    Catalog(CatalogError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Insufficient stock carries a structured item list the client can
        // render, so it gets its own response shape.
        if let ApiError::Order(OrderError::InsufficientStock(ref shortages)) = self {
            let body = serde_json::json!({
                "error": self.to_message(),
                "items": shortages,
            });
            return (StatusCode::CONFLICT, axum::Json(body)).into_response();
        }

        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Catalog(err) => catalog_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl ApiError {
    fn to_message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::Order(err) => err.to_string(),
            ApiError::Catalog(err) => err.to_string(),
        }
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    match &err {
        OrderError::OrderNotFound(_) | OrderError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        OrderError::InsufficientStock(_)
        | OrderError::InvalidTransition { .. }
        | OrderError::InvalidState { .. }
        | OrderError::InvalidPaymentState { .. } => (StatusCode::CONFLICT, err.to_string()),
        OrderError::InvalidQuantity { .. }
        | OrderError::InvalidShippingCost { .. }
        | OrderError::NoItems => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::StockInconsistency(_) | OrderError::Storage(_) | OrderError::Catalog(_) => {
            tracing::error!(error = %err, "order operation failed server-side");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    match &err {
        CatalogError::ProductNotFound(_) | CatalogError::VariantNotFound { .. } => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CatalogError::AlreadyExists(_) => (StatusCode::CONFLICT, err.to_string()),
        CatalogError::Database(_) | CatalogError::Serialization(_) => {
            tracing::error!(error = %err, "catalog operation failed server-side");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}
