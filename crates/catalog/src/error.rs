//! Catalog error types.

use common::{ProductId, Size};
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product exists with the given ID.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The product exists but carries no variant for the given size.
    #[error("Variant not found: {product_id} size {size}")]
    VariantNotFound { product_id: ProductId, size: Size },

    /// A product with the given ID already exists.
    #[error("Product already exists: {0}")]
    AlreadyExists(ProductId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for catalog results.
pub type Result<T> = std::result::Result<T, CatalogError>;
