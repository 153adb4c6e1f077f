//! Catalog endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{CatalogStore, Product};
use common::{Money, ProductId, Size};
use orders::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    /// Stock per size, keyed by size code ("S", "M", "L", "XL").
    pub variants: BTreeMap<String, u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub variants: BTreeMap<String, u32>,
    pub total_stock: u64,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price_cents: product.price.cents(),
            variants: product
                .variants
                .iter()
                .map(|(size, stock)| (size.to_string(), *stock))
                .collect(),
            total_stock: product.total_stock(),
            created_at: product.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if req.price_cents <= 0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid price: {} cents (must be positive)",
            req.price_cents
        )));
    }

    let variants = req
        .variants
        .iter()
        .map(|(size, stock)| {
            let size: Size = size
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Invalid size: {size}")))?;
            Ok((size, *stock))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let mut product = Product::new(
        req.id.as_str(),
        req.name.as_str(),
        Money::from_cents(req.price_cents),
        variants,
    );
    if let Some(description) = req.description {
        product = product.with_description(description);
    }

    state.catalog.insert_product(product.clone()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products/:id — load a product by SKU.
#[tracing::instrument(skip(state))]
pub async fn get<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(product.into()))
}

/// GET /products — list all products.
#[tracing::instrument(skip(state))]
pub async fn list<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.list_products().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}
