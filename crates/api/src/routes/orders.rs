//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogStore;
use common::{AddressId, CustomerId, Money, OrderId, PaymentMethodId, Size};
use orders::store::OrderFilter;
use orders::{DraftItem, NewOrder, Order, OrderService, OrderStatus, OrderStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<C: CatalogStore + Clone, O: OrderStore> {
    pub order_service: OrderService<C, O>,
    pub catalog: C,
}

impl<C: CatalogStore + Clone, O: OrderStore> AppState<C, O> {
    /// Creates application state over the given stores.
    pub fn new(catalog: C, store: O) -> Self {
        Self {
            order_service: OrderService::new(catalog.clone(), store),
            catalog,
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Uuid,
    pub payment_method: Uuid,
    pub shipping_cost_cents: i64,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: String,
    pub payment_method: String,
    pub shipping_cost_cents: i64,
    pub total_cents: i64,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                size: item.size.to_string(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                line_total_cents: item.line_total().cents(),
            })
            .collect();
        Self {
            id: order.id.to_string(),
            customer_id: order.customer_id.to_string(),
            items,
            shipping_address: order.shipping_address.to_string(),
            payment_method: order.payment_method.to_string(),
            shipping_cost_cents: order.shipping_cost.cents(),
            total_cents: order.total_price.cents(),
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — price, reserve, and persist a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let items = req
        .items
        .iter()
        .map(|item| {
            let size = parse_size(&item.size)?;
            Ok(DraftItem::new(item.product_id.as_str(), size, item.quantity))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let order = state
        .order_service
        .create_order(NewOrder {
            customer_id: CustomerId::from_uuid(req.customer_id),
            items,
            shipping_address: AddressId::from_uuid(req.shipping_address),
            payment_method: PaymentMethodId::from_uuid(req.payment_method),
            shipping_cost: Money::from_cents(req.shipping_cost_cents),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .order_service
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(order.into()))
}

/// GET /orders — list orders, optionally filtered by customer and status.
#[tracing::instrument(skip(state, query))]
pub async fn list<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let filter = OrderFilter {
        customer_id: query.customer_id.map(CustomerId::from_uuid),
        status,
    };

    let orders = state.order_service.list_orders(&filter).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// POST /orders/:id/cancel — cancel an order and restore its stock.
///
/// An incomplete stock restoration still cancels the order but surfaces as
/// a 500 so the client knows the system needs attention.
#[tracing::instrument(skip(state))]
pub async fn cancel<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let order_id = parse_order_id(&id)?;
    let cancelled = state.order_service.cancel_order(order_id).await?;

    if cancelled.restore_failures.is_empty() {
        let response: OrderResponse = cancelled.order.into();
        return Ok(Json(response).into_response());
    }

    let response: OrderResponse = cancelled.order.into();
    let body = serde_json::json!({
        "error": format!(
            "order cancelled but {} stock restore(s) failed",
            cancelled.restore_failures.len()
        ),
        "order": response,
    });
    Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
}

/// POST /orders/:id/pay — mark a pending payment as paid.
#[tracing::instrument(skip(state))]
pub async fn pay<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.order_service.mark_paid(order_id).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/:id/status — apply a fulfillment status change.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = parse_status(&req.status)?;

    let order = state.order_service.update_status(order_id, status).await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/:id — remove a cancelled order record.
#[tracing::instrument(skip(state))]
pub async fn delete<C: CatalogStore + Clone + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.order_service.delete_order(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_size(size: &str) -> Result<Size, ApiError> {
    size.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid size: {size}")))
}

fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    status
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid status: {status}")))
}
