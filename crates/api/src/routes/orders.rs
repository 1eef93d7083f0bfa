//! Checkout and order management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use checkout::{Notifier, OrderWorkflow};
use document_store::DocumentStore;
use domain::{
    CatalogRepository, CheckoutRequest, Order, OrderFilter, OrderService, OrderStatus,
    UpdateOrderStatus, VoucherRepository,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub workflow: OrderWorkflow<S, Arc<dyn Notifier>>,
    pub orders: OrderService<S>,
    pub catalog: CatalogRepository<S>,
    pub vouchers: VoucherRepository<S>,
    pub store: S,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            success: true,
            order,
        }
    }
}

// -- Handlers --

/// POST /orders — place an order from a checkout request.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(request) = payload?;
    let placed = state.workflow.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(placed.order.into())))
}

/// GET /orders — list orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let orders = state
        .orders
        .list(OrderFilter {
            status,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;

    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}

/// GET /orders/{code} — fetch one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(code): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get(&code).await?;
    Ok(Json(order.into()))
}

/// PATCH /orders/{code}/status — move an order through its lifecycle.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(code): Path<String>,
    payload: Result<Json<UpdateOrderStatus>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Json(cmd) = payload?;
    let order = state.orders.update_status(&code, cmd).await?;
    Ok(Json(order.into()))
}
