//! Catalog browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use document_store::DocumentStore;
use domain::Product;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    #[serde(default)]
    pub include_unavailable: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}

#[derive(Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

/// GET /products — list products, available ones only by default.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state
        .catalog
        .list(query.include_unavailable, query.limit, query.offset)
        .await?;
    Ok(Json(ProductListResponse {
        success: true,
        products,
    }))
}

/// GET /products/{id} — fetch a product by internal or external id.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}
