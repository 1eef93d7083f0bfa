//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use checkout::TransactionPolicy;
use document_store::{DocumentStore, SessionMode, TransactionSupport};
use serde::Serialize;

use crate::routes::orders::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub transactions: TransactionSupport,
    pub policy: TransactionPolicy,
    pub checkout_mode: SessionMode,
}

/// GET /health — returns system health and how checkouts will be written.
pub async fn check<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        transactions: state.store.transaction_support(),
        policy: state.workflow.config().transactions,
        checkout_mode: state.workflow.preferred_mode(),
    })
}
