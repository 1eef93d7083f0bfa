//! Voucher validation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use document_store::DocumentStore;
use domain::{AccountId, Money};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateVoucherRequest {
    pub code: String,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Cart subtotal used to preview the discount.
    #[serde(default)]
    pub subtotal: Option<Money>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateVoucherResponse {
    pub success: bool,
    pub code: String,
    pub percent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Money>,
}

/// POST /vouchers/validate — check that a voucher can be used.
///
/// Nothing is redeemed; the response only reports the discount the voucher
/// would grant.
#[tracing::instrument(skip(state, payload))]
pub async fn validate<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ValidateVoucherRequest>, JsonRejection>,
) -> Result<Json<ValidateVoucherResponse>, ApiError> {
    let Json(req) = payload?;
    if req.code.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing required field: code".to_string()));
    }

    let voucher = state.vouchers.check(&req.code, req.account_id).await?;
    Ok(Json(ValidateVoucherResponse {
        success: true,
        discount_amount: req
            .subtotal
            .map(|subtotal| subtotal.non_negative().percent(voucher.percent)),
        code: voucher.code,
        percent: voucher.percent,
    }))
}
