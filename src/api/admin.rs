//! Admin API handlers for the payroll ledger.
//!
//! Pausing, treasury funding, emergency withdrawal and the token whitelist.
//! Mounted behind the admin guard in the router.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::domain::{AppError, TreasuryReceipt, TreasurySnapshot, ValidationError};

use super::auth::Identity;

/// Request body for treasury deposits and withdrawals
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TreasuryRequest {
    /// Token symbol
    #[schema(example = "USDC")]
    pub token: String,
    /// Decimal amount
    #[schema(example = "1000")]
    pub amount: String,
}

/// Request body for `PUT /api/admin/tokens/{symbol}`
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenSupportRequest {
    pub supported: bool,
}

/// Response for ledger state changes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LedgerActionResponse {
    /// Success indicator
    pub success: bool,
    /// Descriptive message
    pub message: String,
    /// Simulated transaction hash
    pub tx_hash: String,
}

fn caller(identity: &Identity) -> &str {
    identity.wallet.as_deref().unwrap_or("anonymous")
}

/// Pause the payroll ledger
///
/// POST /api/admin/pause
#[utoipa::path(
    post,
    path = "/api/admin/pause",
    tag = "admin",
    responses(
        (status = 200, description = "Ledger paused", body = LedgerActionResponse),
        (status = 403, description = "Admin role required", body = crate::domain::ErrorResponse),
        (status = 409, description = "Ledger already paused", body = crate::domain::ErrorResponse),
    )
)]
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<LedgerActionResponse>, AppError> {
    let tx_hash = state.payroll.pause().await?;
    warn!(admin = %caller(&identity), tx_hash = %tx_hash, "Admin paused the payroll ledger");
    Ok(Json(LedgerActionResponse {
        success: true,
        message: "Payroll ledger paused".to_string(),
        tx_hash,
    }))
}

/// Resume the payroll ledger
///
/// POST /api/admin/unpause
#[utoipa::path(
    post,
    path = "/api/admin/unpause",
    tag = "admin",
    responses(
        (status = 200, description = "Ledger resumed", body = LedgerActionResponse),
        (status = 403, description = "Admin role required", body = crate::domain::ErrorResponse),
        (status = 409, description = "Ledger is not paused", body = crate::domain::ErrorResponse),
    )
)]
pub async fn unpause_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<LedgerActionResponse>, AppError> {
    let tx_hash = state.payroll.unpause().await?;
    warn!(admin = %caller(&identity), tx_hash = %tx_hash, "Admin resumed the payroll ledger");
    Ok(Json(LedgerActionResponse {
        success: true,
        message: "Payroll ledger resumed".to_string(),
        tx_hash,
    }))
}

/// Treasury balances and ledger counters
///
/// GET /api/admin/treasury
#[utoipa::path(
    get,
    path = "/api/admin/treasury",
    tag = "admin",
    responses(
        (status = 200, description = "Treasury snapshot", body = TreasurySnapshot),
        (status = 403, description = "Admin role required", body = crate::domain::ErrorResponse),
    )
)]
pub async fn treasury_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TreasurySnapshot>, AppError> {
    let snapshot = state.payroll.treasury().await?;
    Ok(Json(snapshot))
}

/// Fund the treasury
///
/// POST /api/admin/treasury/deposit
#[utoipa::path(
    post,
    path = "/api/admin/treasury/deposit",
    tag = "admin",
    request_body = TreasuryRequest,
    responses(
        (status = 200, description = "Deposit applied", body = TreasuryReceipt),
        (status = 400, description = "Invalid amount or unsupported token", body = crate::domain::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::domain::ErrorResponse),
    )
)]
pub async fn deposit_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TreasuryRequest>,
) -> Result<Json<TreasuryReceipt>, AppError> {
    let receipt = state
        .payroll
        .deposit(&payload.token, &payload.amount)
        .await?;
    Ok(Json(receipt))
}

/// Emergency withdrawal; only allowed while the ledger is paused
///
/// POST /api/admin/treasury/withdraw
#[utoipa::path(
    post,
    path = "/api/admin/treasury/withdraw",
    tag = "admin",
    request_body = TreasuryRequest,
    responses(
        (status = 200, description = "Withdrawal applied", body = TreasuryReceipt),
        (status = 400, description = "Invalid amount", body = crate::domain::ErrorResponse),
        (status = 402, description = "Insufficient treasury balance", body = crate::domain::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::domain::ErrorResponse),
        (status = 409, description = "Ledger is not paused", body = crate::domain::ErrorResponse),
    )
)]
pub async fn withdraw_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<TreasuryRequest>,
) -> Result<Json<TreasuryReceipt>, AppError> {
    let receipt = state
        .payroll
        .emergency_withdraw(&payload.token, &payload.amount)
        .await?;
    warn!(
        admin = %caller(&identity),
        token = %receipt.token,
        amount = %receipt.amount,
        "Admin performed emergency withdrawal"
    );
    Ok(Json(receipt))
}

/// Add or remove a token from the payment whitelist
///
/// PUT /api/admin/tokens/{symbol}
#[utoipa::path(
    put,
    path = "/api/admin/tokens/{symbol}",
    tag = "admin",
    params(
        ("symbol" = String, Path, description = "Token symbol, e.g. USDC")
    ),
    request_body = TokenSupportRequest,
    responses(
        (status = 200, description = "Whitelist updated", body = LedgerActionResponse),
        (status = 400, description = "Invalid symbol", body = crate::domain::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::domain::ErrorResponse),
    )
)]
pub async fn set_token_supported_handler(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Json(payload): Json<TokenSupportRequest>,
) -> Result<Json<LedgerActionResponse>, AppError> {
    if symbol.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::MissingField(
            "symbol".to_string(),
        )));
    }
    let tx_hash = state
        .payroll
        .set_token_supported(&symbol, payload.supported)
        .await?;
    let verb = if payload.supported { "enabled" } else { "disabled" };
    Ok(Json(LedgerActionResponse {
        success: true,
        message: format!("Token {} {}", symbol.trim().to_uppercase(), verb),
        tx_hash,
    }))
}
