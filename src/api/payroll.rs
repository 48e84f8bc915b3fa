//! Payroll and bonus handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;

use crate::app::AppState;
use crate::domain::{
    AppError, Bonus, CreateBonusRequest, ErrorResponse, ListBonusesParams, PaginatedResponse,
    PaymentHistoryParams, PaymentRecord, PaymentStatus, PayrollPreview, PayrollRunResult,
    ProcessPayrollRequest,
};

use super::auth::Identity;

/// Preview the payments a payroll run would make now
#[utoipa::path(
    get,
    path = "/api/payroll/process",
    tag = "payroll",
    responses(
        (status = 200, description = "Employees currently due and totals per token", body = PayrollPreview),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn preview_payroll_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PayrollPreview>, AppError> {
    let preview = state.payroll.preview(Utc::now()).await?;
    Ok(Json(preview))
}

/// Process payroll
///
/// Pays every due employee, or only the listed ones. Employees that cannot
/// be paid (not due, inactive, insufficient treasury) are reported under
/// `skipped`; the run itself fails only when the ledger is paused.
#[utoipa::path(
    post,
    path = "/api/payroll/process",
    tag = "payroll",
    request_body = ProcessPayrollRequest,
    responses(
        (status = 200, description = "Payroll run result", body = PayrollRunResult),
        (status = 403, description = "Caller may not run payroll", body = ErrorResponse),
        (status = 409, description = "Ledger is paused", body = ErrorResponse)
    )
)]
pub async fn process_payroll_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Option<Json<ProcessPayrollRequest>>,
) -> Result<Json<PayrollRunResult>, AppError> {
    identity.require_writer()?;
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let result = state.payroll.process_payroll(&request, Utc::now()).await?;
    info!(
        processed = result.processed.len(),
        skipped = result.skipped.len(),
        "Payroll processed via API"
    );
    Ok(Json(result))
}

/// Payment history, newest first
#[utoipa::path(
    get,
    path = "/api/payroll/history",
    tag = "payroll",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of payments to return (1-100, default: 20)"),
        ("cursor" = Option<String>, Query, description = "Cursor for pagination (payment ID to start after)"),
        ("employee_id" = Option<String>, Query, description = "Only payments to this employee")
    ),
    responses(
        (status = 200, description = "Page of payments", body = PaginatedResponse<PaymentRecord>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
pub async fn payment_history_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentHistoryParams>,
) -> Result<Json<PaginatedResponse<PaymentRecord>>, AppError> {
    let page = state.payroll.payment_history(&params).await?;
    Ok(Json(page))
}

/// Payment due status for one employee
#[utoipa::path(
    get,
    path = "/api/payroll/status/{employee_id}",
    tag = "payroll",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Payment status", body = PaymentStatus),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    )
)]
pub async fn payment_status_handler(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
) -> Result<Json<PaymentStatus>, AppError> {
    let status = state
        .payroll
        .payment_status(&employee_id, Utc::now())
        .await?;
    Ok(Json(status))
}

/// List bonuses, newest first
#[utoipa::path(
    get,
    path = "/api/bonuses",
    tag = "bonuses",
    params(
        ("status" = Option<String>, Query, description = "pending or distributed"),
        ("employee_id" = Option<String>, Query, description = "Only bonuses for this employee")
    ),
    responses(
        (status = 200, description = "Bonuses", body = [Bonus]),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
pub async fn list_bonuses_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListBonusesParams>,
) -> Result<Json<Vec<Bonus>>, AppError> {
    let bonuses = state.payroll.list_bonuses(&params).await?;
    Ok(Json(bonuses))
}

/// Create a pending bonus for an active employee
#[utoipa::path(
    post,
    path = "/api/bonuses",
    tag = "bonuses",
    request_body = CreateBonusRequest,
    responses(
        (status = 201, description = "Bonus created", body = Bonus),
        (status = 400, description = "Validation error or unsupported token", body = ErrorResponse),
        (status = 403, description = "Caller may not create bonuses", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse),
        (status = 409, description = "Ledger is paused", body = ErrorResponse)
    )
)]
pub async fn create_bonus_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateBonusRequest>,
) -> Result<(StatusCode, Json<Bonus>), AppError> {
    identity.require_writer()?;
    let bonus = state.payroll.create_bonus(&payload).await?;
    Ok((StatusCode::CREATED, Json(bonus)))
}

/// Get a bonus by ID
#[utoipa::path(
    get,
    path = "/api/bonuses/{id}",
    tag = "bonuses",
    params(
        ("id" = String, Path, description = "Bonus ID")
    ),
    responses(
        (status = 200, description = "Bonus found", body = Bonus),
        (status = 404, description = "Bonus not found", body = ErrorResponse)
    )
)]
pub async fn get_bonus_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Bonus>, AppError> {
    let bonus = state.payroll.get_bonus(&id).await?;
    Ok(Json(bonus))
}

/// Distribute a pending bonus from the treasury
#[utoipa::path(
    post,
    path = "/api/bonuses/{id}/distribute",
    tag = "bonuses",
    params(
        ("id" = String, Path, description = "Bonus ID")
    ),
    responses(
        (status = 200, description = "Bonus distributed", body = Bonus),
        (status = 402, description = "Insufficient treasury balance", body = ErrorResponse),
        (status = 403, description = "Caller may not distribute bonuses", body = ErrorResponse),
        (status = 404, description = "Bonus not found", body = ErrorResponse),
        (status = 409, description = "Already distributed or ledger paused", body = ErrorResponse)
    )
)]
pub async fn distribute_bonus_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Bonus>, AppError> {
    identity.require_writer()?;
    let bonus = state.payroll.distribute_bonus(&id).await?;
    Ok(Json(bonus))
}
