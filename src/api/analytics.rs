use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::app::AppState;
use crate::domain::{
    AppError, ErrorResponse, PaymentTrendParams, PaymentTrendPoint, PayrollSummary,
};

/// Headcount, monthly payroll and bonus totals
#[utoipa::path(
    get,
    path = "/api/analytics/payroll-summary",
    tag = "analytics",
    responses(
        (status = 200, description = "Payroll summary", body = PayrollSummary),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn payroll_summary_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PayrollSummary>, AppError> {
    let summary = state.analytics.payroll_summary(Utc::now()).await?;
    Ok(Json(summary))
}

/// Payments per calendar month, oldest first
#[utoipa::path(
    get,
    path = "/api/analytics/payment-trend",
    tag = "analytics",
    params(
        ("months" = Option<u32>, Query, description = "Number of months (1-24, default: 6)")
    ),
    responses(
        (status = 200, description = "Monthly payment totals", body = [PaymentTrendPoint]),
        (status = 400, description = "Invalid months", body = ErrorResponse)
    )
)]
pub async fn payment_trend_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentTrendParams>,
) -> Result<Json<Vec<PaymentTrendPoint>>, AppError> {
    let trend = state
        .analytics
        .payment_trend(&params, Utc::now())
        .await?;
    Ok(Json(trend))
}
