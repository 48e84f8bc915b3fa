//! Company registration handlers.
//!
//! A company is owned by the caller's wallet; `/me` routes resolve it
//! from the authenticated identity.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::app::AppState;
use crate::domain::{AppError, Company, CreateCompanyRequest, ErrorResponse, UpdateCompanyRequest};

use super::auth::Identity;

/// Register the caller's company and its ENS domain
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company registered", body = Company),
        (status = 400, description = "Invalid domain or wallet already owns a company", body = ErrorResponse),
        (status = 401, description = "No wallet identity", body = ErrorResponse),
        (status = 403, description = "Caller may not register companies", body = ErrorResponse)
    )
)]
pub async fn create_company_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    identity.require_writer()?;
    let wallet = identity.require_wallet()?;
    let company = state.service.create_company(wallet, &payload).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// Get the caller's company
#[utoipa::path(
    get,
    path = "/api/companies/me",
    tag = "companies",
    responses(
        (status = 200, description = "Caller's company", body = Company),
        (status = 401, description = "No wallet identity", body = ErrorResponse),
        (status = 404, description = "Caller has no company", body = ErrorResponse)
    )
)]
pub async fn get_my_company_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Company>, AppError> {
    let wallet = identity.require_wallet()?;
    let company = state.service.get_company_for_owner(wallet).await?;
    Ok(Json(company))
}

/// Rename the caller's company
#[utoipa::path(
    put,
    path = "/api/companies/me",
    tag = "companies",
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = Company),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "No wallet identity", body = ErrorResponse),
        (status = 404, description = "Caller has no company", body = ErrorResponse)
    )
)]
pub async fn update_my_company_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateCompanyRequest>,
) -> Result<Json<Company>, AppError> {
    identity.require_writer()?;
    let wallet = identity.require_wallet()?;
    let company = state
        .service
        .update_company_for_owner(wallet, &payload)
        .await?;
    Ok(Json(company))
}

/// Get a company by ID
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "companies",
    params(
        ("id" = String, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company found", body = Company),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
pub async fn get_company_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Company>, AppError> {
    let company = state.service.get_company(&id).await?;
    Ok(Json(company))
}
