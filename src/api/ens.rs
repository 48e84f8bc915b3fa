//! ENS handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::app::AppState;
use crate::domain::{
    AppError, EnsAvailability, EnsRegistration, ErrorResponse, RegisterSubdomainRequest,
};

use super::auth::Identity;

/// Check whether an ENS name can be registered
#[utoipa::path(
    get,
    path = "/api/ens/check/{name}",
    tag = "ens",
    params(
        ("name" = String, Path, description = "Label or full name, e.g. `acme` or `acme.eth`")
    ),
    responses(
        (status = 200, description = "Availability", body = EnsAvailability),
        (status = 400, description = "Invalid name", body = ErrorResponse)
    )
)]
pub async fn check_availability_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<EnsAvailability>, AppError> {
    let availability = state.ens.check_availability(&name).await?;
    Ok(Json(availability))
}

/// Assign `label.<company domain>` to an employee
#[utoipa::path(
    post,
    path = "/api/ens/register",
    tag = "ens",
    request_body = RegisterSubdomainRequest,
    responses(
        (status = 201, description = "Subdomain registered", body = EnsRegistration),
        (status = 400, description = "Invalid label or name already taken", body = ErrorResponse),
        (status = 401, description = "No wallet identity", body = ErrorResponse),
        (status = 403, description = "Employee belongs to another company", body = ErrorResponse),
        (status = 404, description = "Company or employee not found", body = ErrorResponse)
    )
)]
pub async fn register_subdomain_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<RegisterSubdomainRequest>,
) -> Result<(StatusCode, Json<EnsRegistration>), AppError> {
    identity.require_writer()?;
    let wallet = identity.require_wallet()?;
    let registration = state.ens.register_subdomain(wallet, &payload).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}
