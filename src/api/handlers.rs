//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    AppError, CreateEmployeeRequest, DatabaseError, Employee, EmploymentType, ErrorDetail,
    ErrorResponse, ExternalServiceError, HealthResponse, HealthStatus, LedgerError,
    ListEmployeesParams, PaginatedResponse, PaymentFrequency, RateLimitResponse,
    UpdateEmployeeRequest,
};

use super::auth::Identity;
use super::{admin, analytics, companies, ens, payroll};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Web3 Payroll API",
        version = "0.1.0",
        description = "Employee records, payroll processing, bonuses and ENS subdomains for on-chain payroll",
        contact(
            name = "API Support",
            email = "support@example.com"
        ),
        license(
            name = "MIT"
        )
    ),
    paths(
        health_check_handler,
        liveness_handler,
        readiness_handler,
        list_employees_handler,
        create_employee_handler,
        get_employee_handler,
        update_employee_handler,
        delete_employee_handler,
        deactivate_employee_handler,
        activate_employee_handler,
        get_employee_by_wallet_handler,
        companies::create_company_handler,
        companies::get_my_company_handler,
        companies::update_my_company_handler,
        companies::get_company_handler,
        payroll::preview_payroll_handler,
        payroll::process_payroll_handler,
        payroll::payment_history_handler,
        payroll::payment_status_handler,
        payroll::list_bonuses_handler,
        payroll::create_bonus_handler,
        payroll::get_bonus_handler,
        payroll::distribute_bonus_handler,
        ens::check_availability_handler,
        ens::register_subdomain_handler,
        analytics::payroll_summary_handler,
        analytics::payment_trend_handler,
        admin::pause_handler,
        admin::unpause_handler,
        admin::treasury_handler,
        admin::deposit_handler,
        admin::withdraw_handler,
        admin::set_token_supported_handler,
    ),
    components(
        schemas(
            Employee,
            EmploymentType,
            PaymentFrequency,
            CreateEmployeeRequest,
            UpdateEmployeeRequest,
            PaginatedResponse<Employee>,
            PaginatedResponse<crate::domain::PaymentRecord>,
            crate::domain::Company,
            crate::domain::CreateCompanyRequest,
            crate::domain::UpdateCompanyRequest,
            crate::domain::Bonus,
            crate::domain::BonusStatus,
            crate::domain::CreateBonusRequest,
            crate::domain::PaymentRecord,
            crate::domain::ProcessPayrollRequest,
            crate::domain::PayrollPreview,
            crate::domain::DuePayment,
            crate::domain::PayrollRunResult,
            crate::domain::SkippedPayment,
            crate::domain::PaymentStatus,
            crate::domain::TokenTotal,
            crate::domain::EnsAvailability,
            crate::domain::EnsCheckSource,
            crate::domain::RegisterSubdomainRequest,
            crate::domain::EnsRegistration,
            crate::domain::PayrollSummary,
            crate::domain::DepartmentSummary,
            crate::domain::FrequencyBreakdown,
            crate::domain::BonusSummary,
            crate::domain::PaymentTrendPoint,
            crate::domain::TreasurySnapshot,
            crate::domain::TreasuryBalance,
            crate::domain::TreasuryReceipt,
            admin::TreasuryRequest,
            admin::TokenSupportRequest,
            admin::LedgerActionResponse,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "employees", description = "Employee record management"),
        (name = "companies", description = "Company and ENS domain registration"),
        (name = "payroll", description = "Payroll processing and payment history"),
        (name = "bonuses", description = "Bonus creation and distribution"),
        (name = "ens", description = "ENS availability and subdomains"),
        (name = "analytics", description = "Payroll analytics"),
        (name = "admin", description = "Ledger administration"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

fn employee_not_found(id: &str) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!("Employee {} not found", id)))
}

/// List employees with filters and cursor pagination
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "employees",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of employees to return (1-100, default: 20)"),
        ("cursor" = Option<String>, Query, description = "Cursor for pagination (employee ID to start after)"),
        ("active" = Option<bool>, Query, description = "Filter by active flag"),
        ("department" = Option<String>, Query, description = "Filter by department"),
        ("company_id" = Option<String>, Query, description = "Filter by company")
    ),
    responses(
        (status = 200, description = "Page of employees", body = PaginatedResponse<Employee>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_employees_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListEmployeesParams>,
) -> Result<Json<PaginatedResponse<Employee>>, AppError> {
    let page = state.service.list_employees(&params).await?;
    Ok(Json(page))
}

/// Create an employee
///
/// The employee is registered on the payroll ledger before the record is
/// stored. When the caller owns a company the employee is attached to it.
#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation error or duplicate wallet/email", body = ErrorResponse),
        (status = 403, description = "Caller may not create employees", body = ErrorResponse),
        (status = 409, description = "Ledger is paused", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    identity.require_writer()?;
    let employee = state
        .service
        .create_employee(&payload, identity.wallet.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// Get a single employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "employees",
    params(
        ("id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_employee_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Employee>, AppError> {
    let employee = state
        .service
        .get_employee(&id)
        .await?
        .ok_or_else(|| employee_not_found(&id))?;
    Ok(Json(employee))
}

/// Look up an employee by wallet address
#[utoipa::path(
    get,
    path = "/api/employees/wallet/{address}",
    tag = "employees",
    params(
        ("address" = String, Path, description = "Ethereum wallet address")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 400, description = "Invalid wallet address", body = ErrorResponse),
        (status = 404, description = "No employee with this wallet", body = ErrorResponse)
    )
)]
pub async fn get_employee_by_wallet_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Employee>, AppError> {
    let employee = state
        .service
        .get_employee_by_wallet(&address)
        .await?
        .ok_or_else(|| {
            AppError::Database(DatabaseError::NotFound(format!(
                "No employee with wallet {}",
                address
            )))
        })?;
    Ok(Json(employee))
}

/// Update an employee
///
/// Only the supplied fields change. Salary, frequency, token and wallet
/// changes are pushed to the payroll ledger.
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "employees",
    params(
        ("id" = String, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Caller may not update employees", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse),
        (status = 409, description = "Ledger is paused", body = ErrorResponse)
    )
)]
pub async fn update_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, AppError> {
    identity.require_writer()?;
    let employee = state.service.update_employee(&id, &payload).await?;
    Ok(Json(employee))
}

/// Permanently delete an employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "employees",
    params(
        ("id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 403, description = "Caller may not delete employees", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse),
        (status = 409, description = "Ledger is paused", body = ErrorResponse)
    )
)]
pub async fn delete_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    identity.require_writer()?;
    state.service.delete_employee(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deactivate an employee, keeping their record
#[utoipa::path(
    patch,
    path = "/api/employees/{id}/deactivate",
    tag = "employees",
    params(
        ("id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deactivated", body = Employee),
        (status = 403, description = "Caller may not deactivate employees", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse),
        (status = 409, description = "Ledger is paused", body = ErrorResponse)
    )
)]
pub async fn deactivate_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Employee>, AppError> {
    identity.require_writer()?;
    let employee = state.service.deactivate_employee(&id).await?;
    Ok(Json(employee))
}

/// Reactivate a deactivated employee
#[utoipa::path(
    patch,
    path = "/api/employees/{id}/activate",
    tag = "employees",
    params(
        ("id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee active", body = Employee),
        (status = 403, description = "Caller may not activate employees", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse),
        (status = 409, description = "Ledger is paused", body = ErrorResponse)
    )
)]
pub async fn activate_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Employee>, AppError> {
    identity.require_writer()?;
    let employee = state.service.activate_employee(&id).await?;
    Ok(Json(employee))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn ledger_status(err: &LedgerError) -> (StatusCode, &'static str) {
    match err {
        LedgerError::Paused
        | LedgerError::NotPaused
        | LedgerError::EmployeeExists(_)
        | LedgerError::EmployeeInactive(_)
        | LedgerError::PaymentNotDue { .. }
        | LedgerError::BonusExists(_)
        | LedgerError::BonusAlreadyDistributed(_) => (StatusCode::CONFLICT, "ledger_conflict"),
        LedgerError::InsufficientBalance { .. } => {
            (StatusCode::PAYMENT_REQUIRED, "insufficient_funds")
        }
        LedgerError::EmployeeNotFound(_) | LedgerError::BonusNotFound(_) => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        LedgerError::ZeroSalary
        | LedgerError::ZeroAmount
        | LedgerError::TokenNotSupported(_)
        | LedgerError::Overflow => (StatusCode::BAD_REQUEST, "ledger_rejected"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type, message) = match &self {
            AppError::Database(db_err) => match db_err {
                DatabaseError::Connection(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "database_error",
                    self.to_string(),
                ),
                DatabaseError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", self.to_string())
                }
                DatabaseError::Duplicate(_) => {
                    (StatusCode::BAD_REQUEST, "duplicate", self.to_string())
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    self.to_string(),
                ),
            },
            AppError::Ledger(ledger_err) => {
                let (status, error_type) = ledger_status(ledger_err);
                (status, error_type, self.to_string())
            }
            AppError::ExternalService(ext_err) => match ext_err {
                ExternalServiceError::Timeout(_) => {
                    (StatusCode::GATEWAY_TIMEOUT, "timeout", self.to_string())
                }
                ExternalServiceError::RateLimited(_) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "rate_limited",
                    self.to_string(),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "external_service_error",
                    self.to_string(),
                ),
            },
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                self.to_string(),
            ),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                self.to_string(),
            ),
            AppError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                self.to_string(),
            ),
            AppError::Authorization(_) => (
                StatusCode::FORBIDDEN,
                "authorization_error",
                self.to_string(),
            ),
            AppError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization_error",
                self.to_string(),
            ),
            AppError::Deserialization(_) => (
                StatusCode::BAD_REQUEST,
                "deserialization_error",
                self.to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                self.to_string(),
            ),
            AppError::NotSupported(_) => (
                StatusCode::NOT_IMPLEMENTED,
                "not_supported",
                self.to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded".to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
