//! Router construction and global rate limiting.

use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;
use crate::domain::{ErrorDetail, RateLimitResponse};

use super::auth::{authenticate, require_admin};
use super::handlers::{
    ApiDoc, activate_employee_handler, create_employee_handler, deactivate_employee_handler,
    delete_employee_handler, get_employee_by_wallet_handler, get_employee_handler,
    health_check_handler, list_employees_handler, liveness_handler, readiness_handler,
    update_employee_handler,
};
use super::{admin, analytics, companies, ens, payroll};

/// Maximum accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Global rate limit settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed in a burst above the sustained rate
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`, falling back to defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            requests_per_second: env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.requests_per_second),
            burst_size: env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.burst_size),
        }
    }

    fn limiter(&self) -> DefaultDirectRateLimiter {
        let rps = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(rps);
        RateLimiter::direct(Quota::per_second(rps).allow_burst(burst))
    }
}

async fn rate_limit(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.check().is_err() {
        debug!(path = %request.uri().path(), "Request rejected by rate limiter");
        let body = Json(RateLimitResponse {
            error: ErrorDetail {
                r#type: "rate_limited".to_string(),
                message: "Too many requests, retry shortly".to_string(),
            },
            retry_after: 1,
        });
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static("1"));
        return response;
    }
    next.run(request).await
}

fn api_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/pause", post(admin::pause_handler))
        .route("/unpause", post(admin::unpause_handler))
        .route("/treasury", get(admin::treasury_handler))
        .route("/treasury/deposit", post(admin::deposit_handler))
        .route("/treasury/withdraw", post(admin::withdraw_handler))
        .route("/tokens/{symbol}", put(admin::set_token_supported_handler))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route(
            "/employees",
            get(list_employees_handler).post(create_employee_handler),
        )
        .route(
            "/employees/wallet/{address}",
            get(get_employee_by_wallet_handler),
        )
        .route(
            "/employees/{id}",
            get(get_employee_handler)
                .put(update_employee_handler)
                .delete(delete_employee_handler),
        )
        .route(
            "/employees/{id}/deactivate",
            patch(deactivate_employee_handler),
        )
        .route("/employees/{id}/activate", patch(activate_employee_handler))
        .route("/companies", post(companies::create_company_handler))
        .route(
            "/companies/me",
            get(companies::get_my_company_handler).put(companies::update_my_company_handler),
        )
        .route("/companies/{id}", get(companies::get_company_handler))
        .route(
            "/payroll/process",
            get(payroll::preview_payroll_handler).post(payroll::process_payroll_handler),
        )
        .route("/payroll/history", get(payroll::payment_history_handler))
        .route(
            "/payroll/status/{employee_id}",
            get(payroll::payment_status_handler),
        )
        .route(
            "/bonuses",
            get(payroll::list_bonuses_handler).post(payroll::create_bonus_handler),
        )
        .route("/bonuses/{id}", get(payroll::get_bonus_handler))
        .route(
            "/bonuses/{id}/distribute",
            post(payroll::distribute_bonus_handler),
        )
        .route("/ens/check/{name}", get(ens::check_availability_handler))
        .route("/ens/register", post(ens::register_subdomain_handler))
        .route(
            "/analytics/payroll-summary",
            get(analytics::payroll_summary_handler),
        )
        .route(
            "/analytics/payment-trend",
            get(analytics::payment_trend_handler),
        )
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(state),
            authenticate,
        ))
}

fn build_router(state: Arc<AppState>, rate_limit_config: Option<RateLimitConfig>) -> Router {
    let mut api = api_routes(&state);
    if let Some(config) = rate_limit_config {
        info!(
            rps = config.requests_per_second,
            burst = config.burst_size,
            "Rate limiting /api routes"
        );
        let limiter = Arc::new(config.limiter());
        api = api.route_layer(middleware::from_fn_with_state(limiter, rate_limit));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Create the application router without rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    build_router(state, None)
}

/// Create the application router with a global rate limit on `/api`
pub fn create_router_with_rate_limit(state: Arc<AppState>, config: RateLimitConfig) -> Router {
    build_router(state, Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate_limit_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.burst_size, 20);
    }

    #[test]
    fn test_limiter_allows_burst_then_rejects() {
        let limiter = RateLimitConfig {
            requests_per_second: 1,
            burst_size: 2,
        }
        .limiter();
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
