//! The API layer, containing web handlers and routing.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod companies;
pub mod ens;
pub mod handlers;
pub mod payroll;
pub mod router;

pub use admin::{LedgerActionResponse, TokenSupportRequest, TreasuryRequest};
pub use auth::{Claims, Identity, Role, TokenVerifier, WALLET_HEADER};
pub use handlers::ApiDoc;
pub use router::{RateLimitConfig, create_router, create_router_with_rate_limit};
