//! Application state management.

use std::sync::Arc;

use crate::api::auth::TokenVerifier;
use crate::domain::{BonusStore, DatabaseClient, EnsProvider, PayrollChain};

use super::analytics::AnalyticsService;
use super::ens_service::EnsService;
use super::payroll::PayrollService;
use super::service::{AppService, DEFAULT_PARENT_TLD};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
    pub payroll: Arc<PayrollService>,
    pub ens: Arc<EnsService>,
    pub analytics: Arc<AnalyticsService>,
    pub db_client: Arc<dyn DatabaseClient>,
    pub chain: Arc<dyn PayrollChain>,
    /// Bearer token verification; `None` when `JWT_SECRET` is not configured
    pub token_verifier: Option<Arc<TokenVerifier>>,
    /// Wallet attached to requests that carry no credentials
    pub default_admin_wallet: Option<String>,
}

impl AppState {
    /// Create a new application state with the default `.eth` parent
    #[must_use]
    pub fn new(
        db_client: Arc<dyn DatabaseClient>,
        chain: Arc<dyn PayrollChain>,
        ens_provider: Arc<dyn EnsProvider>,
        bonuses: Arc<dyn BonusStore>,
    ) -> Self {
        Self::with_parent_tld(db_client, chain, ens_provider, bonuses, DEFAULT_PARENT_TLD)
    }

    #[must_use]
    pub fn with_parent_tld(
        db_client: Arc<dyn DatabaseClient>,
        chain: Arc<dyn PayrollChain>,
        ens_provider: Arc<dyn EnsProvider>,
        bonuses: Arc<dyn BonusStore>,
        parent_tld: &str,
    ) -> Self {
        let service = Arc::new(AppService::with_parent_tld(
            Arc::clone(&db_client),
            Arc::clone(&chain),
            parent_tld,
        ));
        let payroll = Arc::new(PayrollService::new(
            Arc::clone(&db_client),
            Arc::clone(&chain),
            Arc::clone(&bonuses),
        ));
        let ens = Arc::new(EnsService::new(
            Arc::clone(&db_client),
            ens_provider,
            parent_tld,
        ));
        let analytics = Arc::new(AnalyticsService::new(Arc::clone(&db_client), bonuses));

        Self {
            service,
            payroll,
            ens,
            analytics,
            db_client,
            chain,
            token_verifier: None,
            default_admin_wallet: None,
        }
    }

    /// Enable bearer token authentication (builder pattern)
    #[must_use]
    pub fn with_token_verifier(mut self, verifier: Arc<TokenVerifier>) -> Self {
        self.token_verifier = Some(verifier);
        self
    }

    /// Set the wallet used for the implicit admin identity (builder pattern)
    #[must_use]
    pub fn with_default_admin_wallet(mut self, wallet: Option<String>) -> Self {
        self.default_admin_wallet = wallet;
        self
    }
}
