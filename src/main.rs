//! Application entry point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use web3_payroll_api::api::{
    RateLimitConfig, TokenVerifier, create_router, create_router_with_rate_limit,
};
use web3_payroll_api::app::{AppState, SchedulerConfig, spawn_scheduler};
use web3_payroll_api::domain::{TokenAmount, canonical_wallet, parse_wallet};
use web3_payroll_api::infra::ens::DEFAULT_CONTROLLER_ADDRESS;
use web3_payroll_api::infra::ledger::DEFAULT_SUPPORTED_TOKENS;
use web3_payroll_api::infra::{
    EnsRegistrarClient, EnsRegistrarConfig, InMemoryBonusStore, PostgresClient, PostgresConfig,
    SimulatedChainClient, parse_token_list, parse_treasury_seed,
};

/// Application configuration
struct Config {
    database_url: String,
    host: String,
    port: u16,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
    /// Ethereum RPC for ENS lookups (optional - simulation mode if not set)
    eth_rpc_url: Option<String>,
    ens_config: EnsRegistrarConfig,
    /// TLD company domains must end in (default: eth)
    ens_parent_tld: String,
    /// HS256 secret for bearer tokens (optional - bearer auth disabled if not set)
    jwt_secret: Option<SecretString>,
    /// Wallet attached to unauthenticated requests
    default_admin_wallet: Option<String>,
    supported_tokens: Vec<String>,
    /// Opening treasury balances, e.g. `ETH:100,USDC:250000`
    treasury_seed: Vec<(String, TokenAmount)>,
    scheduler_config: SchedulerConfig,
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Config {
    fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let enable_rate_limiting = env_flag("ENABLE_RATE_LIMITING", false);
        let rate_limit_config = RateLimitConfig::from_env();

        let eth_rpc_url = env::var("ETH_RPC_URL").ok().filter(|u| !u.is_empty());
        let controller = match env::var("ENS_CONTROLLER_ADDRESS")
            .ok()
            .filter(|a| !a.is_empty())
        {
            Some(raw) => parse_wallet(&raw).context("ENS_CONTROLLER_ADDRESS is not an address")?,
            None => DEFAULT_CONTROLLER_ADDRESS,
        };
        let ens_config = EnsRegistrarConfig {
            rpc_url: eth_rpc_url.clone(),
            controller,
            ..Default::default()
        };
        let ens_parent_tld = env::var("ENS_PARENT_TLD")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "eth".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(SecretString::from);

        let default_admin_wallet = match env::var("DEFAULT_ADMIN_WALLET")
            .ok()
            .filter(|w| !w.is_empty())
        {
            Some(raw) => {
                Some(canonical_wallet(&raw).context("DEFAULT_ADMIN_WALLET is not an address")?)
            }
            None => None,
        };

        let supported_tokens = env::var("SUPPORTED_TOKENS")
            .ok()
            .map(|v| parse_token_list(&v))
            .filter(|tokens| !tokens.is_empty())
            .unwrap_or_else(|| {
                DEFAULT_SUPPORTED_TOKENS
                    .iter()
                    .map(|t| (*t).to_string())
                    .collect()
            });
        let treasury_seed = match env::var("TREASURY_SEED").ok().filter(|s| !s.is_empty()) {
            Some(raw) => parse_treasury_seed(&raw).context("TREASURY_SEED is invalid")?,
            None => Vec::new(),
        };

        let scheduler_config = SchedulerConfig {
            enabled: env_flag("AUTO_PAYROLL_ENABLED", false),
            interval: Duration::from_secs(
                env::var("AUTO_PAYROLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(3600),
            ),
        };

        Ok(Self {
            database_url,
            host,
            port,
            enable_rate_limiting,
            rate_limit_config,
            eth_rpc_url,
            ens_config,
            ens_parent_tld,
            jwt_secret,
            default_admin_wallet,
            supported_tokens,
            treasury_seed,
            scheduler_config,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🏗️  Web3 Payroll API v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;

    info!("📦 Initializing infrastructure...");

    let db_config = PostgresConfig::default();
    let postgres_client = PostgresClient::new(&config.database_url, db_config).await?;
    postgres_client.run_migrations().await?;
    info!("   ✓ Database connected and migrations applied");

    let chain = SimulatedChainClient::new(config.supported_tokens.as_slice(), &config.treasury_seed)?;
    info!(
        "   ✓ Payroll ledger ready (tokens: {})",
        config.supported_tokens.join(", ")
    );
    if config.treasury_seed.is_empty() {
        warn!("   ⚠ Treasury starts empty (TREASURY_SEED not set)");
    }

    let ens_client = EnsRegistrarClient::new(config.ens_config.clone())?;
    match &config.eth_rpc_url {
        Some(url) => info!("   ✓ ENS availability via {}", url),
        None => warn!("   ⚠ ENS client in SIMULATION MODE (no ETH_RPC_URL)"),
    }

    let mut app_state = AppState::with_parent_tld(
        Arc::new(postgres_client),
        Arc::new(chain),
        Arc::new(ens_client),
        Arc::new(InMemoryBonusStore::new()),
        &config.ens_parent_tld,
    )
    .with_default_admin_wallet(config.default_admin_wallet.clone());

    if let Some(secret) = config.jwt_secret.take() {
        app_state = app_state.with_token_verifier(Arc::new(TokenVerifier::new(secret)));
        info!("   ✓ Bearer token authentication enabled");
    } else {
        info!("   ○ Bearer token authentication disabled (JWT_SECRET not set)");
    }
    if config.default_admin_wallet.is_none() {
        warn!("   ⚠ Requests without credentials act as an admin with no wallet");
    }

    let app_state = Arc::new(app_state);

    let synced = app_state.service.sync_ledger().await?;
    info!("   ✓ {} employee(s) registered on the payroll ledger", synced);

    let scheduler_shutdown_tx = if config.scheduler_config.enabled {
        let (_handle, shutdown_tx) = spawn_scheduler(
            Arc::clone(&app_state.payroll),
            config.scheduler_config.clone(),
        );
        info!(
            "   ✓ Payroll scheduler started (every {}s)",
            config.scheduler_config.interval.as_secs()
        );
        Some(shutdown_tx)
    } else {
        info!("   ○ Payroll scheduler disabled");
        None
    };

    let router = if config.enable_rate_limiting {
        info!("   ✓ Rate limiting enabled");
        create_router_with_rate_limit(app_state, config.rate_limit_config)
    } else {
        info!("   ○ Rate limiting disabled");
        create_router(app_state)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(tx) = scheduler_shutdown_tx {
        let _ = tx.send(true);
    }

    info!("Server shutdown complete");
    Ok(())
}
