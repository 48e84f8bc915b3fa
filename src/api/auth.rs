//! Request authentication.
//!
//! Every `/api` request resolves to an [`Identity`]:
//!
//! 1. `x-wallet-address` header: an employer acting for that wallet.
//! 2. `Authorization: Bearer <jwt>`: HS256 token signed with `JWT_SECRET`.
//! 3. Neither: the default admin identity.
//!
//! A request carrying both a wallet header and an `Authorization` header is
//! rejected.
//!
//! The identity is stored in the request extensions for handlers to read.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::app::AppState;
use crate::domain::{AppError, canonical_wallet};

/// Header carrying the caller's wallet address
pub const WALLET_HEADER: &str = "x-wallet-address";

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employer,
    Viewer,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employer => "employer",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "employer" => Ok(Self::Employer),
            "viewer" => Ok(Self::Viewer),
            other => Err(AppError::Authentication(format!("Unknown role: {}", other))),
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Checksummed wallet, when the caller has one
    pub wallet: Option<String>,
    pub role: Role,
}

impl Identity {
    #[must_use]
    pub fn admin(wallet: Option<String>) -> Self {
        Self {
            wallet,
            role: Role::Admin,
        }
    }

    #[must_use]
    pub fn employer(wallet: String) -> Self {
        Self {
            wallet: Some(wallet),
            role: Role::Employer,
        }
    }

    /// Admins and employers may mutate payroll data
    pub fn require_writer(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin | Role::Employer => Ok(()),
            Role::Viewer => Err(AppError::Authorization(
                "This action requires the admin or employer role".to_string(),
            )),
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            _ => Err(AppError::Authorization(
                "This action requires the admin role".to_string(),
            )),
        }
    }

    /// The caller's wallet, required by company-scoped operations
    pub fn require_wallet(&self) -> Result<&str, AppError> {
        self.wallet.as_deref().ok_or_else(|| {
            AppError::Authentication(format!(
                "A wallet identity is required; send the {} header",
                WALLET_HEADER
            ))
        })
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Wallet address
    pub sub: String,
    pub role: Role,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens
pub struct TokenVerifier {
    secret: SecretString,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Mint a token for `wallet` valid for `ttl`
    pub fn issue(&self, wallet: &str, role: Role, ttl: Duration) -> Result<String, AppError> {
        let claims = Claims {
            sub: canonical_wallet(wallet)?,
            role,
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("JWT encoding error: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AppError::Authentication(format!("Invalid bearer token: {}", e)))?;
        Ok(data.claims)
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(Some)
        .ok_or_else(|| {
            AppError::Authentication(
                "Invalid authorization format, expected 'Bearer <token>'".to_string(),
            )
        })
}

/// Resolve the caller's identity from request headers
pub fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    if headers.contains_key(WALLET_HEADER)
        && headers.contains_key(axum::http::header::AUTHORIZATION)
    {
        return Err(AppError::Authentication(format!(
            "Send either a {} header or a bearer token, not both",
            WALLET_HEADER
        )));
    }

    if let Some(value) = headers.get(WALLET_HEADER) {
        let raw = value.to_str().map_err(|_| {
            AppError::Authentication(format!("Invalid {} header", WALLET_HEADER))
        })?;
        let wallet = canonical_wallet(raw).map_err(|_| {
            AppError::Authentication(format!("Invalid wallet address in {} header", WALLET_HEADER))
        })?;
        return Ok(Identity::employer(wallet));
    }

    if let Some(token) = bearer_token(headers)? {
        let verifier = state.token_verifier.as_ref().ok_or_else(|| {
            AppError::Authentication("Bearer authentication is not configured".to_string())
        })?;
        let claims = verifier.verify(token)?;
        let wallet = canonical_wallet(&claims.sub).map_err(|_| {
            AppError::Authentication("Token subject is not a wallet address".to_string())
        })?;
        return Ok(Identity {
            wallet: Some(wallet),
            role: claims.role,
        });
    }

    Ok(Identity::admin(state.default_admin_wallet.clone()))
}

/// Middleware attaching an [`Identity`] to every request
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_identity(&state, request.headers()).inspect_err(|e| {
        warn!(error = %e, path = %request.uri().path(), "Authentication failed");
    })?;
    debug!(role = %identity.role, wallet = ?identity.wallet, "Request authenticated");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Middleware guarding the admin routes; runs after [`authenticate`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::Authentication("Request is not authenticated".to_string()))?
        .require_admin()?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

    fn verifier(secret: &str) -> TokenVerifier {
        TokenVerifier::new(SecretString::from(secret.to_string()))
    }

    #[test]
    fn test_issue_and_verify_token() {
        let verifier = verifier("test-secret");
        let token = verifier
            .issue(WALLET, Role::Employer, Duration::hours(1))
            .unwrap();

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, "0x52908400098527886E0F7030069857D2E4169EE7");
        assert_eq!(claims.role, Role::Employer);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = verifier("one")
            .issue(WALLET, Role::Admin, Duration::hours(1))
            .unwrap();
        let result = verifier("two").verify(&token);
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = verifier("test-secret");
        // Past the default 60s leeway
        let token = verifier
            .issue(WALLET, Role::Admin, Duration::minutes(-5))
            .unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(verifier("s").verify("not-a-token").is_err());
    }

    #[test]
    fn test_role_guards() {
        let viewer = Identity {
            wallet: None,
            role: Role::Viewer,
        };
        assert!(matches!(
            viewer.require_writer(),
            Err(AppError::Authorization(_))
        ));
        assert!(viewer.require_wallet().is_err());

        let employer = Identity::employer(WALLET.to_string());
        assert!(employer.require_writer().is_ok());
        assert!(employer.require_admin().is_err());
        assert!(Identity::admin(None).require_admin().is_ok());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers).unwrap(), None);

        headers.insert("authorization", "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc"));

        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());
    }

    fn state_with_verifier(verifier: TokenVerifier) -> AppState {
        use crate::infra::{InMemoryBonusStore, SimulatedChainClient};
        use crate::test_utils::{MockDatabaseClient, MockEnsProvider};

        let chain = SimulatedChainClient::new(&["USDC"][..], &[]).unwrap();
        AppState::new(
            Arc::new(MockDatabaseClient::new()),
            Arc::new(chain),
            Arc::new(MockEnsProvider::new()),
            Arc::new(InMemoryBonusStore::new()),
        )
        .with_token_verifier(Arc::new(verifier))
    }

    #[test]
    fn test_wallet_header_and_bearer_token_are_exclusive() {
        let verifier = verifier("test-secret");
        let token = verifier
            .issue(WALLET, Role::Viewer, Duration::hours(1))
            .unwrap();
        let state = state_with_verifier(verifier);

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        let identity = resolve_identity(&state, &headers).unwrap();
        assert_eq!(identity.role, Role::Viewer);

        headers.insert(WALLET_HEADER, WALLET.parse().unwrap());
        assert!(matches!(
            resolve_identity(&state, &headers),
            Err(AppError::Authentication(_))
        ));

        headers.remove("authorization");
        let identity = resolve_identity(&state, &headers).unwrap();
        assert_eq!(identity.role, Role::Employer);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }
}
