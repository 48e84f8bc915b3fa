//! Error types shared across all layers.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("External service error: {0}")]
    ExternalService(#[from] ExternalServiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Authorization(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate entry: {0}")]
    Duplicate(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Postgres SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Connection(err.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                let what = db_err
                    .constraint()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| db_err.message().to_string());
                Self::Duplicate(what)
            }
            _ => Self::Query(err.to_string()),
        }
    }
}

/// Payroll ledger rejections. Each variant mirrors a revert of the
/// on-chain payroll manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger is paused")]
    Paused,

    #[error("ledger is not paused")]
    NotPaused,

    #[error("salary must be greater than zero")]
    ZeroSalary,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("token {0} is not supported")]
    TokenNotSupported(String),

    #[error("employee {0} is already registered")]
    EmployeeExists(String),

    #[error("employee {0} is not registered")]
    EmployeeNotFound(String),

    #[error("employee {0} is not active")]
    EmployeeInactive(String),

    #[error("payment for {wallet} is not due until {next_due}")]
    PaymentNotDue { wallet: String, next_due: String },

    #[error("insufficient {token} balance: required {required}, available {available}")]
    InsufficientBalance {
        token: String,
        required: String,
        available: String,
    },

    #[error("bonus {0} already exists")]
    BonusExists(String),

    #[error("bonus {0} not found")]
    BonusNotFound(String),

    #[error("bonus {0} has already been distributed")]
    BonusAlreadyDistributed(String),

    #[error("amount overflow")]
    Overflow,
}

/// Failures talking to third-party services (Ethereum RPC)
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("failed to parse response: {0}")]
    ParseError(String),

    #[error("misconfigured: {0}")]
    Configuration(String),
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Request validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("{0}")]
    Multiple(String),

    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Multiple(errors.to_string()))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Deserialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_messages() {
        let err = LedgerError::InsufficientBalance {
            token: "USDC".to_string(),
            required: "10".to_string(),
            available: "2.5".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "insufficient USDC balance: required 10, available 2.5"
        );
        assert_eq!(
            AppError::from(LedgerError::Paused).to_string(),
            "Ledger error: ledger is paused"
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn test_validation_field_helper() {
        let err = ValidationError::field("salary", "must be positive");
        assert_eq!(err.to_string(), "salary: must be positive");
    }
}
