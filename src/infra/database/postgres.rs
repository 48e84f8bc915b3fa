//! PostgreSQL database client implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use std::time::Duration;
use tracing::{info, instrument};

use crate::domain::{
    AppError, Company, CreateEmployeeRequest, DatabaseClient, DatabaseError, Employee,
    EmployeeFilter, NewCompany, PaginatedResponse, PaymentRecord, UpdateEmployeeRequest,
    ValidationError,
};

const EMPLOYEE_COLUMNS: &str = r#"
    id, company_id, first_name, last_name, email, phone, department, position,
    employment_type, start_date, wallet_address, salary, payment_frequency,
    preferred_token, ens_subdomain, tax_id, tax_country, is_active,
    last_payment_at, last_tx_hash, created_at, updated_at
"#;

const EMPLOYEE_FILTER: &str = r#"
    ($1::boolean IS NULL OR is_active = $1)
    AND ($2::text IS NULL OR lower(department) = lower($2))
    AND ($3::text IS NULL OR company_id = $3)
"#;

const PAYMENT_COLUMNS: &str = "id, employee_id, wallet_address, amount, token, tx_hash, paid_at";

const COMPANY_COLUMNS: &str =
    "id, name, ens_domain, ens_node, owner_wallet, created_at, updated_at";

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL database client with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

fn query_error(e: sqlx::Error) -> AppError {
    AppError::Database(DatabaseError::from(e))
}

fn invalid_cursor() -> AppError {
    AppError::Validation(ValidationError::field("cursor", "Invalid cursor"))
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Migration(e.to_string())))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_employee(row: &PgRow) -> Result<Employee, AppError> {
        let employment_type: String = row.get("employment_type");
        let payment_frequency: String = row.get("payment_frequency");
        let id: String = row.get("id");

        Ok(Employee {
            employment_type: employment_type
                .parse()
                .map_err(|e: String| DatabaseError::Corrupt(format!("employee {}: {}", id, e)))?,
            payment_frequency: payment_frequency
                .parse()
                .map_err(|e: String| DatabaseError::Corrupt(format!("employee {}: {}", id, e)))?,
            id,
            company_id: row.get("company_id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            email: row.get("email"),
            phone: row.get("phone"),
            department: row.get("department"),
            position: row.get("position"),
            start_date: row.get("start_date"),
            wallet_address: row.get("wallet_address"),
            salary: row.get("salary"),
            preferred_token: row.get("preferred_token"),
            ens_subdomain: row.get("ens_subdomain"),
            tax_id: row.get("tax_id"),
            tax_country: row.get("tax_country"),
            is_active: row.get("is_active"),
            last_payment_at: row.get("last_payment_at"),
            last_tx_hash: row.get("last_tx_hash"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_payment(row: &PgRow) -> PaymentRecord {
        PaymentRecord {
            id: row.get("id"),
            employee_id: row.get("employee_id"),
            wallet_address: row.get("wallet_address"),
            amount: row.get("amount"),
            token: row.get("token"),
            tx_hash: row.get("tx_hash"),
            paid_at: row.get("paid_at"),
        }
    }

    fn row_to_company(row: &PgRow) -> Company {
        Company {
            id: row.get("id"),
            name: row.get("name"),
            ens_domain: row.get("ens_domain"),
            ens_node: row.get("ens_node"),
            owner_wallet: row.get("owner_wallet"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    async fn fetch_employee(&self, sql: &str, value: &str) -> Result<Option<Employee>, AppError> {
        let row = sqlx::query(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(Self::row_to_employee).transpose()
    }

    async fn fetch_company(&self, sql: &str, value: &str) -> Result<Option<Company>, AppError> {
        let row = sqlx::query(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(row.as_ref().map(Self::row_to_company))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self, data), fields(wallet = %data.wallet_address, department = %data.department))]
    async fn create_employee(
        &self,
        data: &CreateEmployeeRequest,
        company_id: Option<&str>,
    ) -> Result<Employee, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let sql = format!(
            r#"
            INSERT INTO employees (
                id, company_id, first_name, last_name, email, phone, department, position,
                employment_type, start_date, wallet_address, salary, payment_frequency,
                preferred_token, tax_id, tax_country, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, TRUE, $17, $17)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&id)
            .bind(company_id)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(&data.phone)
            .bind(&data.department)
            .bind(&data.position)
            .bind(data.employment_type.as_str())
            .bind(data.start_date)
            .bind(&data.wallet_address)
            .bind(&data.salary)
            .bind(data.payment_frequency.as_str())
            .bind(&data.preferred_token)
            .bind(&data.tax_id)
            .bind(&data.tax_country)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;

        Self::row_to_employee(&row)
    }

    #[instrument(skip(self))]
    async fn get_employee(&self, id: &str) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        self.fetch_employee(&sql, id).await
    }

    #[instrument(skip(self))]
    async fn get_employee_by_wallet(&self, wallet: &str) -> Result<Option<Employee>, AppError> {
        let sql = format!(
            "SELECT {} FROM employees WHERE wallet_address = $1",
            EMPLOYEE_COLUMNS
        );
        self.fetch_employee(&sql, wallet).await
    }

    #[instrument(skip(self))]
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<Employee>, AppError> {
        let limit = limit.clamp(1, 100);
        // One extra row tells us whether another page exists
        let fetch_limit = limit + 1;

        let rows = match cursor {
            Some(cursor_id) => {
                let cursor_row = sqlx::query("SELECT created_at FROM employees WHERE id = $1")
                    .bind(cursor_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(query_error)?;
                let cursor_created_at: DateTime<Utc> = match cursor_row {
                    Some(row) => row.get("created_at"),
                    None => return Err(invalid_cursor()),
                };

                let sql = format!(
                    r#"
                    SELECT {} FROM employees
                    WHERE {} AND (created_at, id) < ($4, $5)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $6
                    "#,
                    EMPLOYEE_COLUMNS, EMPLOYEE_FILTER
                );
                sqlx::query(&sql)
                    .bind(filter.active)
                    .bind(&filter.department)
                    .bind(&filter.company_id)
                    .bind(cursor_created_at)
                    .bind(cursor_id)
                    .bind(fetch_limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(query_error)?
            }
            None => {
                let sql = format!(
                    r#"
                    SELECT {} FROM employees
                    WHERE {}
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#,
                    EMPLOYEE_COLUMNS, EMPLOYEE_FILTER
                );
                sqlx::query(&sql)
                    .bind(filter.active)
                    .bind(&filter.department)
                    .bind(&filter.company_id)
                    .bind(fetch_limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(query_error)?
            }
        };

        let has_more = rows.len() > limit as usize;
        let employees = rows
            .iter()
            .take(limit as usize)
            .map(Self::row_to_employee)
            .collect::<Result<Vec<_>, _>>()?;
        let next_cursor = if has_more {
            employees.last().map(|e| e.id.clone())
        } else {
            None
        };

        Ok(PaginatedResponse::new(employees, next_cursor, has_more))
    }

    #[instrument(skip(self))]
    async fn list_all_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        let sql = format!(
            "SELECT {} FROM employees WHERE {} ORDER BY created_at ASC, id ASC",
            EMPLOYEE_COLUMNS, EMPLOYEE_FILTER
        );
        let rows = sqlx::query(&sql)
            .bind(filter.active)
            .bind(&filter.department)
            .bind(&filter.company_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        rows.iter().map(Self::row_to_employee).collect()
    }

    #[instrument(skip(self, update))]
    async fn update_employee(
        &self,
        id: &str,
        update: &UpdateEmployeeRequest,
    ) -> Result<Option<Employee>, AppError> {
        let sql = format!(
            r#"
            UPDATE employees
            SET first_name        = COALESCE($2, first_name),
                last_name         = COALESCE($3, last_name),
                email             = COALESCE($4, email),
                phone             = COALESCE($5, phone),
                department        = COALESCE($6, department),
                position          = COALESCE($7, position),
                employment_type   = COALESCE($8, employment_type),
                start_date        = COALESCE($9, start_date),
                wallet_address    = COALESCE($10, wallet_address),
                salary            = COALESCE($11, salary),
                payment_frequency = COALESCE($12, payment_frequency),
                preferred_token   = COALESCE($13, preferred_token),
                tax_id            = COALESCE($14, tax_id),
                tax_country       = COALESCE($15, tax_country),
                updated_at        = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.email)
            .bind(&update.phone)
            .bind(&update.department)
            .bind(&update.position)
            .bind(update.employment_type.map(|t| t.as_str()))
            .bind(update.start_date)
            .bind(&update.wallet_address)
            .bind(&update.salary)
            .bind(update.payment_frequency.map(|f| f.as_str()))
            .bind(&update.preferred_token)
            .bind(&update.tax_id)
            .bind(&update.tax_country)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.as_ref().map(Self::row_to_employee).transpose()
    }

    #[instrument(skip(self))]
    async fn set_employee_active(&self, id: &str, active: bool) -> Result<Option<Employee>, AppError> {
        let sql = format!(
            "UPDATE employees SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.as_ref().map(Self::row_to_employee).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_employee(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn assign_ens_subdomain(&self, id: &str, name: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE employees SET ens_subdomain = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Database(DatabaseError::NotFound(format!(
                "employee {}",
                id
            ))));
        }
        Ok(())
    }

    #[instrument(skip(self, payment), fields(employee_id = %payment.employee_id, tx_hash = %payment.tx_hash))]
    async fn record_payment(&self, payment: &PaymentRecord) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        sqlx::query(
            r#"
            INSERT INTO payroll_payments (id, employee_id, wallet_address, amount, token, tx_hash, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.employee_id)
        .bind(&payment.wallet_address)
        .bind(&payment.amount)
        .bind(&payment.token)
        .bind(&payment.tx_hash)
        .bind(payment.paid_at)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query(
            r#"
            UPDATE employees
            SET last_payment_at = $2, last_tx_hash = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(&payment.employee_id)
        .bind(payment.paid_at)
        .bind(&payment.tx_hash)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_payments(
        &self,
        employee_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<PaymentRecord>, AppError> {
        let limit = limit.clamp(1, 100);
        let fetch_limit = limit + 1;

        let rows = match cursor {
            Some(cursor_id) => {
                let cursor_row = sqlx::query("SELECT paid_at FROM payroll_payments WHERE id = $1")
                    .bind(cursor_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(query_error)?;
                let cursor_paid_at: DateTime<Utc> = match cursor_row {
                    Some(row) => row.get("paid_at"),
                    None => return Err(invalid_cursor()),
                };

                let sql = format!(
                    r#"
                    SELECT {} FROM payroll_payments
                    WHERE ($1::text IS NULL OR employee_id = $1)
                      AND (paid_at, id) < ($2, $3)
                    ORDER BY paid_at DESC, id DESC
                    LIMIT $4
                    "#,
                    PAYMENT_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(employee_id)
                    .bind(cursor_paid_at)
                    .bind(cursor_id)
                    .bind(fetch_limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(query_error)?
            }
            None => {
                let sql = format!(
                    r#"
                    SELECT {} FROM payroll_payments
                    WHERE ($1::text IS NULL OR employee_id = $1)
                    ORDER BY paid_at DESC, id DESC
                    LIMIT $2
                    "#,
                    PAYMENT_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(employee_id)
                    .bind(fetch_limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(query_error)?
            }
        };

        let has_more = rows.len() > limit as usize;
        let payments: Vec<PaymentRecord> = rows
            .iter()
            .take(limit as usize)
            .map(Self::row_to_payment)
            .collect();
        let next_cursor = if has_more {
            payments.last().map(|p| p.id.clone())
        } else {
            None
        };

        Ok(PaginatedResponse::new(payments, next_cursor, has_more))
    }

    #[instrument(skip(self))]
    async fn list_payments_since(&self, since: DateTime<Utc>) -> Result<Vec<PaymentRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM payroll_payments WHERE paid_at >= $1 ORDER BY paid_at ASC",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(rows.iter().map(Self::row_to_payment).collect())
    }

    #[instrument(skip(self, data), fields(domain = %data.ens_domain))]
    async fn create_company(&self, data: &NewCompany) -> Result<Company, AppError> {
        let sql = format!(
            r#"
            INSERT INTO companies (id, name, ens_domain, ens_node, owner_wallet, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&data.name)
            .bind(&data.ens_domain)
            .bind(&data.ens_node)
            .bind(&data.owner_wallet)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(Self::row_to_company(&row))
    }

    #[instrument(skip(self))]
    async fn get_company(&self, id: &str) -> Result<Option<Company>, AppError> {
        let sql = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        self.fetch_company(&sql, id).await
    }

    #[instrument(skip(self))]
    async fn get_company_by_owner(&self, owner_wallet: &str) -> Result<Option<Company>, AppError> {
        let sql = format!(
            "SELECT {} FROM companies WHERE owner_wallet = $1",
            COMPANY_COLUMNS
        );
        self.fetch_company(&sql, owner_wallet).await
    }

    #[instrument(skip(self))]
    async fn update_company(&self, id: &str, name: &str) -> Result<Option<Company>, AppError> {
        let sql = format!(
            "UPDATE companies SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            COMPANY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(row.as_ref().map(Self::row_to_company))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert_eq!(config.max_lifetime, Duration::from_secs(1800));
    }

    #[test]
    fn test_invalid_cursor_is_validation_error() {
        assert!(matches!(
            invalid_cursor(),
            AppError::Validation(ValidationError::InvalidField { .. })
        ));
    }
}
