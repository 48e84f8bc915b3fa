//! Domain traits defining contracts for external systems.

use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::amount::TokenAmount;
use super::error::AppError;
use super::ledger::{LedgerEmployee, PaymentReceipt, TreasuryReceipt, TreasurySnapshot};
use super::schedule::PaymentFrequency;
use super::types::{
    Bonus, Company, CreateEmployeeRequest, Employee, EmployeeFilter, EnsCheckSource,
    ListBonusesParams, NewCompany, PaginatedResponse, PaymentRecord, UpdateEmployeeRequest,
};

/// Database client trait for persistence operations
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Check database connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    // --- employees ---

    /// Insert a normalized employee
    async fn create_employee(
        &self,
        data: &CreateEmployeeRequest,
        company_id: Option<&str>,
    ) -> Result<Employee, AppError>;

    async fn get_employee(&self, id: &str) -> Result<Option<Employee>, AppError>;

    /// Look up by checksummed wallet address
    async fn get_employee_by_wallet(&self, wallet: &str) -> Result<Option<Employee>, AppError>;

    /// List employees with cursor-based pagination
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<Employee>, AppError>;

    /// Every employee matching the filter, oldest first
    async fn list_all_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError>;

    /// Apply a normalized partial update; `None` if the employee does not exist
    async fn update_employee(
        &self,
        id: &str,
        update: &UpdateEmployeeRequest,
    ) -> Result<Option<Employee>, AppError>;

    async fn set_employee_active(&self, id: &str, active: bool) -> Result<Option<Employee>, AppError>;

    /// Hard delete; returns whether a row was removed
    async fn delete_employee(&self, id: &str) -> Result<bool, AppError>;

    async fn assign_ens_subdomain(&self, id: &str, name: &str) -> Result<(), AppError>;

    // --- payments ---

    /// Persist a payment and stamp the employee's last payment
    async fn record_payment(&self, payment: &PaymentRecord) -> Result<(), AppError>;

    /// Payment history, newest first
    async fn list_payments(
        &self,
        employee_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<PaymentRecord>, AppError>;

    async fn list_payments_since(&self, since: DateTime<Utc>) -> Result<Vec<PaymentRecord>, AppError>;

    // --- companies ---

    async fn create_company(&self, data: &NewCompany) -> Result<Company, AppError>;

    async fn get_company(&self, id: &str) -> Result<Option<Company>, AppError>;

    async fn get_company_by_owner(&self, owner_wallet: &str) -> Result<Option<Company>, AppError>;

    async fn update_company(&self, id: &str, name: &str) -> Result<Option<Company>, AppError>;
}

/// Payroll manager contract. Every mutating call returns the hash of the
/// transaction that carried it.
#[async_trait]
pub trait PayrollChain: Send + Sync {
    /// Check ledger connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    async fn is_paused(&self) -> Result<bool, AppError>;

    async fn employee(&self, wallet: Address) -> Result<Option<LedgerEmployee>, AppError>;

    async fn register_employee(
        &self,
        wallet: Address,
        salary: TokenAmount,
        frequency: PaymentFrequency,
        token: &str,
    ) -> Result<String, AppError>;

    async fn update_employee(
        &self,
        wallet: Address,
        salary: TokenAmount,
        frequency: PaymentFrequency,
        token: &str,
    ) -> Result<String, AppError>;

    async fn remove_employee(&self, wallet: Address) -> Result<String, AppError>;

    async fn process_payment(
        &self,
        wallet: Address,
        now: DateTime<Utc>,
    ) -> Result<PaymentReceipt, AppError>;

    /// Refund a salary payment that could not be recorded, restoring the
    /// employee's previous payment stamp
    async fn reverse_payment(
        &self,
        receipt: &PaymentReceipt,
        previous_payment_at: Option<DateTime<Utc>>,
    ) -> Result<String, AppError>;

    async fn create_bonus(
        &self,
        id: &str,
        wallet: Address,
        amount: TokenAmount,
        token: &str,
    ) -> Result<String, AppError>;

    async fn distribute_bonus(&self, id: &str) -> Result<PaymentReceipt, AppError>;

    async fn pause(&self) -> Result<String, AppError>;

    async fn unpause(&self) -> Result<String, AppError>;

    async fn deposit(&self, token: &str, amount: TokenAmount) -> Result<TreasuryReceipt, AppError>;

    async fn emergency_withdraw(
        &self,
        token: &str,
        amount: TokenAmount,
    ) -> Result<TreasuryReceipt, AppError>;

    async fn set_token_supported(&self, token: &str, supported: bool) -> Result<String, AppError>;

    async fn treasury(&self) -> Result<TreasurySnapshot, AppError>;
}

/// ENS registrar access
#[async_trait]
pub trait EnsProvider: Send + Sync {
    /// Whether a second-level `.eth` label can be registered
    async fn check_availability(&self, label: &str) -> Result<(bool, EnsCheckSource), AppError>;

    /// Create `label.parent` owned by `owner`, returning the transaction hash
    async fn register_subdomain(
        &self,
        parent: &str,
        label: &str,
        owner: Address,
    ) -> Result<String, AppError>;
}

/// Bonus bookkeeping
#[async_trait]
pub trait BonusStore: Send + Sync {
    async fn insert(&self, bonus: Bonus) -> Result<(), AppError>;

    async fn get(&self, id: &str) -> Result<Option<Bonus>, AppError>;

    /// Bonuses matching the filter, newest first
    async fn list(&self, params: &ListBonusesParams) -> Result<Vec<Bonus>, AppError>;

    /// Replace an existing bonus; `false` if it does not exist
    async fn update(&self, bonus: Bonus) -> Result<bool, AppError>;
}
