//! Domain types with validation support.

use std::str::FromStr;

use alloy_primitives::Address;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::amount::TokenAmount;
use super::error::ValidationError;
use super::schedule::PaymentFrequency;

// ============================================================================
// WALLETS AND AMOUNTS
// ============================================================================

/// Parse a `0x`-prefixed 20-byte hex address.
pub fn parse_wallet(value: &str) -> Result<Address, ValidationError> {
    let value = value.trim();
    if !value.starts_with("0x") && !value.starts_with("0X") {
        return Err(ValidationError::InvalidAddress(value.to_string()));
    }
    Address::from_str(value).map_err(|_| ValidationError::InvalidAddress(value.to_string()))
}

/// EIP-55 checksummed form used for storage and comparison
pub fn canonical_wallet(value: &str) -> Result<String, ValidationError> {
    parse_wallet(value).map(|a| a.to_checksum(None))
}

/// Parse a strictly positive decimal amount.
pub fn parse_positive_amount(field: &str, value: &str) -> Result<TokenAmount, ValidationError> {
    let amount = value
        .parse::<TokenAmount>()
        .map_err(|e| ValidationError::InvalidAmount(format!("{}: {}", field, e)))?;
    if amount.is_zero() {
        return Err(ValidationError::InvalidAmount(format!(
            "{}: must be greater than zero",
            field
        )));
    }
    Ok(amount)
}

fn validate_wallet_field(value: &str) -> Result<(), validator::ValidationError> {
    parse_wallet(value)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("wallet_address"))
}

fn validate_amount_field(value: &str) -> Result<(), validator::ValidationError> {
    match value.parse::<TokenAmount>() {
        Ok(amount) if !amount.is_zero() => Ok(()),
        _ => Err(validator::ValidationError::new("positive_amount")),
    }
}

fn validate_token_field(value: &str) -> Result<(), validator::ValidationError> {
    let value = value.trim();
    if (2..=10).contains(&value.len()) && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("token_symbol"))
    }
}

// ============================================================================
// EMPLOYEES
// ============================================================================

/// Kind of employment contract
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contractor,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTime => "full_time",
            Self::PartTime => "part_time",
            Self::Contractor => "contractor",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_time" => Ok(Self::FullTime),
            "part_time" => Ok(Self::PartTime),
            "contractor" => Ok(Self::Contractor),
            _ => Err(format!("Invalid employment type: {}", s)),
        }
    }
}

impl std::fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Employee record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Employee {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Company the employee was created under
    pub company_id: Option<String>,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Nakamoto")]
    pub last_name: String,
    #[schema(example = "alice@acme.xyz")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "Protocol Engineer")]
    pub position: String,
    pub employment_type: EmploymentType,
    pub start_date: NaiveDate,
    /// EIP-55 checksummed payout wallet
    #[schema(example = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")]
    pub wallet_address: String,
    /// Salary per pay period as a decimal string
    #[schema(example = "4200.50")]
    pub salary: String,
    pub payment_frequency: PaymentFrequency,
    #[schema(example = "USDC")]
    pub preferred_token: String,
    #[schema(example = "alice.acme.eth")]
    pub ens_subdomain: Option<String>,
    pub tax_id: Option<String>,
    pub tax_country: Option<String>,
    pub is_active: bool,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub last_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Salary as a fixed-point amount. Stored salaries are validated on write.
    pub fn salary_amount(&self) -> Result<TokenAmount, ValidationError> {
        parse_positive_amount("salary", &self.salary)
    }

    pub fn wallet(&self) -> Result<Address, ValidationError> {
        parse_wallet(&self.wallet_address)
    }
}

/// Request to create an employee
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    #[schema(example = "Alice")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    #[schema(example = "Nakamoto")]
    pub last_name: String,
    #[validate(email(message = "Email is invalid"))]
    #[schema(example = "alice@acme.xyz")]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 32, message = "Phone is too long"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Department is required"))]
    #[schema(example = "Engineering")]
    pub department: String,
    #[validate(length(min = 1, max = 100, message = "Position is required"))]
    #[schema(example = "Protocol Engineer")]
    pub position: String,
    #[serde(default)]
    pub employment_type: EmploymentType,
    pub start_date: NaiveDate,
    #[validate(custom(function = "validate_wallet_field", message = "Wallet address is invalid"))]
    #[schema(example = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")]
    pub wallet_address: String,
    #[validate(custom(function = "validate_amount_field", message = "Salary must be a positive decimal"))]
    #[schema(example = "4200.50")]
    pub salary: String,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    #[serde(default = "default_token")]
    #[validate(custom(function = "validate_token_field", message = "Token symbol is invalid"))]
    #[schema(example = "USDC")]
    pub preferred_token: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 2, message = "Tax country must be an ISO 3166 alpha-2 code"))]
    pub tax_country: Option<String>,
}

fn default_token() -> String {
    "USDC".to_string()
}

impl CreateEmployeeRequest {
    /// Canonical form persisted by the database layer: checksummed wallet,
    /// lower-case email, upper-case token, normalized salary.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let salary = parse_positive_amount("salary", &self.salary)?;
        Ok(Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.clone(),
            department: self.department.trim().to_string(),
            position: self.position.trim().to_string(),
            employment_type: self.employment_type,
            start_date: self.start_date,
            wallet_address: canonical_wallet(&self.wallet_address)?,
            salary: salary.to_string(),
            payment_frequency: self.payment_frequency,
            preferred_token: self.preferred_token.trim().to_uppercase(),
            tax_id: self.tax_id.clone(),
            tax_country: self.tax_country.as_ref().map(|c| c.to_uppercase()),
        })
    }
}

/// Partial update of an employee. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub department: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub position: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub start_date: Option<NaiveDate>,
    pub wallet_address: Option<String>,
    pub salary: Option<String>,
    pub payment_frequency: Option<PaymentFrequency>,
    pub preferred_token: Option<String>,
    pub tax_id: Option<String>,
    #[validate(length(min = 2, max = 2))]
    pub tax_country: Option<String>,
}

impl UpdateEmployeeRequest {
    /// Validate and canonicalize the fields `validator` cannot express on options.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let wallet_address = self
            .wallet_address
            .as_deref()
            .map(canonical_wallet)
            .transpose()?;
        let salary = self
            .salary
            .as_deref()
            .map(|s| parse_positive_amount("salary", s).map(|a| a.to_string()))
            .transpose()?;
        let preferred_token = match self.preferred_token.as_deref() {
            Some(token) => {
                validate_token_field(token)
                    .map_err(|_| ValidationError::field("preferred_token", "Token symbol is invalid"))?;
                Some(token.trim().to_uppercase())
            }
            None => None,
        };

        Ok(Self {
            first_name: self.first_name.as_ref().map(|s| s.trim().to_string()),
            last_name: self.last_name.as_ref().map(|s| s.trim().to_string()),
            email: self.email.as_ref().map(|s| s.trim().to_lowercase()),
            phone: self.phone.clone(),
            department: self.department.as_ref().map(|s| s.trim().to_string()),
            position: self.position.as_ref().map(|s| s.trim().to_string()),
            employment_type: self.employment_type,
            start_date: self.start_date,
            wallet_address,
            salary,
            payment_frequency: self.payment_frequency,
            preferred_token,
            tax_id: self.tax_id.clone(),
            tax_country: self.tax_country.as_ref().map(|c| c.to_uppercase()),
        })
    }

    /// Whether the update touches anything the payroll ledger tracks
    #[must_use]
    pub fn changes_payroll_settings(&self) -> bool {
        self.salary.is_some() || self.payment_frequency.is_some() || self.preferred_token.is_some()
    }

    /// Apply the update to an in-memory employee (used by mocks and services)
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(v) = &self.first_name {
            employee.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            employee.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            employee.email = v.clone();
        }
        if let Some(v) = &self.phone {
            employee.phone = Some(v.clone());
        }
        if let Some(v) = &self.department {
            employee.department = v.clone();
        }
        if let Some(v) = &self.position {
            employee.position = v.clone();
        }
        if let Some(v) = self.employment_type {
            employee.employment_type = v;
        }
        if let Some(v) = self.start_date {
            employee.start_date = v;
        }
        if let Some(v) = &self.wallet_address {
            employee.wallet_address = v.clone();
        }
        if let Some(v) = &self.salary {
            employee.salary = v.clone();
        }
        if let Some(v) = self.payment_frequency {
            employee.payment_frequency = v;
        }
        if let Some(v) = &self.preferred_token {
            employee.preferred_token = v.clone();
        }
        if let Some(v) = &self.tax_id {
            employee.tax_id = Some(v.clone());
        }
        if let Some(v) = &self.tax_country {
            employee.tax_country = Some(v.clone());
        }
        employee.updated_at = Utc::now();
    }
}

/// Filters for listing employees
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub active: Option<bool>,
    pub department: Option<String>,
    pub company_id: Option<String>,
}

impl EmployeeFilter {
    #[must_use]
    pub fn active_only() -> Self {
        Self {
            active: Some(true),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn matches(&self, employee: &Employee) -> bool {
        self.active.is_none_or(|a| employee.is_active == a)
            && self
                .department
                .as_ref()
                .is_none_or(|d| employee.department.eq_ignore_ascii_case(d))
            && self
                .company_id
                .as_ref()
                .is_none_or(|c| employee.company_id.as_deref() == Some(c.as_str()))
    }
}

/// Query parameters for `GET /api/employees`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ListEmployeesParams {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub cursor: Option<String>,
    pub active: Option<bool>,
    pub department: Option<String>,
    pub company_id: Option<String>,
}

impl ListEmployeesParams {
    #[must_use]
    pub fn filter(&self) -> EmployeeFilter {
        EmployeeFilter {
            active: self.active,
            department: self.department.clone(),
            company_id: self.company_id.clone(),
        }
    }
}

// ============================================================================
// COMPANIES
// ============================================================================

/// Company owning an ENS domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Company {
    pub id: String,
    #[schema(example = "Acme Labs")]
    pub name: String,
    #[schema(example = "acme.eth")]
    pub ens_domain: String,
    /// EIP-137 namehash of `ens_domain`
    pub ens_node: String,
    pub owner_wallet: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to register the caller's company
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    #[schema(example = "Acme Labs")]
    pub name: String,
    #[validate(length(min = 5, max = 255, message = "ENS domain is required"))]
    #[schema(example = "acme.eth")]
    pub ens_domain: String,
}

/// Request to rename a company
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub name: String,
}

/// Fully resolved company ready for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub ens_domain: String,
    pub ens_node: String,
    pub owner_wallet: String,
}

// ============================================================================
// BONUSES
// ============================================================================

/// Bonus lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BonusStatus {
    #[default]
    Pending,
    Distributed,
}

impl BonusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Distributed => "distributed",
        }
    }
}

impl FromStr for BonusStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "distributed" => Ok(Self::Distributed),
            _ => Err(format!("Invalid bonus status: {}", s)),
        }
    }
}

impl std::fmt::Display for BonusStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One-off payment owed to an employee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Bonus {
    pub id: String,
    pub employee_id: String,
    pub wallet_address: String,
    #[schema(example = "500")]
    pub amount: String,
    #[schema(example = "USDC")]
    pub token: String,
    #[schema(example = "Q3 performance")]
    pub reason: String,
    pub status: BonusStatus,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub distributed_at: Option<DateTime<Utc>>,
}

/// Request to create a bonus
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBonusRequest {
    #[validate(length(min = 1, message = "Employee ID is required"))]
    pub employee_id: String,
    #[validate(custom(function = "validate_amount_field", message = "Amount must be a positive decimal"))]
    #[schema(example = "500")]
    pub amount: String,
    #[validate(length(min = 1, max = 500, message = "Reason is required"))]
    #[schema(example = "Q3 performance")]
    pub reason: String,
    /// Defaults to the employee's preferred token
    pub token: Option<String>,
}

/// Query parameters for `GET /api/bonuses`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ListBonusesParams {
    pub status: Option<BonusStatus>,
    pub employee_id: Option<String>,
}

// ============================================================================
// PAYROLL
// ============================================================================

/// A processed salary payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PaymentRecord {
    pub id: String,
    pub employee_id: String,
    pub wallet_address: String,
    #[schema(example = "4200.5")]
    pub amount: String,
    #[schema(example = "USDC")]
    pub token: String,
    #[schema(example = "0x6f1c0b6f7e3c1f54d1f1d1fbb4c2b1a4e9d3f1c8a8b0e2c4d6f8a0b2c4d6e8f0")]
    pub tx_hash: String,
    pub paid_at: DateTime<Utc>,
}

/// Request body for `POST /api/payroll/process`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProcessPayrollRequest {
    /// Restrict the run to these employees; all due employees otherwise
    #[serde(default)]
    pub employee_ids: Option<Vec<String>>,
}

/// Amount aggregated per token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TokenTotal {
    #[schema(example = "USDC")]
    pub token: String,
    #[schema(example = "12500")]
    pub amount: String,
}

/// Employee whose salary is currently due
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DuePayment {
    pub employee_id: String,
    pub name: String,
    pub wallet_address: String,
    pub amount: String,
    pub token: String,
    pub payment_frequency: PaymentFrequency,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub next_payment_at: DateTime<Utc>,
}

/// Dry run of the next payroll
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayrollPreview {
    pub due: Vec<DuePayment>,
    pub totals: Vec<TokenTotal>,
    pub ledger_paused: bool,
    pub generated_at: DateTime<Utc>,
}

/// Employee left out of a payroll run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SkippedPayment {
    pub employee_id: String,
    #[schema(example = "payment for 0x… is not due until 2026-11-01T00:00:00+00:00")]
    pub reason: String,
}

/// Result of a payroll run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayrollRunResult {
    pub processed: Vec<PaymentRecord>,
    pub skipped: Vec<SkippedPayment>,
    pub totals: Vec<TokenTotal>,
}

/// Payment schedule for one employee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PaymentStatus {
    pub employee_id: String,
    pub is_active: bool,
    pub is_due: bool,
    pub payment_frequency: PaymentFrequency,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub next_payment_at: DateTime<Utc>,
}

/// Query parameters for `GET /api/payroll/history`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PaymentHistoryParams {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub cursor: Option<String>,
    pub employee_id: Option<String>,
}

// ============================================================================
// ENS
// ============================================================================

/// Where an availability answer came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnsCheckSource {
    /// `available()` on the registrar controller
    Onchain,
    /// No RPC configured; reserved-name list
    Simulated,
    /// RPC failed; assumed available
    Fallback,
}

/// ENS availability answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EnsAvailability {
    #[schema(example = "acme.eth")]
    pub name: String,
    #[schema(example = "acme")]
    pub label: String,
    pub available: bool,
    pub source: EnsCheckSource,
    pub checked_at: DateTime<Utc>,
}

/// Request to give an employee a subdomain of the caller's company domain
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterSubdomainRequest {
    #[validate(length(min = 1, message = "Employee ID is required"))]
    pub employee_id: String,
    #[validate(length(min = 1, max = 63, message = "Label must be 1-63 characters"))]
    #[schema(example = "alice")]
    pub label: String,
}

/// Completed subdomain assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EnsRegistration {
    #[schema(example = "alice.acme.eth")]
    pub name: String,
    pub node: String,
    pub parent: String,
    pub owner: String,
    pub employee_id: String,
    pub tx_hash: String,
    pub registered_at: DateTime<Utc>,
}

// ============================================================================
// ANALYTICS
// ============================================================================

/// Per-department breakdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DepartmentSummary {
    pub department: String,
    pub employees: usize,
    pub active_employees: usize,
    pub monthly_payroll: Vec<TokenTotal>,
}

/// Employees per payment frequency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FrequencyBreakdown {
    pub frequency: PaymentFrequency,
    pub employees: usize,
}

/// Bonus ledger totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BonusSummary {
    pub pending_count: usize,
    pub distributed_count: usize,
    pub pending_total: Vec<TokenTotal>,
    pub distributed_total: Vec<TokenTotal>,
}

/// Response for `GET /api/analytics/payroll-summary`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayrollSummary {
    pub total_employees: usize,
    pub active_employees: usize,
    pub inactive_employees: usize,
    /// Active employees whose salary is due now
    pub payments_due: usize,
    /// Active salaries normalized to a monthly figure
    pub monthly_payroll: Vec<TokenTotal>,
    pub by_department: Vec<DepartmentSummary>,
    pub by_frequency: Vec<FrequencyBreakdown>,
    pub bonuses: BonusSummary,
    pub generated_at: DateTime<Utc>,
}

/// Payments made in one calendar month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PaymentTrendPoint {
    #[schema(example = "2026-10")]
    pub month: String,
    pub payments: usize,
    pub totals: Vec<TokenTotal>,
}

/// Query parameters for `GET /api/analytics/payment-trend`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PaymentTrendParams {
    #[validate(range(min = 1, max = 24, message = "Months must be between 1 and 24"))]
    #[serde(default = "default_trend_months")]
    pub months: u32,
}

fn default_trend_months() -> u32 {
    6
}

// ============================================================================
// PAGINATION, HEALTH, ERRORS
// ============================================================================

/// Pagination parameters for list requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default: 20)
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    #[serde(default = "default_limit")]
    #[schema(example = 20)]
    pub limit: i64,
    /// Cursor for pagination (ID to start after)
    pub cursor: Option<String>,
}

fn default_limit() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            cursor: None,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub items: Vec<T>,
    /// Cursor for next page (null if no more items)
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            items,
            next_cursor,
            has_more,
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: HealthStatus,
    /// Payroll ledger; degraded while paused
    pub ledger: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database: HealthStatus, ledger: HealthStatus) -> Self {
        let status = match (&database, &ledger) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };
        Self {
            status,
            database,
            ledger,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "validation_error")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "salary: must be greater than zero")]
    pub message: String,
}

/// Rate limit exceeded response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    pub error: ErrorDetail,
    /// Seconds until rate limit resets
    #[schema(example = 1)]
    pub retry_after: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_request() -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            first_name: "Alice".to_string(),
            last_name: "Nakamoto".to_string(),
            email: "Alice@Acme.xyz".to_string(),
            phone: None,
            department: "Engineering".to_string(),
            position: "Engineer".to_string(),
            employment_type: EmploymentType::FullTime,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            wallet_address: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string(),
            salary: "4200.50".to_string(),
            payment_frequency: PaymentFrequency::Monthly,
            preferred_token: "usdc".to_string(),
            tax_id: None,
            tax_country: Some("de".to_string()),
        }
    }

    #[test]
    fn test_create_employee_validation() {
        assert!(sample_request().validate().is_ok());

        let mut req = sample_request();
        req.first_name = String::new();
        assert!(req.validate().is_err());

        let mut req = sample_request();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());

        let mut req = sample_request();
        req.wallet_address = "0x1234".to_string();
        assert!(req.validate().is_err());

        let mut req = sample_request();
        req.salary = "0".to_string();
        assert!(req.validate().is_err());

        let mut req = sample_request();
        req.salary = "-10".to_string();
        assert!(req.validate().is_err());

        let mut req = sample_request();
        req.preferred_token = "U$DC".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_employee_normalization() {
        let normalized = sample_request().normalized().unwrap();
        assert_eq!(
            normalized.wallet_address,
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert_eq!(normalized.email, "alice@acme.xyz");
        assert_eq!(normalized.salary, "4200.5");
        assert_eq!(normalized.preferred_token, "USDC");
        assert_eq!(normalized.tax_country.as_deref(), Some("DE"));
    }

    #[test]
    fn test_parse_wallet_requires_prefix() {
        assert!(parse_wallet("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
        assert!(parse_wallet("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_ok());
        assert!(parse_wallet("0xZZaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
    }

    #[test]
    fn test_update_request_normalization() {
        let update = UpdateEmployeeRequest {
            salary: Some("100.000".to_string()),
            preferred_token: Some("eth".to_string()),
            ..Default::default()
        };
        let normalized = update.normalized().unwrap();
        assert_eq!(normalized.salary.as_deref(), Some("100"));
        assert_eq!(normalized.preferred_token.as_deref(), Some("ETH"));
        assert!(normalized.changes_payroll_settings());

        let bad = UpdateEmployeeRequest {
            salary: Some("0".to_string()),
            ..Default::default()
        };
        assert!(bad.normalized().is_err());

        let name_only = UpdateEmployeeRequest {
            first_name: Some("Bob".to_string()),
            ..Default::default()
        };
        assert!(!name_only.changes_payroll_settings());
    }

    #[test]
    fn test_employee_filter_matches() {
        let now = Utc::now();
        let req = sample_request().normalized().unwrap();
        let employee = Employee {
            id: "e1".to_string(),
            company_id: Some("c1".to_string()),
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: None,
            department: req.department,
            position: req.position,
            employment_type: req.employment_type,
            start_date: req.start_date,
            wallet_address: req.wallet_address,
            salary: req.salary,
            payment_frequency: req.payment_frequency,
            preferred_token: req.preferred_token,
            ens_subdomain: None,
            tax_id: None,
            tax_country: None,
            is_active: true,
            last_payment_at: None,
            last_tx_hash: None,
            created_at: now,
            updated_at: now,
        };

        assert!(EmployeeFilter::default().matches(&employee));
        assert!(EmployeeFilter::active_only().matches(&employee));
        assert!(
            EmployeeFilter {
                department: Some("engineering".to_string()),
                company_id: Some("c1".to_string()),
                ..Default::default()
            }
            .matches(&employee)
        );
        assert!(
            !EmployeeFilter {
                active: Some(false),
                ..Default::default()
            }
            .matches(&employee)
        );
        assert!(
            !EmployeeFilter {
                company_id: Some("c2".to_string()),
                ..Default::default()
            }
            .matches(&employee)
        );
    }

    #[test]
    fn test_bonus_status_display_and_parsing() {
        for (status, string) in [
            (BonusStatus::Pending, "pending"),
            (BonusStatus::Distributed, "distributed"),
        ] {
            assert_eq!(status.to_string(), string);
            assert_eq!(BonusStatus::from_str(string).unwrap(), status);
        }
        assert!(BonusStatus::from_str("paid").is_err());
    }

    #[test]
    fn test_health_response_aggregation() {
        let health = HealthResponse::new(HealthStatus::Healthy, HealthStatus::Degraded);
        assert_eq!(health.status, HealthStatus::Degraded);
        let health = HealthResponse::new(HealthStatus::Unhealthy, HealthStatus::Healthy);
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }
}
