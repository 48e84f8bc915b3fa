//! Domain layer containing core business types, traits, and error definitions.

pub mod amount;
pub mod ens;
pub mod error;
pub mod ledger;
pub mod schedule;
pub mod traits;
pub mod types;

pub use amount::{AmountParseError, TokenAmount};
pub use error::{
    AppError, ConfigError, DatabaseError, ExternalServiceError, LedgerError, ValidationError,
};
pub use ledger::{
    Disbursement, LedgerBonus, LedgerEmployee, PaymentReceipt, PayrollLedger, TreasuryBalance,
    TreasuryReceipt, TreasurySnapshot,
};
pub use schedule::{PaymentFrequency, is_payment_due, monthly_equivalent, next_payment_at};
pub use traits::{BonusStore, DatabaseClient, EnsProvider, PayrollChain};
pub use types::{
    Bonus, BonusStatus, BonusSummary, Company, CreateBonusRequest, CreateCompanyRequest,
    CreateEmployeeRequest, DepartmentSummary, DuePayment, Employee, EmployeeFilter,
    EmploymentType, EnsAvailability, EnsCheckSource, EnsRegistration, ErrorDetail, ErrorResponse,
    FrequencyBreakdown, HealthResponse, HealthStatus, ListBonusesParams, ListEmployeesParams,
    NewCompany, PaginatedResponse, PaginationParams, PaymentHistoryParams, PaymentRecord,
    PaymentStatus, PaymentTrendParams, PaymentTrendPoint, PayrollPreview, PayrollRunResult,
    PayrollSummary, ProcessPayrollRequest, RateLimitResponse, RegisterSubdomainRequest,
    SkippedPayment, TokenTotal, UpdateCompanyRequest, UpdateEmployeeRequest, canonical_wallet,
    parse_positive_amount, parse_wallet,
};
