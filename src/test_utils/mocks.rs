//! Mock implementations for testing.

use alloy_primitives::{Address, keccak256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::{
    AppError, Company, CreateEmployeeRequest, DatabaseClient, DatabaseError, Employee,
    EmployeeFilter, EnsCheckSource, EnsProvider, ExternalServiceError, NewCompany,
    PaginatedResponse, PaymentRecord, UpdateEmployeeRequest,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
    /// Fail only `record_payment`, leaving every other call working
    pub fail_record_payment: bool,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn failing_payment_records() -> Self {
        Self {
            fail_record_payment: true,
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct MockTables {
    /// Insertion order; listings walk it newest first
    employees: Vec<Employee>,
    payments: Vec<PaymentRecord>,
    companies: Vec<Company>,
}

/// Mock database client for testing
pub struct MockDatabaseClient {
    storage: Arc<Mutex<MockTables>>,
    config: MockConfig,
    is_healthy: AtomicBool,
}

fn duplicate(what: String) -> AppError {
    AppError::Database(DatabaseError::Duplicate(what))
}

fn page<T: Clone + utoipa::ToSchema>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> &str,
    limit: i64,
    cursor: Option<&str>,
) -> PaginatedResponse<T> {
    let start = match cursor {
        Some(c) => items
            .iter()
            .position(|item| id_of(item) == c)
            .map_or(items.len(), |i| i + 1),
        None => 0,
    };
    let limit = limit.max(1) as usize;
    let rest: Vec<T> = items.into_iter().skip(start).collect();
    let has_more = rest.len() > limit;
    let items: Vec<T> = rest.into_iter().take(limit).collect();
    let next_cursor = if has_more {
        items.last().map(|item| id_of(item).to_string())
    } else {
        None
    };
    PaginatedResponse::new(items, next_cursor, has_more)
}

impl MockDatabaseClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(MockTables::default())),
            config,
            is_healthy: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// All stored employees (for assertions)
    pub fn get_all_employees(&self) -> Vec<Employee> {
        self.storage.lock().unwrap().employees.clone()
    }

    /// All recorded payments (for assertions)
    pub fn get_all_payments(&self) -> Vec<PaymentRecord> {
        self.storage.lock().unwrap().payments.clone()
    }

    /// Insert an employee as-is, bypassing validation (for seeding)
    pub fn insert_employee(&self, employee: Employee) {
        self.storage.lock().unwrap().employees.push(employee);
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Database(DatabaseError::Query(msg)));
        }
        Ok(())
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Unhealthy".to_string(),
            )));
        }
        self.check_should_fail()
    }

    async fn create_employee(
        &self,
        data: &CreateEmployeeRequest,
        company_id: Option<&str>,
    ) -> Result<Employee, AppError> {
        self.check_should_fail()?;
        let mut storage = self.storage.lock().unwrap();
        if storage
            .employees
            .iter()
            .any(|e| e.wallet_address == data.wallet_address)
        {
            return Err(duplicate(format!("wallet {}", data.wallet_address)));
        }
        if storage
            .employees
            .iter()
            .any(|e| e.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(duplicate(format!("email {}", data.email)));
        }

        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.map(str::to_string),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            department: data.department.clone(),
            position: data.position.clone(),
            employment_type: data.employment_type,
            start_date: data.start_date,
            wallet_address: data.wallet_address.clone(),
            salary: data.salary.clone(),
            payment_frequency: data.payment_frequency,
            preferred_token: data.preferred_token.clone(),
            ens_subdomain: None,
            tax_id: data.tax_id.clone(),
            tax_country: data.tax_country.clone(),
            is_active: true,
            last_payment_at: None,
            last_tx_hash: None,
            created_at: now,
            updated_at: now,
        };
        storage.employees.push(employee.clone());
        Ok(employee)
    }

    async fn get_employee(&self, id: &str) -> Result<Option<Employee>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        Ok(storage.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn get_employee_by_wallet(&self, wallet: &str) -> Result<Option<Employee>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        Ok(storage
            .employees
            .iter()
            .find(|e| e.wallet_address == wallet)
            .cloned())
    }

    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<Employee>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        let matching: Vec<Employee> = storage
            .employees
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        Ok(page(matching, |e| e.id.as_str(), limit, cursor))
    }

    async fn list_all_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        Ok(storage
            .employees
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn update_employee(
        &self,
        id: &str,
        update: &UpdateEmployeeRequest,
    ) -> Result<Option<Employee>, AppError> {
        self.check_should_fail()?;
        let mut storage = self.storage.lock().unwrap();
        if let Some(email) = &update.email {
            if storage
                .employees
                .iter()
                .any(|e| e.id != id && e.email.eq_ignore_ascii_case(email))
            {
                return Err(duplicate(format!("email {}", email)));
            }
        }
        Ok(storage
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .map(|employee| {
                update.apply_to(employee);
                employee.clone()
            }))
    }

    async fn set_employee_active(&self, id: &str, active: bool) -> Result<Option<Employee>, AppError> {
        self.check_should_fail()?;
        let mut storage = self.storage.lock().unwrap();
        Ok(storage
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .map(|employee| {
                employee.is_active = active;
                employee.updated_at = Utc::now();
                employee.clone()
            }))
    }

    async fn delete_employee(&self, id: &str) -> Result<bool, AppError> {
        self.check_should_fail()?;
        let mut storage = self.storage.lock().unwrap();
        let before = storage.employees.len();
        storage.employees.retain(|e| e.id != id);
        Ok(storage.employees.len() < before)
    }

    async fn assign_ens_subdomain(&self, id: &str, name: &str) -> Result<(), AppError> {
        self.check_should_fail()?;
        let mut storage = self.storage.lock().unwrap();
        if storage
            .employees
            .iter()
            .any(|e| e.id != id && e.ens_subdomain.as_deref() == Some(name))
        {
            return Err(duplicate(format!("subdomain {}", name)));
        }
        let employee = storage
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::Database(DatabaseError::NotFound(id.to_string())))?;
        employee.ens_subdomain = Some(name.to_string());
        employee.updated_at = Utc::now();
        Ok(())
    }

    async fn record_payment(&self, payment: &PaymentRecord) -> Result<(), AppError> {
        self.check_should_fail()?;
        if self.config.fail_record_payment {
            return Err(AppError::Database(DatabaseError::Query(
                "payment insert failed".to_string(),
            )));
        }
        let mut storage = self.storage.lock().unwrap();
        if storage.payments.iter().any(|p| p.tx_hash == payment.tx_hash) {
            return Err(duplicate(format!("payment {}", payment.tx_hash)));
        }
        if let Some(employee) = storage
            .employees
            .iter_mut()
            .find(|e| e.id == payment.employee_id)
        {
            employee.last_payment_at = Some(payment.paid_at);
            employee.last_tx_hash = Some(payment.tx_hash.clone());
        }
        storage.payments.push(payment.clone());
        Ok(())
    }

    async fn list_payments(
        &self,
        employee_id: Option<&str>,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<PaymentRecord>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        let matching: Vec<PaymentRecord> = storage
            .payments
            .iter()
            .rev()
            .filter(|p| employee_id.is_none_or(|id| p.employee_id == id))
            .cloned()
            .collect();
        Ok(page(matching, |p| p.id.as_str(), limit, cursor))
    }

    async fn list_payments_since(&self, since: DateTime<Utc>) -> Result<Vec<PaymentRecord>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        Ok(storage
            .payments
            .iter()
            .filter(|p| p.paid_at >= since)
            .cloned()
            .collect())
    }

    async fn create_company(&self, data: &NewCompany) -> Result<Company, AppError> {
        self.check_should_fail()?;
        let mut storage = self.storage.lock().unwrap();
        if storage
            .companies
            .iter()
            .any(|c| c.ens_domain == data.ens_domain)
        {
            return Err(duplicate(format!("domain {}", data.ens_domain)));
        }
        if storage
            .companies
            .iter()
            .any(|c| c.owner_wallet == data.owner_wallet)
        {
            return Err(duplicate(format!("owner {}", data.owner_wallet)));
        }
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4().to_string(),
            name: data.name.clone(),
            ens_domain: data.ens_domain.clone(),
            ens_node: data.ens_node.clone(),
            owner_wallet: data.owner_wallet.clone(),
            created_at: now,
            updated_at: now,
        };
        storage.companies.push(company.clone());
        Ok(company)
    }

    async fn get_company(&self, id: &str) -> Result<Option<Company>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        Ok(storage.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn get_company_by_owner(&self, owner_wallet: &str) -> Result<Option<Company>, AppError> {
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        Ok(storage
            .companies
            .iter()
            .find(|c| c.owner_wallet == owner_wallet)
            .cloned())
    }

    async fn update_company(&self, id: &str, name: &str) -> Result<Option<Company>, AppError> {
        self.check_should_fail()?;
        let mut storage = self.storage.lock().unwrap();
        Ok(storage
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .map(|company| {
                company.name = name.to_string();
                company.updated_at = Utc::now();
                company.clone()
            }))
    }
}

/// Mock ENS provider for testing
pub struct MockEnsProvider {
    taken: Mutex<HashSet<String>>,
    config: MockConfig,
}

impl MockEnsProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            taken: Mutex::new(HashSet::new()),
            config,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Mark a label as already registered
    pub fn mark_taken(&self, label: &str) {
        self.taken.lock().unwrap().insert(label.to_lowercase());
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::ExternalService(ExternalServiceError::Unavailable(
                msg,
            )));
        }
        Ok(())
    }
}

impl Default for MockEnsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnsProvider for MockEnsProvider {
    async fn check_availability(&self, label: &str) -> Result<(bool, EnsCheckSource), AppError> {
        self.check_should_fail()?;
        let taken = self.taken.lock().unwrap().contains(label);
        Ok((!taken, EnsCheckSource::Simulated))
    }

    async fn register_subdomain(
        &self,
        parent: &str,
        label: &str,
        owner: Address,
    ) -> Result<String, AppError> {
        self.check_should_fail()?;
        let name = format!("{}.{}", label, parent);
        self.taken.lock().unwrap().insert(name.clone());
        let hash = keccak256([name.as_bytes(), owner.as_slice()].concat());
        Ok(format!("0x{}", hex::encode(hash)))
    }
}
