//! Employee and company management.
//!
//! The database is the system of record for employee details; the payroll
//! ledger holds the payroll settings it needs to pay them. Every mutation
//! that touches payroll settings is applied to the ledger first, so a ledger
//! rejection (paused, unsupported token) leaves the database untouched, and
//! a failed database write rolls the ledger change back.

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AppError, Company, CreateCompanyRequest, CreateEmployeeRequest, DatabaseClient, DatabaseError,
    Employee, EmployeeFilter, HealthResponse, HealthStatus, LedgerEmployee, LedgerError,
    ListEmployeesParams, NewCompany, PaginatedResponse, PayrollChain, UpdateCompanyRequest,
    UpdateEmployeeRequest, canonical_wallet, ens, parse_positive_amount, parse_wallet,
};

/// Default parent TLD for company domains
pub const DEFAULT_PARENT_TLD: &str = "eth";

/// Application service containing employee and company business logic
pub struct AppService {
    db_client: Arc<dyn DatabaseClient>,
    chain: Arc<dyn PayrollChain>,
    parent_tld: String,
}

/// Ledger change made ahead of a database write
enum LedgerUpdate {
    Updated {
        wallet: Address,
        previous: LedgerEmployee,
    },
    Moved {
        from: Address,
        to: Address,
        previous: LedgerEmployee,
    },
}

fn employee_not_found(id: &str) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!("Employee {} not found", id)))
}

fn company_not_found(what: &str) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!("Company {} not found", what)))
}

impl AppService {
    #[must_use]
    pub fn new(db_client: Arc<dyn DatabaseClient>, chain: Arc<dyn PayrollChain>) -> Self {
        Self::with_parent_tld(db_client, chain, DEFAULT_PARENT_TLD)
    }

    #[must_use]
    pub fn with_parent_tld(
        db_client: Arc<dyn DatabaseClient>,
        chain: Arc<dyn PayrollChain>,
        parent_tld: &str,
    ) -> Self {
        Self {
            db_client,
            chain,
            parent_tld: parent_tld.trim_matches('.').to_lowercase(),
        }
    }

    #[must_use]
    pub fn parent_tld(&self) -> &str {
        &self.parent_tld
    }

    // ------------------------------------------------------------------
    // Employees
    // ------------------------------------------------------------------

    /// Validate, register on the ledger, then persist a new employee.
    #[instrument(skip(self, request), fields(department = %request.department))]
    pub async fn create_employee(
        &self,
        request: &CreateEmployeeRequest,
        caller_wallet: Option<&str>,
    ) -> Result<Employee, AppError> {
        request.validate().map_err(|e| {
            warn!(error = %e, "Validation failed");
            AppError::from(e)
        })?;
        let data = request.normalized()?;

        if self
            .db_client
            .get_employee_by_wallet(&data.wallet_address)
            .await?
            .is_some()
        {
            return Err(AppError::Database(DatabaseError::Duplicate(format!(
                "Employee with wallet {} already exists",
                data.wallet_address
            ))));
        }

        let company_id = match caller_wallet {
            Some(wallet) => self
                .db_client
                .get_company_by_owner(wallet)
                .await?
                .map(|c| c.id),
            None => None,
        };

        let wallet = parse_wallet(&data.wallet_address)?;
        let salary = parse_positive_amount("salary", &data.salary)?;
        let tx_hash = self
            .chain
            .register_employee(wallet, salary, data.payment_frequency, &data.preferred_token)
            .await?;

        match self
            .db_client
            .create_employee(&data, company_id.as_deref())
            .await
        {
            Ok(employee) => {
                info!(id = %employee.id, tx_hash = %tx_hash, "Employee created");
                Ok(employee)
            }
            Err(e) => {
                // Undo the ledger registration so the two stores agree
                if let Err(rollback) = self.chain.remove_employee(wallet).await {
                    error!(error = ?rollback, "Failed to roll back ledger registration");
                }
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_employee(&self, id: &str) -> Result<Option<Employee>, AppError> {
        self.db_client.get_employee(id).await
    }

    async fn require_employee(&self, id: &str) -> Result<Employee, AppError> {
        self.db_client
            .get_employee(id)
            .await?
            .ok_or_else(|| employee_not_found(id))
    }

    #[instrument(skip(self))]
    pub async fn get_employee_by_wallet(&self, wallet: &str) -> Result<Option<Employee>, AppError> {
        let wallet = canonical_wallet(wallet)?;
        self.db_client.get_employee_by_wallet(&wallet).await
    }

    #[instrument(skip(self))]
    pub async fn list_employees(
        &self,
        params: &ListEmployeesParams,
    ) -> Result<PaginatedResponse<Employee>, AppError> {
        params.validate()?;
        self.db_client
            .list_employees(&params.filter(), params.limit, params.cursor.as_deref())
            .await
    }

    /// Apply a partial update, re-syncing the ledger when payroll settings
    /// or the wallet change.
    #[instrument(skip(self, request))]
    pub async fn update_employee(
        &self,
        id: &str,
        request: &UpdateEmployeeRequest,
    ) -> Result<Employee, AppError> {
        request.validate()?;
        let update = request.normalized()?;
        let existing = self.require_employee(id).await?;

        let wallet_changed = update
            .wallet_address
            .as_ref()
            .is_some_and(|w| *w != existing.wallet_address);
        if wallet_changed {
            if let Some(new_wallet) = &update.wallet_address {
                if self.db_client.get_employee_by_wallet(new_wallet).await?.is_some() {
                    return Err(AppError::Database(DatabaseError::Duplicate(format!(
                        "Employee with wallet {} already exists",
                        new_wallet
                    ))));
                }
            }
        }

        let ledger_update = if existing.is_active
            && (wallet_changed || update.changes_payroll_settings())
        {
            let mut merged = existing.clone();
            update.apply_to(&mut merged);
            Some(self.apply_ledger_update(&existing, &merged, wallet_changed).await?)
        } else {
            None
        };

        let updated = self
            .db_client
            .update_employee(id, &update)
            .await
            .and_then(|employee| employee.ok_or_else(|| employee_not_found(id)));
        let employee = match updated {
            Ok(employee) => employee,
            Err(e) => {
                if let Some(change) = ledger_update {
                    self.undo_ledger_update(change).await;
                }
                return Err(e);
            }
        };
        info!(id = %employee.id, "Employee updated");
        Ok(employee)
    }

    /// Push merged payroll settings to the ledger. A wallet change registers
    /// the new wallet before retiring the old one, so a rejected wallet
    /// leaves the current registration paying.
    async fn apply_ledger_update(
        &self,
        existing: &Employee,
        merged: &Employee,
        wallet_changed: bool,
    ) -> Result<LedgerUpdate, AppError> {
        let old_wallet = existing.wallet()?;
        let previous = self
            .chain
            .employee(old_wallet)
            .await?
            .ok_or_else(|| LedgerError::EmployeeNotFound(old_wallet.to_checksum(None)))?;
        let salary = merged.salary_amount()?;

        if !wallet_changed {
            self.chain
                .update_employee(
                    old_wallet,
                    salary,
                    merged.payment_frequency,
                    &merged.preferred_token,
                )
                .await?;
            return Ok(LedgerUpdate::Updated {
                wallet: old_wallet,
                previous,
            });
        }

        let new_wallet = merged.wallet()?;
        self.chain
            .register_employee(
                new_wallet,
                salary,
                merged.payment_frequency,
                &merged.preferred_token,
            )
            .await?;
        if let Err(e) = self.chain.remove_employee(old_wallet).await {
            if let Err(rollback) = self.chain.remove_employee(new_wallet).await {
                error!(error = ?rollback, "Failed to roll back new wallet registration");
            }
            return Err(e);
        }
        Ok(LedgerUpdate::Moved {
            from: old_wallet,
            to: new_wallet,
            previous,
        })
    }

    /// Put the ledger back the way `apply_ledger_update` found it
    async fn undo_ledger_update(&self, change: LedgerUpdate) {
        match change {
            LedgerUpdate::Updated { wallet, previous } => {
                if let Err(e) = self
                    .chain
                    .update_employee(wallet, previous.salary, previous.frequency, &previous.token)
                    .await
                {
                    error!(error = ?e, "Failed to restore ledger payroll settings");
                }
            }
            LedgerUpdate::Moved { from, to, previous } => {
                if let Err(e) = self.chain.remove_employee(to).await {
                    error!(error = ?e, "Failed to roll back new wallet registration");
                }
                if let Err(e) = self
                    .chain
                    .register_employee(from, previous.salary, previous.frequency, &previous.token)
                    .await
                {
                    error!(error = ?e, "Failed to restore previous wallet registration");
                }
            }
        }
    }

    /// Soft-deactivate: the employee leaves the ledger but keeps their record.
    #[instrument(skip(self))]
    pub async fn deactivate_employee(&self, id: &str) -> Result<Employee, AppError> {
        let existing = self.require_employee(id).await?;
        if !existing.is_active {
            return Ok(existing);
        }
        self.chain.remove_employee(existing.wallet()?).await?;
        let employee = self
            .db_client
            .set_employee_active(id, false)
            .await?
            .ok_or_else(|| employee_not_found(id))?;
        info!(id = %employee.id, "Employee deactivated");
        Ok(employee)
    }

    #[instrument(skip(self))]
    pub async fn activate_employee(&self, id: &str) -> Result<Employee, AppError> {
        let existing = self.require_employee(id).await?;
        if existing.is_active {
            return Ok(existing);
        }
        self.chain
            .register_employee(
                existing.wallet()?,
                existing.salary_amount()?,
                existing.payment_frequency,
                &existing.preferred_token,
            )
            .await?;
        let employee = self
            .db_client
            .set_employee_active(id, true)
            .await?
            .ok_or_else(|| employee_not_found(id))?;
        info!(id = %employee.id, "Employee reactivated");
        Ok(employee)
    }

    /// Hard delete. Active employees are removed from the ledger first.
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: &str) -> Result<(), AppError> {
        let existing = self.require_employee(id).await?;
        if existing.is_active {
            match self.chain.remove_employee(existing.wallet()?).await {
                Ok(_) => {}
                Err(AppError::Ledger(
                    LedgerError::EmployeeNotFound(_) | LedgerError::EmployeeInactive(_),
                )) => {
                    warn!(id = %id, "Employee was not on the ledger");
                }
                Err(e) => return Err(e),
            }
        }
        if !self.db_client.delete_employee(id).await? {
            return Err(employee_not_found(id));
        }
        info!(id = %id, "Employee deleted");
        Ok(())
    }

    /// Register every active employee missing from the ledger. Run at startup,
    /// since the simulated ledger does not survive a restart.
    #[instrument(skip(self))]
    pub async fn sync_ledger(&self) -> Result<usize, AppError> {
        let employees = self
            .db_client
            .list_all_employees(&EmployeeFilter::active_only())
            .await?;

        let mut registered = 0;
        for employee in employees {
            let wallet = employee.wallet()?;
            if self
                .chain
                .employee(wallet)
                .await?
                .is_some_and(|e| e.active)
            {
                continue;
            }
            match self
                .chain
                .register_employee(
                    wallet,
                    employee.salary_amount()?,
                    employee.payment_frequency,
                    &employee.preferred_token,
                )
                .await
            {
                Ok(_) => registered += 1,
                Err(e) => warn!(id = %employee.id, error = %e, "Could not register employee on ledger"),
            }
        }

        info!(registered, "Ledger synchronized with employee records");
        Ok(registered)
    }

    // ------------------------------------------------------------------
    // Companies
    // ------------------------------------------------------------------

    #[instrument(skip(self, request))]
    pub async fn create_company(
        &self,
        owner_wallet: &str,
        request: &CreateCompanyRequest,
    ) -> Result<Company, AppError> {
        request.validate()?;
        let owner_wallet = canonical_wallet(owner_wallet)?;
        let ens_domain = ens::normalize_domain(&request.ens_domain, &self.parent_tld)?;

        if self
            .db_client
            .get_company_by_owner(&owner_wallet)
            .await?
            .is_some()
        {
            return Err(AppError::Database(DatabaseError::Duplicate(format!(
                "Wallet {} already owns a company",
                owner_wallet
            ))));
        }

        let company = self
            .db_client
            .create_company(&NewCompany {
                name: request.name.trim().to_string(),
                ens_node: ens::node_hex(&ens::namehash(&ens_domain)),
                ens_domain,
                owner_wallet,
            })
            .await?;
        info!(id = %company.id, domain = %company.ens_domain, "Company registered");
        Ok(company)
    }

    #[instrument(skip(self))]
    pub async fn get_company(&self, id: &str) -> Result<Company, AppError> {
        self.db_client
            .get_company(id)
            .await?
            .ok_or_else(|| company_not_found(id))
    }

    #[instrument(skip(self))]
    pub async fn get_company_for_owner(&self, owner_wallet: &str) -> Result<Company, AppError> {
        let owner_wallet = canonical_wallet(owner_wallet)?;
        self.db_client
            .get_company_by_owner(&owner_wallet)
            .await?
            .ok_or_else(|| company_not_found(&format!("for wallet {}", owner_wallet)))
    }

    #[instrument(skip(self, request))]
    pub async fn update_company_for_owner(
        &self,
        owner_wallet: &str,
        request: &UpdateCompanyRequest,
    ) -> Result<Company, AppError> {
        request.validate()?;
        let company = self.get_company_for_owner(owner_wallet).await?;
        self.db_client
            .update_company(&company.id, request.name.trim())
            .await?
            .ok_or_else(|| company_not_found(&company.id))
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Perform health check on all dependencies
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let db_health = match self.db_client.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unhealthy,
        };
        let ledger_health = match self.chain.health_check().await {
            Ok(()) => match self.chain.is_paused().await {
                Ok(false) => HealthStatus::Healthy,
                Ok(true) => HealthStatus::Degraded,
                Err(_) => HealthStatus::Unhealthy,
            },
            Err(_) => HealthStatus::Unhealthy,
        };
        HealthResponse::new(db_health, ledger_health)
    }
}
