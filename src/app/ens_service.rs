//! ENS availability checks and employee subdomain assignment.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::{
    AppError, DatabaseClient, DatabaseError, EnsAvailability, EnsProvider, EnsRegistration,
    RegisterSubdomainRequest, canonical_wallet, ens,
};

pub struct EnsService {
    db_client: Arc<dyn DatabaseClient>,
    provider: Arc<dyn EnsProvider>,
    parent_tld: String,
}

impl EnsService {
    #[must_use]
    pub fn new(
        db_client: Arc<dyn DatabaseClient>,
        provider: Arc<dyn EnsProvider>,
        parent_tld: &str,
    ) -> Self {
        Self {
            db_client,
            provider,
            parent_tld: parent_tld.trim_matches('.').to_lowercase(),
        }
    }

    /// Check whether `name` (`label` or `label.<tld>`) can be registered.
    #[instrument(skip(self))]
    pub async fn check_availability(&self, name: &str) -> Result<EnsAvailability, AppError> {
        let label = ens::registrable_label(name, &self.parent_tld)?;
        let (available, source) = self.provider.check_availability(&label).await?;

        Ok(EnsAvailability {
            name: ens::subdomain(&label, &self.parent_tld),
            label,
            available,
            source,
            checked_at: Utc::now(),
        })
    }

    /// Give an employee `label.<company domain>`.
    #[instrument(skip(self, request), fields(employee_id = %request.employee_id))]
    pub async fn register_subdomain(
        &self,
        caller_wallet: &str,
        request: &RegisterSubdomainRequest,
    ) -> Result<EnsRegistration, AppError> {
        request.validate()?;
        let label = ens::normalize_label(&request.label)?;
        let caller_wallet = canonical_wallet(caller_wallet)?;

        let company = self
            .db_client
            .get_company_by_owner(&caller_wallet)
            .await?
            .ok_or_else(|| {
                AppError::Database(DatabaseError::NotFound(
                    "Register a company before assigning subdomains".to_string(),
                ))
            })?;

        let employee = self
            .db_client
            .get_employee(&request.employee_id)
            .await?
            .ok_or_else(|| {
                AppError::Database(DatabaseError::NotFound(format!(
                    "Employee {} not found",
                    request.employee_id
                )))
            })?;
        if employee
            .company_id
            .as_ref()
            .is_some_and(|id| *id != company.id)
        {
            return Err(AppError::Authorization(
                "Employee belongs to another company".to_string(),
            ));
        }

        let name = ens::subdomain(&label, &company.ens_domain);
        if employee.ens_subdomain.as_deref() == Some(name.as_str()) {
            return Err(AppError::Database(DatabaseError::Duplicate(format!(
                "{} is already assigned to this employee",
                name
            ))));
        }

        let owner = employee.wallet()?;
        let tx_hash = self
            .provider
            .register_subdomain(&company.ens_domain, &label, owner)
            .await?;
        self.db_client
            .assign_ens_subdomain(&employee.id, &name)
            .await
            .map_err(|e| match e {
                AppError::Database(DatabaseError::Duplicate(_)) => AppError::Database(
                    DatabaseError::Duplicate(format!("{} is already taken", name)),
                ),
                other => other,
            })?;

        info!(name = %name, tx_hash = %tx_hash, "Subdomain registered");
        Ok(EnsRegistration {
            node: ens::node_hex(&ens::namehash(&name)),
            name,
            parent: company.ens_domain,
            owner: employee.wallet_address,
            employee_id: employee.id,
            tx_hash,
            registered_at: Utc::now(),
        })
    }
}

