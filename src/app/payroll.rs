//! Payroll processing, bonuses and treasury administration.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AppError, Bonus, BonusStatus, BonusStore, CreateBonusRequest, DatabaseClient, DatabaseError,
    DuePayment, Employee, EmployeeFilter, LedgerError, ListBonusesParams, PaginatedResponse,
    PaymentHistoryParams, PaymentRecord, PaymentStatus, PayrollChain, PayrollPreview,
    PayrollRunResult, ProcessPayrollRequest, SkippedPayment, TokenAmount, TokenTotal,
    TreasuryReceipt, TreasurySnapshot, ValidationError, is_payment_due, next_payment_at,
    parse_positive_amount,
};

/// Sum amounts per token, sorted by token symbol
pub fn totals_by_token<'a, I>(amounts: I) -> Vec<TokenTotal>
where
    I: IntoIterator<Item = (&'a str, TokenAmount)>,
{
    let mut totals: BTreeMap<String, TokenAmount> = BTreeMap::new();
    for (token, amount) in amounts {
        let entry = totals.entry(token.to_string()).or_default();
        *entry = [*entry, amount].into_iter().sum();
    }
    totals
        .into_iter()
        .map(|(token, amount)| TokenTotal {
            token,
            amount: amount.to_string(),
        })
        .collect()
}

/// Payroll service driving the ledger
pub struct PayrollService {
    db_client: Arc<dyn DatabaseClient>,
    chain: Arc<dyn PayrollChain>,
    bonuses: Arc<dyn BonusStore>,
}

impl PayrollService {
    #[must_use]
    pub fn new(
        db_client: Arc<dyn DatabaseClient>,
        chain: Arc<dyn PayrollChain>,
        bonuses: Arc<dyn BonusStore>,
    ) -> Self {
        Self {
            db_client,
            chain,
            bonuses,
        }
    }

    fn due_payment(employee: &Employee, now: DateTime<Utc>) -> DuePayment {
        DuePayment {
            employee_id: employee.id.clone(),
            name: employee.full_name(),
            wallet_address: employee.wallet_address.clone(),
            amount: employee.salary.clone(),
            token: employee.preferred_token.clone(),
            payment_frequency: employee.payment_frequency,
            last_payment_at: employee.last_payment_at,
            next_payment_at: next_payment_at(
                employee.last_payment_at,
                employee.payment_frequency,
                now,
            ),
        }
    }

    /// Active employees whose salary is due at `now`
    #[instrument(skip(self))]
    pub async fn preview(&self, now: DateTime<Utc>) -> Result<PayrollPreview, AppError> {
        let employees = self
            .db_client
            .list_all_employees(&EmployeeFilter::active_only())
            .await?;

        let due: Vec<DuePayment> = employees
            .iter()
            .filter(|e| is_payment_due(e.last_payment_at, e.payment_frequency, now))
            .map(|e| Self::due_payment(e, now))
            .collect();
        let totals = totals_by_token(due.iter().filter_map(|d| {
            d.amount
                .parse::<TokenAmount>()
                .ok()
                .map(|a| (d.token.as_str(), a))
        }));

        Ok(PayrollPreview {
            due,
            totals,
            ledger_paused: self.chain.is_paused().await?,
            generated_at: now,
        })
    }

    /// Pay every due employee (or the requested subset). Per-employee
    /// rejections are reported as skipped; a paused ledger fails the run.
    #[instrument(skip(self, request))]
    pub async fn process_payroll(
        &self,
        request: &ProcessPayrollRequest,
        now: DateTime<Utc>,
    ) -> Result<PayrollRunResult, AppError> {
        if self.chain.is_paused().await? {
            return Err(AppError::Ledger(LedgerError::Paused));
        }

        let mut skipped = Vec::new();
        let candidates = match &request.employee_ids {
            Some(ids) => {
                let mut found = Vec::with_capacity(ids.len());
                for id in ids {
                    match self.db_client.get_employee(id).await? {
                        Some(employee) => found.push(employee),
                        None => skipped.push(SkippedPayment {
                            employee_id: id.clone(),
                            reason: "employee not found".to_string(),
                        }),
                    }
                }
                found
            }
            None => {
                self.db_client
                    .list_all_employees(&EmployeeFilter::active_only())
                    .await?
            }
        };

        let mut processed = Vec::new();
        for employee in candidates {
            if !employee.is_active {
                skipped.push(SkippedPayment {
                    employee_id: employee.id.clone(),
                    reason: "employee is not active".to_string(),
                });
                continue;
            }
            if !is_payment_due(employee.last_payment_at, employee.payment_frequency, now) {
                skipped.push(SkippedPayment {
                    employee_id: employee.id.clone(),
                    reason: format!(
                        "payment not due until {}",
                        next_payment_at(employee.last_payment_at, employee.payment_frequency, now)
                            .to_rfc3339()
                    ),
                });
                continue;
            }

            match self.pay_employee(&employee, now).await {
                Ok(record) => processed.push(record),
                Err(AppError::Ledger(e)) => {
                    warn!(employee_id = %employee.id, error = %e, "Payment rejected by ledger");
                    skipped.push(SkippedPayment {
                        employee_id: employee.id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(employee_id = %employee.id, error = ?e, "Payroll run aborted");
                    return Err(e);
                }
            }
        }

        let totals = totals_by_token(processed.iter().filter_map(|p: &PaymentRecord| {
            p.amount
                .parse::<TokenAmount>()
                .ok()
                .map(|a| (p.token.as_str(), a))
        }));
        info!(
            processed = processed.len(),
            skipped = skipped.len(),
            "Payroll run complete"
        );

        Ok(PayrollRunResult {
            processed,
            skipped,
            totals,
        })
    }

    async fn pay_employee(
        &self,
        employee: &Employee,
        now: DateTime<Utc>,
    ) -> Result<PaymentRecord, AppError> {
        let wallet = employee.wallet()?;
        let previous_payment_at = self
            .chain
            .employee(wallet)
            .await?
            .and_then(|e| e.last_payment_at);
        let receipt = self.chain.process_payment(wallet, now).await?;
        let record = PaymentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee.id.clone(),
            wallet_address: employee.wallet_address.clone(),
            amount: receipt.amount.to_string(),
            token: receipt.token.clone(),
            tx_hash: receipt.tx_hash.clone(),
            paid_at: receipt.paid_at,
        };

        if let Err(e) = self.db_client.record_payment(&record).await {
            error!(
                employee_id = %employee.id,
                tx_hash = %receipt.tx_hash,
                amount = %receipt.amount,
                token = %receipt.token,
                error = ?e,
                "Salary paid but not recorded, reversing"
            );
            if let Err(reversal) = self.chain.reverse_payment(&receipt, previous_payment_at).await {
                error!(
                    tx_hash = %receipt.tx_hash,
                    error = ?reversal,
                    "Failed to reverse unrecorded salary payment"
                );
            }
            return Err(e);
        }
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn payment_history(
        &self,
        params: &PaymentHistoryParams,
    ) -> Result<PaginatedResponse<PaymentRecord>, AppError> {
        params.validate()?;
        self.db_client
            .list_payments(
                params.employee_id.as_deref(),
                params.limit,
                params.cursor.as_deref(),
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn payment_status(
        &self,
        employee_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PaymentStatus, AppError> {
        let employee = self
            .db_client
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| {
                AppError::Database(DatabaseError::NotFound(format!(
                    "Employee {} not found",
                    employee_id
                )))
            })?;

        Ok(PaymentStatus {
            employee_id: employee.id,
            is_active: employee.is_active,
            is_due: employee.is_active
                && is_payment_due(employee.last_payment_at, employee.payment_frequency, now),
            payment_frequency: employee.payment_frequency,
            last_payment_at: employee.last_payment_at,
            next_payment_at: next_payment_at(
                employee.last_payment_at,
                employee.payment_frequency,
                now,
            ),
        })
    }

    // ------------------------------------------------------------------
    // Bonuses
    // ------------------------------------------------------------------

    #[instrument(skip(self, request), fields(employee_id = %request.employee_id))]
    pub async fn create_bonus(&self, request: &CreateBonusRequest) -> Result<Bonus, AppError> {
        request.validate()?;
        let amount = parse_positive_amount("amount", &request.amount)?;

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
        if !employee.is_active {
            return Err(AppError::Validation(ValidationError::field(
                "employee_id",
                "Bonuses can only be created for active employees",
            )));
        }

        let token = request
            .token
            .as_deref()
            .map(|t| t.trim().to_uppercase())
            .unwrap_or_else(|| employee.preferred_token.clone());
        let id = uuid::Uuid::new_v4().to_string();

        self.chain
            .create_bonus(&id, employee.wallet()?, amount, &token)
            .await?;

        let bonus = Bonus {
            id,
            employee_id: employee.id,
            wallet_address: employee.wallet_address,
            amount: amount.to_string(),
            token,
            reason: request.reason.trim().to_string(),
            status: BonusStatus::Pending,
            tx_hash: None,
            created_at: Utc::now(),
            distributed_at: None,
        };
        self.bonuses.insert(bonus.clone()).await?;
        info!(bonus_id = %bonus.id, amount = %bonus.amount, "Bonus created");
        Ok(bonus)
    }

    pub async fn list_bonuses(&self, params: &ListBonusesParams) -> Result<Vec<Bonus>, AppError> {
        self.bonuses.list(params).await
    }

    pub async fn get_bonus(&self, id: &str) -> Result<Bonus, AppError> {
        self.bonuses
            .get(id)
            .await?
            .ok_or_else(|| AppError::Ledger(LedgerError::BonusNotFound(id.to_string())))
    }

    /// Pay out a pending bonus exactly once
    #[instrument(skip(self))]
    pub async fn distribute_bonus(&self, id: &str) -> Result<Bonus, AppError> {
        let mut bonus = self.get_bonus(id).await?;
        if bonus.status == BonusStatus::Distributed {
            return Err(AppError::Ledger(LedgerError::BonusAlreadyDistributed(
                id.to_string(),
            )));
        }

        let receipt = self.chain.distribute_bonus(id).await?;
        bonus.status = BonusStatus::Distributed;
        bonus.tx_hash = Some(receipt.tx_hash);
        bonus.distributed_at = Some(receipt.paid_at);
        self.bonuses.update(bonus.clone()).await?;
        Ok(bonus)
    }

    // ------------------------------------------------------------------
    // Treasury administration
    // ------------------------------------------------------------------

    pub async fn pause(&self) -> Result<String, AppError> {
        self.chain.pause().await
    }

    pub async fn unpause(&self) -> Result<String, AppError> {
        self.chain.unpause().await
    }

    pub async fn treasury(&self) -> Result<TreasurySnapshot, AppError> {
        self.chain.treasury().await
    }

    #[instrument(skip(self))]
    pub async fn deposit(&self, token: &str, amount: &str) -> Result<TreasuryReceipt, AppError> {
        let amount = parse_positive_amount("amount", amount)?;
        self.chain.deposit(token, amount).await
    }

    #[instrument(skip(self))]
    pub async fn emergency_withdraw(
        &self,
        token: &str,
        amount: &str,
    ) -> Result<TreasuryReceipt, AppError> {
        let amount = parse_positive_amount("amount", amount)?;
        self.chain.emergency_withdraw(token, amount).await
    }

    pub async fn set_token_supported(&self, token: &str, supported: bool) -> Result<String, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::Validation(ValidationError::MissingField(
                "symbol".to_string(),
            )));
        }
        self.chain.set_token_supported(token, supported).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_by_token() {
        let totals = totals_by_token(vec![
            ("USDC", TokenAmount::from_whole(10)),
            ("ETH", "0.5".parse().unwrap()),
            ("USDC", "2.25".parse().unwrap()),
        ]);
        assert_eq!(
            totals,
            vec![
                TokenTotal {
                    token: "ETH".to_string(),
                    amount: "0.5".to_string()
                },
                TokenTotal {
                    token: "USDC".to_string(),
                    amount: "12.25".to_string()
                },
            ]
        );
        assert!(totals_by_token(Vec::new()).is_empty());
    }
}
