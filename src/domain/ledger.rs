//! Payroll ledger state machine.
//!
//! Models the payroll manager contract: an employee registry keyed by
//! wallet, interval-based salary payments funded from a per-token treasury,
//! a bonus ledger, a pause switch and a token whitelist. The ledger is pure
//! state; transport (transaction hashes, locking) lives in
//! `infra::ledger`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::amount::TokenAmount;
use super::error::LedgerError;
use super::schedule::{PaymentFrequency, is_payment_due, next_payment_at};

/// Registry entry for one employee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEmployee {
    pub salary: TokenAmount,
    pub frequency: PaymentFrequency,
    pub token: String,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub active: bool,
}

/// Bonus ledger entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBonus {
    pub wallet: Address,
    pub amount: TokenAmount,
    pub token: String,
    pub distributed: bool,
}

/// Outcome of a successful debit from the treasury
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disbursement {
    pub wallet: Address,
    pub amount: TokenAmount,
    pub token: String,
}

/// Receipt for a ledger transfer to an employee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub tx_hash: String,
    pub wallet: Address,
    pub amount: TokenAmount,
    pub token: String,
    pub paid_at: DateTime<Utc>,
}

/// Receipt for a treasury deposit or withdrawal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TreasuryReceipt {
    pub tx_hash: String,
    #[schema(example = "USDC")]
    pub token: String,
    #[schema(example = "1000")]
    pub amount: String,
    /// Balance after the operation
    #[schema(example = "251000")]
    pub balance: String,
}

/// Per-token treasury view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TreasuryBalance {
    #[schema(example = "USDC")]
    pub token: String,
    #[schema(example = "250000")]
    pub balance: String,
    pub supported: bool,
}

/// Snapshot of the ledger returned by the admin API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TreasurySnapshot {
    pub paused: bool,
    pub balances: Vec<TreasuryBalance>,
    pub registered_employees: usize,
    pub active_employees: usize,
    pub pending_bonuses: usize,
}

/// In-memory model of the payroll manager contract
#[derive(Debug, Clone, Default)]
pub struct PayrollLedger {
    paused: bool,
    supported_tokens: BTreeSet<String>,
    balances: BTreeMap<String, TokenAmount>,
    employees: HashMap<Address, LedgerEmployee>,
    bonuses: HashMap<String, LedgerBonus>,
}

/// Token symbols are compared upper-case
pub fn normalize_token(token: &str) -> String {
    token.trim().to_uppercase()
}

impl PayrollLedger {
    #[must_use]
    pub fn new<I, S>(supported_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            supported_tokens: supported_tokens
                .into_iter()
                .map(|t| normalize_token(t.as_ref()))
                .collect(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn is_token_supported(&self, token: &str) -> bool {
        self.supported_tokens.contains(&normalize_token(token))
    }

    #[must_use]
    pub fn employee(&self, wallet: &Address) -> Option<&LedgerEmployee> {
        self.employees.get(wallet)
    }

    #[must_use]
    pub fn bonus(&self, id: &str) -> Option<&LedgerBonus> {
        self.bonuses.get(id)
    }

    #[must_use]
    pub fn balance(&self, token: &str) -> TokenAmount {
        self.balances
            .get(&normalize_token(token))
            .copied()
            .unwrap_or_default()
    }

    fn ensure_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    fn ensure_token(&self, token: &str) -> Result<String, LedgerError> {
        let token = normalize_token(token);
        if !self.supported_tokens.contains(&token) {
            return Err(LedgerError::TokenNotSupported(token));
        }
        Ok(token)
    }

    fn debit(&mut self, token: &str, amount: TokenAmount) -> Result<(), LedgerError> {
        let available = self.balance(token);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    token: token.to_string(),
                    required: amount.to_string(),
                    available: available.to_string(),
                })?;
        self.balances.insert(token.to_string(), remaining);
        Ok(())
    }

    /// Register a new employee.
    pub fn add_employee(
        &mut self,
        wallet: Address,
        salary: TokenAmount,
        frequency: PaymentFrequency,
        token: &str,
    ) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        if salary.is_zero() {
            return Err(LedgerError::ZeroSalary);
        }
        let token = self.ensure_token(token)?;
        if self.employees.get(&wallet).is_some_and(|e| e.active) {
            return Err(LedgerError::EmployeeExists(wallet.to_checksum(None)));
        }

        // A previously removed wallet is re-registered with its payment history kept.
        let last_payment_at = self
            .employees
            .get(&wallet)
            .and_then(|e| e.last_payment_at);
        self.employees.insert(
            wallet,
            LedgerEmployee {
                salary,
                frequency,
                token,
                last_payment_at,
                active: true,
            },
        );
        Ok(())
    }

    /// Change salary, frequency or token of an active employee.
    pub fn update_employee(
        &mut self,
        wallet: Address,
        salary: TokenAmount,
        frequency: PaymentFrequency,
        token: &str,
    ) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        if salary.is_zero() {
            return Err(LedgerError::ZeroSalary);
        }
        let token = self.ensure_token(token)?;
        let employee = self.active_employee_mut(&wallet)?;
        employee.salary = salary;
        employee.frequency = frequency;
        employee.token = token;
        Ok(())
    }

    /// Deactivate an employee; the registry entry is kept for history.
    pub fn remove_employee(&mut self, wallet: Address) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        let employee = self.active_employee_mut(&wallet)?;
        employee.active = false;
        Ok(())
    }

    fn active_employee_mut(&mut self, wallet: &Address) -> Result<&mut LedgerEmployee, LedgerError> {
        let employee = self
            .employees
            .get_mut(wallet)
            .ok_or_else(|| LedgerError::EmployeeNotFound(wallet.to_checksum(None)))?;
        if !employee.active {
            return Err(LedgerError::EmployeeInactive(wallet.to_checksum(None)));
        }
        Ok(employee)
    }

    /// Pay one salary period if due and funded.
    pub fn process_payment(
        &mut self,
        wallet: Address,
        now: DateTime<Utc>,
    ) -> Result<Disbursement, LedgerError> {
        self.ensure_not_paused()?;
        let employee = self
            .employees
            .get(&wallet)
            .ok_or_else(|| LedgerError::EmployeeNotFound(wallet.to_checksum(None)))?;
        if !employee.active {
            return Err(LedgerError::EmployeeInactive(wallet.to_checksum(None)));
        }
        if !is_payment_due(employee.last_payment_at, employee.frequency, now) {
            return Err(LedgerError::PaymentNotDue {
                wallet: wallet.to_checksum(None),
                next_due: next_payment_at(employee.last_payment_at, employee.frequency, now)
                    .to_rfc3339(),
            });
        }

        let amount = employee.salary;
        let token = employee.token.clone();
        self.debit(&token, amount)?;

        if let Some(employee) = self.employees.get_mut(&wallet) {
            employee.last_payment_at = Some(now);
        }

        Ok(Disbursement {
            wallet,
            amount,
            token,
        })
    }

    /// Refund a salary payment and restore the employee's previous payment
    /// stamp. Allowed while paused.
    pub fn reverse_payment(
        &mut self,
        wallet: Address,
        amount: TokenAmount,
        token: &str,
        previous_payment_at: Option<DateTime<Utc>>,
    ) -> Result<TokenAmount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let token = normalize_token(token);
        let employee = self
            .employees
            .get_mut(&wallet)
            .ok_or_else(|| LedgerError::EmployeeNotFound(wallet.to_checksum(None)))?;
        employee.last_payment_at = previous_payment_at;

        let balance = self
            .balance(&token)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances.insert(token, balance);
        Ok(balance)
    }

    /// Record a bonus owed to an active employee.
    pub fn create_bonus(
        &mut self,
        id: &str,
        wallet: Address,
        amount: TokenAmount,
        token: &str,
    ) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let token = self.ensure_token(token)?;
        self.active_employee_mut(&wallet)?;
        if self.bonuses.contains_key(id) {
            return Err(LedgerError::BonusExists(id.to_string()));
        }
        self.bonuses.insert(
            id.to_string(),
            LedgerBonus {
                wallet,
                amount,
                token,
                distributed: false,
            },
        );
        Ok(())
    }

    /// Pay out a bonus. A bonus can only be distributed once.
    pub fn distribute_bonus(&mut self, id: &str) -> Result<Disbursement, LedgerError> {
        self.ensure_not_paused()?;
        let bonus = self
            .bonuses
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::BonusNotFound(id.to_string()))?;
        if bonus.distributed {
            return Err(LedgerError::BonusAlreadyDistributed(id.to_string()));
        }

        self.debit(&bonus.token, bonus.amount)?;
        if let Some(entry) = self.bonuses.get_mut(id) {
            entry.distributed = true;
        }

        Ok(Disbursement {
            wallet: bonus.wallet,
            amount: bonus.amount,
            token: bonus.token,
        })
    }

    pub fn pause(&mut self) -> Result<(), LedgerError> {
        self.ensure_not_paused()?;
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    /// Fund the treasury. Deposits are accepted while paused.
    pub fn deposit(&mut self, token: &str, amount: TokenAmount) -> Result<TokenAmount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let token = self.ensure_token(token)?;
        let balance = self
            .balance(&token)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances.insert(token, balance);
        Ok(balance)
    }

    /// Drain funds while the ledger is paused.
    pub fn emergency_withdraw(
        &mut self,
        token: &str,
        amount: TokenAmount,
    ) -> Result<TokenAmount, LedgerError> {
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let token = normalize_token(token);
        self.debit(&token, amount)?;
        Ok(self.balance(&token))
    }

    /// Add or remove a token from the whitelist. Balances are left untouched.
    pub fn set_token_supported(&mut self, token: &str, supported: bool) {
        let token = normalize_token(token);
        if supported {
            self.supported_tokens.insert(token);
        } else {
            self.supported_tokens.remove(&token);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TreasurySnapshot {
        let tokens: BTreeSet<&String> = self
            .supported_tokens
            .iter()
            .chain(self.balances.keys())
            .collect();
        let balances = tokens
            .into_iter()
            .map(|token| TreasuryBalance {
                token: token.clone(),
                balance: self.balance(token).to_string(),
                supported: self.supported_tokens.contains(token),
            })
            .collect();

        TreasurySnapshot {
            paused: self.paused,
            balances,
            registered_employees: self.employees.len(),
            active_employees: self.employees.values().filter(|e| e.active).count(),
            pending_bonuses: self.bonuses.values().filter(|b| !b.distributed).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use chrono::Duration;

    const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
    const BOB: Address = address!("0x2222222222222222222222222222222222222222");

    fn funded_ledger() -> PayrollLedger {
        let mut ledger = PayrollLedger::new(["ETH", "usdc"]);
        ledger.deposit("USDC", TokenAmount::from_whole(10_000)).unwrap();
        ledger
    }

    fn usdc(v: u64) -> TokenAmount {
        TokenAmount::from_whole(v)
    }

    #[test]
    fn test_add_employee_with_zero_salary_reverts() {
        let mut ledger = funded_ledger();
        let result = ledger.add_employee(ALICE, TokenAmount::ZERO, PaymentFrequency::Monthly, "USDC");
        assert_eq!(result, Err(LedgerError::ZeroSalary));
        assert!(ledger.employee(&ALICE).is_none());
    }

    #[test]
    fn test_add_employee_rejects_unsupported_token_and_duplicates() {
        let mut ledger = funded_ledger();
        assert_eq!(
            ledger.add_employee(ALICE, usdc(100), PaymentFrequency::Monthly, "DOGE"),
            Err(LedgerError::TokenNotSupported("DOGE".to_string()))
        );
        ledger
            .add_employee(ALICE, usdc(100), PaymentFrequency::Monthly, "usdc")
            .unwrap();
        assert!(matches!(
            ledger.add_employee(ALICE, usdc(100), PaymentFrequency::Monthly, "USDC"),
            Err(LedgerError::EmployeeExists(_))
        ));
        assert_eq!(ledger.employee(&ALICE).unwrap().token, "USDC");
    }

    #[test]
    fn test_removed_employee_can_be_re_added() {
        let mut ledger = funded_ledger();
        let now = Utc::now();
        ledger
            .add_employee(ALICE, usdc(100), PaymentFrequency::Weekly, "USDC")
            .unwrap();
        ledger.process_payment(ALICE, now).unwrap();
        ledger.remove_employee(ALICE).unwrap();
        assert!(matches!(
            ledger.process_payment(ALICE, now + Duration::days(8)),
            Err(LedgerError::EmployeeInactive(_))
        ));

        ledger
            .add_employee(ALICE, usdc(200), PaymentFrequency::Weekly, "USDC")
            .unwrap();
        let employee = ledger.employee(&ALICE).unwrap();
        assert!(employee.active);
        assert_eq!(employee.last_payment_at, Some(now));
    }

    #[test]
    fn test_process_payment_respects_interval() {
        let mut ledger = funded_ledger();
        let now = Utc::now();
        ledger
            .add_employee(ALICE, usdc(1_000), PaymentFrequency::Weekly, "USDC")
            .unwrap();

        let paid = ledger.process_payment(ALICE, now).unwrap();
        assert_eq!(paid.amount, usdc(1_000));
        assert_eq!(paid.token, "USDC");
        assert_eq!(ledger.balance("USDC"), usdc(9_000));

        assert!(matches!(
            ledger.process_payment(ALICE, now + Duration::days(6)),
            Err(LedgerError::PaymentNotDue { .. })
        ));
        assert!(ledger.process_payment(ALICE, now + Duration::days(7)).is_ok());
        assert_eq!(ledger.balance("USDC"), usdc(8_000));
    }

    #[test]
    fn test_reverse_payment_refunds_and_restores_schedule() {
        let mut ledger = funded_ledger();
        let first = Utc::now() - Duration::days(8);
        let now = Utc::now();
        ledger
            .add_employee(ALICE, usdc(1_000), PaymentFrequency::Weekly, "USDC")
            .unwrap();
        ledger.process_payment(ALICE, first).unwrap();

        let paid = ledger.process_payment(ALICE, now).unwrap();
        assert_eq!(ledger.balance("USDC"), usdc(8_000));

        ledger.pause().unwrap();
        let balance = ledger
            .reverse_payment(ALICE, paid.amount, &paid.token, Some(first))
            .unwrap();
        assert_eq!(balance, usdc(9_000));
        assert_eq!(ledger.employee(&ALICE).unwrap().last_payment_at, Some(first));

        ledger.unpause().unwrap();
        assert!(ledger.process_payment(ALICE, now).is_ok());
    }

    #[test]
    fn test_reverse_payment_requires_known_wallet() {
        let mut ledger = funded_ledger();
        assert!(matches!(
            ledger.reverse_payment(BOB, usdc(1), "USDC", None),
            Err(LedgerError::EmployeeNotFound(_))
        ));
        assert_eq!(ledger.balance("USDC"), usdc(10_000));
    }

    #[test]
    fn test_process_payment_insufficient_balance() {
        let mut ledger = funded_ledger();
        ledger
            .add_employee(ALICE, usdc(20_000), PaymentFrequency::Monthly, "USDC")
            .unwrap();

        let result = ledger.process_payment(ALICE, Utc::now());
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                token: "USDC".to_string(),
                required: "20000".to_string(),
                available: "10000".to_string(),
            })
        );
        assert!(ledger.employee(&ALICE).unwrap().last_payment_at.is_none());
    }

    #[test]
    fn test_process_payment_requires_registered_employee() {
        let mut ledger = funded_ledger();
        assert!(matches!(
            ledger.process_payment(BOB, Utc::now()),
            Err(LedgerError::EmployeeNotFound(_))
        ));
    }

    #[test]
    fn test_bonus_cannot_be_distributed_twice() {
        let mut ledger = funded_ledger();
        ledger
            .add_employee(ALICE, usdc(100), PaymentFrequency::Monthly, "USDC")
            .unwrap();
        ledger.create_bonus("b1", ALICE, usdc(50), "USDC").unwrap();

        let paid = ledger.distribute_bonus("b1").unwrap();
        assert_eq!(paid.amount, usdc(50));
        assert_eq!(
            ledger.distribute_bonus("b1"),
            Err(LedgerError::BonusAlreadyDistributed("b1".to_string()))
        );
        assert_eq!(ledger.balance("USDC"), usdc(9_950));
    }

    #[test]
    fn test_bonus_guards() {
        let mut ledger = funded_ledger();
        assert!(matches!(
            ledger.create_bonus("b1", BOB, usdc(1), "USDC"),
            Err(LedgerError::EmployeeNotFound(_))
        ));
        ledger
            .add_employee(BOB, usdc(100), PaymentFrequency::Monthly, "USDC")
            .unwrap();
        assert_eq!(
            ledger.create_bonus("b1", BOB, TokenAmount::ZERO, "USDC"),
            Err(LedgerError::ZeroAmount)
        );
        ledger.create_bonus("b1", BOB, usdc(1), "USDC").unwrap();
        assert_eq!(
            ledger.create_bonus("b1", BOB, usdc(1), "USDC"),
            Err(LedgerError::BonusExists("b1".to_string()))
        );
        assert_eq!(
            ledger.distribute_bonus("missing"),
            Err(LedgerError::BonusNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_pause_blocks_mutation() {
        let mut ledger = funded_ledger();
        ledger
            .add_employee(ALICE, usdc(100), PaymentFrequency::Monthly, "USDC")
            .unwrap();
        ledger.create_bonus("b1", ALICE, usdc(5), "USDC").unwrap();
        ledger.pause().unwrap();

        assert_eq!(ledger.pause(), Err(LedgerError::Paused));
        assert_eq!(
            ledger.add_employee(BOB, usdc(100), PaymentFrequency::Monthly, "USDC"),
            Err(LedgerError::Paused)
        );
        assert_eq!(
            ledger.update_employee(ALICE, usdc(200), PaymentFrequency::Monthly, "USDC"),
            Err(LedgerError::Paused)
        );
        assert_eq!(ledger.remove_employee(ALICE), Err(LedgerError::Paused));
        assert!(matches!(
            ledger.process_payment(ALICE, Utc::now()),
            Err(LedgerError::Paused)
        ));
        assert_eq!(ledger.distribute_bonus("b1"), Err(LedgerError::Paused));

        ledger.unpause().unwrap();
        assert_eq!(ledger.unpause(), Err(LedgerError::NotPaused));
        assert!(ledger.process_payment(ALICE, Utc::now()).is_ok());
    }

    #[test]
    fn test_emergency_withdraw_only_when_paused() {
        let mut ledger = funded_ledger();
        assert_eq!(
            ledger.emergency_withdraw("USDC", usdc(1)),
            Err(LedgerError::NotPaused)
        );
        ledger.pause().unwrap();
        assert_eq!(ledger.emergency_withdraw("USDC", usdc(4_000)).unwrap(), usdc(6_000));
        assert!(matches!(
            ledger.emergency_withdraw("USDC", usdc(7_000)),
            Err(LedgerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_token_whitelist_and_snapshot() {
        let mut ledger = funded_ledger();
        ledger.set_token_supported("usdc", false);
        assert!(!ledger.is_token_supported("USDC"));
        assert!(matches!(
            ledger.deposit("USDC", usdc(1)),
            Err(LedgerError::TokenNotSupported(_))
        ));

        let snapshot = ledger.snapshot();
        let usdc_row = snapshot
            .balances
            .iter()
            .find(|b| b.token == "USDC")
            .unwrap();
        assert!(!usdc_row.supported);
        assert_eq!(usdc_row.balance, "10000");
        assert!(snapshot.balances.iter().any(|b| b.token == "ETH" && b.supported));
    }
}
