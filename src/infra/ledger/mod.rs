//! Payroll ledger client.
//!
//! [`SimulatedChainClient`] runs the [`PayrollLedger`] state machine in
//! process and stamps every accepted mutation with a pseudo transaction
//! hash, the way a contract call would return one.

use std::sync::{Mutex, MutexGuard};

use alloy_primitives::{Address, keccak256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::domain::{
    AppError, ConfigError, LedgerEmployee, PaymentFrequency, PaymentReceipt, PayrollChain,
    PayrollLedger, TokenAmount, TreasuryReceipt, TreasurySnapshot,
};

/// Tokens whitelisted when `SUPPORTED_TOKENS` is not set
pub const DEFAULT_SUPPORTED_TOKENS: &[&str] = &["ETH", "USDC", "USDT", "DAI"];

/// Parse `SYMBOL:AMOUNT` pairs separated by commas, e.g. `ETH:100,USDC:250000`.
pub fn parse_treasury_seed(value: &str) -> Result<Vec<(String, TokenAmount)>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (token, amount) = pair.split_once(':').ok_or_else(|| ConfigError::InvalidValue {
                key: "TREASURY_SEED".to_string(),
                message: format!("expected SYMBOL:AMOUNT, got '{}'", pair),
            })?;
            let amount = amount
                .trim()
                .parse::<TokenAmount>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "TREASURY_SEED".to_string(),
                    message: format!("{}: {}", token.trim(), e),
                })?;
            Ok((token.trim().to_uppercase(), amount))
        })
        .collect()
}

/// Parse a comma separated token list
pub fn parse_token_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// `0x`-prefixed pseudo transaction hash
fn tx_hash() -> String {
    let entropy: [u8; 32] = rand::random();
    format!("0x{}", hex::encode(keccak256(entropy).as_slice()))
}

/// In-process payroll ledger
#[derive(Debug)]
pub struct SimulatedChainClient {
    ledger: Mutex<PayrollLedger>,
}

impl SimulatedChainClient {
    /// Create a ledger with the given whitelist and opening balances
    pub fn new<S: AsRef<str>>(
        supported_tokens: &[S],
        seed: &[(String, TokenAmount)],
    ) -> Result<Self, AppError> {
        let mut ledger = PayrollLedger::new(supported_tokens.iter().map(|t| t.as_ref()));
        for (token, amount) in seed {
            if amount.is_zero() {
                continue;
            }
            ledger.deposit(token, *amount)?;
        }

        let snapshot = ledger.snapshot();
        info!(
            tokens = snapshot.balances.len(),
            "Simulated payroll ledger initialized"
        );

        Ok(Self {
            ledger: Mutex::new(ledger),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, PayrollLedger>, AppError> {
        self.ledger
            .lock()
            .map_err(|_| AppError::Internal("payroll ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl PayrollChain for SimulatedChainClient {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn is_paused(&self) -> Result<bool, AppError> {
        Ok(self.lock()?.is_paused())
    }

    async fn employee(&self, wallet: Address) -> Result<Option<LedgerEmployee>, AppError> {
        Ok(self.lock()?.employee(&wallet).cloned())
    }

    #[instrument(skip(self), fields(wallet = %wallet))]
    async fn register_employee(
        &self,
        wallet: Address,
        salary: TokenAmount,
        frequency: PaymentFrequency,
        token: &str,
    ) -> Result<String, AppError> {
        self.lock()?.add_employee(wallet, salary, frequency, token)?;
        let hash = tx_hash();
        info!(tx_hash = %hash, "Employee registered on ledger");
        Ok(hash)
    }

    #[instrument(skip(self), fields(wallet = %wallet))]
    async fn update_employee(
        &self,
        wallet: Address,
        salary: TokenAmount,
        frequency: PaymentFrequency,
        token: &str,
    ) -> Result<String, AppError> {
        self.lock()?.update_employee(wallet, salary, frequency, token)?;
        Ok(tx_hash())
    }

    #[instrument(skip(self), fields(wallet = %wallet))]
    async fn remove_employee(&self, wallet: Address) -> Result<String, AppError> {
        self.lock()?.remove_employee(wallet)?;
        let hash = tx_hash();
        info!(tx_hash = %hash, "Employee removed from ledger");
        Ok(hash)
    }

    #[instrument(skip(self), fields(wallet = %wallet))]
    async fn process_payment(
        &self,
        wallet: Address,
        now: DateTime<Utc>,
    ) -> Result<PaymentReceipt, AppError> {
        let paid = self.lock()?.process_payment(wallet, now)?;
        let receipt = PaymentReceipt {
            tx_hash: tx_hash(),
            wallet: paid.wallet,
            amount: paid.amount,
            token: paid.token,
            paid_at: now,
        };
        info!(
            tx_hash = %receipt.tx_hash,
            amount = %receipt.amount,
            token = %receipt.token,
            "Salary paid"
        );
        Ok(receipt)
    }

    #[instrument(skip(self, receipt), fields(wallet = %receipt.wallet, paid_tx = %receipt.tx_hash))]
    async fn reverse_payment(
        &self,
        receipt: &PaymentReceipt,
        previous_payment_at: Option<DateTime<Utc>>,
    ) -> Result<String, AppError> {
        self.lock()?.reverse_payment(
            receipt.wallet,
            receipt.amount,
            &receipt.token,
            previous_payment_at,
        )?;
        let hash = tx_hash();
        warn!(tx_hash = %hash, amount = %receipt.amount, "Salary payment reversed");
        Ok(hash)
    }

    #[instrument(skip(self), fields(wallet = %wallet))]
    async fn create_bonus(
        &self,
        id: &str,
        wallet: Address,
        amount: TokenAmount,
        token: &str,
    ) -> Result<String, AppError> {
        self.lock()?.create_bonus(id, wallet, amount, token)?;
        Ok(tx_hash())
    }

    #[instrument(skip(self))]
    async fn distribute_bonus(&self, id: &str) -> Result<PaymentReceipt, AppError> {
        let paid = self.lock()?.distribute_bonus(id)?;
        let receipt = PaymentReceipt {
            tx_hash: tx_hash(),
            wallet: paid.wallet,
            amount: paid.amount,
            token: paid.token,
            paid_at: Utc::now(),
        };
        info!(tx_hash = %receipt.tx_hash, amount = %receipt.amount, "Bonus distributed");
        Ok(receipt)
    }

    async fn pause(&self) -> Result<String, AppError> {
        self.lock()?.pause()?;
        warn!("Payroll ledger paused");
        Ok(tx_hash())
    }

    async fn unpause(&self) -> Result<String, AppError> {
        self.lock()?.unpause()?;
        info!("Payroll ledger unpaused");
        Ok(tx_hash())
    }

    #[instrument(skip(self))]
    async fn deposit(&self, token: &str, amount: TokenAmount) -> Result<TreasuryReceipt, AppError> {
        let balance = self.lock()?.deposit(token, amount)?;
        Ok(TreasuryReceipt {
            tx_hash: tx_hash(),
            token: token.to_uppercase(),
            amount: amount.to_string(),
            balance: balance.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn emergency_withdraw(
        &self,
        token: &str,
        amount: TokenAmount,
    ) -> Result<TreasuryReceipt, AppError> {
        let balance = self.lock()?.emergency_withdraw(token, amount)?;
        warn!(token = %token, amount = %amount, "Emergency withdrawal executed");
        Ok(TreasuryReceipt {
            tx_hash: tx_hash(),
            token: token.to_uppercase(),
            amount: amount.to_string(),
            balance: balance.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn set_token_supported(&self, token: &str, supported: bool) -> Result<String, AppError> {
        self.lock()?.set_token_supported(token, supported);
        info!(token = %token, supported, "Token whitelist updated");
        Ok(tx_hash())
    }

    async fn treasury(&self) -> Result<TreasurySnapshot, AppError> {
        Ok(self.lock()?.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LedgerError;
    use alloy_primitives::address;

    const ALICE: Address = address!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

    #[test]
    fn test_parse_treasury_seed() {
        let seed = parse_treasury_seed("eth:100, USDC:250000.5,").unwrap();
        assert_eq!(
            seed,
            vec![
                ("ETH".to_string(), TokenAmount::from_whole(100)),
                ("USDC".to_string(), "250000.5".parse().unwrap()),
            ]
        );
        assert!(parse_treasury_seed("ETH100").is_err());
        assert!(parse_treasury_seed("ETH:lots").is_err());
        assert!(parse_treasury_seed("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_token_list() {
        assert_eq!(parse_token_list("eth, usdc,,dai"), vec!["ETH", "USDC", "DAI"]);
    }

    #[tokio::test]
    async fn test_payment_returns_receipt_with_hash() {
        let client = SimulatedChainClient::new(
            DEFAULT_SUPPORTED_TOKENS,
            &[("USDC".to_string(), TokenAmount::from_whole(5_000))],
        )
        .unwrap();
        client
            .register_employee(
                ALICE,
                TokenAmount::from_whole(1_000),
                PaymentFrequency::Monthly,
                "USDC",
            )
            .await
            .unwrap();

        let receipt = client.process_payment(ALICE, Utc::now()).await.unwrap();
        assert!(receipt.tx_hash.starts_with("0x"));
        assert_eq!(receipt.tx_hash.len(), 66);
        assert_eq!(receipt.amount, TokenAmount::from_whole(1_000));

        let snapshot = client.treasury().await.unwrap();
        let usdc = snapshot.balances.iter().find(|b| b.token == "USDC").unwrap();
        assert_eq!(usdc.balance, "4000");
    }

    #[tokio::test]
    async fn test_ledger_errors_surface_as_app_errors() {
        let client = SimulatedChainClient::new(DEFAULT_SUPPORTED_TOKENS, &[]).unwrap();
        client.pause().await.unwrap();
        let err = client.pause().await.unwrap_err();
        assert!(matches!(err, AppError::Ledger(LedgerError::Paused)));

        let err = client
            .emergency_withdraw("USDC", TokenAmount::from_whole(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Ledger(LedgerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_seed_with_unsupported_token_fails() {
        let result = SimulatedChainClient::new(
            &["ETH"][..],
            &[("DOGE".to_string(), TokenAmount::from_whole(1))],
        );
        assert!(result.is_err());
    }
}
