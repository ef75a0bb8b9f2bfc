//! Chain provider capability and its JSON-RPC reference implementation.

use std::future::Future;
use std::time::{Duration, Instant};

use alloy_core::primitives::{Address, B256, Bytes};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::DeployConfig;

/// Default timeout for individual RPC requests.
const RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors produced by a chain provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("no receipt for transaction {0} within {1:?}")]
    ReceiptTimeout(B256, Duration),
}

/// A transaction in the `eth_sendTransaction` wire shape.
///
/// Transactions are signed node-side by the account named in `from`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    /// Absent for contract-creation transactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Gas limit; omitted to let the node estimate.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_u64_as_hex"
    )]
    pub gas: Option<u64>,
}

/// A log emitted by a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Chain-confirmed outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    pub transaction_hash: B256,
    /// Standard contract-creation field. Absent for plain calls, and not
    /// the created address when a contract deployed on the signer's behalf.
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub block_number: u64,
    #[serde(deserialize_with = "deserialize_bool_from_hex")]
    pub status: bool,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl DeploymentReceipt {
    /// Whether the transaction executed without reverting.
    pub fn succeeded(&self) -> bool {
        self.status
    }
}

/// Serialize a u64 as a 0x-prefixed hex quantity.
fn serialize_u64_as_hex<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(value) => serializer.serialize_str(&format!("0x{value:x}")),
        None => serializer.serialize_none(),
    }
}

/// Deserialize a u64 from a hex string (with 0x prefix).
fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(serde::de::Error::custom)
}

/// Deserialize a receipt status flag from its hex quantity ("0x1"/"0x0").
fn deserialize_bool_from_hex<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    let value =
        u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(serde::de::Error::custom)?;
    Ok(value != 0)
}

/// Chain read/submit capability consumed by the deployment pipelines.
pub trait ChainProvider: Send + Sync + 'static {
    /// Fetch the deployed bytecode at `address` (`eth_getCode`).
    fn get_bytecode(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<Bytes, ProviderError>> + Send;

    /// Submit a transaction and return its hash.
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<B256, ProviderError>> + Send;

    /// Await the receipt of a submitted transaction.
    fn wait_for_receipt(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<DeploymentReceipt, ProviderError>> + Send;
}

/// JSON-RPC chain provider over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChainProvider {
    client: reqwest::Client,
    endpoint: Url,
    poll_interval: Duration,
    receipt_timeout: Option<Duration>,
}

impl HttpChainProvider {
    pub fn new(endpoint: Url, config: &DeployConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(RPC_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            poll_interval: config.receipt_poll_interval(),
            receipt_timeout: config.receipt_timeout(),
        })
    }

    /// Make a JSON-RPC call and deserialize the result.
    async fn rpc_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("failed to send {method} request: {e}")))?;

        let result: Value = response.json().await.map_err(|e| {
            ProviderError::Transport(format!("failed to parse {method} response: {e}"))
        })?;

        if let Some(error) = result.get("error") {
            return Err(ProviderError::Rpc(
                error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
            ));
        }

        let value = result
            .get("result")
            .cloned()
            .ok_or_else(|| ProviderError::Rpc(format!("no result in {method} response")))?;

        serde_json::from_value(value)
            .map_err(|e| ProviderError::Rpc(format!("failed to deserialize {method} result: {e}")))
    }
}

impl ChainProvider for HttpChainProvider {
    async fn get_bytecode(&self, address: Address) -> Result<Bytes, ProviderError> {
        self.rpc_call(
            "eth_getCode",
            vec![serde_json::json!(address), serde_json::json!("latest")],
        )
        .await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ProviderError> {
        self.rpc_call("eth_sendTransaction", vec![serde_json::json!(tx)])
            .await
    }

    /// Poll for the receipt until it lands or the configured deadline
    /// passes. Individual query failures are retried, not surfaced.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<DeploymentReceipt, ProviderError> {
        let start = Instant::now();

        loop {
            match self
                .rpc_call::<Option<DeploymentReceipt>>(
                    "eth_getTransactionReceipt",
                    vec![serde_json::json!(tx_hash)],
                )
                .await
            {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {
                    tracing::trace!(tx_hash = %tx_hash, "Receipt not available yet, retrying...");
                }
                Err(e) => {
                    tracing::trace!(error = %e, tx_hash = %tx_hash, "Receipt query failed, retrying...");
                }
            }

            if let Some(timeout) = self.receipt_timeout
                && start.elapsed() > timeout
            {
                return Err(ProviderError::ReceiptTimeout(tx_hash, timeout));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
