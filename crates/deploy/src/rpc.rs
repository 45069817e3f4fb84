//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes, U64, U256};
use anyhow::Context;
use backon::{ConstantBuilder, Retryable};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// Default timeout for RPC requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error from {}: {}",
            method,
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// The subset of a transaction receipt the deployer looks at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `1` on success, `0` on revert.
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status == U64::from(1))
    }
}

/// Typed wrappers over the Ethereum JSON-RPC methods used by a run.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client(DEFAULT_TIMEOUT)?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> anyhow::Result<T> {
        json_rpc_call(&self.client, &self.url, method, params).await
    }

    pub async fn chain_id(&self) -> anyhow::Result<u64> {
        let id: U64 = self.call("eth_chainId", vec![]).await?;
        Ok(id.to())
    }

    pub async fn transaction_count(&self, address: Address) -> anyhow::Result<u64> {
        let count: U64 = self
            .call("eth_getTransactionCount", vec![json!(address), json!("pending")])
            .await?;
        Ok(count.to())
    }

    pub async fn gas_price(&self) -> anyhow::Result<u128> {
        let price: U256 = self.call("eth_gasPrice", vec![]).await?;
        gas_price_from(price)
    }

    pub async fn balance(&self, address: Address) -> anyhow::Result<U256> {
        self.call("eth_getBalance", vec![json!(address), json!("latest")])
            .await
    }

    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &Bytes,
    ) -> anyhow::Result<u64> {
        let gas: U64 = self
            .call(
                "eth_estimateGas",
                vec![json!({ "from": from, "to": to, "value": value, "data": data })],
            )
            .await?;
        Ok(gas.to())
    }

    /// Read-only call against the latest block.
    pub async fn eth_call(&self, to: Address, data: &Bytes) -> anyhow::Result<Bytes> {
        self.call(
            "eth_call",
            vec![json!({ "to": to, "data": data }), json!("latest")],
        )
        .await
    }

    pub async fn send_raw_transaction(&self, raw: &Bytes) -> anyhow::Result<B256> {
        self.call("eth_sendRawTransaction", vec![json!(raw)]).await
    }

    pub async fn receipt(&self, hash: B256) -> anyhow::Result<Option<TransactionReceipt>> {
        self.call("eth_getTransactionReceipt", vec![json!(hash)])
            .await
    }

    /// Poll for the receipt of `hash` every `poll_interval`, giving up after `timeout`.
    pub async fn wait_for_receipt(
        &self,
        hash: B256,
        poll_interval: Duration,
        timeout: Duration,
    ) -> anyhow::Result<TransactionReceipt> {
        let max_times = (timeout.as_millis() / poll_interval.as_millis().max(1)).max(1) as usize;

        (|| async {
            self.receipt(hash)
                .await?
                .with_context(|| format!("Transaction {hash} is not mined yet"))
        })
        .retry(
            ConstantBuilder::default()
                .with_delay(poll_interval)
                .with_max_times(max_times),
        )
        .notify(|err, _| {
            tracing::trace!(tx_hash = %hash, error = %err, "Receipt not available, retrying...");
        })
        .await
        .with_context(|| format!("Timeout waiting for transaction {hash}"))
    }
}

fn gas_price_from(price: U256) -> anyhow::Result<u128> {
    u128::try_from(price).map_err(|_| anyhow::anyhow!("Gas price {price} does not fit in 128 bits"))
}
