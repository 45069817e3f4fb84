//! Networks: the registry, the [`Chain`] seam and its JSON-RPC implementation.

use std::{collections::BTreeMap, future::Future, time::Duration};

use alloy_core::{
    primitives::{Address, B256, Bytes, U256},
    sol,
    sol_types::SolCall,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::{
    DeployError,
    rpc::RpcClient,
    symbols::Roles,
    wallet::{LegacyTransaction, LocalWallet},
};

sol! {
    interface IImmutableCreate2Factory {
        function safeCreate2(bytes32 salt, bytes initializationCode) external payable returns (address deploymentAddress);
    }

    interface IRoot {
        function currentNonce() external view returns (uint256);
        function execute(address target, bytes data, bytes signature) external;
    }
}

/// One ether in wei.
pub const ETHER: u128 = 1_000_000_000_000_000_000;

/// Deployer balance below which an ephemeral network tops it up.
pub const TOP_UP_THRESHOLD: u128 = ETHER / 2;

/// Balance an ephemeral network's deployer is topped up to.
pub const TOP_UP_TARGET: u128 = ETHER;

/// Extra gas over the node's estimate, in percent.
const GAS_MARGIN_PERCENT: u64 = 20;

const fn default_confirmation_timeout_secs() -> u64 {
    300
}

const fn default_poll_interval_secs() -> u64 {
    2
}

/// Execution environment of a network.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProtocolType {
    #[default]
    Evm,
}

/// Registry entry for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(rename = "type", default)]
    pub protocol: ProtocolType,
    pub rpc: Url,
    pub chain_id: u64,
    /// Local development chain whose state does not outlive the node.
    #[serde(default)]
    pub ephemeral: bool,
    /// Overrides the workspace-wide factory address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl NetworkConfig {
    pub fn new(rpc: Url, chain_id: u64) -> Self {
        Self {
            protocol: ProtocolType::Evm,
            rpc,
            chain_id,
            ephemeral: false,
            factory: None,
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Known networks by name.
pub type NetworkRegistry = BTreeMap<String, NetworkConfig>;

/// Look up `name` in `registry`.
pub fn lookup<'a>(registry: &'a NetworkRegistry, name: &str) -> Result<&'a NetworkConfig, DeployError> {
    registry
        .get(name)
        .ok_or_else(|| DeployError::UnknownNetwork(name.to_string()))
}

/// The on-chain operations a run needs.
///
/// Every method resolves once the transaction is confirmed and returns its hash.
pub trait Chain {
    /// Deploy `init_code` through the CREATE2 factory with `salt`.
    fn deploy(&self, salt: B256, init_code: &Bytes) -> impl Future<Output = Result<B256>> + Send;

    /// Current nonce of the root contract at `root`.
    fn root_nonce(&self, root: Address) -> impl Future<Output = Result<U256>> + Send;

    /// Run `call_data` on `target` through the root contract with an owner signature.
    fn execute(
        &self,
        root: Address,
        target: Address,
        call_data: &Bytes,
        signature: &Bytes,
    ) -> impl Future<Output = Result<B256>> + Send;
}

/// A [`Chain`] reached over JSON-RPC, signing with a local deployer key.
#[derive(Debug, Clone)]
pub struct JsonRpcChain {
    rpc: RpcClient,
    chain_id: u64,
    factory: Address,
    deployer: LocalWallet,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl JsonRpcChain {
    /// Connect to `network` and check that the endpoint serves the declared chain.
    pub async fn connect(
        network: &str,
        config: &NetworkConfig,
        factory: Address,
        deployer: LocalWallet,
    ) -> Result<Self> {
        let rpc = RpcClient::new(config.rpc.as_str())?;
        let actual = rpc
            .chain_id()
            .await
            .with_context(|| format!("Failed to reach {} at {}", network, config.rpc))?;

        if actual != config.chain_id {
            return Err(DeployError::ChainIdMismatch {
                network: network.to_string(),
                expected: config.chain_id,
                actual,
            }
            .into());
        }

        tracing::info!(
            network,
            chain_id = actual,
            deployer = %deployer.address(),
            "Connected to network"
        );

        Ok(Self {
            rpc,
            chain_id: actual,
            factory: config.factory.unwrap_or(factory),
            deployer,
            poll_interval: config.poll_interval(),
            confirmation_timeout: config.confirmation_timeout(),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn deployer(&self) -> Address {
        self.deployer.address()
    }

    /// Sign and submit a transaction from `from`, then wait for a successful receipt.
    async fn send(&self, from: &LocalWallet, to: Address, value: U256, data: Bytes) -> Result<B256> {
        let nonce = self.rpc.transaction_count(from.address()).await?;
        let gas_price = self.rpc.gas_price().await?;
        let estimate = self
            .rpc
            .estimate_gas(from.address(), to, value, &data)
            .await
            .context("Failed to estimate gas, the transaction would likely revert")?;

        let tx = LegacyTransaction {
            chain_id: self.chain_id,
            nonce,
            gas_price,
            gas_limit: estimate + estimate * GAS_MARGIN_PERCENT / 100,
            to,
            value,
            data,
        };
        let raw = from.sign_transaction(&tx)?;
        let hash = self.rpc.send_raw_transaction(&raw).await?;

        tracing::debug!(tx_hash = %hash, to = %to, nonce, "Transaction submitted");

        let receipt = self
            .rpc
            .wait_for_receipt(hash, self.poll_interval, self.confirmation_timeout)
            .await?;
        if !receipt.succeeded() {
            return Err(DeployError::TransactionReverted { hash }.into());
        }

        Ok(receipt.transaction_hash)
    }

    /// Bring the deployer's balance up to `target` from `funder` when it is below `threshold`.
    pub async fn ensure_funded(&self, funder: &LocalWallet, threshold: U256, target: U256) -> Result<()> {
        let balance = self.rpc.balance(self.deployer.address()).await?;
        if balance >= threshold {
            return Ok(());
        }

        let amount = target - balance;
        tracing::info!(
            deployer = %self.deployer.address(),
            funder = %funder.address(),
            balance = %balance,
            amount = %amount,
            "Topping up deployer"
        );

        self.send(funder, self.deployer.address(), amount, Bytes::new())
            .await
            .context("Failed to top up deployer")?;

        Ok(())
    }
}

impl Chain for JsonRpcChain {
    async fn deploy(&self, salt: B256, init_code: &Bytes) -> Result<B256> {
        let data = IImmutableCreate2Factory::safeCreate2Call {
            salt,
            initializationCode: init_code.clone(),
        }
        .abi_encode();

        self.send(&self.deployer, self.factory, U256::ZERO, data.into())
            .await
    }

    async fn root_nonce(&self, root: Address) -> Result<U256> {
        let data = IRoot::currentNonceCall {}.abi_encode();
        let output = self
            .rpc
            .eth_call(root, &data.into())
            .await
            .with_context(|| format!("Failed to read nonce of root {root}"))?;

        anyhow::ensure!(
            output.len() >= 32,
            "Root {} returned {} bytes for currentNonce(), is it deployed?",
            root,
            output.len()
        );

        Ok(U256::from_be_slice(&output[..32]))
    }

    async fn execute(
        &self,
        root: Address,
        target: Address,
        call_data: &Bytes,
        signature: &Bytes,
    ) -> Result<B256> {
        let data = IRoot::executeCall {
            target,
            data: call_data.clone(),
            signature: signature.clone(),
        }
        .abi_encode();

        self.send(&self.deployer, root, U256::ZERO, data.into())
            .await
    }
}

/// Everything a run needs to know about the network it targets.
#[derive(Debug, Clone)]
pub struct NetworkContext<C> {
    pub name: String,
    pub chain_id: u64,
    pub chain: C,
    pub factory: Address,
    pub roles: Roles,
    /// Signs root calls; without it stored signatures are reused.
    pub owner: Option<LocalWallet>,
    /// Whether action files are rewritten after each applied action.
    pub persist: bool,
}
