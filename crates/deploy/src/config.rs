//! Workspace configuration (`Mirror.toml`).

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    DeployError,
    artifact::DEFAULT_ARTIFACTS_DIR,
    create2::IMMUTABLE_CREATE2_FACTORY,
    miner::{DEFAULT_PROGRESS_INTERVAL, SaltMiner},
    network::{self, NetworkConfig, NetworkRegistry},
    symbols::Roles,
};

/// The default name of the configuration file.
pub const CONFIG_FILENAME: &str = "Mirror.toml";

/// Prefix of environment variables overriding configuration values.
///
/// Nested keys are separated by `__`, e.g. `MIRROR_NETWORKS__OPTIMISM__RPC`.
pub const ENV_PREFIX: &str = "MIRROR_";

/// Default directory holding the action files.
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// Salt miner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Worker threads, all available cores when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Give up after this many attempts per deployment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u64>,
    /// Attempts between two progress log lines.
    pub progress_interval: u64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            max_attempts: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl MinerConfig {
    /// Build a miner for `factory` with these settings.
    pub fn miner(&self, factory: Address) -> SaltMiner {
        let miner = SaltMiner::new(factory)
            .with_max_attempts(self.max_attempts)
            .with_progress_interval(self.progress_interval);

        match self.workers {
            Some(workers) => miner.with_workers(workers),
            None => miner,
        }
    }
}

/// Everything a `mirror` invocation reads from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub deployments_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    /// Fail on placeholders without a symbol instead of substituting `null`.
    pub strict_placeholders: bool,
    /// CREATE2 factory used unless a network overrides it.
    pub factory: Address,
    pub roles: Roles,
    pub miner: MinerConfig,
    pub networks: NetworkRegistry,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        let mut networks = NetworkRegistry::new();
        networks.insert(
            "hardhat".to_string(),
            NetworkConfig {
                ephemeral: true,
                ..NetworkConfig::new(
                    url::Url::parse("http://127.0.0.1:8545").expect("static url is valid"),
                    31337,
                )
            },
        );

        Self {
            deployments_dir: PathBuf::from(DEFAULT_DEPLOYMENTS_DIR),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            strict_placeholders: false,
            factory: IMMUTABLE_CREATE2_FACTORY,
            roles: Roles::default(),
            miner: MinerConfig::default(),
            networks,
        }
    }
}

impl MirrorConfig {
    /// Load defaults, then `path` if it exists, then `MIRROR_*` environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            found = path.is_file(),
            networks = config.networks.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, DeployError> {
        network::lookup(&self.networks, name)
    }

    /// Factory address for `network`, honouring its override.
    pub fn factory_for(&self, network: &NetworkConfig) -> Address {
        network.factory.unwrap_or(self.factory)
    }
}
