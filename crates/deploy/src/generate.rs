//! Offline address generation.
//!
//! Fills in `salt`, `contractAddress` and `parsedArguments` of every deployment action,
//! mining a salt for each one that has no address yet. Runs without any network and is
//! meant to happen once, before the action files are replayed on any chain.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};

use crate::{
    action::{Action, ActionFile, DeploymentAction},
    artifact::ArtifactStore,
    create2,
    fs::FsHandler,
    init_code::InitCodeBuilder,
    miner::{MiningStats, SaltMiner, VanityPrefix},
    symbols::{Roles, SymbolTable},
};

/// Address assigned to one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAddress {
    pub file: PathBuf,
    pub name: String,
    pub address: Address,
    /// Present when the salt was mined during this pass.
    pub mined: Option<MiningStats>,
}

/// Assigns addresses to the deployments of a set of action files.
pub struct AddressGenerator<'a, S> {
    store: &'a S,
    miner: &'a SaltMiner,
    roles: &'a Roles,
}

impl<'a, S: ArtifactStore> AddressGenerator<'a, S> {
    pub fn new(store: &'a S, miner: &'a SaltMiner, roles: &'a Roles) -> Self {
        Self {
            store,
            miner,
            roles,
        }
    }

    /// Process every action file below `directory`, in path order.
    pub fn run(&self, directory: &Path) -> Result<Vec<GeneratedAddress>> {
        let mut table = SymbolTable::with_roles(self.roles);
        let mut generated = Vec::new();

        for path in FsHandler::collect_action_files(directory)? {
            generated.extend(self.run_file(&path, &mut table)?);
        }

        Ok(generated)
    }

    /// Process one file and rewrite it.
    pub fn run_file(&self, path: &Path, table: &mut SymbolTable) -> Result<Vec<GeneratedAddress>> {
        let mut file = ActionFile::load(path)?;
        let mut generated = Vec::new();

        for action in file.iter_mut() {
            let Action::Deployment(deployment) = action else {
                continue;
            };

            let mined = self
                .assign(deployment, table)
                .with_context(|| format!("Failed to generate address for `{}`", deployment.name))?;
            let address = deployment
                .contract_address
                .context("Address generation left no contract address")?;
            table.insert_address(deployment.name.clone(), address);

            generated.push(GeneratedAddress {
                file: path.to_path_buf(),
                name: deployment.name.clone(),
                address,
                mined,
            });
        }

        file.save()?;

        tracing::debug!(path = %path.display(), deployments = generated.len(), "Action file generated");

        Ok(generated)
    }

    fn assign(&self, deployment: &mut DeploymentAction, table: &SymbolTable) -> Result<Option<MiningStats>> {
        let init_code = InitCodeBuilder::new(self.store).build(table, deployment)?;
        deployment.parsed_arguments = init_code.arguments.clone();

        if let Some(address) = deployment.contract_address {
            match deployment.salt {
                Some(salt)
                    if create2::compute_address(self.miner.factory(), salt, &init_code.code)
                        != address =>
                {
                    tracing::warn!(
                        name = %deployment.name,
                        address = %address,
                        "Declared address no longer matches its init code"
                    );
                }
                _ => {}
            }
            return Ok(None);
        }

        let prefix = VanityPrefix::parse(&deployment.leading)?;
        tracing::info!(name = %deployment.name, prefix = %prefix, "Mining salt");

        let mined = self.miner.mine(init_code.hash(), &prefix)?;

        tracing::info!(
            name = %deployment.name,
            address = %mined.address,
            salt = %mined.salt,
            attempts = mined.stats.attempts,
            elapsed = ?mined.stats.elapsed,
            "Salt mined"
        );

        deployment.salt = Some(mined.salt);
        deployment.contract_address = Some(mined.address);

        Ok(Some(mined.stats))
    }
}
