use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mirror_deploy::{CONFIG_FILENAME, LocalWallet, Roles, verify::DEFAULT_SCRIPT_NAME};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "mirror")]
#[command(
    author,
    version,
    about = "Deploy contracts at the same address on every network."
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(
        short,
        long,
        global = true,
        env = "MIRROR_VERBOSITY",
        default_value_t = LevelFilter::INFO
    )]
    pub verbosity: LevelFilter,

    /// Path to the configuration file.
    #[arg(long, global = true, env = "MIRROR_CONFIG", default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    #[command(flatten)]
    pub keys: Keys,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay every action file on a network, applying only what is missing.
    Deploy {
        /// Name of the network in the configuration's registry.
        network: String,
    },

    /// Mine salts and assign addresses to deployments, offline.
    Generate,

    /// Write a script verifying the source of every deployed contract.
    VerifyScript {
        /// Where to write the script.
        #[arg(long, default_value = DEFAULT_SCRIPT_NAME)]
        out: PathBuf,
    },
}

/// Private keys, only ever read from the environment or the command line.
#[derive(Args)]
pub struct Keys {
    /// Key submitting every transaction.
    #[arg(long, env = "MIRROR_DEPLOYER_KEY", hide_env_values = true, hide = true, global = true)]
    pub deployer_key: Option<String>,

    /// Key signing root calls.
    #[arg(long, env = "MIRROR_OWNER_KEY", hide_env_values = true, hide = true, global = true)]
    pub owner_key: Option<String>,

    /// Key of the operator role, only its address is used.
    #[arg(long, env = "MIRROR_OPERATOR_KEY", hide_env_values = true, hide = true, global = true)]
    pub operator_key: Option<String>,

    /// Key topping up the deployer on ephemeral networks.
    #[arg(long, env = "MIRROR_FUNDER_KEY", hide_env_values = true, hide = true, global = true)]
    pub funder_key: Option<String>,
}

impl Keys {
    pub fn deployer(&self) -> anyhow::Result<Option<LocalWallet>> {
        wallet(self.deployer_key.as_deref())
    }

    pub fn owner(&self) -> anyhow::Result<Option<LocalWallet>> {
        wallet(self.owner_key.as_deref())
    }

    pub fn funder(&self) -> anyhow::Result<Option<LocalWallet>> {
        wallet(self.funder_key.as_deref())
    }

    /// Role addresses: derived from a key when one is given, otherwise `configured`.
    pub fn roles(&self, configured: &Roles) -> anyhow::Result<Roles> {
        let operator = wallet(self.operator_key.as_deref())?;

        Ok(Roles {
            deployer: self.deployer()?.map(|w| w.address()).or(configured.deployer),
            operator: operator.map(|w| w.address()).or(configured.operator),
            owner: self.owner()?.map(|w| w.address()).or(configured.owner),
        })
    }
}

fn wallet(key: Option<&str>) -> anyhow::Result<Option<LocalWallet>> {
    key.map(LocalWallet::from_hex).transpose()
}
