//! mirror replays a set of contract deployments at the same addresses on every network.

mod cli;
mod summary;

use alloy_core::primitives::U256;
use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command, Keys};
use mirror_deploy::{
    AddressGenerator, CancelToken, DeploymentOrchestrator, FsArtifactStore, JsonRpcChain,
    MirrorConfig, NetworkContext, RunLock,
    network::{TOP_UP_TARGET, TOP_UP_THRESHOLD},
    verify,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = MirrorConfig::load(&cli.config)?;

    match cli.command {
        Command::Deploy { ref network } => deploy(&config, &cli.keys, network).await,
        Command::Generate => generate(config, &cli.keys).await,
        Command::VerifyScript { ref out } => {
            verify::write_script(&config.deployments_dir, out)?;
            Ok(())
        }
    }
}

async fn deploy(config: &MirrorConfig, keys: &Keys, network: &str) -> Result<()> {
    let _lock = RunLock::acquire(&config.deployments_dir)?;

    let network_config = config.network(network)?;
    let deployer = keys
        .deployer()?
        .context("MIRROR_DEPLOYER_KEY is required to submit transactions")?;
    let chain = JsonRpcChain::connect(
        network,
        network_config,
        config.factory_for(network_config),
        deployer,
    )
    .await?;

    if network_config.ephemeral {
        match keys.funder()? {
            Some(funder) => {
                chain
                    .ensure_funded(
                        &funder,
                        U256::from(TOP_UP_THRESHOLD),
                        U256::from(TOP_UP_TARGET),
                    )
                    .await?
            }
            None => tracing::warn!(network, "No MIRROR_FUNDER_KEY, deployer will not be topped up"),
        }
    }

    let ctx = NetworkContext {
        name: network.to_string(),
        chain_id: chain.chain_id(),
        factory: chain.factory(),
        roles: keys.roles(&config.roles)?,
        owner: keys.owner()?,
        persist: !network_config.ephemeral,
        chain,
    };
    let store = FsArtifactStore::new(&config.artifacts_dir);

    let run = DeploymentOrchestrator::new(&ctx, &store)
        .with_strict_placeholders(config.strict_placeholders)
        .run(&config.deployments_dir)
        .await?;

    println!("{}", summary::run_table(&run));

    Ok(())
}

async fn generate(config: MirrorConfig, keys: &Keys) -> Result<()> {
    let _lock = RunLock::acquire(&config.deployments_dir)?;

    let roles = keys.roles(&config.roles)?;
    let cancel = CancelToken::new();
    let miner = config
        .miner
        .miner(config.factory)
        .with_cancel_token(cancel.clone());

    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, stopping salt mining...");
            cancel.cancel();
        }
    });

    let deployments_dir = config.deployments_dir.clone();
    let generated = tokio::task::spawn_blocking(move || {
        let store = FsArtifactStore::new(&config.artifacts_dir);
        AddressGenerator::new(&store, &miner, &roles).run(&deployments_dir)
    })
    .await
    .context("Address generation task panicked")?;
    watcher.abort();

    let generated = generated?;
    tracing::info!(
        deployments = generated.len(),
        mined = generated.iter().filter(|g| g.mined.is_some()).count(),
        "Address generation complete"
    );
    println!("{}", summary::generated_table(&generated));

    Ok(())
}
