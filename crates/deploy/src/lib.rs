//! mirror-deploy - Deterministic multi-network contract deployment.
//!
//! Action files describe a deployment plan: contracts to create through a CREATE2
//! factory and privileged calls to run through a root contract. This crate mines vanity
//! salts for the plan once, offline, and then replays it on any number of networks,
//! giving every contract the same address everywhere and recording per-network proof of
//! execution back into the files so that reruns only apply what is missing.

pub mod abi;
pub mod action;
pub mod artifact;
pub mod config;
pub mod create2;
mod error;
pub mod fs;
pub mod generate;
pub mod init_code;
pub mod miner;
pub mod network;
pub mod orchestrator;
pub mod resolver;
pub mod root;
pub mod rpc;
pub mod symbols;
pub mod verify;
pub mod wallet;

pub use action::{
    Action, ActionFile, AuthenticatedCallAction, CallResult, DeploymentAction, DeploymentResult,
    Staged,
};
pub use artifact::{Artifact, ArtifactStore, FsArtifactStore};
pub use config::{CONFIG_FILENAME, MinerConfig, MirrorConfig};
pub use create2::{IMMUTABLE_CREATE2_FACTORY, compute_address};
pub use error::DeployError;
pub use fs::RunLock;
pub use generate::{AddressGenerator, GeneratedAddress};
pub use init_code::{InitCode, InitCodeBuilder};
pub use miner::{CancelToken, MinedSalt, MiningStats, SaltCandidates, SaltMiner, VanityPrefix};
pub use network::{
    Chain, JsonRpcChain, NetworkConfig, NetworkContext, NetworkRegistry, ProtocolType,
};
pub use orchestrator::{ActionReport, ActionState, DeploymentOrchestrator, RunSummary};
pub use resolver::{Resolution, resolve};
pub use root::{RootCall, RootTopic};
pub use symbols::{Roles, SymbolTable};
pub use wallet::{LegacyTransaction, LocalWallet};
