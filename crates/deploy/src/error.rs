//! Typed failures of the deployment engine.
//!
//! Plumbing errors (I/O, JSON, RPC transport) travel as [`anyhow::Error`] with context.
//! The variants below are the ones callers need to tell apart, so they are raised as
//! [`DeployError`] and can be recovered with `err.downcast_ref::<DeployError>()`.

use std::path::PathBuf;

use alloy_core::primitives::{Address, B256};

/// Failures with a well-defined meaning for a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The artifact store has no compiled output for the reference.
    #[error("artifact `{reference}` not found at {}", path.display())]
    ArtifactNotFound { reference: String, path: PathBuf },

    /// Constructor or call arguments do not fit the ABI signature.
    #[error("failed to encode arguments for `{name}`: {reason}")]
    ArgumentEncoding { name: String, reason: String },

    /// The declared address disagrees with the CREATE2 derivation.
    #[error("address mismatch for `{name}`: declared {declared}, computed {computed}")]
    AddressMismatch {
        name: String,
        declared: Address,
        computed: Address,
    },

    /// A deployment was submitted before `generate` assigned a salt and address.
    #[error("deployment `{name}` has no mined salt or contract address, run `mirror generate` first")]
    NotMined { name: String },

    /// Placeholders without a symbol, raised only in strict mode.
    #[error("unresolved placeholder(s) {names:?} in action `{action}`")]
    UnresolvedPlaceholder { action: String, names: Vec<String> },

    /// Neither an owner key nor a stored signature is available for a root call.
    #[error("no owner key and no stored signature for root call to `{target}`")]
    MissingSigningKey { target: String },

    /// A stored signature does not authorize the digest for this network.
    #[error("stored signature for root call to `{target}` recovers to {recovered}, expected {expected}")]
    SignatureMismatch {
        target: String,
        recovered: Address,
        expected: Address,
    },

    /// The function signature of an authenticated call does not parse.
    #[error("invalid function signature `{signature}`: {reason}")]
    InvalidFunctionSignature { signature: String, reason: String },

    /// The vanity prefix contains something other than hex digits.
    #[error("invalid vanity prefix `{0}`, expected hex digits")]
    InvalidPrefix(String),

    /// Mining was stopped through its cancellation handle.
    #[error("salt mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },

    /// Mining hit its attempt bound without a match.
    #[error("salt mining exhausted after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    /// The transaction was mined with a failure status.
    #[error("transaction {hash} reverted")]
    TransactionReverted { hash: B256 },

    /// The network name is not in the registry.
    #[error("unknown network `{0}`")]
    UnknownNetwork(String),

    /// The RPC endpoint serves a different chain than the registry declares.
    #[error("network `{network}` expects chain id {expected}, endpoint reports {actual}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },
}
