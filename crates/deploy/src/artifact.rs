//! Compiled contract artifacts, produced by a separate compilation step.

use std::path::{Path, PathBuf};

use alloy_core::{json_abi::JsonAbi, primitives::Bytes};
use anyhow::Context;
use serde::{Deserialize, Deserializer};

use crate::DeployError;

/// Default location of compiled artifacts, relative to the working directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts/contracts";

/// Bytecode and ABI of one compiled contract.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artifact {
    pub abi: JsonAbi,
    #[serde(deserialize_with = "deserialize_bytecode")]
    pub bytecode: Bytes,
}

/// Hardhat stores bytecode as a hex string, Foundry as `{ "object": "0x…" }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeRepr {
    Hex(Bytes),
    Object { object: Bytes },
}

fn deserialize_bytecode<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match BytecodeRepr::deserialize(deserializer)? {
        BytecodeRepr::Hex(bytes) | BytecodeRepr::Object { object: bytes } => bytes,
    })
}

/// Source of compiled artifacts.
pub trait ArtifactStore {
    /// Load the artifact named by `reference`.
    ///
    /// Fails with [`DeployError::ArtifactNotFound`] when nothing is stored for it.
    fn load(&self, reference: &str) -> anyhow::Result<Artifact>;
}

/// Artifacts laid out on disk by the compiler.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a reference to the JSON file holding it.
    ///
    /// - `dir/File.sol` → `<root>/dir/File.sol/File.json`
    /// - `File.sol/Name` → `<root>/File.sol/Name.json`
    pub fn artifact_path(&self, reference: &str) -> PathBuf {
        let reference = reference.trim_matches('/');
        let last = reference.rsplit('/').next().unwrap_or(reference);

        match last.strip_suffix(".sol") {
            Some(stem) => self.root.join(reference).join(format!("{stem}.json")),
            None => self.root.join(format!("{reference}.json")),
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self, reference: &str) -> anyhow::Result<Artifact> {
        let path = self.artifact_path(reference);
        if !path.is_file() {
            return Err(DeployError::ArtifactNotFound {
                reference: reference.to_string(),
                path,
            }
            .into());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let artifact: Artifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

        tracing::trace!(reference, path = %path.display(), "Artifact loaded");

        Ok(artifact)
    }
}
