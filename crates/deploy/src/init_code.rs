//! Deployment init code: compiled bytecode followed by the encoded constructor arguments.

use alloy_core::primitives::{B256, Bytes, keccak256};
use serde_json::Value;

use crate::{
    abi,
    action::DeploymentAction,
    artifact::{Artifact, ArtifactStore},
    resolver,
    symbols::SymbolTable,
};

/// Init code of one deployment together with the arguments that went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitCode {
    pub code: Bytes,
    /// Constructor arguments after placeholder resolution.
    pub arguments: Vec<Value>,
}

impl InitCode {
    pub fn hash(&self) -> B256 {
        keccak256(&self.code)
    }
}

/// Builds [`InitCode`] for deployment actions from an [`ArtifactStore`].
#[derive(Debug, Clone, Copy)]
pub struct InitCodeBuilder<'a, S> {
    store: &'a S,
}

impl<'a, S: ArtifactStore> InitCodeBuilder<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve `action`'s constructor arguments, load its artifact and build the init code.
    pub fn build(&self, table: &SymbolTable, action: &DeploymentAction) -> anyhow::Result<InitCode> {
        let resolution = resolver::resolve(table, &Value::Array(action.constructor_arguments.clone()));
        for name in &resolution.missing {
            tracing::warn!(action = %action.name, placeholder = %name, "Not found <{}>", name);
        }
        let arguments = match resolution.value {
            Value::Array(items) => items,
            other => vec![other],
        };

        self.encode(action, arguments)
    }

    /// Build the init code of an action whose placeholders were already resolved.
    pub fn build_resolved(&self, action: &DeploymentAction) -> anyhow::Result<InitCode> {
        self.encode(action, action.constructor_arguments.clone())
    }

    fn encode(&self, action: &DeploymentAction, arguments: Vec<Value>) -> anyhow::Result<InitCode> {
        let artifact = self.store.load(&action.artifact)?;
        let code = encode_init_code(&action.name, &artifact, &arguments)?;

        Ok(InitCode { code, arguments })
    }
}

/// Append `arguments`, encoded for the artifact's constructor, to its bytecode.
///
/// Artifacts without a constructor yield their bytecode unchanged.
pub fn encode_init_code(
    name: &str,
    artifact: &Artifact,
    arguments: &[Value],
) -> anyhow::Result<Bytes> {
    let Some(constructor) = artifact.abi.constructor() else {
        if !arguments.is_empty() {
            tracing::warn!(
                action = name,
                arguments = arguments.len(),
                "Artifact has no constructor, ignoring constructor arguments"
            );
        }
        return Ok(artifact.bytecode.clone());
    };

    let encoded = abi::encode_params(name, &constructor.inputs, arguments)?;

    let mut code = artifact.bytecode.to_vec();
    code.extend(encoded);

    Ok(code.into())
}
