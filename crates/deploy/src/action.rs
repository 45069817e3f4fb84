//! Action files: the declarative deployment plan and its per-network proof of execution.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value};

use crate::{
    DeployError,
    fs::FsHandler,
    resolver::{self, Resolution},
    symbols::SymbolTable,
};

/// Placeholder that names the root contract when an action does not pick one.
pub const DEFAULT_ROOT: &str = "<Root>";

/// One step of a deployment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Deploy a contract through the CREATE2 factory.
    #[serde(rename = "deployment")]
    Deployment(DeploymentAction),
    /// Call a contract through the root contract with an owner signature.
    #[serde(rename = "root", alias = "rootCall")]
    AuthenticatedCall(AuthenticatedCallAction),
}

impl Action {
    /// Human-readable identity used in logs and error messages.
    pub fn label(&self) -> String {
        match self {
            Self::Deployment(action) => action.name.clone(),
            Self::AuthenticatedCall(action) => action.label(),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "deployment",
            Self::AuthenticatedCall(_) => "root",
        }
    }

    /// Whether a result for `network` has already been recorded.
    pub fn is_applied_on(&self, network: &str) -> bool {
        match self {
            Self::Deployment(action) => action.results.iter().any(|r| r.network == network),
            Self::AuthenticatedCall(action) => action.results.iter().any(|r| r.network == network),
        }
    }

    /// Networks this action has been applied on, in recording order.
    pub fn networks(&self) -> Vec<&str> {
        match self {
            Self::Deployment(action) => action.results.iter().map(|r| r.network.as_str()).collect(),
            Self::AuthenticatedCall(action) => {
                action.results.iter().map(|r| r.network.as_str()).collect()
            }
        }
    }
}

/// Deploy `artifact` with `constructorArguments` at a CREATE2 address.
///
/// `salt` and `contractAddress` are filled in once by the offline mining pass and are
/// then part of the action's identity on every network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentAction {
    pub name: String,
    pub artifact: String,
    #[serde(default)]
    pub constructor_arguments: Vec<Value>,
    /// Constructor arguments as resolved by the last mining pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parsed_arguments: Vec<Value>,
    /// Required hex prefix of the mined address.
    #[serde(default)]
    pub leading: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub salt: Option<B256>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        serialize_with = "checksummed_opt"
    )]
    pub contract_address: Option<Address>,
    #[serde(
        default,
        rename = "deployments",
        alias = "results",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub results: Vec<DeploymentResult>,
    /// Keys this tool does not interpret, carried through rewrites untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeploymentAction {
    pub fn record(&mut self, network: &str, contract_address: Address, transaction_hash: B256) {
        self.results.push(DeploymentResult {
            network: network.to_string(),
            contract_address,
            transaction_hash,
        });
    }
}

/// Proof that a deployment happened on a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    #[serde(alias = "chain")]
    pub network: String,
    #[serde(serialize_with = "checksummed")]
    pub contract_address: Address,
    pub transaction_hash: B256,
}

/// Call `target` with `functionSignature(args)` through the root contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedCallAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root contract address or placeholder, `<Root>` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Target address or placeholder.
    pub target: String,
    /// Solidity signature such as `setController(address,bool)`.
    pub function_signature: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// The last signature produced for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Bytes>,
    #[serde(
        default,
        rename = "deployments",
        alias = "results",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub results: Vec<CallResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthenticatedCallAction {
    pub fn root(&self) -> &str {
        self.root.as_deref().unwrap_or(DEFAULT_ROOT)
    }

    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}.{}", self.target, self.function_signature))
    }

    pub fn record(&mut self, network: &str, transaction_hash: B256, signature: Bytes) {
        self.results.push(CallResult {
            network: network.to_string(),
            transaction_hash,
        });
        self.signature = Some(signature);
    }
}

/// Proof that a root call happened on a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    #[serde(alias = "chain")]
    pub network: String,
    pub transaction_hash: B256,
}

fn checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&address.to_checksum(None))
}

fn checksummed_opt<S: Serializer>(
    address: &Option<Address>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match address {
        Some(address) => checksummed(address, serializer),
        None => serializer.serialize_none(),
    }
}

/// Treat `null`, a missing field and a blank string alike.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => s.trim().parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// An action held in both of its forms while it is being applied.
///
/// `raw` keeps the symbolic placeholders and is the only form ever persisted; `resolved`
/// is what gets encoded and submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Staged {
    pub raw: Action,
    pub resolved: Action,
    /// Placeholders that had no symbol.
    pub missing: Vec<String>,
}

impl Staged {
    /// Resolve a copy of `raw` against `table`.
    ///
    /// Unknown placeholders are substituted with `null`; in `strict` mode they fail with
    /// [`DeployError::UnresolvedPlaceholder`] instead.
    pub fn resolve(raw: &Action, table: &SymbolTable, strict: bool) -> Result<Self> {
        let tree = serde_json::to_value(raw).context("Failed to serialize action")?;
        let Resolution { value, missing } = resolver::resolve(table, &tree);

        if !missing.is_empty() {
            if strict {
                return Err(DeployError::UnresolvedPlaceholder {
                    action: raw.label(),
                    names: missing,
                }
                .into());
            }
            for name in &missing {
                tracing::warn!(action = %raw.label(), placeholder = %name, "Not found <{}>", name);
            }
        }

        let resolved: Action = serde_json::from_value(value).with_context(|| {
            format!(
                "Resolved action `{}` is malformed (unresolved placeholders: {:?})",
                raw.label(),
                missing
            )
        })?;

        Ok(Self {
            raw: raw.clone(),
            resolved,
            missing,
        })
    }
}

/// An ordered action list backed by a JSON file.
#[derive(Debug, Clone, PartialEq, Deref, DerefMut)]
pub struct ActionFile {
    path: PathBuf,
    #[deref]
    #[deref_mut]
    actions: Vec<Action>,
}

impl ActionFile {
    pub fn new(path: impl Into<PathBuf>, actions: Vec<Action>) -> Self {
        Self {
            path: path.into(),
            actions,
        }
    }

    /// Load an action file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read action file {}", path.display()))?;
        let actions: Vec<Action> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse action file {}", path.display()))?;

        tracing::debug!(path = %path.display(), actions = actions.len(), "Action file loaded");

        Ok(Self::new(path, actions))
    }

    /// Rewrite the file in place.
    ///
    /// The content is written next to the file and renamed over it, so a crash leaves
    /// either the old or the new version on disk.
    pub fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.actions)
            .context("Failed to serialize action file")?;
        content.push('\n');

        FsHandler::write_atomic(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to write action file {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{OPERATOR, SymbolTable};
    use alloy_core::primitives::{address, b256};
    use serde_json::json;
    use tempdir::TempDir;

    fn legacy_file() -> Value {
        json!([
            {
                "type": "deployment",
                "name": "Root",
                "artifact": "root/Root.sol",
                "constructorArguments": ["<OPERATOR>"],
                "leading": "8888",
                "salt": "",
                "contractAddress": ""
            },
            {
                "type": "root",
                "target": "<Registry>",
                "functionSignature": "setController(address,bool)",
                "args": ["<OPERATOR>", true],
                "deployments": [
                    {
                        "chain": "goerli",
                        "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111"
                    }
                ]
            }
        ])
    }

    #[test]
    fn test_parse_legacy_layout() {
        let actions: Vec<Action> = serde_json::from_value(legacy_file()).unwrap();

        let Action::Deployment(root) = &actions[0] else {
            panic!("expected a deployment");
        };
        assert_eq!(root.salt, None);
        assert_eq!(root.contract_address, None);
        assert_eq!(root.constructor_arguments, vec![json!("<OPERATOR>")]);

        let Action::AuthenticatedCall(call) = &actions[1] else {
            panic!("expected a root call");
        };
        assert_eq!(call.root(), DEFAULT_ROOT);
        assert!(actions[1].is_applied_on("goerli"));
        assert!(!actions[1].is_applied_on("optimism"));
    }

    #[test]
    fn test_serialize_uses_network_key() {
        let mut action = DeploymentAction {
            name: "Registry".into(),
            artifact: "Registry.sol/Registry".into(),
            constructor_arguments: vec![],
            parsed_arguments: vec![],
            leading: "abc".into(),
            salt: Some(b256!(
                "0000000000000000000000000000000000000000a1b2c3d4e5f60718293a4b5c"
            )),
            contract_address: Some(address!("abc0000000000000000000000000000000000001")),
            results: vec![],
            extra: Map::new(),
        };
        action.record(
            "testnetA",
            address!("abc0000000000000000000000000000000000001"),
            B256::repeat_byte(0x22),
        );

        let value = serde_json::to_value(Action::Deployment(action)).unwrap();

        assert_eq!(value["type"], "deployment");
        assert_eq!(value["deployments"][0]["network"], "testnetA");
        assert!(value["deployments"][0].get("chain").is_none());
        assert!(value.get("parsedArguments").is_none());
    }

    #[test]
    fn test_staged_keeps_placeholders_in_raw() {
        let actions: Vec<Action> = serde_json::from_value(legacy_file()).unwrap();
        let mut table = SymbolTable::new();
        table.insert(OPERATOR, "0x8888112e21A42eAAD5DD2e9eDcE4BfD8327dAa6A");
        table.insert("Registry", "0x8888000000000000000000000000000000000002");

        let staged = Staged::resolve(&actions[1], &table, false).unwrap();

        let Action::AuthenticatedCall(resolved) = &staged.resolved else {
            panic!("expected a root call");
        };
        let Action::AuthenticatedCall(raw) = &staged.raw else {
            panic!("expected a root call");
        };
        assert_eq!(resolved.target, "0x8888000000000000000000000000000000000002");
        assert_eq!(resolved.args[0], json!("0x8888112e21A42eAAD5DD2e9eDcE4BfD8327dAa6A"));
        assert_eq!(raw.target, "<Registry>");
        assert_eq!(raw.args[0], json!("<OPERATOR>"));
        assert!(staged.missing.is_empty());
    }

    #[test]
    fn test_staged_strict_rejects_missing_symbols() {
        let actions: Vec<Action> = serde_json::from_value(legacy_file()).unwrap();

        let err = Staged::resolve(&actions[0], &SymbolTable::new(), true).unwrap_err();

        match err.downcast_ref::<DeployError>() {
            Some(DeployError::UnresolvedPlaceholder { action, names }) => {
                assert_eq!(action, "Root");
                assert_eq!(names, &vec!["OPERATOR".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_action_file_save_and_load() {
        let temp_dir = TempDir::new("mirror-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("00-core.json");
        let actions: Vec<Action> = serde_json::from_value(legacy_file()).unwrap();

        ActionFile::new(&path, actions.clone()).save().unwrap();
        let loaded = ActionFile::load(&path).unwrap();

        assert_eq!(loaded.path(), path.as_path());
        assert_eq!(loaded.into_actions(), actions);
    }

    #[test]
    fn test_action_file_load_corrupted() {
        let temp_dir = TempDir::new("mirror-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(ActionFile::load(&path).is_err());
    }
}
