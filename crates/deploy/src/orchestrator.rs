//! The deployment run: replays action files against one network.
//!
//! Each `(action, network)` pair moves through `Pending → Submitted → Recorded`, or is
//! `Skipped` when a result for the network is already on file. Actions run strictly in
//! order because later ones resolve addresses recorded by earlier ones, and the file is
//! rewritten after every recorded action so an interrupted run resumes right after the
//! last one.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use strum::Display;

use crate::{
    DeployError, abi,
    action::{Action, ActionFile, AuthenticatedCallAction, DeploymentAction, Staged},
    artifact::ArtifactStore,
    create2,
    fs::FsHandler,
    init_code::InitCodeBuilder,
    network::{Chain, NetworkContext},
    resolver,
    root::RootCall,
    symbols::{OWNER, SymbolTable},
};

/// Progress of one action on one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ActionState {
    Pending,
    Submitted,
    Recorded,
    Skipped,
}

/// What happened to one action during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub file: PathBuf,
    pub label: String,
    pub kind: &'static str,
    /// `Recorded` or `Skipped`.
    pub state: ActionState,
    pub contract_address: Option<Address>,
    pub transaction_hash: Option<B256>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub network: String,
    pub actions: Vec<ActionReport>,
}

impl RunSummary {
    pub fn applied(&self) -> usize {
        self.count(ActionState::Recorded)
    }

    pub fn skipped(&self) -> usize {
        self.count(ActionState::Skipped)
    }

    fn count(&self, state: ActionState) -> usize {
        self.actions.iter().filter(|a| a.state == state).count()
    }
}

/// Result of applying one action.
struct Applied {
    /// The raw action with its new result appended.
    raw: Action,
    contract_address: Option<Address>,
    transaction_hash: B256,
}

/// Replays action files against the network of a [`NetworkContext`].
pub struct DeploymentOrchestrator<'a, C, S> {
    ctx: &'a NetworkContext<C>,
    store: &'a S,
    strict_placeholders: bool,
}

impl<'a, C: Chain, S: ArtifactStore> DeploymentOrchestrator<'a, C, S> {
    pub fn new(ctx: &'a NetworkContext<C>, store: &'a S) -> Self {
        Self {
            ctx,
            store,
            strict_placeholders: false,
        }
    }

    /// Fail on unresolved placeholders instead of substituting `null`.
    pub fn with_strict_placeholders(mut self, strict: bool) -> Self {
        self.strict_placeholders = strict;
        self
    }

    /// Apply every action file below `directory`, in path order.
    pub async fn run(&self, directory: &Path) -> Result<RunSummary> {
        let files = FsHandler::collect_action_files(directory)?;
        let mut table = SymbolTable::for_network(&self.ctx.roles, &self.ctx.name, self.ctx.chain_id);
        let mut summary = RunSummary {
            network: self.ctx.name.clone(),
            actions: Vec::new(),
        };

        tracing::info!(
            network = %self.ctx.name,
            files = files.len(),
            persist = self.ctx.persist,
            "Starting deployment run"
        );

        for path in files {
            self.run_file(&path, &mut table, &mut summary).await?;
        }

        tracing::info!(
            network = %self.ctx.name,
            applied = summary.applied(),
            skipped = summary.skipped(),
            "Deployment run complete"
        );

        Ok(summary)
    }

    /// Apply the actions of one file, rewriting it after each recorded action.
    pub async fn run_file(
        &self,
        path: &Path,
        table: &mut SymbolTable,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut file = ActionFile::load(path)?;
        table.record_declared(&file);

        for index in 0..file.len() {
            let label = file[index].label();
            let kind = file[index].kind();

            if file[index].is_applied_on(&self.ctx.name) {
                tracing::debug!(action = %label, state = %ActionState::Skipped, "Already applied");
                summary.actions.push(ActionReport {
                    file: path.to_path_buf(),
                    label,
                    kind,
                    state: ActionState::Skipped,
                    contract_address: match &file[index] {
                        Action::Deployment(d) => d.contract_address,
                        Action::AuthenticatedCall(_) => None,
                    },
                    transaction_hash: None,
                });
                continue;
            }

            tracing::debug!(action = %label, state = %ActionState::Pending, "Applying action");

            let applied = self.apply(&file[index], table).await.with_context(|| {
                format!(
                    "Action `{}` failed on network {} ({})",
                    label,
                    self.ctx.name,
                    path.display()
                )
            })?;

            file[index] = applied.raw;
            if self.ctx.persist {
                file.save()?;
            }

            tracing::debug!(action = %label, state = %ActionState::Recorded, "Result recorded");
            summary.actions.push(ActionReport {
                file: path.to_path_buf(),
                label,
                kind,
                state: ActionState::Recorded,
                contract_address: applied.contract_address,
                transaction_hash: Some(applied.transaction_hash),
            });
        }

        Ok(())
    }

    async fn apply(&self, raw: &Action, table: &mut SymbolTable) -> Result<Applied> {
        let staged = Staged::resolve(raw, table, self.strict_placeholders)?;

        match (&staged.raw, &staged.resolved) {
            (Action::Deployment(raw), Action::Deployment(resolved)) => {
                self.deploy(raw, resolved, table).await
            }
            (Action::AuthenticatedCall(raw), Action::AuthenticatedCall(resolved)) => {
                self.execute(raw, resolved, table).await
            }
            _ => anyhow::bail!("Resolution changed the kind of action `{}`", raw.label()),
        }
    }

    async fn deploy(
        &self,
        raw: &DeploymentAction,
        resolved: &DeploymentAction,
        table: &mut SymbolTable,
    ) -> Result<Applied> {
        let (Some(salt), Some(declared)) = (resolved.salt, resolved.contract_address) else {
            return Err(DeployError::NotMined {
                name: resolved.name.clone(),
            }
            .into());
        };

        let init_code = InitCodeBuilder::new(self.store).build_resolved(resolved)?;
        let computed = create2::compute_address(self.ctx.factory, salt, &init_code.code);
        if computed != declared {
            return Err(DeployError::AddressMismatch {
                name: resolved.name.clone(),
                declared,
                computed,
            }
            .into());
        }

        tracing::debug!(
            action = %resolved.name,
            state = %ActionState::Submitted,
            address = %declared,
            "Deploying contract"
        );
        let transaction_hash = self.ctx.chain.deploy(salt, &init_code.code).await?;

        tracing::info!(
            name = %resolved.name,
            address = %declared,
            tx_hash = %transaction_hash,
            network = %self.ctx.name,
            "Contract deployed"
        );

        table.insert_address(resolved.name.clone(), declared);

        let mut raw = raw.clone();
        raw.record(&self.ctx.name, declared, transaction_hash);

        Ok(Applied {
            raw: Action::Deployment(raw),
            contract_address: Some(declared),
            transaction_hash,
        })
    }

    async fn execute(
        &self,
        raw: &AuthenticatedCallAction,
        resolved: &AuthenticatedCallAction,
        table: &SymbolTable,
    ) -> Result<Applied> {
        // Taken from the raw form so an unresolved root never falls back to the default.
        let root = resolve_address(table, "root", raw.root())?;
        let target = resolve_address(table, "target", &raw.target)?;
        let call_data = abi::encode_call(&resolved.function_signature, &resolved.args)?;

        let nonce = self.ctx.chain.root_nonce(root).await?;
        let call = RootCall {
            root,
            target,
            call_data,
            nonce,
        };
        let signature = call.authorize(
            self.ctx.owner.as_ref(),
            raw.signature.as_ref(),
            table.address(OWNER),
        )?;

        tracing::debug!(
            action = %resolved.label(),
            state = %ActionState::Submitted,
            root = %root,
            nonce = %nonce,
            "Executing root call"
        );
        let transaction_hash = self
            .ctx
            .chain
            .execute(root, target, &call.call_data, &signature)
            .await?;

        tracing::info!(
            target = %raw.target,
            function = %resolved.function_signature,
            tx_hash = %transaction_hash,
            network = %self.ctx.name,
            "Root call executed"
        );

        let mut raw = raw.clone();
        raw.record(&self.ctx.name, transaction_hash, signature);

        Ok(Applied {
            raw: Action::AuthenticatedCall(raw),
            contract_address: None,
            transaction_hash,
        })
    }
}

/// Parse `value` as an address, resolving it first when it is a placeholder.
fn resolve_address(table: &SymbolTable, field: &str, value: &str) -> Result<Address> {
    if let Some(name) = resolver::placeholder_name(value) {
        return table
            .address(name)
            .with_context(|| format!("`{field}` refers to <{name}>, which has no address"));
    }

    value
        .parse()
        .with_context(|| format!("`{field}` is not an address: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        artifact::FsArtifactStore,
        create2::IMMUTABLE_CREATE2_FACTORY,
        miner::salt_from_suffix,
        symbols::Roles,
        wallet::LocalWallet,
    };
    use alloy_core::primitives::{Bytes, U256, address, keccak256};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tempdir::TempDir;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const BYTECODE: [u8; 5] = [0x60, 0x80, 0x60, 0x40, 0x52];

    #[derive(Default)]
    struct MockChain {
        nonce: u64,
        deployments: Mutex<Vec<(B256, Bytes)>>,
        executions: Mutex<Vec<(Address, Address, Bytes, Bytes)>>,
    }

    impl MockChain {
        fn submissions(&self) -> usize {
            self.deployments.lock().unwrap().len() + self.executions.lock().unwrap().len()
        }

        fn next_hash(&self) -> B256 {
            keccak256(self.submissions().to_be_bytes())
        }
    }

    impl Chain for MockChain {
        async fn deploy(&self, salt: B256, init_code: &Bytes) -> Result<B256> {
            let hash = self.next_hash();
            self.deployments
                .lock()
                .unwrap()
                .push((salt, init_code.clone()));
            Ok(hash)
        }

        async fn root_nonce(&self, _root: Address) -> Result<U256> {
            Ok(U256::from(self.nonce))
        }

        async fn execute(
            &self,
            root: Address,
            target: Address,
            call_data: &Bytes,
            signature: &Bytes,
        ) -> Result<B256> {
            let hash = self.next_hash();
            self.executions.lock().unwrap().push((
                root,
                target,
                call_data.clone(),
                signature.clone(),
            ));
            Ok(hash)
        }
    }

    struct Fixture {
        dir: TempDir,
        store: FsArtifactStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new("mirror-test").expect("Failed to create temp dir");
            let artifact = dir.path().join("artifacts/Registry.sol/Registry.json");
            std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
            std::fs::write(
                &artifact,
                json!({ "abi": [], "bytecode": format!("0x{}", hex::encode(BYTECODE)) })
                    .to_string(),
            )
            .unwrap();
            std::fs::create_dir_all(dir.path().join("deployments")).unwrap();
            let store = FsArtifactStore::new(dir.path().join("artifacts"));
            Self { dir, store }
        }

        fn deployments(&self) -> PathBuf {
            self.dir.path().join("deployments")
        }

        fn write(&self, name: &str, actions: Value) -> PathBuf {
            let path = self.deployments().join(name);
            std::fs::write(&path, serde_json::to_string_pretty(&actions).unwrap()).unwrap();
            path
        }

        fn read(&self, name: &str) -> Value {
            serde_json::from_str(&std::fs::read_to_string(self.deployments().join(name)).unwrap())
                .unwrap()
        }
    }

    fn context(network: &str, chain: MockChain, owner: Option<LocalWallet>) -> NetworkContext<MockChain> {
        NetworkContext {
            name: network.to_string(),
            chain_id: 5,
            chain,
            factory: IMMUTABLE_CREATE2_FACTORY,
            roles: Roles {
                deployer: None,
                operator: Some(address!("8888112e21a42eaad5dd2e9edce4bfd8327daa6a")),
                owner: Some(LocalWallet::from_hex(DEV_KEY).unwrap().address()),
            },
            owner,
            persist: true,
        }
    }

    fn mined_registry() -> Value {
        let salt = salt_from_suffix([7; 12]);
        let address = create2::compute_address(IMMUTABLE_CREATE2_FACTORY, salt, &BYTECODE);
        json!({
            "type": "deployment",
            "name": "Registry",
            "artifact": "Registry.sol/Registry",
            "constructorArguments": [],
            "leading": "",
            "salt": salt,
            "contractAddress": address
        })
    }

    fn root_call() -> Value {
        json!({
            "type": "root",
            "root": "<Registry>",
            "target": "<Registry>",
            "functionSignature": "setController(address,bool)",
            "args": ["<OPERATOR>", true]
        })
    }

    #[tokio::test]
    async fn test_second_run_is_a_full_skip() {
        let fixture = Fixture::new();
        fixture.write("01_registry.json", json!([mined_registry(), root_call()]));
        let owner = LocalWallet::from_hex(DEV_KEY).unwrap();

        let ctx = context("testnetA", MockChain::default(), Some(owner.clone()));
        let summary = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();
        assert_eq!(summary.applied(), 2);
        assert_eq!(ctx.chain.submissions(), 2);

        let ctx = context("testnetA", MockChain::default(), Some(owner));
        let summary = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();
        assert_eq!(summary.applied(), 0);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(ctx.chain.submissions(), 0);
    }

    #[tokio::test]
    async fn test_address_mismatch_submits_nothing() {
        let fixture = Fixture::new();
        let mut tampered = mined_registry();
        tampered["contractAddress"] = json!("0x8888000000000000000000000000000000000001");
        fixture.write("01_registry.json", json!([tampered]));

        let ctx = context("testnetA", MockChain::default(), None);
        let err = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::AddressMismatch { name, .. }) if name == "Registry"
        ));
        assert!(format!("{err:#}").contains("testnetA"));
        assert_eq!(ctx.chain.submissions(), 0);
        assert!(fixture.read("01_registry.json")[0].get("deployments").is_none());
    }

    #[tokio::test]
    async fn test_unknown_root_is_never_replaced_by_default() {
        let fixture = Fixture::new();
        let mut registry = mined_registry();
        registry["name"] = json!("Root");
        fixture.write(
            "01_registry.json",
            json!([
                registry,
                {
                    "type": "root",
                    "root": "<GovernanceRoot>",
                    "target": "<Root>",
                    "functionSignature": "lock()"
                }
            ]),
        );
        let owner = LocalWallet::from_hex(DEV_KEY).unwrap();

        let ctx = context("testnetA", MockChain::default(), Some(owner));
        let err = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("<GovernanceRoot>"));
        assert!(ctx.chain.executions.lock().unwrap().is_empty());
        let written = fixture.read("01_registry.json");
        assert!(written[1].get("deployments").is_none());
        assert!(written[1].get("signature").is_none());
    }

    #[tokio::test]
    async fn test_rewrite_keeps_unknown_keys_and_checksums() {
        let fixture = Fixture::new();
        let mut registry = mined_registry();
        registry["comment"] = json!("keep me");
        let mut call = root_call();
        call["notes"] = json!({ "ticket": 42 });
        fixture.write("01_registry.json", json!([registry, call]));
        let owner = LocalWallet::from_hex(DEV_KEY).unwrap();

        let ctx = context("testnetA", MockChain::default(), Some(owner));
        DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();

        let written = fixture.read("01_registry.json");
        let address = create2::compute_address(
            IMMUTABLE_CREATE2_FACTORY,
            salt_from_suffix([7; 12]),
            &BYTECODE,
        );
        assert_eq!(written[0]["comment"], "keep me");
        assert_eq!(written[1]["notes"], json!({ "ticket": 42 }));
        assert_eq!(written[0]["contractAddress"], json!(address.to_checksum(None)));
        assert_eq!(
            written[0]["deployments"][0]["contractAddress"],
            json!(address.to_checksum(None))
        );
        assert_eq!(written[1]["target"], "<Registry>");
    }

    #[tokio::test]
    async fn test_unmined_deployment_is_rejected() {
        let fixture = Fixture::new();
        let mut unmined = mined_registry();
        unmined["salt"] = Value::Null;
        unmined["contractAddress"] = json!("");
        fixture.write("01_registry.json", json!([unmined]));

        let ctx = context("testnetA", MockChain::default(), None);
        let err = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::NotMined { .. })
        ));
        assert_eq!(ctx.chain.submissions(), 0);
    }

    #[tokio::test]
    async fn test_root_call_persists_signature_and_placeholders() {
        let fixture = Fixture::new();
        fixture.write("01_registry.json", json!([mined_registry(), root_call()]));
        let owner = LocalWallet::from_hex(DEV_KEY).unwrap();
        let chain = MockChain {
            nonce: 3,
            ..Default::default()
        };

        let ctx = context("testnetA", chain, Some(owner.clone()));
        DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();

        let registry = create2::compute_address(
            IMMUTABLE_CREATE2_FACTORY,
            salt_from_suffix([7; 12]),
            &BYTECODE,
        );
        let executions = ctx.chain.executions.lock().unwrap();
        let (root, target, call_data, signature) = &executions[0];
        assert_eq!(*root, registry);
        assert_eq!(*target, registry);
        assert_eq!(
            *call_data,
            abi::encode_call(
                "setController(address,bool)",
                &[json!("0x8888112e21A42eAAD5DD2e9eDcE4BfD8327dAa6A"), json!(true)]
            )
            .unwrap()
        );
        let call = RootCall {
            root: registry,
            target: registry,
            call_data: call_data.clone(),
            nonce: U256::from(3),
        };
        assert_eq!(*signature, call.sign(&owner).unwrap());

        let persisted = fixture.read("01_registry.json");
        assert_eq!(persisted[1]["target"], "<Registry>");
        assert_eq!(persisted[1]["args"][0], "<OPERATOR>");
        assert_eq!(persisted[1]["signature"], json!(signature));
        assert_eq!(persisted[1]["deployments"][0]["network"], "testnetA");
        assert_eq!(persisted[0]["deployments"][0]["network"], "testnetA");
    }

    #[tokio::test]
    async fn test_stored_signature_is_reused_without_owner_key() {
        let fixture = Fixture::new();
        fixture.write("01_registry.json", json!([mined_registry(), root_call()]));
        let owner = LocalWallet::from_hex(DEV_KEY).unwrap();

        let ctx = context("testnetA", MockChain::default(), Some(owner));
        DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();
        let stored = ctx.chain.executions.lock().unwrap()[0].3.clone();

        let ctx = context("testnetB", MockChain::default(), None);
        DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();

        assert_eq!(ctx.chain.executions.lock().unwrap()[0].3, stored);
        assert_eq!(
            fixture.read("01_registry.json")[1]["deployments"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_stored_signature_for_other_nonce_is_rejected() {
        let fixture = Fixture::new();
        fixture.write("01_registry.json", json!([mined_registry(), root_call()]));
        let owner = LocalWallet::from_hex(DEV_KEY).unwrap();

        let ctx = context("testnetA", MockChain::default(), Some(owner));
        DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();

        let chain = MockChain {
            nonce: 1,
            ..Default::default()
        };
        let ctx = context("testnetB", chain, None);
        let err = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::SignatureMismatch { .. })
        ));
        // The deployment went through before the root call failed.
        assert_eq!(ctx.chain.deployments.lock().unwrap().len(), 1);
        assert!(ctx.chain.executions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_root_call_without_key_or_signature() {
        let fixture = Fixture::new();
        fixture.write("01_registry.json", json!([mined_registry(), root_call()]));

        let ctx = context("testnetA", MockChain::default(), None);
        let err = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::MissingSigningKey { .. })
        ));

        // The deployment before it stays recorded.
        let persisted = fixture.read("01_registry.json");
        assert_eq!(persisted[0]["deployments"][0]["network"], "testnetA");
        assert!(persisted[1].get("deployments").is_none());
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_unknown_placeholder() {
        let fixture = Fixture::new();
        let mut call = root_call();
        call["args"] = json!(["<Resolver>", true]);
        fixture.write("01_registry.json", json!([mined_registry(), call]));
        let owner = LocalWallet::from_hex(DEV_KEY).unwrap();

        let ctx = context("testnetA", MockChain::default(), Some(owner.clone()));
        let err = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .with_strict_placeholders(true)
            .run(&fixture.deployments())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::UnresolvedPlaceholder { names, .. }) if names == &vec!["Resolver".to_string()]
        ));
        assert!(ctx.chain.executions.lock().unwrap().is_empty());

        // Permissive mode substitutes null, which still cannot be encoded.
        let ctx = context("testnetA", MockChain::default(), Some(owner));
        let err = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::ArgumentEncoding { .. })
        ));
    }

    #[tokio::test]
    async fn test_ephemeral_network_leaves_files_untouched() {
        let fixture = Fixture::new();
        fixture.write("01_registry.json", json!([mined_registry()]));
        let before = fixture.read("01_registry.json");

        let mut ctx = context("hardhat", MockChain::default(), None);
        ctx.persist = false;
        let summary = DeploymentOrchestrator::new(&ctx, &fixture.store)
            .run(&fixture.deployments())
            .await
            .unwrap();

        assert_eq!(summary.applied(), 1);
        assert_eq!(fixture.read("01_registry.json"), before);
    }

    #[test]
    fn test_resolve_address() {
        let mut table = SymbolTable::new();
        table.insert("Root", "0x8888000000000000000000000000000000000001");

        assert_eq!(
            resolve_address(&table, "root", "<Root>").unwrap(),
            address!("8888000000000000000000000000000000000001")
        );
        assert_eq!(
            resolve_address(&table, "target", "0x8888000000000000000000000000000000000002").unwrap(),
            address!("8888000000000000000000000000000000000002")
        );
        assert!(resolve_address(&table, "target", "<Missing>").is_err());
        assert!(resolve_address(&table, "target", "nope").is_err());
    }
}
