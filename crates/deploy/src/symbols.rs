//! Named values that action files reference through `<Name>` placeholders.

use std::collections::BTreeMap;

use alloy_core::primitives::Address;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;

/// Symbol of the account that signs deployment transactions.
pub const DEPLOYER: &str = "DEPLOYER";
/// Symbol of the operator account.
pub const OPERATOR: &str = "OPERATOR";
/// Symbol of the owner account, the signer of root calls.
pub const OWNER: &str = "OWNER";
/// Symbol holding the name of the network being run.
pub const CHAIN_NAME: &str = "CHAIN_NAME";
/// Symbol holding the numeric chain id of the network being run.
pub const CHAIN_ID: &str = "CHAIN_ID";

/// Well-known role addresses seeded into every table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
}

/// Mapping from logical names to resolved values.
///
/// Lives for one run only: it is rebuilt from role constants and the action files
/// themselves every time, and grows as deployments are recorded.
#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct SymbolTable(BTreeMap<String, Value>);

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with the role addresses that are known.
    pub fn with_roles(roles: &Roles) -> Self {
        let mut table = Self::new();
        for (name, address) in [
            (DEPLOYER, roles.deployer),
            (OPERATOR, roles.operator),
            (OWNER, roles.owner),
        ] {
            if let Some(address) = address {
                table.insert_address(name, address);
            }
        }
        table
    }

    /// Seed a table for a run against a specific network.
    pub fn for_network(roles: &Roles, network: &str, chain_id: u64) -> Self {
        let mut table = Self::with_roles(roles);
        table.insert(CHAIN_NAME, network);
        table.insert(CHAIN_ID, chain_id);
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Record an address under `name` in its checksummed form.
    pub fn insert_address(&mut self, name: impl Into<String>, address: Address) {
        self.insert(name, address.to_checksum(None));
    }

    /// Look up `name` and parse it as an address.
    pub fn address(&self, name: &str) -> Option<Address> {
        self.0.get(name)?.as_str()?.parse().ok()
    }

    /// Register every declared deployment address of an action list.
    ///
    /// Deployments without a declared address are left out, so references to them stay
    /// unresolved until they have been mined.
    pub fn record_declared(&mut self, actions: &[Action]) {
        for action in actions {
            if let Action::Deployment(deployment) = action {
                if let Some(address) = deployment.contract_address {
                    self.insert_address(deployment.name.clone(), address);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::address;

    #[test]
    fn test_with_roles_seeds_known_roles_only() {
        let roles = Roles {
            deployer: Some(address!("888811ac3dc01628ebd22b1aa01a35825ad997e8")),
            operator: None,
            owner: Some(address!("88881111a0358cdf10bc095aa14b95936ada741f")),
        };

        let table = SymbolTable::with_roles(&roles);

        assert_eq!(
            table.get(DEPLOYER),
            Some(&Value::from("0x888811AC3DC01628eBD22b1Aa01a35825aD997e8"))
        );
        assert!(table.get(OPERATOR).is_none());
        assert_eq!(table.address(OWNER), roles.owner);
    }

    #[test]
    fn test_for_network_adds_chain_constants() {
        let table = SymbolTable::for_network(&Roles::default(), "testnetA", 5);

        assert_eq!(table.get(CHAIN_NAME), Some(&Value::from("testnetA")));
        assert_eq!(table.get(CHAIN_ID), Some(&Value::from(5u64)));
        assert!(table.address(CHAIN_NAME).is_none());
    }

    #[test]
    fn test_record_declared_skips_unmined() {
        let actions: Vec<Action> = serde_json::from_value(serde_json::json!([
            {
                "type": "deployment",
                "name": "Root",
                "artifact": "root/Root.sol",
                "constructorArguments": [],
                "leading": "8888",
                "salt": "0x0000000000000000000000000000000000000000a1b2c3d4e5f60718293a4b5c",
                "contractAddress": "0x8888000000000000000000000000000000000001"
            },
            {
                "type": "deployment",
                "name": "Registry",
                "artifact": "Registry.sol/Registry",
                "constructorArguments": ["<Root>"],
                "leading": "abc",
                "salt": null,
                "contractAddress": null
            }
        ]))
        .unwrap();

        let mut table = SymbolTable::new();
        table.record_declared(&actions);

        assert_eq!(
            table.address("Root"),
            Some(address!("8888000000000000000000000000000000000001"))
        );
        assert!(table.get("Registry").is_none());
    }
}
