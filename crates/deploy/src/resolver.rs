//! Placeholder substitution over JSON value trees.
//!
//! A string of the form `<Name>` is replaced by the value recorded under `Name` in the
//! [`SymbolTable`]. The walk is a pure transform: the input tree is never mutated, so the
//! caller keeps the symbolic form around for persisting.

use serde_json::{Map, Value};

use crate::symbols::SymbolTable;

/// Output of a resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The tree with every known placeholder substituted.
    pub value: Value,
    /// Names referenced by placeholders that the table does not know, in walk order.
    ///
    /// Each of them was replaced by `null`.
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Return the referenced name if `s` is a `<Name>` placeholder.
pub fn placeholder_name(s: &str) -> Option<&str> {
    s.strip_prefix('<')?
        .strip_suffix('>')
        .filter(|name| !name.is_empty())
}

/// Substitute every placeholder in `node` using `table`.
pub fn resolve(table: &SymbolTable, node: &Value) -> Resolution {
    let mut missing = Vec::new();
    let value = resolve_node(table, node, &mut missing);
    Resolution { value, missing }
}

fn resolve_node(table: &SymbolTable, node: &Value, missing: &mut Vec<String>) -> Value {
    match node {
        Value::String(s) => match placeholder_name(s) {
            Some(name) => match table.get(name) {
                Some(value) => value.clone(),
                None => {
                    missing.push(name.to_string());
                    Value::Null
                }
            },
            None => node.clone(),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_node(table, item, missing))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), resolve_node(table, value, missing)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => node.clone(),
    }
}
