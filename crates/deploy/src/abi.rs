//! ABI encoding of JSON arguments against Solidity parameter lists.

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{Function, Param},
    primitives::Bytes,
};
use serde_json::Value;

use crate::DeployError;

/// Encode `args` as the parameter tuple described by `params`.
///
/// Strings and numbers are coerced the way Solidity literals read (`"0x…"` addresses and
/// bytes, decimal or hex integers, `true`/`false`); JSON arrays map onto array and tuple
/// types element by element.
pub fn encode_params(name: &str, params: &[Param], args: &[Value]) -> Result<Vec<u8>, DeployError> {
    let encoding_error = |reason: String| DeployError::ArgumentEncoding {
        name: name.to_string(),
        reason,
    };

    if params.len() != args.len() {
        return Err(encoding_error(format!(
            "expected {} argument(s), got {}",
            params.len(),
            args.len()
        )));
    }

    let values = params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (param, arg))| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| encoding_error(format!("argument {index}: {e}")))?;
            coerce(&ty, arg).map_err(|e| {
                encoding_error(format!("argument {index} ({}): {e}", param.ty))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// Build call data for `signature` (e.g. `setController(address,bool)`) applied to `args`.
pub fn encode_call(signature: &str, args: &[Value]) -> Result<Bytes, DeployError> {
    let function = Function::parse(signature).map_err(|e| DeployError::InvalidFunctionSignature {
        signature: signature.to_string(),
        reason: e.to_string(),
    })?;

    let mut data = function.selector().to_vec();
    data.extend(encode_params(signature, &function.inputs, args)?);

    Ok(data.into())
}

fn coerce(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (_, Value::Null) => Err("value is missing (unresolved placeholder?)".to_string()),
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {len} element(s), got {}", items.len()));
            }
            items
                .iter()
                .map(|item| coerce(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!(
                    "expected {} tuple field(s), got {}",
                    types.len(),
                    items.len()
                ));
            }
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| coerce(ty, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|e| e.to_string()),
        (_, Value::Array(_) | Value::Object(_)) => {
            Err(format!("cannot encode {value} as {}", ty.sol_type_name()))
        }
    }
}
