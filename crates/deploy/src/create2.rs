//! CREATE2 address derivation.
//!
//! `address = keccak256(0xff ++ factory ++ salt ++ keccak256(init_code))[12..]`
//!
//! The result depends on nothing but its three inputs, which is what makes a deployment
//! land on the same address on every chain where the factory lives at the same address.

use alloy_core::primitives::{Address, B256, address, keccak256};

/// The immutable CREATE2 factory, deployed at the same address on most EVM chains.
///
/// Its `safeCreate2` only accepts salts whose first 20 bytes are zero or equal to the
/// caller's address.
pub const IMMUTABLE_CREATE2_FACTORY: Address = address!("0000000000ffe8b47b3e2130213b802212439497");

/// Compute the CREATE2 address for `init_code` deployed by `factory` with `salt`.
pub fn compute_address(factory: Address, salt: B256, init_code: &[u8]) -> Address {
    compute_address_from_hash(factory, salt, keccak256(init_code))
}

/// Same as [`compute_address`] with the init code hash precomputed.
pub fn compute_address_from_hash(factory: Address, salt: B256, init_code_hash: B256) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(factory.as_slice());
    preimage[21..53].copy_from_slice(salt.as_slice());
    preimage[53..85].copy_from_slice(init_code_hash.as_slice());

    Address::from_slice(&keccak256(preimage)[12..])
}
