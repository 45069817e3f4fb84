//! Local secp256k1 keys: digest signing, signer recovery and EIP-155 legacy transactions.

use alloy_core::{
    primitives::{Address, B256, Bytes, U256, keccak256},
    rlp::{BufMut, Encodable, Header},
};
use anyhow::Context;
use k256::{
    ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};

/// Length of an `r ‖ s ‖ v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// A private key held in memory.
#[derive(Clone)]
pub struct LocalWallet {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalWallet {
    /// Parse a hex-encoded 32-byte private key, with or without `0x`.
    pub fn from_hex(key: &str) -> anyhow::Result<Self> {
        let key = key.trim();
        let bytes = hex::decode(key.strip_prefix("0x").unwrap_or(key))
            .context("Private key is not valid hex")?;
        let key = SigningKey::from_slice(&bytes).context("Invalid secp256k1 private key")?;

        Ok(Self::from_signing_key(key))
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = public_key_address(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest as `r ‖ s ‖ v` with `v = 27 + recovery id`.
    ///
    /// Nonces are deterministic (RFC 6979) and `s` is in the lower half of the curve order.
    pub fn sign_digest(&self, digest: B256) -> anyhow::Result<[u8; SIGNATURE_LEN]> {
        let (signature, recovery_id) = self.sign_prehash(digest)?;

        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }

    fn sign_prehash(&self, digest: B256) -> anyhow::Result<(Signature, RecoveryId)> {
        self.key
            .sign_prehash_recoverable(digest.as_slice())
            .context("Failed to sign digest")
    }

    /// Sign `tx` for its chain and return the raw transaction bytes.
    pub fn sign_transaction(&self, tx: &LegacyTransaction) -> anyhow::Result<Bytes> {
        let (signature, recovery_id) = self.sign_prehash(tx.signing_hash())?;
        let bytes = signature.to_bytes();

        let v = u64::from(recovery_id.to_byte()) + tx.chain_id * 2 + 35;
        let r = U256::from_be_slice(&bytes[..32]);
        let s = U256::from_be_slice(&bytes[32..]);

        Ok(tx.encode_signed(v, r, s).into())
    }
}

/// Recover the address that signed `digest`.
///
/// Accepts `v` as either `27`/`28` or a bare recovery id.
pub fn recover_signer(digest: B256, signature: &[u8]) -> anyhow::Result<Address> {
    anyhow::ensure!(
        signature.len() == SIGNATURE_LEN,
        "Signature must be {} bytes, got {}",
        SIGNATURE_LEN,
        signature.len()
    );

    let v = signature[64];
    let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })
        .with_context(|| format!("Invalid signature recovery byte {v}"))?;
    let parsed = Signature::from_slice(&signature[..64]).context("Malformed signature")?;

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &parsed, recovery_id)
        .context("Failed to recover signer")?;

    Ok(public_key_address(&key))
}

fn public_key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..])
}

/// Pre-EIP-1559 transaction, signed with EIP-155 replay protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl LegacyTransaction {
    fn fields_len(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.data.length()
    }

    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
    }

    /// Hash of `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn signing_hash(&self) -> B256 {
        let payload_length = self.fields_len() + self.chain_id.length() + 2 * 0u8.length();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        self.chain_id.encode(&mut out);
        0u8.encode(&mut out);
        0u8.encode(&mut out);

        keccak256(out)
    }

    fn encode_signed(&self, v: u64, r: U256, s: U256) -> Vec<u8> {
        let payload_length = self.fields_len() + v.length() + r.length() + s.length();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        v.encode(&mut out);
        r.encode(&mut out);
        s.encode(&mut out);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{address, b256};

    // First default account of local development nodes.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_address_from_key() {
        let wallet = LocalWallet::from_hex(DEV_KEY).unwrap();

        assert_eq!(
            wallet.address(),
            address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266")
        );
        assert!(format!("{wallet:?}").contains("address"));
        assert!(!format!("{wallet:?}").contains("ac0974be"));
    }

    #[test]
    fn test_invalid_keys() {
        assert!(LocalWallet::from_hex("0xzz").is_err());
        assert!(LocalWallet::from_hex(&format!("0x{}", "00".repeat(32))).is_err());
        assert!(LocalWallet::from_hex("0x0102").is_err());
    }

    #[test]
    fn test_sign_then_recover() {
        let wallet = LocalWallet::from_hex(DEV_KEY).unwrap();
        let digest = keccak256(b"mirror");

        let signature = wallet.sign_digest(digest).unwrap();

        assert!(signature[64] == 27 || signature[64] == 28);
        assert_eq!(recover_signer(digest, &signature).unwrap(), wallet.address());

        let mut bare = signature;
        bare[64] -= 27;
        assert_eq!(recover_signer(digest, &bare).unwrap(), wallet.address());

        assert_ne!(
            recover_signer(keccak256(b"other"), &signature).unwrap(),
            wallet.address()
        );
        assert!(recover_signer(digest, &signature[..64]).is_err());
    }

    // Example transaction from EIP-155.
    #[test]
    fn test_eip155_example() {
        let wallet = LocalWallet::from_hex(&"46".repeat(32)).unwrap();
        let tx = LegacyTransaction {
            chain_id: 1,
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: address!("3535353535353535353535353535353535353535"),
            value: U256::from(1_000_000_000_000_000_000u64),
            data: Bytes::new(),
        };

        assert_eq!(
            tx.signing_hash(),
            b256!("daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53")
        );

        let raw = wallet.sign_transaction(&tx).unwrap();

        assert_eq!(
            hex::encode(&raw),
            concat!(
                "f86c098504a817c800825208943535353535353535353535353535353535353535",
                "880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c",
                "71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc",
                "64214b297fb1966a3b6d83",
            )
        );
    }
}
