//! Authorization of privileged calls through the root contract.
//!
//! The root contract executes a call only with an owner signature over
//! `keccak256(0x19 ++ 0x00 ++ root ++ topic ++ nonce ++ keccak256(target ++ callData))`.
//! The root's own address and its monotonic nonce are both bound into the digest.

use alloy_core::primitives::{Address, B256, Bytes, U256, keccak256};
use strum::{Display, EnumIter};

use crate::{
    DeployError,
    wallet::{self, LocalWallet},
};

/// Category of an authorized root operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RootTopic {
    #[strum(to_string = "Root.lock")]
    Lock,
    #[strum(to_string = "Root.execute")]
    Execute,
    #[strum(to_string = "Root.transferOwnership")]
    TransferOwnership,
    #[strum(to_string = "Root.setController")]
    SetController,
}

impl RootTopic {
    /// The 32-byte tag bound into the digest.
    pub fn tag(&self) -> B256 {
        keccak256(self.to_string())
    }
}

/// `keccak256(target ++ callData)`.
pub fn payload_hash(target: Address, call_data: &[u8]) -> B256 {
    let mut payload = Vec::with_capacity(20 + call_data.len());
    payload.extend_from_slice(target.as_slice());
    payload.extend_from_slice(call_data);
    keccak256(payload)
}

/// The digest the owner signs for one root operation.
pub fn build_digest(root: Address, topic: B256, nonce: U256, payload_hash: B256) -> B256 {
    let mut preimage = [0u8; 2 + 20 + 32 + 32 + 32];
    preimage[0] = 0x19;
    preimage[1] = 0x00;
    preimage[2..22].copy_from_slice(root.as_slice());
    preimage[22..54].copy_from_slice(topic.as_slice());
    preimage[54..86].copy_from_slice(&nonce.to_be_bytes::<32>());
    preimage[86..118].copy_from_slice(payload_hash.as_slice());
    keccak256(preimage)
}

/// A resolved call to run through the root contract's `execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCall {
    pub root: Address,
    pub target: Address,
    pub call_data: Bytes,
    pub nonce: U256,
}

impl RootCall {
    pub fn digest(&self) -> B256 {
        build_digest(
            self.root,
            RootTopic::Execute.tag(),
            self.nonce,
            payload_hash(self.target, &self.call_data),
        )
    }

    pub fn sign(&self, owner: &LocalWallet) -> anyhow::Result<Bytes> {
        Ok(Bytes::copy_from_slice(&owner.sign_digest(self.digest())?))
    }

    /// Pick the signature that authorizes this call.
    ///
    /// A present owner key always signs afresh. Without one, a previously stored
    /// signature is reused if it recovers to `expected_owner` for this digest.
    pub fn authorize(
        &self,
        owner: Option<&LocalWallet>,
        stored: Option<&Bytes>,
        expected_owner: Option<Address>,
    ) -> anyhow::Result<Bytes> {
        if let Some(owner) = owner {
            return self.sign(owner);
        }

        let Some(signature) = stored else {
            return Err(DeployError::MissingSigningKey {
                target: self.target.to_checksum(None),
            }
            .into());
        };

        let recovered = wallet::recover_signer(self.digest(), signature)?;
        match expected_owner {
            Some(expected) if recovered != expected => Err(DeployError::SignatureMismatch {
                target: self.target.to_checksum(None),
                recovered,
                expected,
            }
            .into()),
            Some(_) => Ok(signature.clone()),
            None => {
                tracing::warn!(
                    signer = %recovered,
                    "No owner address configured, reusing stored signature unchecked"
                );
                Ok(signature.clone())
            }
        }
    }
}
