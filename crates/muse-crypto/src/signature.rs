//! Compact recoverable signatures.
//!
//! The node only accepts "canonical" signatures: neither `r` nor `s` may
//! have its high bit set, and neither may carry a redundant leading zero
//! byte. Signing retries with fresh RFC 6979 nonces (via the additional-data
//! input) until the result qualifies.

use std::fmt;

use ecdsa::hazmat::SignPrimitive;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::{FieldBytes, Scalar};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;

use muse_types::Pack;

use crate::error::CryptoError;
use crate::keys::{PrivateKey, PublicKey};

/// Serialized length: recovery byte plus `r ‖ s`.
pub const COMPACT_SIGNATURE_LEN: usize = 65;

/// Recovery byte offset for compressed keys (27 + 4).
const COMPACT_HEADER: u8 = 31;

/// Upper bound on nonce attempts before giving up.
const MAX_ATTEMPTS: u32 = 1024;

/// A 65-byte compact signature: `recovery_byte ‖ r ‖ s`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactSignature([u8; COMPACT_SIGNATURE_LEN]);

impl CompactSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != COMPACT_SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                COMPACT_SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let mut sig = [0u8; COMPACT_SIGNATURE_LEN];
        sig.copy_from_slice(bytes);
        Ok(Self(sig))
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; COMPACT_SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether the node would accept this signature's `r` and `s` encoding.
    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.0)
    }

    fn recovery_id(&self) -> Result<RecoveryId, CryptoError> {
        let header = self.0[0];
        if !(27..=34).contains(&header) {
            return Err(CryptoError::InvalidSignature(format!(
                "bad recovery byte {}",
                header
            )));
        }
        let id = (header - 27) & 3;
        RecoveryId::from_byte(id)
            .ok_or_else(|| CryptoError::InvalidSignature(format!("bad recovery id {}", id)))
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature({})", self.to_hex())
    }
}

impl fmt::Display for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Pack for CompactSignature {
    fn pack(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
}

impl Serialize for CompactSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CompactSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

fn is_canonical(c: &[u8; COMPACT_SIGNATURE_LEN]) -> bool {
    c[1] & 0x80 == 0
        && !(c[1] == 0 && c[2] & 0x80 == 0)
        && c[33] & 0x80 == 0
        && !(c[33] == 0 && c[34] & 0x80 == 0)
}

/// Sign a 32-byte digest, producing a canonical compact signature.
pub fn sign_digest_canonical(key: &PrivateKey, digest: &[u8; 32]) -> Result<CompactSignature, CryptoError> {
    let scalar: &Scalar = key.signing_key().as_nonzero_scalar().as_ref();
    let z = FieldBytes::from(*digest);

    for attempt in 0..MAX_ATTEMPTS {
        let ad: Vec<u8> = if attempt == 0 {
            Vec::new()
        } else {
            attempt.to_le_bytes().to_vec()
        };
        let (sig, recid): (Signature, Option<RecoveryId>) = scalar
            .try_sign_prehashed_rfc6979::<Sha256>(&z, &ad)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        let recid = recid.ok_or_else(|| CryptoError::Signing("no recovery id".to_string()))?;

        let mut compact = [0u8; COMPACT_SIGNATURE_LEN];
        compact[0] = COMPACT_HEADER + recid.to_byte();
        compact[1..].copy_from_slice(&sig.to_bytes());
        if is_canonical(&compact) {
            return Ok(CompactSignature(compact));
        }
    }

    Err(CryptoError::Signing(format!(
        "no canonical signature after {} attempts",
        MAX_ATTEMPTS
    )))
}

/// Recover the public key that produced `sig` over `digest`.
pub fn recover_public_key(digest: &[u8; 32], sig: &CompactSignature) -> Result<PublicKey, CryptoError> {
    let recid = sig.recovery_id()?;
    let signature = Signature::from_slice(&sig.0[1..])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let vk = VerifyingKey::recover_from_prehash(digest, &signature, recid)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Ok(PublicKey::from_verifying_key(&vk))
}

/// Whether `sig` over `digest` was made by `key`.
pub fn verify(digest: &[u8; 32], sig: &CompactSignature, key: &PublicKey) -> bool {
    matches!(recover_public_key(digest, sig), Ok(recovered) if recovered == *key)
}
