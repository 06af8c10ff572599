//! The transaction envelope and its signing digest.

use muse_crypto::hash::sha256;
use muse_crypto::CompactSignature;
use muse_types::{Extensions, Pack, TimePointSec};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::ops::Operation;

/// Reference block binding for replay protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefBlockParams {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
}

impl RefBlockParams {
    /// Derive the binding from the head block: the low 16 bits of its
    /// number, and bytes 4..8 of its id read little-endian.
    pub fn from_head(head_block_number: u32, head_block_id: &str) -> Result<Self, ApiError> {
        let id = hex::decode(head_block_id)
            .map_err(|e| ApiError::Malformed(format!("head_block_id {}: {}", head_block_id, e)))?;
        if id.len() < 8 {
            return Err(ApiError::Malformed(format!(
                "head_block_id {} is too short",
                head_block_id
            )));
        }
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&id[4..8]);
        Ok(Self {
            ref_block_num: (head_block_number & 0xFFFF) as u16,
            ref_block_prefix: u32::from_le_bytes(prefix),
        })
    }
}

/// Parse a hex chain id.
pub fn parse_chain_id(chain_id: &str) -> Result<[u8; 32], ApiError> {
    let bytes = hex::decode(chain_id).map_err(|e| ApiError::Malformed(format!("chain id: {}", e)))?;
    if bytes.len() != 32 {
        return Err(ApiError::Malformed(format!(
            "chain id must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: TimePointSec,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub extensions: Extensions,
    #[serde(default)]
    pub signatures: Vec<CompactSignature>,
}

impl Transaction {
    pub fn new(block: RefBlockParams, expiration: TimePointSec, operations: Vec<Operation>) -> Self {
        Self {
            ref_block_num: block.ref_block_num,
            ref_block_prefix: block.ref_block_prefix,
            expiration,
            operations,
            extensions: Extensions,
            signatures: Vec::new(),
        }
    }

    /// The digest every signature commits to: `sha256(chain_id ‖ packed)`.
    pub fn digest(&self, chain_id: &[u8; 32]) -> [u8; 32] {
        let mut buf = chain_id.to_vec();
        self.pack(&mut buf);
        sha256(&buf)
    }

    /// Transaction id: the first 20 bytes of `sha256(packed)`, hex.
    pub fn id(&self) -> String {
        hex::encode(&sha256(&self.to_packed())[..20])
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }
}

/// Signatures are not part of the packed form.
impl Pack for Transaction {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.ref_block_num.pack(buf);
        self.ref_block_prefix.pack(buf);
        self.expiration.pack(buf);
        self.operations.pack(buf);
        self.extensions.pack(buf);
    }
}
