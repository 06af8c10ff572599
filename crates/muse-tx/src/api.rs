//! Collaborator interfaces consumed by the builder.
//!
//! The builder never talks to the network or to key storage directly; it
//! is handed implementations of these traits. `muse-wallet` provides the
//! RPC-backed and in-memory implementations, tests provide mocks.

use muse_crypto::{PrivateKey, PublicKey};
use muse_types::{AccountId, AssetId, Permission};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authority::Authority;
use crate::fee::FeeEntry;
use crate::ops::{AccountOptions, Operation};
use crate::transaction::{RefBlockParams, Transaction};

/// Failure reported by a collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("rejected by node: {0}")]
    Rejected(String),
}

/// Node queries needed to assemble, sign and hand off a transaction.
#[allow(async_fn_in_trait)]
pub trait NodeApi {
    /// One fee entry per operation, nested for proposals.
    async fn get_required_fees(&self, ops: &[Operation], fee_asset: AssetId) -> Result<Vec<FeeEntry>, ApiError>;

    async fn get_reference_block_params(&self) -> Result<RefBlockParams, ApiError>;

    /// Hex-encoded chain id.
    async fn get_chain_id(&self) -> Result<String, ApiError>;

    async fn broadcast(&self, tx: &Transaction) -> Result<(), ApiError>;

    async fn verify_authority(&self, tx: &Transaction) -> Result<bool, ApiError>;
}

/// An account as far as the builder cares: identity plus authorities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: AccountId,
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub options: AccountOptions,
}

impl AccountInfo {
    pub fn authority(&self, permission: Permission) -> &Authority {
        match permission {
            Permission::Owner => &self.owner,
            Permission::Active => &self.active,
        }
    }
}

/// Read-only account lookup.
#[allow(async_fn_in_trait)]
pub trait AccountLookup {
    /// Look up an account by name or by id (`1.2.x`). Unknown accounts
    /// are `Ok(None)`.
    async fn get_account(&self, name_or_id: &str) -> Result<Option<AccountInfo>, ApiError>;

    async fn get_authority(&self, name_or_id: &str, permission: Permission) -> Result<Option<Authority>, ApiError> {
        Ok(self
            .get_account(name_or_id)
            .await?
            .map(|acct| acct.authority(permission).clone()))
    }
}

/// Local private key material.
pub trait KeyStore {
    fn lookup_private_key(&self, key: &PublicKey) -> Option<PrivateKey>;

    fn list_public_keys(&self) -> Vec<PublicKey>;
}
