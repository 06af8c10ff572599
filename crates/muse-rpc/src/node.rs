//! Node RPC client.
//!
//! Typed async methods for the database and broadcast endpoints the
//! transaction tooling relies on: chain state for reference blocks, fee
//! schedules, account/asset/witness lookups, authority verification and
//! broadcasting.
//!
//! Authorities and operations are passed through as JSON: their typed form
//! lives in `muse-tx`, which sits above this crate.

use crate::apis::{DATABASE, NETWORK_BROADCAST};
use crate::client::{RpcClient, RpcConfig};
use crate::error::RpcError;
use muse_types::{AccountId, AssetId, CommitteeMemberId, ProposalId, TimePointSec, VoteId, WitnessId};
use serde::Deserialize;
use serde_json::{json, Value};

// =============================================================================
// Response Types
// =============================================================================

/// `get_dynamic_global_properties` response.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u32,
    /// Hex-encoded 20-byte block id.
    pub head_block_id: String,
    pub time: TimePointSec,
    #[serde(default)]
    pub last_irreversible_block_num: u32,
    /// Catch-all for additional fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Account object.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountObject {
    pub id: AccountId,
    pub name: String,
    /// Owner authority, as the node encodes it.
    pub owner: Value,
    /// Active authority, as the node encodes it.
    pub active: Value,
    /// Memo key, voting account and votes.
    pub options: Value,
    #[serde(default)]
    pub registrar: Option<AccountId>,
    #[serde(default)]
    pub referrer: Option<AccountId>,
    #[serde(default)]
    pub lifetime_referrer: Option<AccountId>,
    #[serde(default)]
    pub membership_expiration_date: Option<TimePointSec>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Asset object.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub id: AssetId,
    pub symbol: String,
    pub precision: u8,
    #[serde(default)]
    pub issuer: Option<AccountId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Witness object.
#[derive(Debug, Clone, Deserialize)]
pub struct WitnessObject {
    pub id: WitnessId,
    pub witness_account: AccountId,
    pub vote_id: VoteId,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Committee member object.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitteeMemberObject {
    pub id: CommitteeMemberId,
    pub committee_member_account: AccountId,
    pub vote_id: VoteId,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Pending proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalObject {
    pub id: ProposalId,
    pub expiration_time: TimePointSec,
    #[serde(default)]
    pub review_period_time: Option<TimePointSec>,
    pub proposed_transaction: Value,
    #[serde(default)]
    pub required_active_approvals: Vec<AccountId>,
    #[serde(default)]
    pub available_active_approvals: Vec<AccountId>,
    #[serde(default)]
    pub required_owner_approvals: Vec<AccountId>,
    #[serde(default)]
    pub available_owner_approvals: Vec<AccountId>,
    #[serde(default)]
    pub available_key_approvals: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// =============================================================================
// NodeRpc
// =============================================================================

/// Typed client for a Muse node.
pub struct NodeRpc {
    client: RpcClient,
}

impl NodeRpc {
    /// Create a node client connected to the given URL.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::new(url)?,
        })
    }

    /// Create with full configuration.
    pub fn with_config(config: RpcConfig) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::with_config(config)?,
        })
    }

    /// Get the underlying RPC client for custom calls.
    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    // =========================================================================
    // Chain State
    // =========================================================================

    pub async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, RpcError> {
        self.client
            .call_typed(DATABASE, "get_dynamic_global_properties", json!([]))
            .await
    }

    /// Hex chain id, the signing domain separator.
    pub async fn get_chain_id(&self) -> Result<String, RpcError> {
        self.client.call_typed(DATABASE, "get_chain_id", json!([])).await
    }

    /// Fees for `ops` (JSON operations) paid in `asset`.
    ///
    /// One entry per operation; a proposal's entry is `[fee, [nested...]]`.
    pub async fn get_required_fees(&self, ops: &[Value], asset: AssetId) -> Result<Vec<Value>, RpcError> {
        self.client
            .call_typed(DATABASE, "get_required_fees", json!([ops, asset]))
            .await
    }

    /// Raw objects by id; unknown ids come back as `None`.
    pub async fn get_objects(&self, ids: &[String]) -> Result<Vec<Option<Value>>, RpcError> {
        self.client.call_typed(DATABASE, "get_objects", json!([ids])).await
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn get_account_by_name(&self, name: &str) -> Result<Option<AccountObject>, RpcError> {
        self.client
            .call_typed(DATABASE, "get_account_by_name", json!([name]))
            .await
    }

    /// Fetch an account by id (`1.2.x`).
    pub async fn get_account(&self, id: AccountId) -> Result<Option<AccountObject>, RpcError> {
        let mut objects = self.get_objects(&[id.to_string()]).await?;
        match objects.pop().flatten() {
            Some(obj) => serde_json::from_value(obj)
                .map(Some)
                .map_err(|e| RpcError::Json {
                    context: format!("account {}", id),
                    source: e,
                }),
            None => Ok(None),
        }
    }

    pub async fn lookup_asset_symbols(&self, symbols: &[&str]) -> Result<Vec<Option<AssetObject>>, RpcError> {
        self.client
            .call_typed(DATABASE, "lookup_asset_symbols", json!([symbols]))
            .await
    }

    pub async fn get_witness_by_account(&self, account: AccountId) -> Result<Option<WitnessObject>, RpcError> {
        self.client
            .call_typed(DATABASE, "get_witness_by_account", json!([account]))
            .await
    }

    pub async fn get_committee_member_by_account(
        &self,
        account: AccountId,
    ) -> Result<Option<CommitteeMemberObject>, RpcError> {
        self.client
            .call_typed(DATABASE, "get_committee_member_by_account", json!([account]))
            .await
    }

    /// Proposals that `account` is involved in.
    pub async fn get_proposed_transactions(&self, account: AccountId) -> Result<Vec<ProposalObject>, RpcError> {
        self.client
            .call_typed(DATABASE, "get_proposed_transactions", json!([account]))
            .await
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Whether the signatures on `tx` satisfy every authority it requires.
    ///
    /// The node reports an unsatisfied authority as an error, which is
    /// mapped to `false` here.
    pub async fn verify_authority(&self, tx: &Value) -> Result<bool, RpcError> {
        match self.client.call(DATABASE, "verify_authority", json!([tx])).await {
            Ok(v) => Ok(v.as_bool().unwrap_or(true)),
            Err(e) if e.is_rejection() => {
                log::debug!("verify_authority rejected: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn broadcast_transaction(&self, tx: &Value) -> Result<(), RpcError> {
        log::info!("broadcasting transaction to {}", self.client.url());
        self.client
            .call(NETWORK_BROADCAST, "broadcast_transaction", json!([tx]))
            .await?;
        Ok(())
    }
}
