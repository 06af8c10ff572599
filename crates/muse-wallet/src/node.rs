//! Node adapter.
//!
//! `RpcNode` implements the builder's collaborator traits on top of the
//! JSON-RPC client, converting between the node's loosely typed JSON and
//! the builder's types. `ChainLookup` adds the few extra queries the
//! session's high-level operations need.

use muse_rpc::node::{AccountObject, AssetObject, CommitteeMemberObject, WitnessObject};
use muse_rpc::{NodeRpc, RpcError};
use muse_tx::api::{AccountInfo, AccountLookup, ApiError, NodeApi};
use muse_tx::{FeeEntry, Operation, RefBlockParams, Transaction};
use muse_types::{AccountId, AssetId, CommitteeMemberId, ProposalId, VoteId, WitnessId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::MuseConfig;
use crate::WalletError;

/// Asset identity and display precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub id: AssetId,
    pub symbol: String,
    pub precision: u8,
}

/// Lookups used by the high-level operations, beyond what the builder needs.
#[allow(async_fn_in_trait)]
pub trait ChainLookup {
    /// Vote id of a witness, given its account (name or id) or witness id.
    async fn get_witness_vote(&self, witness: &str) -> Result<Option<VoteId>, ApiError>;

    /// Vote id of a committee member, given its account or member id.
    async fn get_committee_vote(&self, member: &str) -> Result<Option<VoteId>, ApiError>;

    /// An asset by symbol or id (`1.3.x`).
    async fn get_asset(&self, symbol_or_id: &str) -> Result<Option<AssetInfo>, ApiError>;

    async fn proposal_exists(&self, id: ProposalId) -> Result<bool, ApiError>;
}

/// JSON-RPC backed node.
pub struct RpcNode {
    rpc: NodeRpc,
    chain_id: OnceCell<String>,
}

impl RpcNode {
    pub fn new(rpc: NodeRpc) -> Self {
        Self {
            rpc,
            chain_id: OnceCell::new(),
        }
    }

    pub fn connect(config: &MuseConfig) -> Result<Self, WalletError> {
        Ok(Self::new(NodeRpc::with_config(config.rpc_config())?))
    }

    pub fn rpc(&self) -> &NodeRpc {
        &self.rpc
    }

    async fn object<T: DeserializeOwned>(&self, id: String) -> Result<Option<T>, ApiError> {
        let mut objects = self.rpc.get_objects(&[id.clone()]).await.map_err(api_error)?;
        match objects.pop().flatten() {
            Some(obj) => parse_field(&id, "object", obj).map(Some),
            None => Ok(None),
        }
    }

    async fn account_id(&self, name_or_id: &str) -> Result<Option<AccountId>, ApiError> {
        Ok(self.get_account(name_or_id).await?.map(|a| a.id))
    }
}

/// Classify an RPC failure: node-side errors are rejections, unparseable
/// responses are malformed, everything else never reached the node.
pub fn api_error(e: RpcError) -> ApiError {
    match e {
        RpcError::Rpc { .. } => ApiError::Rejected(e.to_string()),
        RpcError::Json { .. } => ApiError::Malformed(e.to_string()),
        _ => ApiError::Unreachable(e.to_string()),
    }
}

fn parse_field<T: DeserializeOwned>(owner: &str, field: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Malformed(format!("{} {}: {}", owner, field, e)))
}

/// Narrow a raw account object to what the builder needs.
pub fn account_info(obj: AccountObject) -> Result<AccountInfo, ApiError> {
    let AccountObject {
        id,
        name,
        owner,
        active,
        options,
        ..
    } = obj;
    Ok(AccountInfo {
        owner: parse_field(&name, "owner", owner)?,
        active: parse_field(&name, "active", active)?,
        options: parse_field(&name, "options", options)?,
        id,
        name,
    })
}

impl NodeApi for RpcNode {
    async fn get_required_fees(&self, ops: &[Operation], fee_asset: AssetId) -> Result<Vec<FeeEntry>, ApiError> {
        let ops = ops
            .iter()
            .map(Operation::to_json)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::Malformed(e.to_string()))?;
        self.rpc
            .get_required_fees(&ops, fee_asset)
            .await
            .map_err(api_error)?
            .into_iter()
            .map(|entry| parse_field("get_required_fees", "entry", entry))
            .collect()
    }

    async fn get_reference_block_params(&self) -> Result<RefBlockParams, ApiError> {
        let props = self.rpc.get_dynamic_global_properties().await.map_err(api_error)?;
        RefBlockParams::from_head(props.head_block_number, &props.head_block_id)
    }

    async fn get_chain_id(&self) -> Result<String, ApiError> {
        self.chain_id
            .get_or_try_init(|| async { self.rpc.get_chain_id().await.map_err(api_error) })
            .await
            .cloned()
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<(), ApiError> {
        let tx = serde_json::to_value(tx).map_err(|e| ApiError::Malformed(e.to_string()))?;
        self.rpc.broadcast_transaction(&tx).await.map_err(api_error)
    }

    async fn verify_authority(&self, tx: &Transaction) -> Result<bool, ApiError> {
        let tx = serde_json::to_value(tx).map_err(|e| ApiError::Malformed(e.to_string()))?;
        self.rpc.verify_authority(&tx).await.map_err(api_error)
    }
}

impl AccountLookup for RpcNode {
    async fn get_account(&self, name_or_id: &str) -> Result<Option<AccountInfo>, ApiError> {
        let obj = match name_or_id.parse::<AccountId>() {
            Ok(id) => self.rpc.get_account(id).await,
            Err(_) => self.rpc.get_account_by_name(name_or_id).await,
        }
        .map_err(api_error)?;
        obj.map(account_info).transpose()
    }
}

impl ChainLookup for RpcNode {
    async fn get_witness_vote(&self, witness: &str) -> Result<Option<VoteId>, ApiError> {
        let obj: Option<WitnessObject> = match witness.parse::<WitnessId>() {
            Ok(id) => self.object(id.to_string()).await?,
            Err(_) => match self.account_id(witness).await? {
                Some(account) => self.rpc.get_witness_by_account(account).await.map_err(api_error)?,
                None => None,
            },
        };
        Ok(obj.map(|w| w.vote_id))
    }

    async fn get_committee_vote(&self, member: &str) -> Result<Option<VoteId>, ApiError> {
        let obj: Option<CommitteeMemberObject> = match member.parse::<CommitteeMemberId>() {
            Ok(id) => self.object(id.to_string()).await?,
            Err(_) => match self.account_id(member).await? {
                Some(account) => self
                    .rpc
                    .get_committee_member_by_account(account)
                    .await
                    .map_err(api_error)?,
                None => None,
            },
        };
        Ok(obj.map(|c| c.vote_id))
    }

    async fn get_asset(&self, symbol_or_id: &str) -> Result<Option<AssetInfo>, ApiError> {
        let obj: Option<AssetObject> = match symbol_or_id.parse::<AssetId>() {
            Ok(id) => self.object(id.to_string()).await?,
            Err(_) => self
                .rpc
                .lookup_asset_symbols(&[symbol_or_id])
                .await
                .map_err(api_error)?
                .pop()
                .flatten(),
        };
        Ok(obj.map(|a| AssetInfo {
            id: a.id,
            symbol: a.symbol,
            precision: a.precision,
        }))
    }

    async fn proposal_exists(&self, id: ProposalId) -> Result<bool, ApiError> {
        let obj: Option<Value> = self.object(id.to_string()).await?;
        Ok(obj.is_some())
    }
}
