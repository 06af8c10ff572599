//! Transaction builder.
//!
//! Buffers operations and signing keys, then runs one
//! assemble → sign → broadcast cycle against the node and key store it was
//! handed. The lifecycle is an explicit state machine:
//!
//! ```text
//! Empty ──append_op──▶ Accumulating ──construct──▶ Assembled ──sign──▶ Signed ──broadcast──▶ Empty
//!                           │                          │
//!                           └──add_signing_information─┴──▶ Partial
//! ```
//!
//! A failed broadcast leaves the builder `Signed` so the caller can retry
//! just the hand-off. `Partial` is the offline branch: the transaction is
//! exported together with the information an external signer needs.

use std::sync::Arc;

use muse_crypto::PrivateKey;
use muse_types::constants::{DEFAULT_AUTHORITY_DEPTH, DEFAULT_EXPIRATION_SECS, DEFAULT_PROPOSAL_EXPIRATION_SECS};
use muse_types::{AssetId, Permission, TimePointSec};

use crate::api::{AccountLookup, KeyStore, NodeApi};
use crate::fee::apply_fees;
use crate::offline::{collect_signing_info, PartialTransaction, SigningInfo};
use crate::ops::Operation;
use crate::proposal::{wrap_in_proposal, ProposalConfig};
use crate::resolve::{AuthorityResolver, ResolvedKeys};
use crate::sign::sign_transaction;
use crate::transaction::{parse_chain_id, Transaction};
use crate::TxError;

/// Settings the builder needs for one assembly cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Seconds from assembly until the transaction expires.
    pub expiration_secs: u32,
    /// Name or id of the proposing account. When set, every assembled
    /// transaction carries its operations inside one `proposal_create`.
    pub proposer: Option<String>,
    pub proposal_expiration_secs: u32,
    pub proposal_review_period: Option<u32>,
    /// Asset the node should quote fees in.
    pub fee_asset: AssetId,
    /// Levels of co-signing accounts explored below the signing account.
    pub authority_depth: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            proposer: None,
            proposal_expiration_secs: DEFAULT_PROPOSAL_EXPIRATION_SECS,
            proposal_review_period: None,
            fee_asset: AssetId::CORE,
            authority_depth: DEFAULT_AUTHORITY_DEPTH,
        }
    }
}

/// Where the builder is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Empty,
    Accumulating,
    Assembled,
    Signed,
    Partial,
}

/// A registered signer and the keys resolved for it.
#[derive(Debug, Clone)]
struct Requirement {
    account: String,
    permission: Permission,
    resolved: ResolvedKeys,
}

pub struct TransactionBuilder<N, K> {
    node: Arc<N>,
    keys: Arc<K>,
    config: BuilderConfig,
    state: BuilderState,
    pending_ops: Vec<Operation>,
    pending_keys: Vec<PrivateKey>,
    requirements: Vec<Requirement>,
    tx: Option<Transaction>,
    signing_info: Option<SigningInfo>,
    proposal_wrapped: bool,
}

impl<N: NodeApi + AccountLookup, K: KeyStore> TransactionBuilder<N, K> {
    pub fn new(node: Arc<N>, keys: Arc<K>, config: BuilderConfig) -> Self {
        Self {
            node,
            keys,
            config,
            state: BuilderState::Empty,
            pending_ops: Vec::new(),
            pending_keys: Vec::new(),
            requirements: Vec::new(),
            tx: None,
            signing_info: None,
            proposal_wrapped: false,
        }
    }

    /// Resume work on an existing transaction, typically one imported for
    /// offline signing. It starts out `Signed` if it already carries
    /// signatures, `Assembled` otherwise.
    pub fn from_transaction(
        node: Arc<N>,
        keys: Arc<K>,
        config: BuilderConfig,
        tx: Transaction,
        signing_info: Option<SigningInfo>,
    ) -> Self {
        let mut builder = Self::new(node, keys, config);
        builder.state = if tx.is_signed() {
            BuilderState::Signed
        } else {
            BuilderState::Assembled
        };
        builder.pending_ops = tx.operations.clone();
        builder.tx = Some(tx);
        builder.signing_info = signing_info;
        builder
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn pending_ops(&self) -> &[Operation] {
        &self.pending_ops
    }

    pub fn pending_keys(&self) -> &[PrivateKey] {
        &self.pending_keys
    }

    /// Accounts registered as signers, in registration order.
    pub fn signers(&self) -> Vec<(String, Permission)> {
        self.requirements
            .iter()
            .map(|r| (r.account.clone(), r.permission))
            .collect()
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.tx.as_ref()
    }

    pub fn signing_info(&self) -> Option<&SigningInfo> {
        self.signing_info.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.state == BuilderState::Empty
    }

    // ─── Accumulation ───────────────────────────────────────────────────────

    pub fn append_op(&mut self, op: Operation) -> Result<(), TxError> {
        match self.state {
            BuilderState::Empty | BuilderState::Accumulating => {}
            state => {
                return Err(TxError::InvalidState(format!(
                    "cannot append operations while {:?}",
                    state
                )))
            }
        }
        log::debug!("appending {}", op.name());
        self.pending_ops.push(op);
        self.state = BuilderState::Accumulating;
        Ok(())
    }

    pub fn append_ops(&mut self, ops: impl IntoIterator<Item = Operation>) -> Result<(), TxError> {
        for op in ops {
            self.append_op(op)?;
        }
        Ok(())
    }

    /// Register `account`'s `permission` as a required signer and pick up
    /// whatever local keys can sign for it.
    ///
    /// Resolution does not fail for lack of weight; that is checked when
    /// signing. Signers are registered for operations, so at least one must
    /// have been appended.
    pub async fn append_signer(&mut self, account: &str, permission: Permission) -> Result<(), TxError> {
        match self.state {
            BuilderState::Accumulating | BuilderState::Assembled => {}
            state => {
                return Err(TxError::InvalidState(format!(
                    "cannot register signers while {:?}",
                    state
                )))
            }
        }
        if self
            .requirements
            .iter()
            .any(|r| r.account == account && r.permission == permission)
        {
            return Ok(());
        }

        let resolved = AuthorityResolver::new(&*self.node, &*self.keys, self.config.authority_depth)
            .resolve(account, permission)
            .await?;
        for (key, _) in &resolved.keys {
            self.add_key(key.clone());
        }
        self.requirements.push(Requirement {
            account: account.to_string(),
            permission,
            resolved,
        });
        Ok(())
    }

    /// Add an explicit WIF private key.
    pub fn append_wif(&mut self, wif: &str) -> Result<(), TxError> {
        let key = PrivateKey::from_wif(wif).map_err(|e| TxError::InvalidKey(e.to_string()))?;
        self.append_private_key(key)
    }

    pub fn append_private_key(&mut self, key: PrivateKey) -> Result<(), TxError> {
        if self.state == BuilderState::Partial {
            return Err(TxError::InvalidState(
                "partial transactions are signed after import".to_string(),
            ));
        }
        self.add_key(key);
        Ok(())
    }

    /// Add every locally held key listed as missing in the signing
    /// information. Returns how many were found.
    pub fn append_missing_signatures(&mut self) -> Result<usize, TxError> {
        let info = self
            .signing_info
            .as_ref()
            .ok_or_else(|| TxError::InvalidState("no signing information attached".to_string()))?;
        let found: Vec<PrivateKey> = info
            .missing_signatures
            .iter()
            .filter_map(|public| self.keys.lookup_private_key(public))
            .collect();
        let count = found.len();
        for key in found {
            self.add_key(key);
        }
        Ok(count)
    }

    fn add_key(&mut self, key: PrivateKey) {
        if !self.pending_keys.contains(&key) {
            self.pending_keys.push(key);
        }
    }

    // ─── Assembly ───────────────────────────────────────────────────────────

    /// Build the unsigned transaction from the pending operations.
    ///
    /// Wraps the operations in a proposal when a proposer is configured,
    /// injects fees, binds the reference block and sets the expiration.
    /// Any node failure along the way aborts the cycle.
    pub async fn construct(&mut self) -> Result<(), TxError> {
        match self.state {
            BuilderState::Accumulating | BuilderState::Assembled => {}
            BuilderState::Empty => return Err(TxError::InvalidState("no operations to construct".to_string())),
            state => {
                return Err(TxError::InvalidState(format!(
                    "cannot construct while {:?}",
                    state
                )))
            }
        }
        for op in &self.pending_ops {
            op.validate()?;
        }

        let mut ops = self.pending_ops.clone();
        self.proposal_wrapped = false;
        if let Some(proposer) = &self.config.proposer {
            let account = self
                .node
                .get_account(proposer)
                .await
                .map_err(TxError::Assembly)?
                .ok_or_else(|| TxError::AccountNotFound(proposer.clone()))?;
            let proposal = ProposalConfig {
                proposer: account.id,
                expiration_secs: self.config.proposal_expiration_secs,
                review_period_secs: self.config.proposal_review_period,
            };
            log::debug!("wrapping {} operation(s) in a proposal by {}", ops.len(), proposer);
            ops = vec![wrap_in_proposal(ops, &proposal, TimePointSec::now())];
            self.proposal_wrapped = true;
        }

        let fees = self
            .node
            .get_required_fees(&ops, self.config.fee_asset)
            .await
            .map_err(TxError::Assembly)?;
        let applied = apply_fees(&mut ops, &fees)?;
        log::debug!("applied {} fee(s) in {}", applied, self.config.fee_asset);

        let block = self
            .node
            .get_reference_block_params()
            .await
            .map_err(TxError::Assembly)?;
        let expiration = TimePointSec::from_now(self.config.expiration_secs);
        log::debug!(
            "reference block {} / {:#010x}, expires {}",
            block.ref_block_num,
            block.ref_block_prefix,
            expiration
        );

        self.tx = Some(Transaction::new(block, expiration, ops));
        self.state = BuilderState::Assembled;
        Ok(())
    }

    // ─── Signing ────────────────────────────────────────────────────────────

    /// Sign the transaction with every pending key, constructing it first
    /// if needed. Signing again after new keys were added only adds the new
    /// signatures.
    pub async fn sign(&mut self) -> Result<(), TxError> {
        match self.state {
            BuilderState::Accumulating => self.construct().await?,
            BuilderState::Assembled | BuilderState::Signed => {}
            state => return Err(TxError::InvalidState(format!("cannot sign while {:?}", state))),
        }

        // A proposal is authorized by the proposer alone.
        if self.proposal_wrapped && self.state == BuilderState::Assembled {
            if let Some(proposer) = self.config.proposer.clone() {
                self.pending_keys.clear();
                self.requirements.clear();
                self.append_signer(&proposer, Permission::Active).await?;
            }
        }

        if self.pending_keys.is_empty() {
            return Err(TxError::MissingKey("no private keys available for signing".to_string()));
        }
        if let Some(short) = self.requirements.iter().find(|r| !r.resolved.is_sufficient()) {
            return Err(TxError::MissingKey(format!(
                "{} {}: local keys carry weight {} of threshold {}",
                short.account,
                short.permission,
                short.resolved.weight,
                short.resolved.threshold
            )));
        }

        let chain_id = self.node.get_chain_id().await.map_err(TxError::Assembly)?;
        let chain_id = parse_chain_id(&chain_id).map_err(TxError::Assembly)?;
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| TxError::InvalidState("no transaction to sign".to_string()))?;
        let added = sign_transaction(tx, &self.pending_keys, &chain_id)?;
        log::debug!("signed {} with {} new signature(s)", tx.id(), added);
        self.state = BuilderState::Signed;
        Ok(())
    }

    /// Ask the node whether the signatures satisfy every required authority.
    pub async fn verify_authority(&self) -> Result<(), TxError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| TxError::InvalidState("no transaction to verify".to_string()))?;
        if self.node.verify_authority(tx).await.map_err(TxError::Assembly)? {
            Ok(())
        } else {
            Err(TxError::InsufficientAuthority)
        }
    }

    // ─── Hand-off ───────────────────────────────────────────────────────────

    /// Broadcast the transaction, signing it first if needed, and reset the
    /// builder. On failure the builder stays `Signed`.
    pub async fn broadcast(&mut self) -> Result<Transaction, TxError> {
        if self.state != BuilderState::Signed {
            self.sign().await?;
        }
        let tx = self
            .tx
            .clone()
            .ok_or_else(|| TxError::InvalidState("no transaction to broadcast".to_string()))?;
        if let Err(e) = self.node.broadcast(&tx).await {
            log::warn!("broadcast of {} failed: {}", tx.id(), e);
            return Err(TxError::Broadcast(e));
        }
        log::info!(
            "broadcast transaction {} ({} operation(s), {} signature(s))",
            tx.id(),
            tx.operations.len(),
            tx.signatures.len()
        );
        self.clear();
        Ok(tx)
    }

    /// Stop short of signing and attach what an external signer needs to
    /// sign for `account`'s `permission`. Can be called again for further
    /// signers; their information is merged.
    pub async fn add_signing_information(
        &mut self,
        account: &str,
        permission: Permission,
    ) -> Result<PartialTransaction, TxError> {
        match self.state {
            BuilderState::Accumulating => self.construct().await?,
            BuilderState::Assembled | BuilderState::Partial => {}
            state => {
                return Err(TxError::InvalidState(format!(
                    "cannot attach signing information while {:?}",
                    state
                )))
            }
        }

        // A proposal is authorized by the proposer alone.
        let (account, permission) = match (&self.config.proposer, self.proposal_wrapped) {
            (Some(proposer), true) => (proposer.clone(), Permission::Active),
            _ => (account.to_string(), permission),
        };
        let mut info = collect_signing_info(&*self.node, &account, permission).await?;
        info.chain_id = self.node.get_chain_id().await.map_err(TxError::Assembly)?;
        let merged = match self.signing_info.take() {
            Some(mut existing) => {
                existing.merge(info);
                existing
            }
            None => info,
        };
        let tx = self
            .tx
            .clone()
            .ok_or_else(|| TxError::InvalidState("no transaction assembled".to_string()))?;
        log::debug!(
            "partial transaction {} awaits {} key(s)",
            tx.id(),
            merged.missing_signatures.len()
        );
        self.signing_info = Some(merged.clone());
        self.state = BuilderState::Partial;
        Ok(PartialTransaction::new(tx, merged))
    }

    /// Drop everything and return to `Empty`, including key material.
    pub fn clear(&mut self) {
        self.pending_ops.clear();
        self.pending_keys.clear();
        self.requirements.clear();
        self.tx = None;
        self.signing_info = None;
        self.proposal_wrapped = false;
        self.state = BuilderState::Empty;
    }
}
