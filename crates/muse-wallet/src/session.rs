//! The session facade.
//!
//! A `Session` owns the configuration, the node, the key store and one
//! transaction builder. Every high-level operation builds its chain
//! operations and hands them to `finalize_op`, which runs them through the
//! builder according to the configured mode:
//!
//! - `unsigned`: attach signing information and return a partial
//!   transaction for signing elsewhere.
//! - `bundle`: queue the operations; nothing is sent until
//!   [`Session::broadcast`].
//! - otherwise: sign and broadcast immediately.

use std::sync::Arc;

use muse_crypto::{PrivateKey, PublicKey};
use muse_rpc::node::DynamicGlobalProperties;
use muse_tx::api::{AccountInfo, AccountLookup, NodeApi};
use muse_tx::ops::{
    AccountCreate, AccountOptions, AccountUpdate, AccountUpgrade, BettingMarketCreate, BettingMarketGroupCreate,
    BettingMarketOptions, BettingMarketResolution, BettingMarketResolve, CompetitorCreate, EventCreate,
    EventGroupCreate, InternationalizedString, LimitOrderCancel, Memo, ProposalUpdate, SportCreate, Transfer,
    PROXY_TO_SELF,
};
use muse_tx::{
    Authority, BuilderConfig, BuilderState, Operation, PartialTransaction, RemovalPolicy, Signer, Transaction,
    TransactionBuilder, TxError,
};
use muse_types::constants::HUNDRED_PERCENT;
use muse_types::{
    parse_decimal_amount, AccountId, AssetAmount, Extensions, LimitOrderId, ObjectId, Permission, ProposalId,
    TimePointSec, VoteId,
};

use crate::config::MuseConfig;
use crate::keystore::MemoryKeyStore;
use crate::node::{ChainLookup, RpcNode};
use crate::WalletError;

/// What `finalize_op` did with the operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Finalized {
    /// Signed and accepted by the node.
    Broadcast(Transaction),
    /// Signed but held back because `nobroadcast` is set.
    Signed(Transaction),
    /// Awaiting signatures elsewhere.
    Partial(PartialTransaction),
    /// Queued in the bundle.
    Queued,
}

impl Finalized {
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Finalized::Broadcast(tx) | Finalized::Signed(tx) => Some(tx),
            Finalized::Partial(partial) => Some(&partial.transaction),
            Finalized::Queued => None,
        }
    }
}

/// The party being granted or revoked access: a public key, or an account
/// by name or id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Foreign {
    Key(PublicKey),
    Account(String),
}

impl Foreign {
    /// Anything that parses as a public key with `prefix` is a key;
    /// everything else is taken as an account.
    pub fn parse(s: &str, prefix: &str) -> Self {
        match PublicKey::from_str_with_prefix(s, prefix) {
            Ok(key) => Foreign::Key(key),
            Err(_) => Foreign::Account(s.to_string()),
        }
    }
}

/// Keys for a new account.
#[derive(Debug, Clone)]
pub enum NewAccountKeys {
    /// Derive owner, active and memo keys from a password. The active and
    /// memo keys are added to the key store; the owner key never is.
    Password(String),
    Keys {
        owner: PublicKey,
        active: PublicKey,
        memo: PublicKey,
    },
}

/// Parameters for [`Session::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub keys: NewAccountKeys,
    /// Pays the registration fee; defaults to the default account.
    pub registrar: Option<String>,
    pub referrer: String,
    /// Whole percent of fees paid to the referrer.
    pub referrer_percent: u16,
    pub additional_owner_keys: Vec<PublicKey>,
    pub additional_active_keys: Vec<PublicKey>,
    pub additional_owner_accounts: Vec<String>,
    pub additional_active_accounts: Vec<String>,
    /// Voting proxy; `None` votes with the account's own stake.
    pub proxy_account: Option<String>,
}

impl NewAccount {
    pub fn new(name: &str, keys: NewAccountKeys) -> Self {
        Self {
            name: name.to_string(),
            keys,
            registrar: None,
            referrer: AccountId(0).to_string(),
            referrer_percent: 50,
            additional_owner_keys: Vec::new(),
            additional_active_keys: Vec::new(),
            additional_owner_accounts: Vec::new(),
            additional_active_accounts: Vec::new(),
            proxy_account: None,
        }
    }
}

pub struct Session<N = RpcNode> {
    config: MuseConfig,
    node: Arc<N>,
    keys: Arc<MemoryKeyStore>,
    builder: TransactionBuilder<N, MemoryKeyStore>,
}

impl Session<RpcNode> {
    /// Connect to the node named in `config` with an empty key store.
    pub fn connect(config: MuseConfig) -> Result<Self, WalletError> {
        let node = Arc::new(RpcNode::connect(&config)?);
        Self::new(config, node, Arc::new(MemoryKeyStore::new()))
    }

    /// Current dynamic global properties of the chain.
    pub async fn info(&self) -> Result<DynamicGlobalProperties, WalletError> {
        Ok(self.node.rpc().get_dynamic_global_properties().await?)
    }
}

impl<N: NodeApi + AccountLookup + ChainLookup> Session<N> {
    pub fn new(config: MuseConfig, node: Arc<N>, keys: Arc<MemoryKeyStore>) -> Result<Self, WalletError> {
        config.validate()?;
        let builder = TransactionBuilder::new(node.clone(), keys.clone(), config.builder_config());
        Ok(Self {
            config,
            node,
            keys,
            builder,
        })
    }

    pub fn config(&self) -> &MuseConfig {
        &self.config
    }

    pub fn node(&self) -> &Arc<N> {
        &self.node
    }

    pub fn keys(&self) -> &Arc<MemoryKeyStore> {
        &self.keys
    }

    /// The builder holding the current bundle.
    pub fn builder(&self) -> &TransactionBuilder<N, MemoryKeyStore> {
        &self.builder
    }

    /// Discard the current bundle, including a transaction whose broadcast
    /// failed.
    pub fn clear(&mut self) {
        self.builder.clear();
    }

    // ─── Finalization ───────────────────────────────────────────────────────

    /// Run `ops`, authorized by `account`'s `permission`, through the
    /// builder according to the session mode.
    ///
    /// In immediate mode a failed broadcast leaves the signed transaction
    /// in the builder; [`Session::broadcast`] retries it. Any other failure
    /// clears the builder, so the next call starts a fresh cycle.
    pub async fn finalize_op(
        &mut self,
        ops: Vec<Operation>,
        account: &str,
        permission: Permission,
    ) -> Result<Finalized, WalletError> {
        self.builder.append_ops(ops)?;

        if self.config.unsigned {
            let partial = self.builder.add_signing_information(account, permission).await;
            self.builder.clear();
            return Ok(Finalized::Partial(partial?));
        }

        if self.config.bundle {
            self.builder.append_signer(account, permission).await?;
            log::debug!("bundled; {} operation(s) pending", self.builder.pending_ops().len());
            return Ok(Finalized::Queued);
        }

        // Immediate mode: a cycle that fails before the hand-off is discarded
        // with its keys. Only a failed broadcast stays for a retry.
        let result = match self.builder.append_signer(account, permission).await {
            Ok(()) => self.complete().await,
            Err(e) => Err(e.into()),
        };
        match result {
            Err(e @ WalletError::Tx(TxError::Broadcast(_))) => Err(e),
            Err(e) => {
                log::debug!("discarding failed cycle: {}", e);
                self.builder.clear();
                Err(e)
            }
            ok => ok,
        }
    }

    /// Sign and broadcast the bundle, or retry a failed broadcast.
    pub async fn broadcast(&mut self) -> Result<Finalized, WalletError> {
        if self.builder.state() == BuilderState::Empty {
            return Err(TxError::InvalidState("nothing to broadcast".to_string()).into());
        }
        self.complete().await
    }

    async fn complete(&mut self) -> Result<Finalized, WalletError> {
        self.builder.sign().await?;
        if self.config.nobroadcast {
            let tx = self
                .builder
                .transaction()
                .cloned()
                .ok_or_else(|| TxError::InvalidState("signed transaction missing".to_string()))?;
            log::warn!("nobroadcast is set; transaction {} was signed but not broadcast", tx.id());
            self.builder.clear();
            return Ok(Finalized::Signed(tx));
        }
        Ok(Finalized::Broadcast(self.builder.broadcast().await?))
    }

    /// Add signatures to a partial transaction: one per key in `wifs`, plus
    /// one per locally held key among its missing signatures.
    pub async fn sign(&self, partial: PartialTransaction, wifs: &[&str]) -> Result<PartialTransaction, WalletError> {
        let mut builder = self.standalone_builder(partial.transaction, Some(partial.signing_info));
        for wif in wifs {
            builder.append_wif(wif)?;
        }
        let found = builder.append_missing_signatures()?;
        log::debug!("{} of the missing keys are held locally", found);
        builder.sign().await?;

        let signing_info = builder.signing_info().cloned().unwrap_or_default();
        let transaction = builder
            .transaction()
            .cloned()
            .ok_or_else(|| TxError::InvalidState("signed transaction missing".to_string()))?;
        Ok(PartialTransaction::new(transaction, signing_info))
    }

    /// Broadcast a transaction signed elsewhere.
    pub async fn broadcast_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        let mut builder = self.standalone_builder(tx, None);
        Ok(builder.broadcast().await?)
    }

    fn standalone_builder(
        &self,
        tx: Transaction,
        signing_info: Option<muse_tx::SigningInfo>,
    ) -> TransactionBuilder<N, MemoryKeyStore> {
        let config = BuilderConfig {
            proposer: None,
            ..self.config.builder_config()
        };
        TransactionBuilder::from_transaction(self.node.clone(), self.keys.clone(), config, tx, signing_info)
    }

    // ─── Lookups ────────────────────────────────────────────────────────────

    fn account_name(&self, account: Option<&str>) -> Result<String, WalletError> {
        account
            .map(str::to_string)
            .or_else(|| self.config.default_account.clone())
            .ok_or(WalletError::NoAccount)
    }

    async fn account(&self, name_or_id: &str) -> Result<AccountInfo, WalletError> {
        self.node
            .get_account(name_or_id)
            .await
            .map_err(TxError::Assembly)?
            .ok_or_else(|| WalletError::NotFound {
                kind: "account",
                name: name_or_id.to_string(),
            })
    }

    async fn signer_for(&self, foreign: &str) -> Result<Signer, WalletError> {
        match Foreign::parse(foreign, &self.config.prefix) {
            Foreign::Key(key) => Ok(Signer::Key(key)),
            Foreign::Account(name) => Ok(Signer::Account(self.account(&name).await?.id)),
        }
    }

    fn require_proposer(&self, operation: &'static str) -> Result<(), WalletError> {
        if self.config.proposer.is_none() {
            return Err(WalletError::ProposerRequired(operation));
        }
        Ok(())
    }

    // ─── Transfers and accounts ─────────────────────────────────────────────

    /// Transfer `amount` (a decimal string, e.g. `"1.5"`) of `asset` to
    /// `to`. The memo, if any, must already be encrypted.
    pub async fn transfer(
        &mut self,
        to: &str,
        amount: &str,
        asset: &str,
        memo: Option<Memo>,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let from = self.account(&self.account_name(account)?).await?;
        let to = self.account(to).await?;
        let asset = self
            .node
            .get_asset(asset)
            .await
            .map_err(TxError::Assembly)?
            .ok_or_else(|| WalletError::NotFound {
                kind: "asset",
                name: asset.to_string(),
            })?;
        let units = parse_decimal_amount(amount, asset.precision)?;

        let op = Operation::Transfer(Transfer {
            fee: AssetAmount::default(),
            from: from.id,
            to: to.id,
            amount: AssetAmount::new(units, asset.id),
            memo,
            extensions: Extensions,
        });
        self.finalize_op(vec![op], &from.name, Permission::Active).await
    }

    /// Register a new account, paid for by the registrar.
    pub async fn create_account(&mut self, params: NewAccount) -> Result<Finalized, WalletError> {
        let registrar = self.account(&self.account_name(params.registrar.as_deref())?).await?;
        if self
            .node
            .get_account(&params.name)
            .await
            .map_err(TxError::Assembly)?
            .is_some()
        {
            return Err(WalletError::AccountExists(params.name));
        }
        let referrer = self.account(&params.referrer).await?;

        let (owner_key, active_key, memo_key) = match &params.keys {
            NewAccountKeys::Password(password) => {
                let owner = PrivateKey::from_password(&params.name, "owner", password)?;
                let active = PrivateKey::from_password(&params.name, "active", password)?;
                let memo = PrivateKey::from_password(&params.name, "memo", password)?;
                let keys = (owner.public_key(), active.public_key(), memo.public_key());
                self.keys.add_key(active);
                self.keys.add_key(memo);
                keys
            }
            NewAccountKeys::Keys { owner, active, memo } => (*owner, *active, *memo),
        };

        let mut owner = Authority::from_key(owner_key);
        let mut active = Authority::from_key(active_key);
        for key in &params.additional_owner_keys {
            owner.add_signer(Signer::Key(*key), Some(1));
        }
        for key in &params.additional_active_keys {
            active.add_signer(Signer::Key(*key), Some(1));
        }
        for name in &params.additional_owner_accounts {
            owner.add_signer(Signer::Account(self.account(name).await?.id), Some(1));
        }
        for name in &params.additional_active_accounts {
            active.add_signer(Signer::Account(self.account(name).await?.id), Some(1));
        }

        let mut options = AccountOptions::new(memo_key);
        options.voting_account = match &params.proxy_account {
            Some(proxy) => self.account(proxy).await?.id,
            None => PROXY_TO_SELF,
        };

        let referrer_percent = params
            .referrer_percent
            .checked_mul(100)
            .filter(|p| *p <= HUNDRED_PERCENT)
            .ok_or_else(|| WalletError::InvalidArgument(format!("referrer percent {}", params.referrer_percent)))?;

        let op = Operation::AccountCreate(AccountCreate {
            fee: AssetAmount::default(),
            registrar: registrar.id,
            referrer: referrer.id,
            referrer_percent,
            name: params.name,
            owner,
            active,
            options,
            extensions: Extensions,
        });
        self.finalize_op(vec![op], &registrar.name, Permission::Active).await
    }

    fn authority_update(account: &AccountInfo, permission: Permission, authority: Authority) -> Operation {
        let mut op = AccountUpdate::new(account.id);
        match permission {
            Permission::Owner => op.owner = Some(authority),
            Permission::Active => op.active = Some(authority),
        }
        Operation::AccountUpdate(op)
    }

    /// Grant `foreign` (a public key or an account) a say in `account`'s
    /// `permission`. `weight` defaults to the current threshold.
    pub async fn allow(
        &mut self,
        foreign: &str,
        weight: Option<u16>,
        permission: Permission,
        account: Option<&str>,
        threshold: Option<u32>,
    ) -> Result<Finalized, WalletError> {
        let account = self.account(&self.account_name(account)?).await?;
        let signer = self.signer_for(foreign).await?;
        let mut authority = account.authority(permission).clone();
        authority.add_signer(signer, weight);
        if let Some(threshold) = threshold {
            authority.set_threshold(threshold)?;
        }

        let op = Self::authority_update(&account, permission, authority);
        self.finalize_op(vec![op], &account.name, permission).await
    }

    /// Revoke `foreign`'s say in `account`'s `permission`.
    ///
    /// Without an explicit `threshold`, a threshold the remaining entries
    /// can no longer reach is lowered by the removed weight; the second
    /// element of the result reports by how much.
    pub async fn disallow(
        &mut self,
        foreign: &str,
        permission: Permission,
        account: Option<&str>,
        threshold: Option<u32>,
    ) -> Result<(Finalized, Option<u32>), WalletError> {
        let account = self.account(&self.account_name(account)?).await?;
        let signer = self.signer_for(foreign).await?;
        let change = account
            .authority(permission)
            .remove_signer(&signer, threshold, RemovalPolicy::LowerByRemovedWeight)?;

        let op = Self::authority_update(&account, permission, change.authority);
        let finalized = self.finalize_op(vec![op], &account.name, permission).await?;
        Ok((finalized, change.lowered_by))
    }

    /// Point the account's memo key at `key`. No private key is stored.
    pub async fn update_memo_key(&mut self, key: &str, account: Option<&str>) -> Result<Finalized, WalletError> {
        let key = PublicKey::from_str_with_prefix(key, &self.config.prefix)?;
        let account = self.account(&self.account_name(account)?).await?;
        let mut options = account.options.clone();
        options.memo_key = key;
        self.update_options(&account, options).await
    }

    async fn update_options(&mut self, account: &AccountInfo, options: AccountOptions) -> Result<Finalized, WalletError> {
        let mut op = AccountUpdate::new(account.id);
        op.new_options = Some(options);
        self.finalize_op(vec![Operation::AccountUpdate(op)], &account.name, Permission::Active)
            .await
    }

    pub async fn upgrade_account(&mut self, account: Option<&str>) -> Result<Finalized, WalletError> {
        let account = self.account(&self.account_name(account)?).await?;
        let op = Operation::AccountUpgrade(AccountUpgrade {
            fee: AssetAmount::default(),
            account_to_upgrade: account.id,
            upgrade_to_lifetime_member: true,
            extensions: Extensions,
        });
        self.finalize_op(vec![op], &account.name, Permission::Active).await
    }

    /// Cancel limit orders, all in one transaction.
    pub async fn cancel(&mut self, orders: &[LimitOrderId], account: Option<&str>) -> Result<Finalized, WalletError> {
        if orders.is_empty() {
            return Err(WalletError::InvalidArgument("no orders to cancel".to_string()));
        }
        let account = self.account(&self.account_name(account)?).await?;
        let ops = orders
            .iter()
            .map(|order| {
                Operation::LimitOrderCancel(LimitOrderCancel {
                    fee: AssetAmount::default(),
                    fee_paying_account: account.id,
                    order: *order,
                    extensions: Extensions,
                })
            })
            .collect();
        self.finalize_op(ops, &account.name, Permission::Active).await
    }

    // ─── Votes ──────────────────────────────────────────────────────────────

    async fn witness_votes(&self, witnesses: &[&str]) -> Result<Vec<VoteId>, WalletError> {
        let mut votes = Vec::with_capacity(witnesses.len());
        for witness in witnesses {
            let vote = self
                .node
                .get_witness_vote(witness)
                .await
                .map_err(TxError::Assembly)?
                .ok_or_else(|| WalletError::NotFound {
                    kind: "witness",
                    name: witness.to_string(),
                })?;
            votes.push(vote);
        }
        Ok(votes)
    }

    async fn committee_votes(&self, members: &[&str]) -> Result<Vec<VoteId>, WalletError> {
        let mut votes = Vec::with_capacity(members.len());
        for member in members {
            let vote = self
                .node
                .get_committee_vote(member)
                .await
                .map_err(TxError::Assembly)?
                .ok_or_else(|| WalletError::NotFound {
                    kind: "committee member",
                    name: member.to_string(),
                })?;
            votes.push(vote);
        }
        Ok(votes)
    }

    pub async fn approve_witness(&mut self, witnesses: &[&str], account: Option<&str>) -> Result<Finalized, WalletError> {
        let account = self.account(&self.account_name(account)?).await?;
        let votes = self.witness_votes(witnesses).await?;
        let mut options = account.options.clone();
        options.add_votes(votes);
        self.update_options(&account, options).await
    }

    pub async fn disapprove_witness(
        &mut self,
        witnesses: &[&str],
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let account = self.account(&self.account_name(account)?).await?;
        let votes = self.witness_votes(witnesses).await?;
        let mut options = account.options.clone();
        options.remove_votes(&votes);
        self.update_options(&account, options).await
    }

    pub async fn approve_committee(&mut self, members: &[&str], account: Option<&str>) -> Result<Finalized, WalletError> {
        let account = self.account(&self.account_name(account)?).await?;
        let votes = self.committee_votes(members).await?;
        let mut options = account.options.clone();
        options.add_votes(votes);
        self.update_options(&account, options).await
    }

    pub async fn disapprove_committee(
        &mut self,
        members: &[&str],
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let account = self.account(&self.account_name(account)?).await?;
        let votes = self.committee_votes(members).await?;
        let mut options = account.options.clone();
        options.remove_votes(&votes);
        self.update_options(&account, options).await
    }

    // ─── Proposals ──────────────────────────────────────────────────────────

    async fn proposal_updates(
        &mut self,
        proposals: &[ProposalId],
        account: Option<&str>,
        approver: Option<&str>,
        approve: bool,
    ) -> Result<Finalized, WalletError> {
        if proposals.is_empty() {
            return Err(WalletError::InvalidArgument("no proposals given".to_string()));
        }
        let account = self.account(&self.account_name(account)?).await?;
        let approver = match approver {
            Some(name) => self.account(name).await?.id,
            None => account.id,
        };

        let mut ops = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            if !self
                .node
                .proposal_exists(*proposal)
                .await
                .map_err(TxError::Assembly)?
            {
                return Err(WalletError::NotFound {
                    kind: "proposal",
                    name: proposal.to_string(),
                });
            }
            let mut op = ProposalUpdate::new(account.id, *proposal);
            if approve {
                op.active_approvals_to_add.push(approver);
            } else {
                op.active_approvals_to_remove.push(approver);
            }
            ops.push(Operation::ProposalUpdate(op));
        }
        self.finalize_op(ops, &account.name, Permission::Active).await
    }

    /// Add `approver`'s (default: the account's) active approval.
    pub async fn approve_proposal(
        &mut self,
        proposals: &[ProposalId],
        account: Option<&str>,
        approver: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        self.proposal_updates(proposals, account, approver, true).await
    }

    pub async fn disapprove_proposal(
        &mut self,
        proposals: &[ProposalId],
        account: Option<&str>,
        approver: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        self.proposal_updates(proposals, account, approver, false).await
    }

    // ─── Sports and betting (proposer only) ─────────────────────────────────
    //
    // Ids default to relative ids (`0.0.n`) so that objects created earlier
    // in the same proposal can be referenced.

    async fn finalize_proposed(
        &mut self,
        operation: &'static str,
        op: Operation,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        self.require_proposer(operation)?;
        let account = self.account(&self.account_name(account)?).await?;
        self.finalize_op(vec![op], &account.name, Permission::Active).await
    }

    pub async fn sport_create(
        &mut self,
        names: InternationalizedString,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let op = Operation::SportCreate(SportCreate {
            fee: AssetAmount::default(),
            name: names,
            extensions: Extensions,
        });
        self.finalize_proposed("sport_create", op, account).await
    }

    pub async fn competitor_create(
        &mut self,
        names: InternationalizedString,
        sport_id: Option<ObjectId>,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let op = Operation::CompetitorCreate(CompetitorCreate {
            fee: AssetAmount::default(),
            name: names,
            sport_id: sport_id.unwrap_or(ObjectId::relative(0)),
            extensions: Extensions,
        });
        self.finalize_proposed("competitor_create", op, account).await
    }

    pub async fn event_group_create(
        &mut self,
        names: InternationalizedString,
        sport_id: Option<ObjectId>,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let op = Operation::EventGroupCreate(EventGroupCreate {
            fee: AssetAmount::default(),
            name: names,
            sport_id: sport_id.unwrap_or(ObjectId::relative(0)),
            extensions: Extensions,
        });
        self.finalize_proposed("event_group_create", op, account).await
    }

    pub async fn event_create(
        &mut self,
        season: InternationalizedString,
        start_time: Option<TimePointSec>,
        competitors: Vec<ObjectId>,
        event_group_id: Option<ObjectId>,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let op = Operation::EventCreate(EventCreate {
            fee: AssetAmount::default(),
            season,
            start_time,
            event_group_id: event_group_id.unwrap_or(ObjectId::relative(0)),
            competitors,
            extensions: Extensions,
        });
        self.finalize_proposed("event_create", op, account).await
    }

    pub async fn betting_market_group_create(
        &mut self,
        options: BettingMarketOptions,
        event_id: Option<ObjectId>,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let op = Operation::BettingMarketGroupCreate(BettingMarketGroupCreate {
            fee: AssetAmount::default(),
            event_id: event_id.unwrap_or(ObjectId::relative(0)),
            options,
            extensions: Extensions,
        });
        self.finalize_proposed("betting_market_group_create", op, account).await
    }

    pub async fn betting_market_create(
        &mut self,
        payout_condition: InternationalizedString,
        asset: &str,
        group_id: Option<ObjectId>,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        self.require_proposer("betting_market_create")?;
        let asset = self
            .node
            .get_asset(asset)
            .await
            .map_err(TxError::Assembly)?
            .ok_or_else(|| WalletError::NotFound {
                kind: "asset",
                name: asset.to_string(),
            })?;
        let op = Operation::BettingMarketCreate(BettingMarketCreate {
            fee: AssetAmount::default(),
            group_id: group_id.unwrap_or(ObjectId::relative(0)),
            payout_condition,
            asset_id: asset.id,
            extensions: Extensions,
        });
        self.finalize_proposed("betting_market_create", op, account).await
    }

    pub async fn resolve_betting_market(
        &mut self,
        market_id: ObjectId,
        resolution: BettingMarketResolution,
        account: Option<&str>,
    ) -> Result<Finalized, WalletError> {
        let op = Operation::BettingMarketResolve(BettingMarketResolve {
            fee: AssetAmount::default(),
            betting_market_id: market_id,
            resolution,
            extensions: Extensions,
        });
        self.finalize_proposed("resolve_betting_market", op, account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_parse() {
        let key = PrivateKey::from_seed("foreign").unwrap().public_key();
        assert_eq!(Foreign::parse(&key.to_string(), "MUSE"), Foreign::Key(key));
        assert_eq!(Foreign::parse("bob", "MUSE"), Foreign::Account("bob".to_string()));
        assert_eq!(
            Foreign::parse(&key.to_string_with_prefix("TEST"), "MUSE"),
            Foreign::Account(key.to_string_with_prefix("TEST"))
        );
    }

    #[test]
    fn test_new_account_defaults() {
        let params = NewAccount::new("carol", NewAccountKeys::Password("secret".to_string()));
        assert_eq!(params.referrer, "1.2.0");
        assert_eq!(params.referrer_percent, 50);
        assert!(params.proxy_account.is_none());
    }
}
