//! Session modes and high-level operations against an in-memory chain.
//!
//! Run with: cargo test -p muse-wallet --test session

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use muse_crypto::{PrivateKey, PublicKey};
use muse_tx::api::{AccountInfo, AccountLookup, ApiError, NodeApi};
use muse_tx::ops::{AccountOptions, BettingMarketOptions, InternationalizedString};
use muse_tx::sign::signers;
use muse_tx::transaction::parse_chain_id;
use muse_tx::{Authority, FeeEntry, Operation, RefBlockParams, Transaction, TxError};
use muse_types::{AccountId, AssetAmount, AssetId, LimitOrderId, ObjectId, Permission, ProposalId, VoteId};
use muse_wallet::session::{NewAccount, NewAccountKeys};
use muse_wallet::{AssetInfo, ChainLookup, Finalized, MemoryKeyStore, MuseConfig, Session, WalletError};

const CHAIN_ID: &str = "45ad2d3f9ef92a49b55c2227eb06123f613bb35dd08bd876f2aea21925a67a67";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Mock chain ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockChain {
    accounts: HashMap<String, AccountInfo>,
    witnesses: HashMap<String, VoteId>,
    committee: HashMap<String, VoteId>,
    proposals: Vec<ProposalId>,
    fees_down: AtomicBool,
    broadcast_down: AtomicBool,
    broadcasts: Mutex<Vec<Transaction>>,
}

impl MockChain {
    fn add_account(&mut self, id: u64, name: &str, active: Authority) {
        let info = AccountInfo {
            id: AccountId(id),
            name: name.to_string(),
            owner: Authority::from_key(key(&format!("{}-owner", name)).public_key()),
            active,
            options: AccountOptions::new(key("memo").public_key()),
        };
        self.accounts.insert(info.id.to_string(), info.clone());
        self.accounts.insert(name.to_string(), info);
    }

    fn sent(&self) -> Vec<Transaction> {
        self.broadcasts.lock().unwrap().clone()
    }
}

fn fee_for(op: &Operation) -> FeeEntry {
    match op {
        Operation::ProposalCreate(p) => FeeEntry::Nested(
            AssetAmount::core(100),
            p.proposed_ops.iter().map(|w| fee_for(&w.op)).collect(),
        ),
        _ => FeeEntry::Flat(AssetAmount::core(10)),
    }
}

impl NodeApi for MockChain {
    async fn get_required_fees(&self, ops: &[Operation], _fee_asset: AssetId) -> Result<Vec<FeeEntry>, ApiError> {
        if self.fees_down.load(Ordering::SeqCst) {
            return Err(ApiError::Unreachable("fee oracle down".to_string()));
        }
        Ok(ops.iter().map(fee_for).collect())
    }

    async fn get_reference_block_params(&self) -> Result<RefBlockParams, ApiError> {
        Ok(RefBlockParams {
            ref_block_num: 42,
            ref_block_prefix: 0xdeadbeef,
        })
    }

    async fn get_chain_id(&self) -> Result<String, ApiError> {
        Ok(CHAIN_ID.to_string())
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<(), ApiError> {
        if self.broadcast_down.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("node busy".to_string()));
        }
        self.broadcasts.lock().unwrap().push(tx.clone());
        Ok(())
    }

    async fn verify_authority(&self, _tx: &Transaction) -> Result<bool, ApiError> {
        Ok(true)
    }
}

impl AccountLookup for MockChain {
    async fn get_account(&self, name_or_id: &str) -> Result<Option<AccountInfo>, ApiError> {
        Ok(self.accounts.get(name_or_id).cloned())
    }
}

impl ChainLookup for MockChain {
    async fn get_witness_vote(&self, witness: &str) -> Result<Option<VoteId>, ApiError> {
        Ok(self.witnesses.get(witness).copied())
    }

    async fn get_committee_vote(&self, member: &str) -> Result<Option<VoteId>, ApiError> {
        Ok(self.committee.get(member).copied())
    }

    async fn get_asset(&self, symbol_or_id: &str) -> Result<Option<AssetInfo>, ApiError> {
        Ok(match symbol_or_id {
            "MUSE" | "1.3.0" => Some(AssetInfo {
                id: AssetId::CORE,
                symbol: "MUSE".to_string(),
                precision: 5,
            }),
            _ => None,
        })
    }

    async fn proposal_exists(&self, id: ProposalId) -> Result<bool, ApiError> {
        Ok(self.proposals.contains(&id))
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────────────

fn key(seed: &str) -> PrivateKey {
    PrivateKey::from_seed(seed).unwrap()
}

fn single_key(seed: &str) -> Authority {
    Authority::from_key(key(seed).public_key())
}

/// committee-account 1.2.0, alice 1.2.10, bob 1.2.20, init0 1.2.30
/// (proposer), one witness and one committee member, proposal 1.10.3.
fn chain() -> MockChain {
    let mut chain = MockChain::default();
    chain.add_account(0, "committee-account", single_key("k_committee"));
    chain.add_account(10, "alice", single_key("k_alice"));
    chain.add_account(20, "bob", single_key("k_bob"));
    chain.add_account(30, "init0", single_key("k_init0"));
    chain.witnesses.insert("init1".to_string(), VoteId::new(1, 4));
    chain.committee.insert("init2".to_string(), VoteId::new(0, 7));
    chain.proposals.push(ProposalId(3));
    chain
}

fn session(chain: MockChain, config: MuseConfig, wifs: &[&str]) -> (Arc<MockChain>, Session<MockChain>) {
    let chain = Arc::new(chain);
    let keys = Arc::new(MemoryKeyStore::new());
    for seed in wifs {
        keys.add_key(key(seed));
    }
    let config = MuseConfig {
        default_account: Some("alice".to_string()),
        ..config
    };
    let session = Session::new(config, chain.clone(), keys).unwrap();
    (chain, session)
}

fn single_op(finalized: &Finalized) -> &Operation {
    let tx = finalized.transaction().expect("finalized without a transaction");
    assert_eq!(tx.operations.len(), 1);
    &tx.operations[0]
}

fn names(pairs: &[(&str, &str)]) -> InternationalizedString {
    pairs.iter().copied().collect()
}

// ─── Modes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_immediate_transfer() {
    init_logging();
    let (chain, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);

    let result = s.transfer("bob", "1.5", "MUSE", None, None).await.unwrap();
    let Finalized::Broadcast(tx) = &result else {
        panic!("expected a broadcast, got {:?}", result);
    };
    let Operation::Transfer(t) = &tx.operations[0] else {
        panic!("expected a transfer");
    };
    assert_eq!(t.from, AccountId(10));
    assert_eq!(t.to, AccountId(20));
    assert_eq!(t.amount.amount, 150_000);
    assert_eq!(t.fee.amount, 10);

    assert_eq!(chain.sent().len(), 1);
    assert!(s.builder().pending_ops().is_empty());
    let chain_id = parse_chain_id(CHAIN_ID).unwrap();
    assert_eq!(signers(tx, &chain_id), vec![key("k_alice").public_key()]);
}

#[tokio::test]
async fn test_failed_assembly_is_not_carried_over() {
    init_logging();
    let (chain, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);

    chain.fees_down.store(true, Ordering::SeqCst);
    let err = s.transfer("bob", "1", "MUSE", None, None).await.unwrap_err();
    assert!(matches!(err, WalletError::Tx(TxError::Assembly(_))), "{:?}", err);
    assert!(s.builder().is_empty());
    assert!(s.builder().pending_ops().is_empty());
    assert!(s.builder().pending_keys().is_empty());

    chain.fees_down.store(false, Ordering::SeqCst);
    s.transfer("bob", "2", "MUSE", None, None).await.unwrap();
    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].operations.len(), 1);
    let Operation::Transfer(t) = &sent[0].operations[0] else {
        panic!("expected a transfer");
    };
    assert_eq!(t.amount.amount, 200_000);
}

#[tokio::test]
async fn test_missing_key_then_retry_with_key() {
    let (chain, mut s) = session(chain(), MuseConfig::default(), &[]);

    let err = s.transfer("bob", "1", "MUSE", None, None).await.unwrap_err();
    assert!(matches!(err, WalletError::Tx(TxError::MissingKey(_))), "{:?}", err);
    assert!(s.builder().is_empty());

    s.keys().add_key(key("k_alice"));
    let result = s.transfer("bob", "1", "MUSE", None, None).await.unwrap();
    assert_eq!(result.transaction().unwrap().operations.len(), 1);
    assert_eq!(chain.sent().len(), 1);
}

#[tokio::test]
async fn test_failed_broadcast_kept_for_retry() {
    let (chain, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);

    chain.broadcast_down.store(true, Ordering::SeqCst);
    let err = s.upgrade_account(None).await.unwrap_err();
    assert!(matches!(err, WalletError::Tx(TxError::Broadcast(_))), "{:?}", err);
    assert_eq!(s.builder().state(), muse_tx::BuilderState::Signed);

    chain.broadcast_down.store(false, Ordering::SeqCst);
    let result = s.broadcast().await.unwrap();
    assert!(matches!(result, Finalized::Broadcast(_)));
    assert_eq!(chain.sent().len(), 1);
    assert!(s.builder().is_empty());
}

#[tokio::test]
async fn test_bundle_sends_once() {
    let config = MuseConfig {
        bundle: true,
        ..Default::default()
    };
    let (chain, mut s) = session(chain(), config, &["k_alice"]);

    assert_eq!(s.transfer("bob", "1", "MUSE", None, None).await.unwrap(), Finalized::Queued);
    assert_eq!(s.transfer("bob", "2", "MUSE", None, None).await.unwrap(), Finalized::Queued);
    assert!(chain.sent().is_empty());
    assert_eq!(s.builder().pending_ops().len(), 2);

    let result = s.broadcast().await.unwrap();
    assert_eq!(result.transaction().unwrap().operations.len(), 2);
    assert_eq!(chain.sent().len(), 1);
    assert!(matches!(
        s.broadcast().await,
        Err(WalletError::Tx(TxError::InvalidState(_)))
    ));
}

#[tokio::test]
async fn test_unsigned_returns_partial() {
    let config = MuseConfig {
        unsigned: true,
        ..Default::default()
    };
    let (node, mut s) = session(chain(), config, &[]);

    let result = s.transfer("bob", "1", "MUSE", None, None).await.unwrap();
    let Finalized::Partial(partial) = result else {
        panic!("expected a partial transaction");
    };
    assert!(partial.transaction.signatures.is_empty());
    assert_eq!(partial.signing_info.missing_signatures, vec![key("k_alice").public_key()]);
    assert!(partial.signing_info.required_authorities.contains_key("alice"));
    assert!(node.sent().is_empty());
    assert!(s.builder().is_empty());

    // sign on a machine holding the key, then broadcast
    let (_, signer) = session(chain(), MuseConfig::default(), &["k_alice"]);
    let signed = signer.sign(partial, &[]).await.unwrap();
    assert_eq!(signed.transaction.signatures.len(), 1);
    assert!(signed.outstanding_signatures().unwrap().is_empty());

    signer.broadcast_transaction(signed.transaction).await.unwrap();
    assert_eq!(signer.node().sent().len(), 1);
}

#[tokio::test]
async fn test_sign_with_explicit_wif() {
    let config = MuseConfig {
        unsigned: true,
        ..Default::default()
    };
    let (_, mut s) = session(chain(), config, &[]);
    let Finalized::Partial(partial) = s.upgrade_account(None).await.unwrap() else {
        panic!("expected a partial transaction");
    };

    let wif = key("k_alice").to_wif();
    let signed = s.sign(partial, &[wif.as_str()]).await.unwrap();
    assert_eq!(signed.transaction.signatures.len(), 1);

    let err = s.sign(signed, &["garbage"]).await.unwrap_err();
    assert!(matches!(err, WalletError::Tx(TxError::InvalidKey(_))));
}

#[tokio::test]
async fn test_nobroadcast_signs_only() {
    init_logging();
    let config = MuseConfig {
        nobroadcast: true,
        ..Default::default()
    };
    let (chain, mut s) = session(chain(), config, &["k_alice"]);

    let result = s.upgrade_account(None).await.unwrap();
    let Finalized::Signed(tx) = &result else {
        panic!("expected a signed transaction, got {:?}", result);
    };
    assert_eq!(tx.signatures.len(), 1);
    assert!(chain.sent().is_empty());
    assert!(s.builder().is_empty());
}

#[tokio::test]
async fn test_missing_account() {
    let chain = Arc::new(chain());
    let mut s = Session::new(MuseConfig::default(), chain, Arc::new(MemoryKeyStore::new())).unwrap();
    assert!(matches!(
        s.upgrade_account(None).await,
        Err(WalletError::NoAccount)
    ));
    assert!(matches!(
        s.upgrade_account(Some("nobody")).await,
        Err(WalletError::NotFound { kind: "account", .. })
    ));
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let config = MuseConfig {
        expiration: 0,
        ..Default::default()
    };
    let result = Session::new(config, Arc::new(chain()), Arc::new(MemoryKeyStore::new()));
    assert!(matches!(result, Err(WalletError::Config(_))));
}

// ─── Accounts and authorities ───────────────────────────────────────────────

#[tokio::test]
async fn test_create_account_with_password() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);

    let mut params = NewAccount::new("carol", NewAccountKeys::Password("hunter2".to_string()));
    params.additional_active_accounts.push("bob".to_string());
    let result = s.create_account(params).await.unwrap();

    let Operation::AccountCreate(op) = single_op(&result) else {
        panic!("expected account_create");
    };
    let owner = PrivateKey::from_password("carol", "owner", "hunter2").unwrap();
    let active = PrivateKey::from_password("carol", "active", "hunter2").unwrap();
    let memo = PrivateKey::from_password("carol", "memo", "hunter2").unwrap();
    assert_eq!(op.registrar, AccountId(10));
    assert_eq!(op.referrer, AccountId(0));
    assert_eq!(op.referrer_percent, 5_000);
    assert_eq!(op.owner.key_auths, vec![(owner.public_key(), 1)]);
    assert_eq!(op.active.key_auths, vec![(active.public_key(), 1)]);
    assert_eq!(op.active.account_auths, vec![(AccountId(20), 1)]);
    assert_eq!(op.options.memo_key, memo.public_key());

    assert!(s.keys().contains(&active.public_key()));
    assert!(s.keys().contains(&memo.public_key()));
    assert!(!s.keys().contains(&owner.public_key()));
}

#[tokio::test]
async fn test_create_existing_account_fails() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);
    let k: PublicKey = key("x").public_key();
    let params = NewAccount::new(
        "bob",
        NewAccountKeys::Keys {
            owner: k,
            active: k,
            memo: k,
        },
    );
    assert!(matches!(
        s.create_account(params).await,
        Err(WalletError::AccountExists(name)) if name == "bob"
    ));
}

#[tokio::test]
async fn test_allow_account_with_threshold() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);

    let result = s
        .allow("bob", Some(1), Permission::Active, None, Some(2))
        .await
        .unwrap();
    let Operation::AccountUpdate(op) = single_op(&result) else {
        panic!("expected account_update");
    };
    let active = op.active.as_ref().unwrap();
    assert_eq!(active.weight_threshold, 2);
    assert_eq!(active.account_auths, vec![(AccountId(20), 1)]);
    assert!(op.owner.is_none());

    assert!(matches!(
        s.allow("bob", Some(1), Permission::Active, None, Some(5)).await,
        Err(WalletError::Tx(TxError::ThresholdUnreachable { .. }))
    ));
}

#[tokio::test]
async fn test_disallow_lowers_threshold() {
    init_logging();
    let mut c = chain();
    let mut two_keys = Authority::new(2);
    two_keys.key_auths = vec![(key("k_alice").public_key(), 1), (key("k_alice2").public_key(), 1)];
    c.add_account(10, "alice", two_keys);
    let (_, mut s) = session(c, MuseConfig::default(), &["k_alice", "k_alice2"]);

    let removed = key("k_alice2").public_key().to_string();
    let (result, lowered_by) = s.disallow(&removed, Permission::Active, None, None).await.unwrap();
    assert_eq!(lowered_by, Some(1));
    let Operation::AccountUpdate(op) = single_op(&result) else {
        panic!("expected account_update");
    };
    let active = op.active.as_ref().unwrap();
    assert_eq!(active.weight_threshold, 1);
    assert_eq!(active.key_auths, vec![(key("k_alice").public_key(), 1)]);
}

#[tokio::test]
async fn test_disallow_unknown_signer() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);
    assert!(matches!(
        s.disallow("bob", Permission::Active, None, None).await,
        Err(WalletError::Tx(TxError::UnknownSigner(_)))
    ));
}

#[tokio::test]
async fn test_update_memo_key() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);
    let new_memo = key("new-memo").public_key();
    let result = s.update_memo_key(&new_memo.to_string(), None).await.unwrap();
    let Operation::AccountUpdate(op) = single_op(&result) else {
        panic!("expected account_update");
    };
    assert_eq!(op.new_options.as_ref().unwrap().memo_key, new_memo);

    assert!(matches!(
        s.update_memo_key("not-a-key", None).await,
        Err(WalletError::Crypto(_))
    ));
}

// ─── Votes, orders, proposals ───────────────────────────────────────────────

#[tokio::test]
async fn test_witness_and_committee_votes() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);

    let result = s.approve_witness(&["init1"], None).await.unwrap();
    let Operation::AccountUpdate(op) = single_op(&result) else {
        panic!("expected account_update");
    };
    let options = op.new_options.as_ref().unwrap();
    assert_eq!(options.votes, vec![VoteId::new(1, 4)]);
    assert_eq!(options.num_witness, 1);
    assert_eq!(options.num_committee, 0);

    let result = s.approve_committee(&["init2"], None).await.unwrap();
    let Operation::AccountUpdate(op) = single_op(&result) else {
        panic!("expected account_update");
    };
    assert_eq!(op.new_options.as_ref().unwrap().num_committee, 1);

    assert!(matches!(
        s.approve_witness(&["nobody"], None).await,
        Err(WalletError::NotFound { kind: "witness", .. })
    ));
}

#[tokio::test]
async fn test_disapprove_witness_recounts() {
    let mut c = chain();
    let mut alice = c.accounts["alice"].clone();
    alice.options.add_votes([VoteId::new(1, 4), VoteId::new(1, 5), VoteId::new(0, 7)]);
    c.accounts.insert("alice".to_string(), alice.clone());
    c.accounts.insert("1.2.10".to_string(), alice);
    let (_, mut s) = session(c, MuseConfig::default(), &["k_alice"]);

    let result = s.disapprove_witness(&["init1"], None).await.unwrap();
    let Operation::AccountUpdate(op) = single_op(&result) else {
        panic!("expected account_update");
    };
    let options = op.new_options.as_ref().unwrap();
    assert_eq!(options.num_witness, 1);
    assert_eq!(options.num_committee, 1);
    assert!(!options.votes.contains(&VoteId::new(1, 4)));
}

#[tokio::test]
async fn test_cancel_orders() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);
    let result = s.cancel(&[LimitOrderId(1), LimitOrderId(2)], None).await.unwrap();
    let tx = result.transaction().unwrap();
    assert_eq!(tx.operations.len(), 2);
    assert!(tx.operations.iter().all(|op| op.name() == "limit_order_cancel"));
}

#[tokio::test]
async fn test_proposal_approval() {
    let (_, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);
    let result = s.approve_proposal(&[ProposalId(3)], None, Some("bob")).await.unwrap();
    let Operation::ProposalUpdate(op) = single_op(&result) else {
        panic!("expected proposal_update");
    };
    assert_eq!(op.fee_paying_account, AccountId(10));
    assert_eq!(op.active_approvals_to_add, vec![AccountId(20)]);

    let result = s.disapprove_proposal(&[ProposalId(3)], None, None).await.unwrap();
    let Operation::ProposalUpdate(op) = single_op(&result) else {
        panic!("expected proposal_update");
    };
    assert_eq!(op.active_approvals_to_remove, vec![AccountId(10)]);

    assert!(matches!(
        s.approve_proposal(&[ProposalId(99)], None, None).await,
        Err(WalletError::NotFound { kind: "proposal", .. })
    ));
}

// ─── Proposer-only operations ───────────────────────────────────────────────

#[tokio::test]
async fn test_sports_need_a_proposer() {
    let (chain, mut s) = session(chain(), MuseConfig::default(), &["k_alice"]);
    let err = s
        .sport_create(names(&[("en", "Football")]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::ProposerRequired("sport_create")));
    assert!(matches!(
        s.resolve_betting_market(
            ObjectId::relative(0),
            muse_tx::ops::BettingMarketResolution::Win,
            None
        )
        .await,
        Err(WalletError::ProposerRequired(_))
    ));
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn test_bundled_proposal_of_sports_objects() {
    init_logging();
    let config = MuseConfig {
        proposer: Some("init0".to_string()),
        bundle: true,
        ..Default::default()
    };
    let (chain, mut s) = session(chain(), config, &["k_init0"]);

    s.sport_create(names(&[("en", "Football"), ("de", "Fußball")]), None)
        .await
        .unwrap();
    s.event_group_create(names(&[("en", "Bundesliga")]), None, None)
        .await
        .unwrap();
    s.competitor_create(names(&[("en", "Team A")]), None, None).await.unwrap();
    s.betting_market_group_create(BettingMarketOptions::Spread { margin: 3 }, Some(ObjectId::relative(3)), None)
        .await
        .unwrap();
    s.betting_market_create(names(&[("en", "Team A wins")]), "MUSE", Some(ObjectId::relative(4)), None)
        .await
        .unwrap();
    assert!(chain.sent().is_empty());

    let result = s.broadcast().await.unwrap();
    let Operation::ProposalCreate(proposal) = single_op(&result) else {
        panic!("expected a proposal");
    };
    assert_eq!(proposal.fee_paying_account, AccountId(30));
    let kinds: Vec<&str> = proposal.proposed_ops.iter().map(|w| w.op.name()).collect();
    assert_eq!(
        kinds,
        vec![
            "sport_create",
            "event_group_create",
            "competitor_create",
            "betting_market_group_create",
            "betting_market_create"
        ]
    );

    let chain_id = parse_chain_id(CHAIN_ID).unwrap();
    let tx = result.transaction().unwrap();
    assert_eq!(signers(tx, &chain_id), vec![key("k_init0").public_key()]);
    assert_eq!(chain.sent().len(), 1);
}

#[tokio::test]
async fn test_unsigned_proposal_lists_proposer_keys() {
    let config = MuseConfig {
        proposer: Some("init0".to_string()),
        unsigned: true,
        ..Default::default()
    };
    let (_, mut s) = session(chain(), config, &[]);

    let result = s
        .event_create(
            names(&[("en", "2026")]),
            None,
            vec![ObjectId::relative(1), ObjectId::relative(2)],
            None,
            None,
        )
        .await
        .unwrap();
    let Finalized::Partial(partial) = result else {
        panic!("expected a partial transaction");
    };
    assert_eq!(partial.signing_info.missing_signatures, vec![key("k_init0").public_key()]);
    assert!(partial.signing_info.required_authorities.contains_key("init0"));
}
