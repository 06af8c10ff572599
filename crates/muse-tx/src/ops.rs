//! Chain operations.
//!
//! `Operation` is a closed enum with one variant per supported operation
//! kind. Each variant carries its wire type id; the JSON form is
//! `[type_id, {fields}]` and the binary form is `varint(type_id)` followed
//! by the fields in declaration order. Field order is part of the signed
//! payload.

use muse_crypto::PublicKey;
use muse_types::constants::HUNDRED_PERCENT;
use muse_types::pack::{pack_bytes, pack_sorted};
use muse_types::vote::{VOTE_COMMITTEE, VOTE_WITNESS};
use muse_types::{
    write_varint, AccountId, AssetAmount, AssetId, Extensions, LimitOrderId, ObjectId, Pack, ProposalId,
    TimePointSec, VoteId,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use crate::authority::Authority;
use crate::TxError;

/// The special voting account meaning "vote with my own stake".
pub const PROXY_TO_SELF: AccountId = AccountId(5);

/// Longest account name the chain accepts.
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 63;

macro_rules! impl_pack {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl Pack for $ty {
            fn pack(&self, buf: &mut Vec<u8>) {
                $( self.$field.pack(buf); )*
            }
        }
    };
}

// ─── Shared field types ─────────────────────────────────────────────────────

/// Opaque bytes, hex-encoded in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl Pack for HexBytes {
    fn pack(&self, buf: &mut Vec<u8>) {
        pack_bytes(buf, &self.0);
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(HexBytes).map_err(de::Error::custom)
    }
}

fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("not an unsigned integer: {}", n))),
        Value::String(s) => s.parse::<u64>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("not an unsigned integer: {}", other))),
    }
}

/// An already-encrypted memo. The payload is produced elsewhere and is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub from: PublicKey,
    pub to: PublicKey,
    #[serde(deserialize_with = "de_u64")]
    pub nonce: u64,
    pub message: HexBytes,
}

impl_pack!(Memo { from, to, nonce, message });

/// Language-tagged names: `[["en", "Football"], ["de", "Fußball"]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternationalizedString(pub Vec<(String, String)>);

impl InternationalizedString {
    /// At least one entry, and no entry with an empty language or text.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|(lang, text)| !lang.is_empty() && !text.is_empty())
    }
}

impl<L: Into<String>, T: Into<String>> FromIterator<(L, T)> for InternationalizedString {
    fn from_iter<I: IntoIterator<Item = (L, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(l, t)| (l.into(), t.into())).collect())
    }
}

impl Pack for InternationalizedString {
    fn pack(&self, buf: &mut Vec<u8>) {
        pack_sorted(buf, &self.0, |(lang, _)| lang.clone());
    }
}

/// Memo key, voting proxy and votes of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOptions {
    pub memo_key: PublicKey,
    pub voting_account: AccountId,
    #[serde(default)]
    pub num_witness: u16,
    #[serde(default)]
    pub num_committee: u16,
    #[serde(default)]
    pub votes: Vec<VoteId>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl AccountOptions {
    pub fn new(memo_key: PublicKey) -> Self {
        Self {
            memo_key,
            voting_account: PROXY_TO_SELF,
            num_witness: 0,
            num_committee: 0,
            votes: Vec::new(),
            extensions: Extensions,
        }
    }

    pub fn add_votes(&mut self, votes: impl IntoIterator<Item = VoteId>) {
        self.votes.extend(votes);
        self.recount_votes();
    }

    pub fn remove_votes(&mut self, votes: &[VoteId]) {
        self.votes.retain(|v| !votes.contains(v));
        self.recount_votes();
    }

    /// Deduplicate the vote set and recompute the witness and committee
    /// counts from it.
    pub fn recount_votes(&mut self) {
        self.votes.sort_by_key(|v| v.content());
        self.votes.dedup();
        let count = |t: u8| self.votes.iter().filter(|v| v.vote_type == t).count();
        self.num_witness = u16::try_from(count(VOTE_WITNESS)).unwrap_or(u16::MAX);
        self.num_committee = u16::try_from(count(VOTE_COMMITTEE)).unwrap_or(u16::MAX);
    }
}

impl Pack for AccountOptions {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.memo_key.pack(buf);
        self.voting_account.pack(buf);
        self.num_witness.pack(buf);
        self.num_committee.pack(buf);
        pack_sorted(buf, &self.votes, |v| v.content());
        self.extensions.pack(buf);
    }
}

/// Account names: lowercase, dot-separated labels, each starting with a
/// letter and ending with a letter or digit.
pub fn is_valid_account_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_ACCOUNT_NAME_LENGTH {
        return false;
    }
    name.split('.').all(|label| {
        let bytes = label.as_bytes();
        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) => {
                first.is_ascii_lowercase()
                    && (last.is_ascii_lowercase() || last.is_ascii_digit())
                    && bytes
                        .iter()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
            }
            _ => false,
        }
    })
}

// ─── Accounts and transfers ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(default)]
    pub fee: AssetAmount,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: AssetAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<Memo>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(Transfer { fee, from, to, amount, memo, extensions });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCancel {
    #[serde(default)]
    pub fee: AssetAmount,
    pub fee_paying_account: AccountId,
    pub order: LimitOrderId,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(LimitOrderCancel { fee, fee_paying_account, order, extensions });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub registrar: AccountId,
    pub referrer: AccountId,
    /// Share of fees paid to the referrer, in hundredths of a percent.
    pub referrer_percent: u16,
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub options: AccountOptions,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(AccountCreate {
    fee,
    registrar,
    referrer,
    referrer_percent,
    name,
    owner,
    active,
    options,
    extensions,
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub account: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Authority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Authority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_options: Option<AccountOptions>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl AccountUpdate {
    pub fn new(account: AccountId) -> Self {
        Self {
            fee: AssetAmount::default(),
            account,
            owner: None,
            active: None,
            new_options: None,
            extensions: Extensions,
        }
    }
}

impl_pack!(AccountUpdate { fee, account, owner, active, new_options, extensions });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpgrade {
    #[serde(default)]
    pub fee: AssetAmount,
    pub account_to_upgrade: AccountId,
    pub upgrade_to_lifetime_member: bool,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(AccountUpgrade { fee, account_to_upgrade, upgrade_to_lifetime_member, extensions });

// ─── Proposals ──────────────────────────────────────────────────────────────

/// An operation nested in a proposal (`{"op": [type_id, {...}]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpWrapper {
    pub op: Operation,
}

impl_pack!(OpWrapper { op });

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub fee_paying_account: AccountId,
    pub expiration_time: TimePointSec,
    pub proposed_ops: Vec<OpWrapper>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_period_seconds: Option<u32>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(ProposalCreate {
    fee,
    fee_paying_account,
    expiration_time,
    proposed_ops,
    review_period_seconds,
    extensions,
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalUpdate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub fee_paying_account: AccountId,
    pub proposal: ProposalId,
    #[serde(default)]
    pub active_approvals_to_add: Vec<AccountId>,
    #[serde(default)]
    pub active_approvals_to_remove: Vec<AccountId>,
    #[serde(default)]
    pub owner_approvals_to_add: Vec<AccountId>,
    #[serde(default)]
    pub owner_approvals_to_remove: Vec<AccountId>,
    #[serde(default)]
    pub key_approvals_to_add: Vec<PublicKey>,
    #[serde(default)]
    pub key_approvals_to_remove: Vec<PublicKey>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ProposalUpdate {
    pub fn new(fee_paying_account: AccountId, proposal: ProposalId) -> Self {
        Self {
            fee: AssetAmount::default(),
            fee_paying_account,
            proposal,
            active_approvals_to_add: Vec::new(),
            active_approvals_to_remove: Vec::new(),
            owner_approvals_to_add: Vec::new(),
            owner_approvals_to_remove: Vec::new(),
            key_approvals_to_add: Vec::new(),
            key_approvals_to_remove: Vec::new(),
            extensions: Extensions,
        }
    }

    fn changes_nothing(&self) -> bool {
        self.active_approvals_to_add.is_empty()
            && self.active_approvals_to_remove.is_empty()
            && self.owner_approvals_to_add.is_empty()
            && self.owner_approvals_to_remove.is_empty()
            && self.key_approvals_to_add.is_empty()
            && self.key_approvals_to_remove.is_empty()
    }
}

impl Pack for ProposalUpdate {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.fee.pack(buf);
        self.fee_paying_account.pack(buf);
        self.proposal.pack(buf);
        pack_sorted(buf, &self.active_approvals_to_add, |id| *id);
        pack_sorted(buf, &self.active_approvals_to_remove, |id| *id);
        pack_sorted(buf, &self.owner_approvals_to_add, |id| *id);
        pack_sorted(buf, &self.owner_approvals_to_remove, |id| *id);
        pack_sorted(buf, &self.key_approvals_to_add, |k| k.address());
        pack_sorted(buf, &self.key_approvals_to_remove, |k| k.address());
        self.extensions.pack(buf);
    }
}

// ─── Sports and betting ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub name: InternationalizedString,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(SportCreate { fee, name, extensions });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub name: InternationalizedString,
    /// May be relative (`0.0.n`) to a sport created in the same proposal.
    pub sport_id: ObjectId,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(CompetitorCreate { fee, name, sport_id, extensions });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventGroupCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub name: InternationalizedString,
    pub sport_id: ObjectId,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(EventGroupCreate { fee, name, sport_id, extensions });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    #[serde(default)]
    pub season: InternationalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimePointSec>,
    pub event_group_id: ObjectId,
    pub competitors: Vec<ObjectId>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(EventCreate { fee, season, start_time, event_group_id, competitors, extensions });

/// Market group shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BettingMarketOptions {
    Moneyline,
    Spread { margin: i32 },
    OverUnder { score: u32 },
}

impl BettingMarketOptions {
    fn tag(&self) -> u64 {
        match self {
            BettingMarketOptions::Moneyline => 0,
            BettingMarketOptions::Spread { .. } => 1,
            BettingMarketOptions::OverUnder { .. } => 2,
        }
    }
}

impl Pack for BettingMarketOptions {
    fn pack(&self, buf: &mut Vec<u8>) {
        write_varint(buf, self.tag());
        match self {
            BettingMarketOptions::Moneyline => {}
            BettingMarketOptions::Spread { margin } => margin.pack(buf),
            BettingMarketOptions::OverUnder { score } => score.pack(buf),
        }
    }
}

impl Serialize for BettingMarketOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            BettingMarketOptions::Moneyline => json!({}),
            BettingMarketOptions::Spread { margin } => json!({ "margin": margin }),
            BettingMarketOptions::OverUnder { score } => json!({ "score": score }),
        };
        (self.tag(), body).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BettingMarketOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (tag, body): (u64, Value) = Deserialize::deserialize(deserializer)?;
        let field = |name: &str| -> Result<i64, D::Error> {
            body.get(name)
                .and_then(Value::as_i64)
                .ok_or_else(|| de::Error::custom(format!("betting market options: missing {}", name)))
        };
        match tag {
            0 => Ok(BettingMarketOptions::Moneyline),
            1 => {
                let margin = i32::try_from(field("margin")?).map_err(<D::Error as de::Error>::custom)?;
                Ok(BettingMarketOptions::Spread { margin })
            }
            2 => {
                let score = u32::try_from(field("score")?).map_err(<D::Error as de::Error>::custom)?;
                Ok(BettingMarketOptions::OverUnder { score })
            }
            other => Err(de::Error::custom(format!("unknown betting market options {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingMarketGroupCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub event_id: ObjectId,
    pub options: BettingMarketOptions,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(BettingMarketGroupCreate { fee, event_id, options, extensions });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingMarketCreate {
    #[serde(default)]
    pub fee: AssetAmount,
    pub group_id: ObjectId,
    pub payout_condition: InternationalizedString,
    pub asset_id: AssetId,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(BettingMarketCreate { fee, group_id, payout_condition, asset_id, extensions });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BettingMarketResolution {
    Win,
    NotWin,
    Cancel,
}

impl Pack for BettingMarketResolution {
    fn pack(&self, buf: &mut Vec<u8>) {
        let index = match self {
            BettingMarketResolution::Win => 0,
            BettingMarketResolution::NotWin => 1,
            BettingMarketResolution::Cancel => 2,
        };
        write_varint(buf, index);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingMarketResolve {
    #[serde(default)]
    pub fee: AssetAmount,
    pub betting_market_id: ObjectId,
    pub resolution: BettingMarketResolution,
    #[serde(default)]
    pub extensions: Extensions,
}

impl_pack!(BettingMarketResolve { fee, betting_market_id, resolution, extensions });

// ─── Operation ──────────────────────────────────────────────────────────────

macro_rules! operations {
    ($($variant:ident($ty:ident) = $id:literal, $name:literal;)*) => {
        /// A chain operation.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Operation {
            $($variant($ty),)*
        }

        impl Operation {
            /// Wire type id.
            pub fn op_id(&self) -> u64 {
                match self {
                    $(Operation::$variant(_) => $id,)*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Operation::$variant(_) => $name,)*
                }
            }

            pub fn fee(&self) -> &AssetAmount {
                match self {
                    $(Operation::$variant(op) => &op.fee,)*
                }
            }

            pub fn fee_mut(&mut self) -> &mut AssetAmount {
                match self {
                    $(Operation::$variant(op) => &mut op.fee,)*
                }
            }

            fn from_parts(id: u64, body: Value) -> Result<Self, TxError> {
                match id {
                    $($id => serde_json::from_value::<$ty>(body)
                        .map(Operation::$variant)
                        .map_err(|e| TxError::Schema(format!("{}: {}", $name, e))),)*
                    other => Err(TxError::Schema(format!("unknown operation type {}", other))),
                }
            }
        }

        impl Serialize for Operation {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $(Operation::$variant(op) => (self.op_id(), op).serialize(serializer),)*
                }
            }
        }

        impl Pack for Operation {
            fn pack(&self, buf: &mut Vec<u8>) {
                write_varint(buf, self.op_id());
                match self {
                    $(Operation::$variant(op) => op.pack(buf),)*
                }
            }
        }

        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

operations! {
    Transfer(Transfer) = 0, "transfer";
    LimitOrderCancel(LimitOrderCancel) = 2, "limit_order_cancel";
    AccountCreate(AccountCreate) = 5, "account_create";
    AccountUpdate(AccountUpdate) = 6, "account_update";
    AccountUpgrade(AccountUpgrade) = 8, "account_upgrade";
    ProposalCreate(ProposalCreate) = 22, "proposal_create";
    ProposalUpdate(ProposalUpdate) = 23, "proposal_update";
    SportCreate(SportCreate) = 45, "sport_create";
    CompetitorCreate(CompetitorCreate) = 46, "competitor_create";
    EventGroupCreate(EventGroupCreate) = 47, "event_group_create";
    EventCreate(EventCreate) = 48, "event_create";
    BettingMarketGroupCreate(BettingMarketGroupCreate) = 49, "betting_market_group_create";
    BettingMarketCreate(BettingMarketCreate) = 50, "betting_market_create";
    BettingMarketResolve(BettingMarketResolve) = 51, "betting_market_resolve";
}

impl Operation {
    /// Parse the `[type_id, {fields}]` JSON form.
    pub fn from_json(value: &Value) -> Result<Self, TxError> {
        let pair = value
            .as_array()
            .filter(|a| a.len() == 2)
            .ok_or_else(|| TxError::Schema("operation must be [type_id, {fields}]".to_string()))?;
        let id = pair[0]
            .as_u64()
            .ok_or_else(|| TxError::Schema(format!("bad operation type id {}", pair[0])))?;
        Self::from_parts(id, pair[1].clone())
    }

    pub fn to_json(&self) -> Result<Value, TxError> {
        serde_json::to_value(self).map_err(|e| TxError::Schema(e.to_string()))
    }

    /// Check semantic constraints the field types cannot express.
    pub fn validate(&self) -> Result<(), TxError> {
        if self.fee().amount < 0 {
            return Err(TxError::Schema(format!("{}: negative fee", self.name())));
        }
        let fail = |msg: &str| Err(TxError::Schema(format!("{}: {}", self.name(), msg)));
        match self {
            Operation::Transfer(op) => {
                if op.amount.amount <= 0 {
                    return fail("amount must be positive");
                }
                if op.from == op.to {
                    return fail("sender and recipient are the same account");
                }
            }
            Operation::LimitOrderCancel(_) | Operation::AccountUpgrade(_) => {}
            Operation::AccountCreate(op) => {
                if !is_valid_account_name(&op.name) {
                    return fail("invalid account name");
                }
                if op.referrer_percent > HUNDRED_PERCENT {
                    return fail("referrer_percent above 100%");
                }
                op.owner.validate_threshold()?;
                op.active.validate_threshold()?;
            }
            Operation::AccountUpdate(op) => {
                if op.owner.is_none() && op.active.is_none() && op.new_options.is_none() {
                    return fail("nothing to update");
                }
                if let Some(owner) = &op.owner {
                    owner.validate_threshold()?;
                }
                if let Some(active) = &op.active {
                    active.validate_threshold()?;
                }
            }
            Operation::ProposalCreate(op) => {
                if op.proposed_ops.is_empty() {
                    return fail("no proposed operations");
                }
                for wrapper in &op.proposed_ops {
                    wrapper.op.validate()?;
                }
            }
            Operation::ProposalUpdate(op) => {
                if op.changes_nothing() {
                    return fail("no approvals added or removed");
                }
            }
            Operation::SportCreate(SportCreate { name, .. })
            | Operation::CompetitorCreate(CompetitorCreate { name, .. })
            | Operation::EventGroupCreate(EventGroupCreate { name, .. })
            | Operation::BettingMarketCreate(BettingMarketCreate {
                payout_condition: name,
                ..
            }) => {
                if !name.is_valid() {
                    return fail("names must be non-empty");
                }
            }
            Operation::EventCreate(op) => {
                if op.competitors.is_empty() {
                    return fail("at least one competitor required");
                }
                if !op.season.0.is_empty() && !op.season.is_valid() {
                    return fail("season names must be non-empty");
                }
            }
            Operation::BettingMarketGroupCreate(_) | Operation::BettingMarketResolve(_) => {}
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Operation::from_json(&value).map_err(de::Error::custom)
    }
}
