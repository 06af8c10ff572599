//! Proposal wrapping.

use muse_types::{AccountId, AssetAmount, Extensions, TimePointSec};

use crate::ops::{OpWrapper, Operation, ProposalCreate};

/// Who proposes, and for how long the proposal stays open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalConfig {
    pub proposer: AccountId,
    pub expiration_secs: u32,
    pub review_period_secs: Option<u32>,
}

/// Replace `ops` by a single `proposal_create` paid for by the proposer,
/// keeping the operations in order and untouched.
pub fn wrap_in_proposal(ops: Vec<Operation>, config: &ProposalConfig, now: TimePointSec) -> Operation {
    Operation::ProposalCreate(ProposalCreate {
        fee: AssetAmount::default(),
        fee_paying_account: config.proposer,
        expiration_time: TimePointSec(now.secs().saturating_add(config.expiration_secs)),
        proposed_ops: ops.into_iter().map(|op| OpWrapper { op }).collect(),
        review_period_seconds: config.review_period_secs,
        extensions: Extensions,
    })
}
