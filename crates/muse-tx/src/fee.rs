//! Fee injection.
//!
//! The node prices a batch of operations and answers with one entry per
//! top-level operation: a flat amount, or for a proposal an
//! `[amount, [nested...]]` pair carrying one entry per proposed operation.
//! `apply_fees` patches those amounts into the operations and insists the
//! shapes line up exactly.

use muse_types::AssetAmount;
use serde::{Deserialize, Serialize};

use crate::ops::Operation;
use crate::TxError;

/// One fee record as returned by `get_required_fees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeEntry {
    Flat(AssetAmount),
    Nested(AssetAmount, Vec<FeeEntry>),
}

impl FeeEntry {
    pub fn amount(&self) -> &AssetAmount {
        match self {
            FeeEntry::Flat(fee) | FeeEntry::Nested(fee, _) => fee,
        }
    }
}

/// Number of fee records a batch needs: every operation, nested or not.
pub fn fee_slots(ops: &[Operation]) -> usize {
    ops.iter().map(op_slots).sum()
}

fn op_slots(op: &Operation) -> usize {
    match op {
        Operation::ProposalCreate(p) => 1 + p.proposed_ops.iter().map(|w| op_slots(&w.op)).sum::<usize>(),
        _ => 1,
    }
}

/// Patch `entries` into `ops`, returning how many fee records were consumed.
pub fn apply_fees(ops: &mut [Operation], entries: &[FeeEntry]) -> Result<usize, TxError> {
    if ops.len() != entries.len() {
        return Err(TxError::FeeResolution(format!(
            "{} operations but {} fee entries",
            ops.len(),
            entries.len()
        )));
    }
    let mut consumed = 0;
    for (op, entry) in ops.iter_mut().zip(entries) {
        consumed += apply_one(op, entry)?;
    }
    Ok(consumed)
}

fn apply_one(op: &mut Operation, entry: &FeeEntry) -> Result<usize, TxError> {
    match (op, entry) {
        (Operation::ProposalCreate(proposal), FeeEntry::Nested(fee, nested)) => {
            if proposal.proposed_ops.len() != nested.len() {
                return Err(TxError::FeeResolution(format!(
                    "proposal carries {} operations but {} nested fee entries",
                    proposal.proposed_ops.len(),
                    nested.len()
                )));
            }
            proposal.fee = fee.clone();
            let mut consumed = 1;
            for (wrapper, entry) in proposal.proposed_ops.iter_mut().zip(nested) {
                consumed += apply_one(&mut wrapper.op, entry)?;
            }
            Ok(consumed)
        }
        (Operation::ProposalCreate(_), FeeEntry::Flat(_)) => Err(TxError::FeeResolution(
            "proposal needs a nested fee entry".to_string(),
        )),
        (op, FeeEntry::Nested(..)) => Err(TxError::FeeResolution(format!(
            "{} got a nested fee entry",
            op.name()
        ))),
        (op, FeeEntry::Flat(fee)) => {
            *op.fee_mut() = fee.clone();
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{OpWrapper, ProposalCreate, Transfer};
    use muse_types::{AccountId, Extensions, TimePointSec};
    use serde_json::json;

    fn transfer() -> Operation {
        Operation::Transfer(Transfer {
            fee: AssetAmount::default(),
            from: AccountId(1),
            to: AccountId(2),
            amount: AssetAmount::core(10),
            memo: None,
            extensions: Extensions,
        })
    }

    fn proposal(n: usize) -> Operation {
        Operation::ProposalCreate(ProposalCreate {
            fee: AssetAmount::default(),
            fee_paying_account: AccountId(1),
            expiration_time: TimePointSec(0),
            proposed_ops: (0..n).map(|_| OpWrapper { op: transfer() }).collect(),
            review_period_seconds: None,
            extensions: Extensions,
        })
    }

    #[test]
    fn test_fee_entries_parse_node_shapes() {
        let entries: Vec<FeeEntry> = serde_json::from_value(json!([
            {"amount": 100, "asset_id": "1.3.0"},
            [{"amount": 50, "asset_id": "1.3.0"}, [{"amount": 7, "asset_id": "1.3.0"}]]
        ]))
        .unwrap();
        assert!(matches!(entries[0], FeeEntry::Flat(_)));
        match &entries[1] {
            FeeEntry::Nested(fee, nested) => {
                assert_eq!(fee.amount, 50);
                assert_eq!(nested.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_flat_fees() {
        let mut ops = vec![transfer(), transfer()];
        let entries = vec![
            FeeEntry::Flat(AssetAmount::core(11)),
            FeeEntry::Flat(AssetAmount::core(12)),
        ];
        assert_eq!(apply_fees(&mut ops, &entries).unwrap(), 2);
        assert_eq!(ops[0].fee().amount, 11);
        assert_eq!(ops[1].fee().amount, 12);
    }

    #[test]
    fn test_nested_fees_cover_every_operation() {
        let mut ops = vec![proposal(3), transfer()];
        let entries = vec![
            FeeEntry::Nested(
                AssetAmount::core(100),
                vec![
                    FeeEntry::Flat(AssetAmount::core(1)),
                    FeeEntry::Flat(AssetAmount::core(2)),
                    FeeEntry::Flat(AssetAmount::core(3)),
                ],
            ),
            FeeEntry::Flat(AssetAmount::core(9)),
        ];
        let consumed = apply_fees(&mut ops, &entries).unwrap();
        assert_eq!(consumed, fee_slots(&ops));
        assert_eq!(consumed, 5);

        let Operation::ProposalCreate(p) = &ops[0] else { panic!("not a proposal") };
        assert_eq!(p.fee.amount, 100);
        let nested: Vec<i64> = p.proposed_ops.iter().map(|w| w.op.fee().amount).collect();
        assert_eq!(nested, vec![1, 2, 3]);
        assert_eq!(ops[1].fee().amount, 9);
    }

    #[test]
    fn test_count_mismatch() {
        let mut ops = vec![transfer()];
        let err = apply_fees(&mut ops, &[]).unwrap_err();
        assert!(matches!(err, TxError::FeeResolution(_)));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut ops = vec![proposal(1)];
        let err = apply_fees(&mut ops, &[FeeEntry::Flat(AssetAmount::core(1))]).unwrap_err();
        assert!(matches!(err, TxError::FeeResolution(_)));

        let mut ops = vec![transfer()];
        let nested = FeeEntry::Nested(AssetAmount::core(1), vec![]);
        assert!(matches!(apply_fees(&mut ops, &[nested]), Err(TxError::FeeResolution(_))));

        let mut ops = vec![proposal(2)];
        let short = FeeEntry::Nested(AssetAmount::core(1), vec![FeeEntry::Flat(AssetAmount::core(1))]);
        assert!(matches!(apply_fees(&mut ops, &[short]), Err(TxError::FeeResolution(_))));
    }
}
