//! Offline and multi-party signing support.
//!
//! An unsigned build stops after assembly and exports a
//! `PartialTransaction`: the transaction plus what a signer elsewhere needs
//! to finish it. That is every authority involved (the signing account's
//! and, one level down, those of its co-signing accounts) and the public
//! keys expected to sign.

use std::collections::BTreeMap;

use muse_crypto::PublicKey;
use muse_types::Permission;
use serde::{Deserialize, Serialize};

use crate::api::AccountLookup;
use crate::authority::Authority;
use crate::sign::signers;
use crate::transaction::{parse_chain_id, Transaction};
use crate::TxError;

// ─── Version Constants ──────────────────────────────────────────────────────

/// Format version for partial transaction files.
pub const PARTIAL_TX_VERSION: u32 = 1;

// ─── Types ──────────────────────────────────────────────────────────────────

/// Side information for completing a transaction's signatures elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningInfo {
    /// Authorities keyed by account name (root) or id (co-signers).
    pub required_authorities: BTreeMap<String, Authority>,
    /// Keys expected to sign, in discovery order.
    pub missing_signatures: Vec<PublicKey>,
    /// Hex chain id the signatures must commit to.
    pub chain_id: String,
}

impl SigningInfo {
    /// Fold in another signer's information.
    pub fn merge(&mut self, other: SigningInfo) {
        self.required_authorities.extend(other.required_authorities);
        for key in other.missing_signatures {
            self.add_missing(key);
        }
        if !other.chain_id.is_empty() {
            self.chain_id = other.chain_id;
        }
    }

    fn add_missing(&mut self, key: PublicKey) {
        if !self.missing_signatures.contains(&key) {
            self.missing_signatures.push(key);
        }
    }
}

/// A transaction waiting for signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialTransaction {
    pub version: u32,
    pub transaction: Transaction,
    pub signing_info: SigningInfo,
}

impl PartialTransaction {
    pub fn new(transaction: Transaction, signing_info: SigningInfo) -> Self {
        Self {
            version: PARTIAL_TX_VERSION,
            transaction,
            signing_info,
        }
    }

    /// Expected keys that have not signed yet.
    pub fn outstanding_signatures(&self) -> Result<Vec<PublicKey>, TxError> {
        let chain_id = parse_chain_id(&self.signing_info.chain_id).map_err(TxError::Assembly)?;
        let signed = signers(&self.transaction, &chain_id);
        Ok(self
            .signing_info
            .missing_signatures
            .iter()
            .filter(|k| !signed.contains(k))
            .copied()
            .collect())
    }
}

// ─── Collection ─────────────────────────────────────────────────────────────

/// Gather the authorities and candidate keys for `account`'s `permission`,
/// following co-signing accounts one level deep.
///
/// The chain id is left empty for the caller to fill in.
pub async fn collect_signing_info<L: AccountLookup>(
    lookup: &L,
    account: &str,
    permission: Permission,
) -> Result<SigningInfo, TxError> {
    let root = lookup
        .get_account(account)
        .await
        .map_err(TxError::Assembly)?
        .ok_or_else(|| TxError::AccountNotFound(account.to_string()))?;
    let authority = root.authority(permission).clone();

    let mut info = SigningInfo::default();
    for (key, _) in &authority.key_auths {
        info.add_missing(*key);
    }
    for (id, _) in &authority.account_auths {
        let id = id.to_string();
        let cosigner = lookup
            .get_authority(&id, permission)
            .await
            .map_err(TxError::Assembly)?
            .ok_or_else(|| TxError::AccountNotFound(id.clone()))?;
        for (key, _) in &cosigner.key_auths {
            info.add_missing(*key);
        }
        info.required_authorities.insert(id, cosigner);
    }
    info.required_authorities.insert(root.name, authority);
    Ok(info)
}

// ─── Import / Export ────────────────────────────────────────────────────────

/// Deserialize a partial transaction from JSON, verifying the version.
pub fn import_partial_tx(json: &str) -> Result<PartialTransaction, TxError> {
    let tx: PartialTransaction =
        serde_json::from_str(json).map_err(|e| TxError::Schema(format!("invalid partial tx JSON: {}", e)))?;
    if tx.version != PARTIAL_TX_VERSION {
        return Err(TxError::Schema(format!(
            "unsupported partial tx version: expected {}, got {}",
            PARTIAL_TX_VERSION, tx.version
        )));
    }
    Ok(tx)
}

/// Serialize a partial transaction to a JSON string.
pub fn export_partial_tx(tx: &PartialTransaction) -> Result<String, TxError> {
    serde_json::to_string_pretty(tx).map_err(|e| TxError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Operation, Transfer};
    use crate::sign::sign_transaction;
    use crate::transaction::RefBlockParams;
    use muse_crypto::PrivateKey;
    use muse_types::{AccountId, AssetAmount, Extensions, TimePointSec};

    fn partial() -> (PartialTransaction, PrivateKey, PrivateKey) {
        let k1 = PrivateKey::from_seed("k1").unwrap();
        let k2 = PrivateKey::from_seed("k2").unwrap();
        let tx = Transaction::new(
            RefBlockParams::default(),
            TimePointSec(1_700_000_000),
            vec![Operation::Transfer(Transfer {
                fee: AssetAmount::core(1),
                from: AccountId(1),
                to: AccountId(2),
                amount: AssetAmount::core(3),
                memo: None,
                extensions: Extensions,
            })],
        );
        let mut info = SigningInfo {
            chain_id: "11".repeat(32),
            ..Default::default()
        };
        let mut auth = Authority::new(2);
        auth.key_auths = vec![(k1.public_key(), 1), (k2.public_key(), 1)];
        info.required_authorities.insert("alice".to_string(), auth);
        info.missing_signatures = vec![k1.public_key(), k2.public_key()];
        (PartialTransaction::new(tx, info), k1, k2)
    }

    #[test]
    fn test_export_import() {
        let (p, _, _) = partial();
        let json = export_partial_tx(&p).unwrap();
        let back = import_partial_tx(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_version_check() {
        let (mut p, _, _) = partial();
        p.version = 99;
        let json = serde_json::to_string(&p).unwrap();
        assert!(matches!(import_partial_tx(&json), Err(TxError::Schema(_))));
        assert!(matches!(import_partial_tx("not json"), Err(TxError::Schema(_))));
    }

    #[test]
    fn test_outstanding_signatures_shrink() {
        let (mut p, k1, k2) = partial();
        assert_eq!(p.outstanding_signatures().unwrap().len(), 2);
        let chain_id = parse_chain_id(&p.signing_info.chain_id).unwrap();
        sign_transaction(&mut p.transaction, &[k1], &chain_id).unwrap();
        assert_eq!(p.outstanding_signatures().unwrap(), vec![k2.public_key()]);
    }

    #[test]
    fn test_merge_dedupes_keys() {
        let (p, k1, _) = partial();
        let mut info = p.signing_info.clone();
        let other = SigningInfo {
            missing_signatures: vec![k1.public_key()],
            ..Default::default()
        };
        info.merge(other);
        assert_eq!(info.missing_signatures.len(), 2);
        assert_eq!(info.chain_id, "11".repeat(32));
    }
}
