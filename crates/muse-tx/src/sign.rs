//! Transaction signing.

use std::collections::HashSet;

use muse_crypto::{recover_public_key, sign_digest_canonical, PrivateKey, PublicKey};

use crate::transaction::Transaction;
use crate::TxError;

/// Public keys that have already signed `tx`.
///
/// Signatures that do not recover (corrupt, or made over another chain id)
/// are skipped.
pub fn signers(tx: &Transaction, chain_id: &[u8; 32]) -> Vec<PublicKey> {
    let digest = tx.digest(chain_id);
    tx.signatures
        .iter()
        .filter_map(|sig| recover_public_key(&digest, sig).ok())
        .collect()
}

/// Sign `tx` with every distinct key in `keys` that has not signed it yet.
///
/// Returns the number of signatures added.
pub fn sign_transaction(tx: &mut Transaction, keys: &[PrivateKey], chain_id: &[u8; 32]) -> Result<usize, TxError> {
    let digest = tx.digest(chain_id);
    let mut seen: HashSet<PublicKey> = signers(tx, chain_id).into_iter().collect();
    let mut added = 0;
    for key in keys {
        if !seen.insert(key.public_key()) {
            continue;
        }
        let sig = sign_digest_canonical(key, &digest).map_err(|e| TxError::InvalidKey(e.to_string()))?;
        tx.signatures.push(sig);
        added += 1;
    }
    log::debug!("added {} signature(s) to {}", added, tx.id());
    Ok(added)
}
