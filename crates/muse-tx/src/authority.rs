//! Weighted-threshold authorities and the threshold-editing helper.
//!
//! An authority is satisfied when the summed weight of its signing keys,
//! co-signing accounts and addresses reaches `weight_threshold`. Editing
//! helpers keep that threshold reachable: adding a signer never lowers it,
//! removing one either fails or, under `RemovalPolicy::LowerByRemovedWeight`,
//! lowers it by exactly the removed weight and reports that it did.

use std::fmt;

use muse_crypto::{Address, PublicKey};
use muse_types::pack::pack_sorted;
use muse_types::{AccountId, Pack};
use serde::{Deserialize, Serialize};

use crate::TxError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    #[serde(default)]
    pub account_auths: Vec<(AccountId, u16)>,
    #[serde(default)]
    pub key_auths: Vec<(PublicKey, u16)>,
    #[serde(default)]
    pub address_auths: Vec<(Address, u16)>,
}

impl Authority {
    pub fn new(weight_threshold: u32) -> Self {
        Self {
            weight_threshold,
            account_auths: Vec::new(),
            key_auths: Vec::new(),
            address_auths: Vec::new(),
        }
    }

    /// Single-key authority with threshold and weight 1.
    pub fn from_key(key: PublicKey) -> Self {
        let mut auth = Self::new(1);
        auth.key_auths.push((key, 1));
        auth
    }

    /// Sum of all entry weights, whether or not a key is held locally.
    pub fn total_weight(&self) -> u64 {
        let accounts: u64 = self.account_auths.iter().map(|(_, w)| u64::from(*w)).sum();
        let keys: u64 = self.key_auths.iter().map(|(_, w)| u64::from(*w)).sum();
        let addresses: u64 = self.address_auths.iter().map(|(_, w)| u64::from(*w)).sum();
        accounts + keys + addresses
    }

    pub fn validate_threshold(&self) -> Result<(), TxError> {
        let available = self.total_weight();
        if u64::from(self.weight_threshold) > available {
            return Err(TxError::ThresholdUnreachable {
                threshold: self.weight_threshold,
                available,
            });
        }
        Ok(())
    }

    /// Set a new threshold, rejecting one the entries cannot reach.
    pub fn set_threshold(&mut self, threshold: u32) -> Result<(), TxError> {
        let previous = self.weight_threshold;
        self.weight_threshold = threshold;
        if let Err(e) = self.validate_threshold() {
            self.weight_threshold = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn weight_of(&self, signer: &Signer) -> Option<u16> {
        match signer {
            Signer::Key(key) => self.key_auths.iter().find(|(k, _)| k == key).map(|(_, w)| *w),
            Signer::Account(id) => self.account_auths.iter().find(|(a, _)| a == id).map(|(_, w)| *w),
        }
    }

    /// Grant `signer` a say in this authority.
    ///
    /// `weight` defaults to the current threshold, so a new signer can act
    /// alone unless told otherwise. An existing entry has its weight
    /// replaced.
    pub fn add_signer(&mut self, signer: Signer, weight: Option<u16>) {
        let weight = weight.unwrap_or_else(|| u16::try_from(self.weight_threshold).unwrap_or(u16::MAX));
        match signer {
            Signer::Key(key) => match self.key_auths.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = weight,
                None => self.key_auths.push((key, weight)),
            },
            Signer::Account(id) => match self.account_auths.iter_mut().find(|(a, _)| *a == id) {
                Some(entry) => entry.1 = weight,
                None => self.account_auths.push((id, weight)),
            },
        }
    }

    /// Produce a copy of this authority without `signer`.
    ///
    /// With an explicit `threshold`, that threshold must be reachable by the
    /// remaining entries. Without one, the current threshold is kept if it
    /// is still reachable; otherwise `policy` decides between failing and
    /// lowering the threshold by the removed entry's weight.
    pub fn remove_signer(
        &self,
        signer: &Signer,
        threshold: Option<u32>,
        policy: RemovalPolicy,
    ) -> Result<AuthorityChange, TxError> {
        let mut authority = self.clone();
        let removed = match signer {
            Signer::Key(key) => take_entry(&mut authority.key_auths, key),
            Signer::Account(id) => take_entry(&mut authority.account_auths, id),
        }
        .ok_or_else(|| TxError::UnknownSigner(signer.to_string()))?;

        if let Some(threshold) = threshold {
            authority.weight_threshold = threshold;
            authority.validate_threshold()?;
            return Ok(AuthorityChange {
                authority,
                lowered_by: None,
            });
        }

        match authority.validate_threshold() {
            Ok(()) => Ok(AuthorityChange {
                authority,
                lowered_by: None,
            }),
            Err(e) => match policy {
                RemovalPolicy::RequireExplicitThreshold => Err(e),
                RemovalPolicy::LowerByRemovedWeight => {
                    let removed = u32::from(removed);
                    log::warn!(
                        "removing {} leaves threshold {} unreachable; lowering it by {}",
                        signer,
                        authority.weight_threshold,
                        removed
                    );
                    authority.weight_threshold = authority.weight_threshold.saturating_sub(removed);
                    authority.validate_threshold()?;
                    Ok(AuthorityChange {
                        authority,
                        lowered_by: Some(removed),
                    })
                }
            },
        }
    }
}

fn take_entry<T: PartialEq>(entries: &mut Vec<(T, u16)>, target: &T) -> Option<u16> {
    let pos = entries.iter().position(|(e, _)| e == target)?;
    Some(entries.remove(pos).1)
}

impl Pack for Authority {
    fn pack(&self, buf: &mut Vec<u8>) {
        self.weight_threshold.pack(buf);
        pack_sorted(buf, &self.account_auths, |(id, _)| *id);
        pack_sorted(buf, &self.key_auths, |(key, _)| key.address());
        pack_sorted(buf, &self.address_auths, |(addr, _)| *addr);
    }
}

/// An authority entry that can be granted or revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signer {
    Key(PublicKey),
    Account(AccountId),
}

impl fmt::Display for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signer::Key(key) => write!(f, "{}", key),
            Signer::Account(id) => write!(f, "{}", id),
        }
    }
}

/// What to do when removing a signer leaves the threshold unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Fail with `ThresholdUnreachable`; the caller must pass a threshold.
    #[default]
    RequireExplicitThreshold,
    /// Lower the threshold by the removed entry's weight and re-validate.
    LowerByRemovedWeight,
}

/// Result of an authority edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityChange {
    pub authority: Authority,
    /// Set when the threshold was lowered automatically.
    pub lowered_by: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use muse_crypto::PrivateKey;

    fn key(seed: &str) -> PublicKey {
        PrivateKey::from_seed(seed).unwrap().public_key()
    }

    fn two_of_three() -> Authority {
        Authority {
            weight_threshold: 2,
            account_auths: vec![(AccountId(20), 1)],
            key_auths: vec![(key("k1"), 1), (key("k2"), 1)],
            address_auths: vec![],
        }
    }

    #[test]
    fn test_total_weight_counts_every_entry() {
        let mut auth = two_of_three();
        auth.address_auths.push((key("k3").address(), 4));
        assert_eq!(auth.total_weight(), 7);
    }

    #[test]
    fn test_validate_threshold() {
        let mut auth = two_of_three();
        assert!(auth.validate_threshold().is_ok());
        auth.weight_threshold = 4;
        match auth.validate_threshold() {
            Err(TxError::ThresholdUnreachable { threshold, available }) => {
                assert_eq!(threshold, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_set_threshold_keeps_old_value_on_failure() {
        let mut auth = two_of_three();
        assert!(auth.set_threshold(9).is_err());
        assert_eq!(auth.weight_threshold, 2);
        auth.set_threshold(3).unwrap();
        assert_eq!(auth.weight_threshold, 3);
    }

    #[test]
    fn test_add_signer_defaults_to_threshold() {
        let mut auth = two_of_three();
        auth.add_signer(Signer::Key(key("new")), None);
        assert_eq!(auth.weight_of(&Signer::Key(key("new"))), Some(2));

        auth.add_signer(Signer::Account(AccountId(20)), Some(5));
        assert_eq!(auth.account_auths, vec![(AccountId(20), 5)]);
    }

    #[test]
    fn test_remove_reachable_keeps_threshold() {
        let auth = two_of_three();
        let change = auth
            .remove_signer(&Signer::Key(key("k1")), None, RemovalPolicy::RequireExplicitThreshold)
            .unwrap();
        assert_eq!(change.authority.weight_threshold, 2);
        assert_eq!(change.lowered_by, None);
        assert_eq!(change.authority.key_auths.len(), 1);
    }

    #[test]
    fn test_remove_unreachable_requires_threshold() {
        let auth = Authority {
            weight_threshold: 3,
            account_auths: vec![],
            key_auths: vec![(key("k1"), 1), (key("k2"), 2)],
            address_auths: vec![],
        };
        let err = auth
            .remove_signer(&Signer::Key(key("k2")), None, RemovalPolicy::RequireExplicitThreshold)
            .unwrap_err();
        assert!(matches!(err, TxError::ThresholdUnreachable { threshold: 3, available: 1 }));

        let change = auth
            .remove_signer(&Signer::Key(key("k2")), Some(1), RemovalPolicy::RequireExplicitThreshold)
            .unwrap();
        assert_eq!(change.authority.weight_threshold, 1);
        assert_eq!(change.lowered_by, None);
    }

    #[test]
    fn test_remove_unreachable_lowers_by_removed_weight() {
        let auth = Authority {
            weight_threshold: 3,
            account_auths: vec![],
            key_auths: vec![(key("k1"), 1), (key("k2"), 2)],
            address_auths: vec![],
        };
        let change = auth
            .remove_signer(&Signer::Key(key("k2")), None, RemovalPolicy::LowerByRemovedWeight)
            .unwrap();
        assert_eq!(change.lowered_by, Some(2));
        assert_eq!(change.authority.weight_threshold, 1);
        assert!(change.authority.validate_threshold().is_ok());
    }

    #[test]
    fn test_explicit_unreachable_threshold_is_never_lowered() {
        let auth = two_of_three();
        let err = auth
            .remove_signer(&Signer::Key(key("k1")), Some(5), RemovalPolicy::LowerByRemovedWeight)
            .unwrap_err();
        assert!(matches!(err, TxError::ThresholdUnreachable { .. }));
    }

    #[test]
    fn test_remove_unknown_signer() {
        let auth = two_of_three();
        let err = auth
            .remove_signer(&Signer::Account(AccountId(99)), None, RemovalPolicy::LowerByRemovedWeight)
            .unwrap_err();
        assert!(matches!(err, TxError::UnknownSigner(_)));
    }

    #[test]
    fn test_pack_sorts_entries() {
        let (a, b) = (key("a"), key("b"));
        let forward = Authority {
            weight_threshold: 1,
            account_auths: vec![(AccountId(9), 1), (AccountId(3), 1)],
            key_auths: vec![(a, 1), (b, 1)],
            address_auths: vec![],
        };
        let mut reversed = forward.clone();
        reversed.account_auths.reverse();
        reversed.key_auths.reverse();
        assert_eq!(forward.to_packed(), reversed.to_packed());

        let packed = forward.to_packed();
        assert_eq!(&packed[..4], &[1, 0, 0, 0]);
        // account_auths: count 2, then 1.2.3 before 1.2.9
        assert_eq!(&packed[4..9], &[2, 3, 1, 0, 9]);
    }

    #[test]
    fn test_json_shape() {
        let auth = Authority::from_key(key("k1"));
        let v = serde_json::to_value(&auth).unwrap();
        assert_eq!(v["weight_threshold"], 1);
        assert_eq!(v["key_auths"][0][1], 1);
        assert!(v["key_auths"][0][0].as_str().unwrap().starts_with("MUSE"));
        let back: Authority = serde_json::from_value(v).unwrap();
        assert_eq!(back, auth);
    }
}
