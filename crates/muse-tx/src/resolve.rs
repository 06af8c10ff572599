//! Authority resolution.
//!
//! Finds the locally held keys that can sign for an account permission.
//! Each account contributes the keys it lists directly; only when those fall
//! short of its own threshold are its co-signing accounts explored, one
//! level deeper each time, down to `max_depth` levels below the root.
//! Accounts past that depth are never looked at, and each account is
//! visited at most once, so an account listed under two parents only counts
//! toward the first.
//!
//! A co-signing account adds the weight its parent lists it with, and only
//! when the keys found for it reach its own threshold.
//!
//! Resolution never fails for lack of weight. The caller checks
//! `ResolvedKeys::is_sufficient` when it is time to sign.

use std::collections::HashSet;

use muse_crypto::{PrivateKey, PublicKey};
use muse_types::{AccountId, Permission};

use crate::api::{AccountLookup, KeyStore};
use crate::authority::Authority;
use crate::TxError;

/// Keys found for one account permission.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKeys {
    /// Keys and the weight each was listed with, in discovery order.
    pub keys: Vec<(PrivateKey, u16)>,
    /// Threshold of the root authority.
    pub threshold: u32,
    /// Weight the found keys carry in the root authority.
    pub weight: u64,
}

impl ResolvedKeys {
    pub fn is_sufficient(&self) -> bool {
        self.weight >= u64::from(self.threshold)
    }

    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.keys.iter().map(|(k, _)| k.public_key()).collect()
    }
}

pub struct AuthorityResolver<'a, L, K> {
    lookup: &'a L,
    keys: &'a K,
    max_depth: usize,
}

impl<'a, L: AccountLookup, K: KeyStore> AuthorityResolver<'a, L, K> {
    pub fn new(lookup: &'a L, keys: &'a K, max_depth: usize) -> Self {
        Self { lookup, keys, max_depth }
    }

    /// Resolve the keys for `account`'s `permission`.
    pub async fn resolve(&self, account: &str, permission: Permission) -> Result<ResolvedKeys, TxError> {
        let (root_id, root) = self.authority(account, permission).await?;
        let threshold = root.weight_threshold;

        let mut found: Vec<(PrivateKey, u16)> = Vec::new();
        let mut found_keys: HashSet<PublicKey> = HashSet::new();
        let mut visited: HashSet<AccountId> = HashSet::new();
        visited.insert(root_id);

        // Children are always recorded after their parent.
        let mut nodes = vec![Node {
            parent: None,
            weight_in_parent: 0,
            threshold,
            local_weight: 0,
        }];

        // Depth-first, children pushed in reverse so they pop in listed order.
        let mut stack: Vec<(usize, Authority, usize)> = vec![(0, root, 0)];
        while let Some((index, authority, level)) = stack.pop() {
            let mut local_weight: u64 = 0;
            for (public, weight) in &authority.key_auths {
                if let Some(private) = self.keys.lookup_private_key(public) {
                    local_weight += u64::from(*weight);
                    if found_keys.insert(*public) {
                        found.push((private, *weight));
                    }
                }
            }
            nodes[index].local_weight = local_weight;

            if local_weight >= u64::from(authority.weight_threshold) || level >= self.max_depth {
                continue;
            }

            let mut children = Vec::new();
            for (id, weight) in &authority.account_auths {
                if !visited.insert(*id) {
                    log::debug!("authority cycle: {} already visited", id);
                    continue;
                }
                let (_, child) = self.authority(&id.to_string(), permission).await?;
                let child_index = nodes.len();
                nodes.push(Node {
                    parent: Some(index),
                    weight_in_parent: *weight,
                    threshold: child.weight_threshold,
                    local_weight: 0,
                });
                children.push((child_index, child, level + 1));
            }
            stack.extend(children.into_iter().rev());
        }

        let weight = satisfied_weight(&nodes);
        log::debug!(
            "resolved {} key(s) with weight {} for {} {} (threshold {})",
            found.len(),
            weight,
            account,
            permission,
            threshold
        );
        Ok(ResolvedKeys {
            keys: found,
            threshold,
            weight,
        })
    }

    async fn authority(&self, account: &str, permission: Permission) -> Result<(AccountId, Authority), TxError> {
        let info = self
            .lookup
            .get_account(account)
            .await
            .map_err(TxError::Assembly)?
            .ok_or_else(|| TxError::AccountNotFound(account.to_string()))?;
        let authority = info.authority(permission).clone();
        Ok((info.id, authority))
    }
}

/// One account reached during resolution.
struct Node {
    parent: Option<usize>,
    weight_in_parent: u16,
    threshold: u32,
    local_weight: u64,
}

/// Fold weights up the tree, leaves first: a node meeting its own
/// threshold credits its parent with the weight the parent lists it with.
fn satisfied_weight(nodes: &[Node]) -> u64 {
    let mut credited = vec![0u64; nodes.len()];
    for (index, node) in nodes.iter().enumerate().rev() {
        let total = node.local_weight + credited[index];
        match node.parent {
            Some(parent) if total >= u64::from(node.threshold) => {
                credited[parent] += u64::from(node.weight_in_parent);
            }
            Some(_) => {}
            None => return total,
        }
    }
    0
}
