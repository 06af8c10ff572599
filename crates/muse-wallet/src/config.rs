//! Session configuration.
//!
//! Every field has a default, so a config file only needs the settings it
//! changes.

use std::path::Path;

use muse_rpc::{RpcConfig, DEFAULT_NODE_URL};
use muse_tx::BuilderConfig;
use muse_types::constants::{
    DEFAULT_AUTHORITY_DEPTH, DEFAULT_EXPIRATION_SECS, DEFAULT_PREFIX, DEFAULT_PROPOSAL_EXPIRATION_SECS,
};
use muse_types::AssetId;
use serde::{Deserialize, Serialize};

use crate::WalletError;

/// Deepest authority recursion a config may ask for.
pub const MAX_AUTHORITY_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuseConfig {
    /// Node JSON-RPC endpoint.
    pub node: String,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    /// Transaction expiration window, seconds.
    pub expiration: u32,
    /// Proposing account (name or id). Enables proposal wrapping.
    pub proposer: Option<String>,
    /// Proposal expiration window, seconds.
    pub proposal_expiration: u32,
    pub proposal_review_period: Option<u32>,
    /// Collect operations until `Session::broadcast` is called.
    pub bundle: bool,
    /// Never sign; return partial transactions for signing elsewhere.
    pub unsigned: bool,
    /// Sign but do not hand transactions to the node.
    pub nobroadcast: bool,
    pub fee_asset: AssetId,
    pub authority_depth: usize,
    pub default_account: Option<String>,
    /// Public key prefix.
    pub prefix: String,
}

impl Default for MuseConfig {
    fn default() -> Self {
        Self {
            node: DEFAULT_NODE_URL.to_string(),
            rpc_user: None,
            rpc_password: None,
            expiration: DEFAULT_EXPIRATION_SECS,
            proposer: None,
            proposal_expiration: DEFAULT_PROPOSAL_EXPIRATION_SECS,
            proposal_review_period: None,
            bundle: false,
            unsigned: false,
            nobroadcast: false,
            fee_asset: AssetId::CORE,
            authority_depth: DEFAULT_AUTHORITY_DEPTH,
            default_account: None,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl MuseConfig {
    /// Load a JSON config file and validate it.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let text = std::fs::read_to_string(path)?;
        let config: MuseConfig = serde_json::from_str(&text)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| WalletError::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.expiration == 0 {
            return Err(WalletError::Config("expiration must be positive".to_string()));
        }
        if self.authority_depth > MAX_AUTHORITY_DEPTH {
            return Err(WalletError::Config(format!(
                "authority_depth {} exceeds {}",
                self.authority_depth, MAX_AUTHORITY_DEPTH
            )));
        }
        if self.unsigned && self.nobroadcast {
            log::debug!("nobroadcast has no effect on unsigned sessions");
        }
        Ok(())
    }

    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            expiration_secs: self.expiration,
            proposer: self.proposer.clone(),
            proposal_expiration_secs: self.proposal_expiration,
            proposal_review_period: self.proposal_review_period,
            fee_asset: self.fee_asset,
            authority_depth: self.authority_depth,
        }
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            url: self.node.clone(),
            username: self.rpc_user.clone(),
            password: self.rpc_password.clone(),
            ..Default::default()
        }
    }
}
