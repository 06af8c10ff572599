//! Wallet error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Tx(#[from] muse_tx::TxError),

    #[error("RPC error: {0}")]
    Rpc(#[from] muse_rpc::RpcError),

    #[error("key error: {0}")]
    Crypto(#[from] muse_crypto::CryptoError),

    #[error("invalid value: {0}")]
    Types(#[from] muse_types::TypesError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no account given and no default account configured")]
    NoAccount,

    #[error("{0} must be proposed; configure a proposer")]
    ProposerRequired(&'static str),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("unknown {kind}: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
