//! Muse transaction construction.
//!
//! Provides the closed operation model, weighted authorities and the
//! threshold-editing helper, fee injection (including fees nested inside
//! proposals), proposal wrapping, recursive authority resolution, canonical
//! signing, and the `TransactionBuilder` that sequences them against a node
//! and a key store supplied as explicit collaborators.

pub mod api;
pub mod authority;
pub mod builder;
pub mod fee;
pub mod offline;
pub mod ops;
pub mod proposal;
pub mod resolve;
pub mod sign;
pub mod transaction;

pub use api::{AccountInfo, AccountLookup, ApiError, KeyStore, NodeApi};
pub use authority::{Authority, AuthorityChange, RemovalPolicy, Signer};
pub use builder::{BuilderConfig, BuilderState, TransactionBuilder};
pub use fee::{apply_fees, FeeEntry};
pub use offline::{PartialTransaction, SigningInfo};
pub use ops::Operation;
pub use resolve::{AuthorityResolver, ResolvedKeys};
pub use sign::sign_transaction;
pub use transaction::{RefBlockParams, Transaction};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("threshold {threshold} unreachable: authority carries only {available} weight")]
    ThresholdUnreachable { threshold: u32, available: u64 },

    #[error("fee resolution failed: {0}")]
    FeeResolution(String),

    #[error("assembly failed: {0}")]
    Assembly(#[source] ApiError),

    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signatures do not satisfy the required authorities")]
    InsufficientAuthority,

    #[error("invalid builder state: {0}")]
    InvalidState(String),

    #[error("signer {0} is not part of the authority")]
    UnknownSigner(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("broadcast failed: {0}")]
    Broadcast(#[source] ApiError),
}
