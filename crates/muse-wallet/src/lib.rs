//! Muse session facade.
//!
//! Ties the transaction builder to a concrete node (JSON-RPC over HTTP) and
//! an in-memory key store, and exposes the high-level chain operations:
//! transfers, account creation and authority editing, votes, proposals and
//! the proposer-only sports and betting operations.

pub mod config;
pub mod error;
pub mod keystore;
pub mod node;
pub mod session;

pub use config::MuseConfig;
pub use error::WalletError;
pub use keystore::MemoryKeyStore;
pub use node::{AssetInfo, ChainLookup, RpcNode};
pub use session::{Finalized, Foreign, NewAccount, NewAccountKeys, Session};
