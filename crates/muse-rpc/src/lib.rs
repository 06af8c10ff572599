//! Muse node RPC client library.
//!
//! Provides an async HTTP client for the graphene-style JSON-RPC interface
//! exposed by Muse nodes (`call(api, method, params)`), and `NodeRpc`, a
//! typed wrapper over the database and broadcast APIs the transaction
//! tooling needs.
//!
//! # Example
//!
//! ```ignore
//! use muse_rpc::NodeRpc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let node = NodeRpc::new("http://localhost:8090").unwrap();
//!     let props = node.get_dynamic_global_properties().await.unwrap();
//!     println!("Head block: {}", props.head_block_number);
//! }
//! ```

pub mod client;
pub mod error;
pub mod node;

pub use client::{RpcClient, RpcConfig};
pub use error::RpcError;
pub use node::{
    AccountObject, AssetObject, CommitteeMemberObject, DynamicGlobalProperties, NodeRpc,
    ProposalObject, WitnessObject,
};

/// Default node endpoint.
pub const DEFAULT_NODE_URL: &str = "http://localhost:8090";

/// Node API names accepted as the first `call` parameter.
pub mod apis {
    pub const DATABASE: &str = "database";
    pub const NETWORK_BROADCAST: &str = "network_broadcast";
}
