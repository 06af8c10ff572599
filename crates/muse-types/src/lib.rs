//! Core types and constants for the Muse chain.
//!
//! This crate provides the foundational types shared by all Muse crates:
//! object identifiers, asset amounts, vote ids, permission levels,
//! second-precision timestamps, chain constants, and the canonical binary
//! encoder (`Pack`) that signed payloads are built from.

pub mod amount;
pub mod constants;
pub mod error;
pub mod object_id;
pub mod pack;
pub mod permission;
pub mod time;
pub mod vote;

pub use amount::{parse_decimal_amount, AssetAmount};
pub use error::TypesError;
pub use object_id::{AccountId, AssetId, CommitteeMemberId, LimitOrderId, ObjectId, ProposalId, WitnessId};
pub use pack::{write_varint, Extensions, Pack};
pub use permission::Permission;
pub use time::TimePointSec;
pub use vote::VoteId;
