//! Type parsing errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("expected {expected} id, got {got}")]
    WrongObjectType { expected: &'static str, got: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid timestamp: {0}")]
    InvalidTime(String),

    #[error("invalid vote id: {0}")]
    InvalidVoteId(String),

    #[error("invalid permission: {0} (use owner or active)")]
    InvalidPermission(String),
}
