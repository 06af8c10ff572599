//! RPC error types.

use thiserror::Error;

/// JSON-RPC 2.0 standard error codes.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error calling {method} at {url}: {source}")]
    Http {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} calling {method} at {url}: {body}")]
    HttpStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("authentication failed at {url}")]
    AuthFailed { url: String },

    #[error("RPC error {code} in {method}: {message}")]
    Rpc {
        code: i64,
        message: String,
        method: String,
    },

    #[error("unexpected response to {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl RpcError {
    /// Whether the failure is worth retrying (connection trouble or a
    /// server-side 5xx). Node-reported errors never are.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Http { source, .. } => source.is_timeout() || source.is_connect(),
            RpcError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the node itself rejected the request (as opposed to the
    /// request never reaching it).
    pub fn is_rejection(&self) -> bool {
        matches!(self, RpcError::Rpc { .. })
    }
}
