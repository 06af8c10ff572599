//! JSON-RPC over HTTP.
//!
//! Muse nodes multiplex their APIs through a single `call` method whose
//! params are `[api_name, method, args]`. `call()` builds that envelope and
//! POSTs it to the node root; `call_method()` sends a bare method for the
//! few endpoints that are exposed directly.
//!
//! Supports Basic auth, an optional timeout, and optional retry with
//! exponential backoff. Both are off by default: a failed request surfaces
//! immediately.

use crate::error::RpcError;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// `result` is legitimately `null` for calls such as
/// `broadcast_transaction`, so absence of an error is what signals success.
#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Value,
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Connection settings for a node endpoint.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    /// Basic auth is sent only when both user and password are set.
    pub username: Option<String>,
    pub password: Option<String>,
    /// `None` waits for the node indefinitely.
    pub timeout: Option<Duration>,
    /// Extra attempts after a transient failure.
    pub retries: u32,
    /// Backoff before the first retry; doubled for each later one.
    pub retry_delay: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: crate::DEFAULT_NODE_URL.to_string(),
            username: None,
            password: None,
            timeout: None,
            retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }
}

fn basic_auth(config: &RpcConfig) -> Option<HeaderValue> {
    let (Some(user), Some(pass)) = (&config.username, &config.password) else {
        return None;
    };
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, pass));
    HeaderValue::from_str(&format!("Basic {}", token)).ok()
}

/// Async JSON-RPC client for a Muse node.
pub struct RpcClient {
    client: reqwest::Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Self::with_config(RpcConfig {
            url: url.to_string(),
            ..Default::default()
        })
    }

    pub fn with_config(mut config: RpcConfig) -> Result<Self, RpcError> {
        config.url = config.url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = basic_auth(&config) {
            headers.insert(AUTHORIZATION, auth);
        }
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(4);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| RpcError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call `method` on the named node API.
    pub async fn call(&self, api: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        log::debug!("rpc call {}.{}", api, method);
        self.send("call", method, json!([api, method, params])).await
    }

    /// Call and decode the result into `T`.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        api: &str,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let value = self.call(api, method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::Json {
            context: format!("{}.{}", api, method),
            source: e,
        })
    }

    /// Call a method exposed directly at the top level.
    pub async fn call_method(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.send(method, method, params).await
    }

    async fn send(&self, rpc_method: &str, label: &str, params: Value) -> Result<Value, RpcError> {
        let req = Request {
            jsonrpc: "2.0",
            id: self.request_id(),
            method: rpc_method,
            params,
        };

        let mut delay = self.config.retry_delay;
        for retry in 0..self.config.retries {
            match self.post(&req, label).await {
                Err(e) if e.is_transient() => {
                    log::warn!(
                        "{} failed ({}); retry {}/{} in {:?}",
                        label,
                        e,
                        retry + 1,
                        self.config.retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                result => return result,
            }
        }
        self.post(&req, label).await
    }

    async fn post(&self, req: &Request<'_>, method: &str) -> Result<Value, RpcError> {
        let url = &self.config.url;
        let resp = self
            .client
            .post(url)
            .json(req)
            .send()
            .await
            .map_err(|e| RpcError::Http {
                method: method.to_string(),
                url: url.to_string(),
                source: e,
            })?;

        let status = resp.status().as_u16();
        if status == 401 {
            return Err(RpcError::AuthFailed { url: url.to_string() });
        }

        // Graphene nodes report RPC failures with a 500 and a JSON error body.
        let text = resp.text().await.map_err(|e| RpcError::Http {
            method: method.to_string(),
            url: url.to_string(),
            source: e,
        })?;
        let http_status = || RpcError::HttpStatus {
            method: method.to_string(),
            url: url.to_string(),
            status,
            body: text.chars().take(500).collect(),
        };

        match serde_json::from_str::<Response>(&text) {
            Ok(Response { error: Some(err), .. }) => Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
                method: method.to_string(),
            }),
            Ok(_) if status >= 400 => Err(http_status()),
            Ok(Response { result, .. }) => Ok(result),
            Err(e) if status < 400 => Err(RpcError::Json {
                context: method.to_string(),
                source: e,
            }),
            Err(_) => Err(http_status()),
        }
    }

    /// True if the node answers `get_chain_id`.
    pub async fn is_connected(&self) -> bool {
        self.call(crate::apis::DATABASE, "get_chain_id", json!([]))
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RpcConfig::default();
        assert_eq!(config.url, "http://localhost:8090");
        assert_eq!(config.timeout, None);
        assert_eq!(config.retries, 0);
    }

    #[test]
    fn test_client_url() {
        let client = RpcClient::new("http://example.com:8090/").unwrap();
        assert_eq!(client.url(), "http://example.com:8090");
    }

    #[test]
    fn test_ids_are_sequential() {
        let client = RpcClient::new("http://localhost:8090").unwrap();
        let first = client.request_id();
        assert_eq!(client.request_id(), first + 1);
    }

    #[test]
    fn test_basic_auth_needs_both_parts() {
        let mut config = RpcConfig {
            username: Some("user".to_string()),
            ..Default::default()
        };
        assert!(basic_auth(&config).is_none());

        config.password = Some("pass".to_string());
        assert_eq!(basic_auth(&config).unwrap(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_call_envelope_shape() {
        let req = Request {
            jsonrpc: "2.0",
            id: 7,
            method: "call",
            params: json!(["database", "get_chain_id", []]),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["method"], "call");
        assert_eq!(v["params"][0], "database");
        assert_eq!(v["params"][1], "get_chain_id");
        assert_eq!(v["id"], 7);
    }

    #[test]
    fn test_null_result_is_success() {
        let body: Response = serde_json::from_str(r#"{"id":1,"jsonrpc":"2.0","result":null}"#).unwrap();
        assert!(body.error.is_none());
        assert!(body.result.is_null());
    }

    #[test]
    fn test_error_body_parses() {
        let body: Response = serde_json::from_str(
            r#"{"id":1,"error":{"code":1,"message":"Assert Exception","data":{}}}"#,
        )
        .unwrap();
        assert_eq!(body.error.unwrap().message, "Assert Exception");
    }
}
