//! Raw HTTP exchange behind a trait.
//!
//! Implementations carry no policy: URL building, verb rules, and error
//! shaping all live above this boundary, so tests can inject canned
//! responses without a network.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use sg_domain::error::{Error, Result};

/// One HTTP exchange as the policy layer sees it.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body; non-JSON responses arrive as a JSON string, empty
    /// bodies as `null`.
    pub body: Value,
}

/// Raw request/response capability.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> Result<TransportResponse>;
}

/// Production transport over a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> Result<TransportResponse> {
        let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|e| Error::Http(format!("invalid method '{method}': {e}")))?;

        let mut request = self.client.request(method, url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(from_reqwest)?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(TransportResponse { status, body })
    }
}

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
