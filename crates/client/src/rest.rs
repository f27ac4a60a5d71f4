//! REST request policy and execution.
//!
//! GET is always permitted; unsafe verbs (POST/PUT/PATCH/DELETE) require the
//! target path to match a caller-supplied glob allowlist. Blocked verbs,
//! transport failures, and non-2xx statuses all come back as a structured
//! [`ApiOutcome`] the agent can read and recover from.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use sg_domain::error::{Error, Result};

use crate::transport::Transport;

/// Structured result of one REST call.
#[derive(Debug, Clone, Serialize)]
pub struct ApiOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiOutcome {
    pub fn ok(status: u16, data: Value) -> Self {
        Self {
            success: true,
            status_code: Some(status),
            data: Some(data),
            error: None,
            hint: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: None,
            data: None,
            error: Some(error.into()),
            hint: None,
        }
    }
}

/// Check a path against the unsafe-verb allowlist.
///
/// Glob semantics with default match options: `*` may span path separators
/// but never bridges a missing one, so `/api/*/search` admits
/// `/api/v1/search` and rejects `/api/search`, while `/api/booking/search/*`
/// admits any deeper path but not the bare prefix.
pub fn is_path_allowed(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| {
        glob::Pattern::new(p)
            .map(|pattern| pattern.matches(path))
            .unwrap_or(false)
    })
}

/// Build the full request URL: base + path with `{placeholder}` substitution
/// and encoded query parameters. `null`-valued query parameters are dropped.
pub fn build_url(
    path: &str,
    base_url: &str,
    path_params: Option<&Map<String, Value>>,
    query_params: Option<&Map<String, Value>>,
) -> Result<String> {
    if base_url.is_empty() {
        return Err(Error::Other("No base URL provided".into()));
    }

    let mut filled = path.to_string();
    if let Some(params) = path_params {
        for (key, value) in params {
            filled = filled.replace(&format!("{{{key}}}"), &scalar_text(value));
        }
    }

    let joined = format!("{}{}", base_url.trim_end_matches('/'), filled);
    let mut url = reqwest::Url::parse(&joined)
        .map_err(|e| Error::Http(format!("invalid URL '{joined}': {e}")))?;

    if let Some(params) = query_params {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            if value.is_null() {
                continue;
            }
            pairs.append_pair(key, &scalar_text(value));
        }
    }

    Ok(url.to_string())
}

/// Render a JSON scalar the way it appears in a URL (strings unquoted).
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// REST executor bound to one question's base URL, headers, and allowlist.
pub struct RestClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    headers: HashMap<String, String>,
    allow_unsafe_paths: Vec<String>,
}

impl RestClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        headers: HashMap<String, String>,
        allow_unsafe_paths: Vec<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            headers,
            allow_unsafe_paths,
        }
    }

    /// Execute one REST call under the verb policy.
    pub async fn execute(
        &self,
        method: &str,
        path: &str,
        path_params: Option<&Map<String, Value>>,
        query_params: Option<&Map<String, Value>>,
        body: Option<&Value>,
    ) -> ApiOutcome {
        let method = method.to_uppercase();
        if method != "GET" && !is_path_allowed(path, &self.allow_unsafe_paths) {
            return ApiOutcome::failure(format!(
                "{method} {path} not allowed: unsafe methods require a path matching \
                 the allow list"
            ));
        }

        let url = match build_url(path, &self.base_url, path_params, query_params) {
            Ok(url) => url,
            Err(e) => return ApiOutcome::failure(e.to_string()),
        };

        tracing::debug!(%method, %url, "REST call");

        match self.transport.request(&method, &url, &self.headers, body).await {
            Err(e) => ApiOutcome::failure(e.to_string()),
            Ok(response) if (200..300).contains(&response.status) => {
                ApiOutcome::ok(response.status, response.body)
            }
            Ok(response) => {
                let body_text = match &response.body {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let mut outcome = ApiOutcome::failure(format!(
                    "HTTP {}: {}",
                    response.status,
                    clip(&body_text, 500)
                ));
                outcome.status_code = Some(response.status);
                if response.status >= 400 {
                    outcome.hint =
                        Some("Use search_schema to find valid enum values or field names".into());
                }
                outcome
            }
        }
    }
}

fn clip(text: &str, max: usize) -> &str {
    let mut end = max.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
