use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which API dialect a question targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKind {
    Graphql,
    Rest,
}

/// Immutable caller-derived configuration for one question.
///
/// For GraphQL, `target_url` is the query endpoint; for REST it is the URL
/// of the OpenAPI document. Headers are forwarded verbatim on every outbound
/// request; nothing here manages credentials.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub api_kind: ApiKind,
    pub target_url: String,
    /// Headers forwarded to the target API on every request.
    pub target_headers: HashMap<String, String>,
    /// Explicit base URL override; wins over the OpenAPI `servers` entry.
    pub base_url: Option<String>,
    /// Glob patterns for which POST/PUT/PATCH/DELETE are permitted.
    pub allow_unsafe_paths: Vec<String>,
    /// Paths the caller declares as async; their presence enables the
    /// polling tool.
    pub poll_paths: Vec<String>,
    /// Attach the last full (untruncated) result to the final answer.
    pub include_result: bool,
}

impl RequestContext {
    /// Context for a GraphQL endpoint with no extra policy.
    pub fn graphql(target_url: impl Into<String>) -> Self {
        Self {
            api_kind: ApiKind::Graphql,
            target_url: target_url.into(),
            target_headers: HashMap::new(),
            base_url: None,
            allow_unsafe_paths: Vec::new(),
            poll_paths: Vec::new(),
            include_result: false,
        }
    }

    /// Context for a REST API described by an OpenAPI document URL.
    pub fn rest(spec_url: impl Into<String>) -> Self {
        Self {
            api_kind: ApiKind::Rest,
            target_url: spec_url.into(),
            target_headers: HashMap::new(),
            base_url: None,
            allow_unsafe_paths: Vec::new(),
            poll_paths: Vec::new(),
            include_result: false,
        }
    }
}
