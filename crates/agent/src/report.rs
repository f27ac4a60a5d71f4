//! Final answer shape returned to the caller.

use serde::Serialize;
use serde_json::Value;

use crate::session::ApiCallRecord;

/// The calls issued during one run, keyed per dialect in the serialized
/// form (`queries` for GraphQL, `api_calls` for REST).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IssuedCalls {
    Graphql { queries: Vec<String> },
    Rest { api_calls: Vec<ApiCallRecord> },
}

/// Top-level question-processing outcome.
///
/// `ok=true` with a `[Partial - ...]` data prefix means the turn budget ran
/// out after data was retrieved; partial results beat total failure.
#[derive(Debug, Serialize)]
pub struct AnswerReport {
    pub ok: bool,
    pub data: Option<String>,
    /// Last full result, attached only when the caller opted in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub calls: IssuedCalls,
    pub error: Option<String>,
}

impl AnswerReport {
    pub fn failure(error: impl Into<String>, calls: IssuedCalls) -> Self {
        Self {
            ok: false,
            data: None,
            result: None,
            calls,
            error: Some(error.into()),
        }
    }
}
