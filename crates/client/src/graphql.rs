//! GraphQL query execution over the transport.
//!
//! One POST with a `{query, variables}` body; the conventional
//! `{data, errors}` envelope is unwrapped here so callers only ever see the
//! `data` value or a structured error string.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::transport::Transport;

/// Structured result of one GraphQL execution.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GraphqlOutcome {
    fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

/// GraphQL executor bound to the shared transport.
pub struct GraphqlClient {
    transport: Arc<dyn Transport>,
}

impl GraphqlClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn execute(
        &self,
        query: &str,
        variables: Option<&Value>,
        endpoint: &str,
        headers: &HashMap<String, String>,
    ) -> GraphqlOutcome {
        let mut body = json!({ "query": query });
        if let Some(vars) = variables {
            body["variables"] = vars.clone();
        }

        tracing::debug!(%endpoint, "GraphQL call");

        let response = match self.transport.request("POST", endpoint, headers, Some(&body)).await
        {
            Ok(response) => response,
            Err(e) => return GraphqlOutcome::failure(e.to_string()),
        };

        if !(200..300).contains(&response.status) {
            return GraphqlOutcome::failure(format!("HTTP {}", response.status));
        }

        // GraphQL errors arrive alongside (possibly partial) data.
        if let Some(errors) = response.body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect();
                return GraphqlOutcome::failure(messages.join("; "));
            }
        }

        GraphqlOutcome {
            success: true,
            data: response.body.get("data").cloned(),
            error: None,
        }
    }
}
