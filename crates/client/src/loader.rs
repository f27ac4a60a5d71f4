//! One-shot schema fetch + compaction per question.
//!
//! GraphQL schemas come from the fixed introspection query; REST schemas
//! from the caller's OpenAPI document URL. Both keep the raw JSON blob for
//! the search tool and cap the compact text to the configured ceiling.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use sg_domain::error::{Error, Result};
use sg_schema::{govern_size, graphql, openapi};

use crate::graphql::GraphqlClient;
use crate::transport::Transport;

/// Compact schema text plus the retained raw blob.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    pub compact: String,
    /// Pretty-printed schema JSON the search tool operates on.
    pub raw: String,
    /// Base URL declared by an OpenAPI document's `servers` entry.
    pub base_url: Option<String>,
}

/// Introspect a GraphQL endpoint and compact the result.
///
/// Failures degrade to an empty context rather than aborting the question;
/// the agent can still issue queries blind and read the errors.
pub async fn fetch_graphql_schema(
    client: &GraphqlClient,
    endpoint: &str,
    headers: &HashMap<String, String>,
    max_chars: usize,
) -> SchemaContext {
    let result = client
        .execute(graphql::INTROSPECTION_QUERY, None, endpoint, headers)
        .await;
    if !result.success {
        tracing::warn!(error = ?result.error, "introspection failed; continuing without schema");
        return SchemaContext::default();
    }

    let Some(schema) = result.data.as_ref().and_then(|d| d.get("__schema")) else {
        tracing::warn!("introspection response had no __schema; continuing without schema");
        return SchemaContext::default();
    };

    let raw = serde_json::to_string_pretty(schema).unwrap_or_default();
    let compact = govern_size(graphql::build_schema_context(schema), max_chars);
    SchemaContext { compact, raw, base_url: None }
}

/// Fetch an OpenAPI document and compact it.
///
/// Unlike the GraphQL path, a REST question cannot proceed without the
/// document (it declares the endpoints), so fetch failures propagate.
pub async fn fetch_openapi_schema(
    transport: &Arc<dyn Transport>,
    spec_url: &str,
    headers: &HashMap<String, String>,
    max_chars: usize,
) -> Result<SchemaContext> {
    let response = transport.request("GET", spec_url, headers, None).await?;
    if !(200..300).contains(&response.status) {
        return Err(Error::Schema(format!(
            "could not fetch OpenAPI document from {spec_url}: HTTP {}",
            response.status
        )));
    }

    let spec: &Value = &response.body;
    let raw = serde_json::to_string_pretty(spec).unwrap_or_default();
    let compact = govern_size(openapi::build_schema_context(spec), max_chars);
    let base_url = openapi::base_url_from_spec(spec);
    Ok(SchemaContext { compact, raw, base_url })
}
