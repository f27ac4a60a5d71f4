//! Tools registered with the agent runtime.
//!
//! Every handler returns a serialized JSON object (or plain text for schema
//! search) and never an error: malformed arguments, blocked verbs, engine
//! failures, and exhausted polls all come back as `{"success": false, ...}`
//! payloads the model reads and corrects course on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use sg_client::graphql::GraphqlClient;
use sg_client::poll::{run_poll, value_text, PollOutcome, PollRequest};
use sg_client::rest::RestClient;
use sg_domain::config::Config;
use sg_domain::tool::ToolDefinition;
use sg_schema::{search_schema, SearchOptions};
use sg_tables::sql::SqlEngine;
use sg_tables::{extract_tables, truncate_for_context, ContextView, TableSummary};

use crate::runtime::{AgentTool, ToolHandler};
use crate::session::{ApiCallRecord, Session};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Result envelopes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct ViewEnvelope<'a> {
    success: bool,
    #[serde(flatten)]
    view: &'a ContextView,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<u32>,
}

#[derive(Serialize)]
struct SummaryEnvelope<'a> {
    success: bool,
    table: &'a str,
    #[serde(flatten)]
    summary: &'a TableSummary,
}

fn to_json(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"success": false, "error": "serialization failed: {e}"}}"#))
}

fn error_json(message: impl Into<String>) -> String {
    to_json(&json!({"success": false, "error": message.into()}))
}

fn view_json(rows: &[Value], name: &str, max_chars: usize, attempts: Option<u32>) -> String {
    match truncate_for_context(rows, name, max_chars) {
        Ok(view) => to_json(&ViewEnvelope { success: true, view: &view, attempts }),
        Err(e) => error_json(e.to_string()),
    }
}

/// Parse a caller-supplied JSON object fragment (path/query params).
fn parse_object_fragment(
    label: &str,
    text: &str,
) -> Result<Option<Map<String, Value>>, String> {
    if text.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(format!("Invalid {label} JSON: expected an object")),
        Err(e) => Err(format!("Invalid {label} JSON: {e}")),
    }
}

fn d_data() -> String {
    "data".into()
}
fn d_poll_result() -> String {
    "poll_result".into()
}
fn d_context_lines() -> usize {
    10
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// graphql_query
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct GraphqlQueryArgs {
    query: String,
    #[serde(default = "d_data")]
    name: String,
}

struct GraphqlQueryTool {
    client: Arc<GraphqlClient>,
    endpoint: String,
    headers: HashMap<String, String>,
    session: Session,
    max_result_chars: usize,
}

#[async_trait]
impl ToolHandler for GraphqlQueryTool {
    async fn call(&self, arguments: Value) -> String {
        let args: GraphqlQueryArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_json(format!("Invalid arguments: {e}")),
        };

        let result = self
            .client
            .execute(&args.query, None, &self.endpoint, &self.headers)
            .await;
        self.session.push_graphql_query(args.query.clone());

        if result.success {
            if let Some(data) = &result.data {
                let (tables, summary) = extract_tables(data, &args.name);
                let stored = tables.get(&args.name).cloned();
                self.session.store_tables(tables, &args.name);

                // Wrapped single-object result: return type info, not rows.
                if let Some(summary) = summary {
                    return to_json(&SummaryEnvelope {
                        success: true,
                        table: &args.name,
                        summary: &summary,
                    });
                }
                if let Some(rows) = stored {
                    return view_json(&rows, &args.name, self.max_result_chars, None);
                }
            }
        }
        to_json(&result)
    }
}

/// The GraphQL query tool, bound to one question's endpoint and session.
pub fn graphql_query_tool(
    client: Arc<GraphqlClient>,
    endpoint: String,
    headers: HashMap<String, String>,
    session: Session,
    config: &Config,
) -> AgentTool {
    AgentTool {
        definition: ToolDefinition {
            name: "graphql_query".into(),
            description: "Execute a GraphQL query. The result is stored as a named table \
                          for sql_query."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "GraphQL query string" },
                    "name": { "type": "string", "description": "Table name (default: data)" }
                },
                "required": ["query"]
            }),
        },
        handler: Arc::new(GraphqlQueryTool {
            client,
            endpoint,
            headers,
            session,
            max_result_chars: config.agent.max_result_chars,
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// rest_call
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct RestCallArgs {
    method: String,
    path: String,
    #[serde(default)]
    path_params: String,
    #[serde(default)]
    query_params: String,
    #[serde(default)]
    body: String,
    #[serde(default = "d_data")]
    name: String,
}

struct RestCallTool {
    client: Arc<RestClient>,
    session: Session,
    max_result_chars: usize,
}

#[async_trait]
impl ToolHandler for RestCallTool {
    async fn call(&self, arguments: Value) -> String {
        let args: RestCallArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_json(format!("Invalid arguments: {e}")),
        };

        let path_params = match parse_object_fragment("path_params", &args.path_params) {
            Ok(p) => p,
            Err(e) => return error_json(e),
        };
        let query_params = match parse_object_fragment("query_params", &args.query_params) {
            Ok(p) => p,
            Err(e) => return error_json(e),
        };
        let body: Option<Value> = if args.body.is_empty() {
            None
        } else {
            match serde_json::from_str(&args.body) {
                Ok(v) => Some(v),
                Err(e) => return error_json(format!("Invalid body JSON: {e}")),
            }
        };

        let result = self
            .client
            .execute(
                &args.method,
                &args.path,
                path_params.as_ref(),
                query_params.as_ref(),
                body.as_ref(),
            )
            .await;

        self.session.push_rest_call(ApiCallRecord {
            method: args.method.clone(),
            path: args.path.clone(),
            path_params: args.path_params.clone(),
            query_params: args.query_params.clone(),
            body: args.body.clone(),
            poll_attempt: None,
        });

        if result.success {
            if let Some(data) = &result.data {
                let (tables, summary) = extract_tables(data, &args.name);
                let stored = tables.get(&args.name).cloned();
                self.session.store_tables(tables, &args.name);

                if let Some(summary) = summary {
                    return to_json(&SummaryEnvelope {
                        success: true,
                        table: &args.name,
                        summary: &summary,
                    });
                }
                if let Some(rows) = stored {
                    return view_json(&rows, &args.name, self.max_result_chars, None);
                }
            }
        }
        to_json(&result)
    }
}

/// The REST call tool, bound to one question's client and session.
pub fn rest_call_tool(client: Arc<RestClient>, session: Session, config: &Config) -> AgentTool {
    AgentTool {
        definition: ToolDefinition {
            name: "rest_call".into(),
            description: "Execute a REST call. The result is stored as a named table for \
                          sql_query. GET is always allowed; other methods need an allow-listed \
                          path."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "method": { "type": "string", "description": "HTTP method" },
                    "path": { "type": "string", "description": "API path, e.g. /users/{id}" },
                    "path_params": { "type": "string", "description": "JSON object for path placeholders" },
                    "query_params": { "type": "string", "description": "JSON object for query parameters" },
                    "body": { "type": "string", "description": "JSON request body" },
                    "name": { "type": "string", "description": "Table name (default: data)" }
                },
                "required": ["method", "path"]
            }),
        },
        handler: Arc::new(RestCallTool {
            client,
            session,
            max_result_chars: config.agent.max_result_chars,
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// poll_until_done
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct PollArgs {
    method: String,
    path: String,
    done_field: String,
    done_value: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    path_params: String,
    #[serde(default)]
    query_params: String,
    #[serde(default = "d_poll_result")]
    name: String,
    #[serde(default)]
    delay_ms: u64,
}

struct PollTool {
    client: Arc<RestClient>,
    session: Session,
    max_polls: u32,
    default_delay_ms: u64,
    max_result_chars: usize,
}

#[async_trait]
impl ToolHandler for PollTool {
    async fn call(&self, arguments: Value) -> String {
        let args: PollArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_json(format!("Invalid arguments: {e}")),
        };

        // The body must parse before the state machine sees anything.
        let body: Option<Value> = if args.body.is_empty() {
            None
        } else {
            match serde_json::from_str(&args.body) {
                Ok(v) => Some(v),
                Err(e) => return error_json(format!("Invalid body JSON: {e}")),
            }
        };
        let path_params = match parse_object_fragment("path_params", &args.path_params) {
            Ok(p) => p,
            Err(e) => return error_json(e),
        };
        let query_params = match parse_object_fragment("query_params", &args.query_params) {
            Ok(p) => p,
            Err(e) => return error_json(e),
        };

        let delay_ms = if args.delay_ms > 0 { args.delay_ms } else { self.default_delay_ms };
        let result = run_poll(
            self.client.as_ref(),
            PollRequest {
                method: args.method,
                path: args.path,
                done_field: args.done_field.clone(),
                done_value: args.done_value.clone(),
                body,
                path_params,
                query_params,
                max_attempts: self.max_polls,
                delay: Duration::from_millis(delay_ms),
            },
        )
        .await;

        // Poll attempts always land in the call log, success or not.
        for attempt in &result.log {
            self.session.push_rest_call(ApiCallRecord {
                method: attempt.method.clone(),
                path: attempt.path.clone(),
                path_params: String::new(),
                query_params: String::new(),
                body: attempt.body.clone(),
                poll_attempt: Some(attempt.poll_attempt),
            });
        }

        match result.outcome {
            PollOutcome::Done { body, attempts } => {
                let (tables, _) = extract_tables(&body, &args.name);
                self.session.store_tables(tables, &args.name);
                let rows = match body {
                    Value::Array(rows) => rows,
                    other => vec![other],
                };
                view_json(&rows, &args.name, self.max_result_chars, Some(attempts))
            }
            PollOutcome::FieldMissing { path, available_keys } => error_json(format!(
                "done_field '{path}' not found in response. Available keys: {available_keys:?}"
            )),
            PollOutcome::RequestFailed { attempt, error } => {
                to_json(&json!({"success": false, "error": error, "attempt": attempt}))
            }
            PollOutcome::Exhausted { last_value, attempts } => to_json(&json!({
                "success": false,
                "error": format!(
                    "max_polls ({}) exceeded. Last {} value: {} (expected: {})",
                    self.max_polls,
                    args.done_field,
                    value_text(last_value.as_ref()),
                    args.done_value
                ),
                "attempts": attempts,
            })),
        }
    }
}

/// The polling tool; registered only when the caller declared polling paths.
pub fn poll_tool(client: Arc<RestClient>, session: Session, config: &Config) -> AgentTool {
    AgentTool {
        definition: ToolDefinition {
            name: "poll_until_done".into(),
            description: "Poll an async endpoint until done_field equals done_value. \
                          Auto-increments polling.count in the body between attempts."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "method": { "type": "string", "description": "HTTP method (typically POST)" },
                    "path": { "type": "string", "description": "API path" },
                    "done_field": { "type": "string", "description": "Dot-path to check, e.g. trips.0.isCompleted" },
                    "done_value": { "type": "string", "description": "Value signalling completion, as a string" },
                    "body": { "type": "string", "description": "JSON request body" },
                    "path_params": { "type": "string", "description": "JSON object for path placeholders" },
                    "query_params": { "type": "string", "description": "JSON object for query parameters" },
                    "name": { "type": "string", "description": "Table name (default: poll_result)" },
                    "delay_ms": { "type": "integer", "description": "Delay between polls in ms" }
                },
                "required": ["method", "path", "done_field", "done_value"]
            }),
        },
        handler: Arc::new(PollTool {
            client,
            session,
            max_polls: config.agent.max_polls,
            default_delay_ms: config.agent.poll_delay_ms,
            max_result_chars: config.agent.max_result_chars,
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// sql_query
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct SqlArgs {
    sql: String,
}

struct SqlTool {
    engine: Arc<dyn SqlEngine>,
    session: Session,
    max_result_chars: usize,
    /// Dialect's query tool, named in the no-data error.
    query_tool: &'static str,
}

#[async_trait]
impl ToolHandler for SqlTool {
    async fn call(&self, arguments: Value) -> String {
        let args: SqlArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_json(format!("Invalid arguments: {e}")),
        };

        let tables = self.session.tables_snapshot();
        if tables.is_empty() {
            return error_json(format!("No data. Call {} first.", self.query_tool));
        }

        let outcome = self.engine.execute(&tables, &args.sql);
        if outcome.success {
            self.session.set_last_result(outcome.result.clone());
            return view_json(&outcome.result, "sql_result", self.max_result_chars, None);
        }
        to_json(&outcome)
    }
}

/// The SQL tool over this question's dataset registry.
pub fn sql_tool(
    engine: Arc<dyn SqlEngine>,
    session: Session,
    config: &Config,
    query_tool: &'static str,
) -> AgentTool {
    AgentTool {
        definition: ToolDefinition {
            name: "sql_query".into(),
            description: "Run SQL over stored results. Available tables are the names used in \
                          earlier calls."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "sql": { "type": "string", "description": "SQL statement" }
                },
                "required": ["sql"]
            }),
        },
        handler: Arc::new(SqlTool {
            engine,
            session,
            max_result_chars: config.agent.max_result_chars,
            query_tool,
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// search_schema
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct SearchArgs {
    pattern: String,
    #[serde(default = "d_context_lines")]
    context: usize,
    #[serde(default)]
    before: usize,
    #[serde(default)]
    after: usize,
    #[serde(default)]
    offset: usize,
}

struct SearchSchemaTool {
    session: Session,
    max_matches: usize,
}

#[async_trait]
impl ToolHandler for SearchSchemaTool {
    async fn call(&self, arguments: Value) -> String {
        let args: SearchArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_json(format!("Invalid arguments: {e}")),
        };
        let blob = self.session.raw_schema();
        search_schema(
            &blob,
            &args.pattern,
            &SearchOptions {
                before: args.before,
                after: args.after,
                context: args.context,
                offset: args.offset,
            },
            self.max_matches,
        )
    }
}

/// The schema search tool over this question's raw schema blob.
pub fn search_tool(session: Session, config: &Config) -> AgentTool {
    AgentTool {
        definition: ToolDefinition {
            name: "search_schema".into(),
            description: "Grep-like regex search on the raw schema. Output lines: \
                          \"line:match\" and \"line-context\"; paginate with offset."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "pattern": { "type": "string", "description": "Regex pattern (case-insensitive)" },
                    "context": { "type": "integer", "description": "Lines around each match (default 10)" },
                    "before": { "type": "integer", "description": "Lines before match (overrides context)" },
                    "after": { "type": "integer", "description": "Lines after match (overrides context)" },
                    "offset": { "type": "integer", "description": "Matches to skip (pagination)" }
                },
                "required": ["pattern"]
            }),
        },
        handler: Arc::new(SearchSchemaTool { session, max_matches: config.schema.max_search_matches }),
    }
}
