//! Per-question orchestration.
//!
//! One question = one session, one schema fetch, one agent run. The runtime
//! outcome is normalized so the caller always receives a structured report:
//! partial results are preferred over total failure whenever the run
//! retrieved any data, and nothing below this boundary panics through.

use std::sync::Arc;

use serde_json::Value;

use sg_client::graphql::GraphqlClient;
use sg_client::loader::{fetch_graphql_schema, fetch_openapi_schema};
use sg_client::rest::RestClient;
use sg_client::transport::Transport;
use sg_domain::config::Config;
use sg_domain::context::{ApiKind, RequestContext};
use sg_domain::error::Result;
use sg_tables::sql::SqlEngine;

use crate::prompts;
use crate::report::{AnswerReport, IssuedCalls};
use crate::runtime::{AgentRuntime, AgentSpec, RunOutcome};
use crate::session::Session;
use crate::tools::{graphql_query_tool, poll_tool, rest_call_tool, search_tool, sql_tool};

/// Injected collaborators shared by every question.
pub struct AgentDeps {
    pub runtime: Arc<dyn AgentRuntime>,
    pub transport: Arc<dyn Transport>,
    pub engine: Arc<dyn SqlEngine>,
    pub config: Config,
}

/// Process one natural-language question against the configured API.
///
/// This is the last-resort error boundary: anything that escapes the flows
/// below is folded into `{ok: false, error}` rather than propagating.
pub async fn answer_question(
    deps: &AgentDeps,
    question: &str,
    ctx: &RequestContext,
) -> AnswerReport {
    let result = match ctx.api_kind {
        ApiKind::Graphql => graphql_question(deps, question, ctx).await,
        ApiKind::Rest => rest_question(deps, question, ctx).await,
    };
    match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "question processing failed");
            AnswerReport::failure(e.to_string(), empty_calls(ctx.api_kind))
        }
    }
}

fn empty_calls(kind: ApiKind) -> IssuedCalls {
    match kind {
        ApiKind::Graphql => IssuedCalls::Graphql { queries: Vec::new() },
        ApiKind::Rest => IssuedCalls::Rest { api_calls: Vec::new() },
    }
}

async fn graphql_question(
    deps: &AgentDeps,
    question: &str,
    ctx: &RequestContext,
) -> Result<AnswerReport> {
    let session = Session::new();
    let client = Arc::new(GraphqlClient::new(deps.transport.clone()));

    let schema = fetch_graphql_schema(
        &client,
        &ctx.target_url,
        &ctx.target_headers,
        deps.config.schema.max_schema_chars,
    )
    .await;
    session.set_raw_schema(schema.raw);

    let tools = vec![
        graphql_query_tool(
            client.clone(),
            ctx.target_url.clone(),
            ctx.target_headers.clone(),
            session.clone(),
            &deps.config,
        ),
        sql_tool(deps.engine.clone(), session.clone(), &deps.config, "graphql_query"),
        search_tool(session.clone(), &deps.config),
    ];
    let spec = AgentSpec {
        name: "graphql-agent".into(),
        instructions: prompts::graphql_instructions(&deps.config.agent),
        tools,
    };
    let input = augment(question, &schema.compact);

    let outcome = deps.runtime.run(spec, &input, deps.config.agent.max_turns).await?;
    Ok(finish(outcome, &session, ctx, deps.config.agent.max_turns))
}

async fn rest_question(
    deps: &AgentDeps,
    question: &str,
    ctx: &RequestContext,
) -> Result<AnswerReport> {
    let session = Session::new();

    let schema = fetch_openapi_schema(
        &deps.transport,
        &ctx.target_url,
        &ctx.target_headers,
        deps.config.schema.max_schema_chars,
    )
    .await?;
    session.set_raw_schema(schema.raw);

    // Explicit override wins over the document's servers entry.
    let Some(base_url) = ctx.base_url.clone().or(schema.base_url) else {
        return Ok(AnswerReport::failure(
            "Could not determine base URL. Provide a base URL override or ensure the \
             OpenAPI document has a 'servers' entry.",
            empty_calls(ApiKind::Rest),
        ));
    };

    let client = Arc::new(RestClient::new(
        deps.transport.clone(),
        base_url,
        ctx.target_headers.clone(),
        ctx.allow_unsafe_paths.clone(),
    ));

    let mut tools = vec![rest_call_tool(client.clone(), session.clone(), &deps.config)];
    if !ctx.poll_paths.is_empty() {
        tools.push(poll_tool(client.clone(), session.clone(), &deps.config));
    }
    tools.push(sql_tool(deps.engine.clone(), session.clone(), &deps.config, "rest_call"));
    tools.push(search_tool(session.clone(), &deps.config));

    let spec = AgentSpec {
        name: "rest-agent".into(),
        instructions: prompts::rest_instructions(&deps.config.agent, &ctx.poll_paths),
        tools,
    };
    let input = augment(question, &schema.compact);

    let outcome = deps.runtime.run(spec, &input, deps.config.agent.max_turns).await?;
    Ok(finish(outcome, &session, ctx, deps.config.agent.max_turns))
}

/// Prepend the compact schema to the question when one was produced.
fn augment(question: &str, compact_schema: &str) -> String {
    if compact_schema.is_empty() {
        question.to_string()
    } else {
        format!("{compact_schema}\n\nQuestion: {question}")
    }
}

/// Normalize the runtime outcome into the caller-facing report.
fn finish(
    outcome: RunOutcome,
    session: &Session,
    ctx: &RequestContext,
    max_turns: u32,
) -> AnswerReport {
    let (calls, last_result) = {
        let state = session.lock();
        let calls = match ctx.api_kind {
            ApiKind::Graphql => IssuedCalls::Graphql { queries: state.graphql_queries.clone() },
            ApiKind::Rest => IssuedCalls::Rest { api_calls: state.rest_calls.clone() },
        };
        (calls, state.last_result.clone())
    };
    let attach_result = |rows: &Option<Vec<Value>>| {
        if ctx.include_result {
            rows.clone().map(Value::Array)
        } else {
            None
        }
    };

    match outcome {
        RunOutcome::Completed { final_output, turns_used } if !final_output.is_empty() => {
            tracing::debug!(turns = turns_used, "agent completed");
            AnswerReport {
                ok: true,
                data: Some(final_output),
                result: attach_result(&last_result),
                calls,
                error: None,
            }
        }
        RunOutcome::Completed { turns_used, .. } => {
            let info = format!("turn {turns_used}/{max_turns}");
            if last_result.is_some() {
                AnswerReport {
                    ok: true,
                    data: Some(format!(
                        "[Partial - {info}] Data retrieved but agent didn't complete."
                    )),
                    result: attach_result(&last_result),
                    calls,
                    error: None,
                }
            } else {
                AnswerReport {
                    ok: false,
                    data: None,
                    result: None,
                    calls,
                    error: Some(format!("No output ({info})")),
                }
            }
        }
        RunOutcome::TurnLimitExceeded { turns_used } => {
            let info = format!("turn {turns_used}/{max_turns}");
            if last_result.is_some() {
                AnswerReport {
                    ok: true,
                    data: Some(format!(
                        "[Partial - {info}] Max turns exceeded but data retrieved."
                    )),
                    result: attach_result(&last_result),
                    calls,
                    error: None,
                }
            } else {
                AnswerReport {
                    ok: false,
                    data: None,
                    result: None,
                    calls,
                    error: Some(format!("Max turns exceeded ({info}), no data retrieved")),
                }
            }
        }
    }
}
