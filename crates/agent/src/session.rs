//! Per-question mutable state.
//!
//! One question owns one [`Session`]; nothing here is shared across
//! questions. Tool handlers clone the `Arc` and mutate through the single
//! shared cell, so writes made inside independently-scheduled tool
//! invocations stay visible to the code assembling the final answer.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use serde_json::Value;

/// One issued REST call, as reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ApiCallRecord {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path_params: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query_params: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_attempt: Option<u32>,
}

/// Everything one question accumulates while its agent runs.
#[derive(Default)]
pub struct SessionState {
    /// Dataset registry: table name to rows, last-write-wins.
    pub tables: HashMap<String, Vec<Value>>,
    /// REST call log, poll attempts included.
    pub rest_calls: Vec<ApiCallRecord>,
    /// GraphQL query log.
    pub graphql_queries: Vec<String>,
    /// Most recent full (untruncated) result, for the final answer.
    pub last_result: Option<Vec<Value>>,
    /// Raw schema JSON the search tool operates on.
    pub raw_schema: String,
}

/// Shared handle to one question's state.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock()
    }

    /// Merge extracted tables into the registry and remember the primary
    /// dataset as the last full result.
    pub fn store_tables(&self, tables: HashMap<String, Vec<Value>>, primary: &str) {
        let mut state = self.lock();
        if let Some(rows) = tables.get(primary) {
            state.last_result = Some(rows.clone());
        }
        state.tables.extend(tables);
    }

    /// Snapshot of the registry for the SQL engine.
    pub fn tables_snapshot(&self) -> HashMap<String, Vec<Value>> {
        self.lock().tables.clone()
    }

    pub fn set_raw_schema(&self, raw: String) {
        self.lock().raw_schema = raw;
    }

    pub fn raw_schema(&self) -> String {
        self.lock().raw_schema.clone()
    }

    pub fn set_last_result(&self, rows: Vec<Value>) {
        self.lock().last_result = Some(rows);
    }

    pub fn push_rest_call(&self, record: ApiCallRecord) {
        self.lock().rest_calls.push(record);
    }

    pub fn push_graphql_query(&self, query: String) {
        self.lock().graphql_queries.push(query);
    }
}
