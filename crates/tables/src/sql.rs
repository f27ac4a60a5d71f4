//! Interface to the external analytical engine.
//!
//! The engine itself (DuckDB or similar) is injected by the embedding
//! process; this crate only defines the contract: run one SQL statement over
//! the session's named tables and report rows or a structured error.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// Result of one SQL execution. Errors are data, never panics; the agent
/// reads them and self-corrects.
#[derive(Debug, Clone, Serialize)]
pub struct SqlOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SqlOutcome {
    pub fn rows(result: Vec<Value>) -> Self {
        Self { success: true, result, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, result: Vec::new(), error: Some(error.into()) }
    }
}

/// Analytical engine running SQL over named in-memory tables.
pub trait SqlEngine: Send + Sync {
    fn execute(&self, tables: &HashMap<String, Vec<Value>>, sql: &str) -> SqlOutcome;
}
