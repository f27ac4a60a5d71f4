//! Classify an API response into named tabular datasets.
//!
//! API responses typically wrap one payload array alongside scalar metadata
//! (`{"users": [...], "count": 100}`). The first array value found (in
//! document order) is taken as the payload; an object with no array values
//! is wrapped as a single-row table so it stays queryable.

use std::collections::HashMap;

use serde_json::Value;

use crate::summary::{table_summary, TableSummary};

/// Extract datasets from a response body.
///
/// Rules, in order:
/// 1. An array body becomes one dataset under `name`.
/// 2. An object body contributes its first array-valued entry under `name`;
///    sibling arrays are dropped.
/// 3. An object with no array values (including `{}`) is wrapped as the
///    single-row dataset `[body]`, with a schema summary attached.
/// 4. Scalars and `null` yield nothing.
///
/// The caller merges the returned map into its session registry
/// (last-write-wins on name reuse).
pub fn extract_tables(
    body: &Value,
    name: &str,
) -> (HashMap<String, Vec<Value>>, Option<TableSummary>) {
    let mut tables = HashMap::new();

    match body {
        Value::Array(rows) => {
            tables.insert(name.to_string(), rows.clone());
            (tables, None)
        }
        Value::Object(map) => {
            if let Some(rows) = map.values().find_map(Value::as_array) {
                tables.insert(name.to_string(), rows.clone());
                return (tables, None);
            }
            // No payload array: wrap the whole object as one row.
            let rows = vec![body.clone()];
            let summary = table_summary(&rows, name);
            tables.insert(name.to_string(), rows);
            (tables, Some(summary))
        }
        _ => (tables, None),
    }
}
