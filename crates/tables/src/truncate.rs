//! Character-budgeted truncation that never splits a row.
//!
//! Tool results go back into a bounded model context, so a table is cut to
//! the budget by accumulating whole rows while the serialized array still
//! fits. A truncated view carries the schema of the FULL table (types
//! reflect every row, not just the shown subset) and a hint for retrieving
//! the rest through the SQL tool.

use serde::Serialize;
use serde_json::Value;

use sg_domain::error::Result;

use crate::summary::table_summary;

/// Default character budget for any tool result returned to the agent.
pub const DEFAULT_MAX_RESULT_CHARS: usize = 32_000;

/// A possibly-reduced view of one table.
#[derive(Debug, Clone, Serialize)]
pub struct ContextView {
    pub truncated: bool,
    pub table: String,
    /// Total rows in the full table.
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showing: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub data: Vec<Value>,
}

/// Fit `rows` into `max_chars` of compact JSON.
///
/// A table whose serialized size is exactly `max_chars` is returned intact
/// (inclusive boundary). The returned `data` is always a prefix of `rows`;
/// no row is ever split.
pub fn truncate_for_context(rows: &[Value], name: &str, max_chars: usize) -> Result<ContextView> {
    // Serialized length of the compact array: brackets + rows + commas.
    let mut row_lens = Vec::with_capacity(rows.len());
    let mut full_len = 2usize;
    for row in rows {
        let len = serde_json::to_string(row)?.len();
        full_len += len;
        row_lens.push(len);
    }
    full_len += rows.len().saturating_sub(1);

    if full_len <= max_chars {
        return Ok(ContextView {
            truncated: false,
            table: name.to_string(),
            rows: rows.len(),
            showing: None,
            schema: None,
            hint: None,
            data: rows.to_vec(),
        });
    }

    let mut acc = 2usize;
    let mut showing = 0usize;
    for len in &row_lens {
        let sep = usize::from(showing > 0);
        if acc + sep + len > max_chars {
            break;
        }
        acc += sep + len;
        showing += 1;
    }

    tracing::debug!(table = name, rows = rows.len(), showing, "result truncated to budget");
    let summary = table_summary(rows, name);
    Ok(ContextView {
        truncated: true,
        table: name.to_string(),
        rows: rows.len(),
        showing: Some(showing),
        schema: Some(summary.schema),
        hint: Some(format!(
            "Showing {showing} of {} rows. Full data is in table '{name}'; \
             use sql_query to page through or aggregate the rest.",
            rows.len()
        )),
        data: rows[..showing].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn small_data_not_truncated() {
        let rows = vec![json!({"id": 1, "name": "Alice"}), json!({"id": 2, "name": "Bob"})];
        let view = truncate_for_context(&rows, "users", DEFAULT_MAX_RESULT_CHARS).unwrap();

        assert!(!view.truncated);
        assert_eq!(view.data, rows);
        assert_eq!(view.table, "users");
        assert_eq!(view.rows, 2);
        assert!(view.schema.is_none());
        assert!(view.showing.is_none());
    }

    #[test]
    fn large_data_truncated_with_schema() {
        let rows: Vec<_> =
            (0..100).map(|i| json!({"id": i, "content": "x".repeat(1000)})).collect();
        let view = truncate_for_context(&rows, "big_table", DEFAULT_MAX_RESULT_CHARS).unwrap();

        assert!(view.truncated);
        assert_eq!(view.table, "big_table");
        assert_eq!(view.rows, 100);
        let showing = view.showing.unwrap();
        assert!(showing < 100);
        assert_eq!(view.data.len(), showing);
        assert!(view.schema.unwrap().contains("content VARCHAR"));
        assert!(view.hint.unwrap().contains("big_table"));
    }

    #[test]
    fn respects_custom_budget() {
        let rows: Vec<_> = (0..50).map(|i| json!({"id": i, "content": "x".repeat(100)})).collect();
        let view = truncate_for_context(&rows, "test", 500).unwrap();

        assert!(view.truncated);
        let serialized = serde_json::to_string(&view.data).unwrap();
        assert!(serialized.len() <= 500);
    }

    #[test]
    fn exact_budget_is_not_truncated() {
        let rows = vec![json!({"id": 1})];
        let exact = serde_json::to_string(&rows).unwrap().len();
        let view = truncate_for_context(&rows, "test", exact).unwrap();

        assert!(!view.truncated);
        assert_eq!(view.data, rows);
        assert_eq!(view.rows, 1);
    }

    #[test]
    fn one_char_under_budget_truncates() {
        let rows = vec![json!({"id": 1}), json!({"id": 2})];
        let exact = serde_json::to_string(&rows).unwrap().len();
        let view = truncate_for_context(&rows, "test", exact - 1).unwrap();

        assert!(view.truncated);
        assert_eq!(view.showing, Some(1));
        assert_eq!(view.data, vec![json!({"id": 1})]);
    }

    #[test]
    fn truncated_rows_are_a_verbatim_prefix() {
        let rows: Vec<_> = (0..30).map(|i| json!({"id": i, "pad": "y".repeat(50)})).collect();
        let view = truncate_for_context(&rows, "t", 800).unwrap();

        assert!(view.truncated);
        let showing = view.showing.unwrap();
        assert_eq!(&view.data[..], &rows[..showing]);
    }

    #[test]
    fn showing_grows_with_budget() {
        let rows: Vec<_> = (0..40).map(|i| json!({"id": i, "pad": "z".repeat(80)})).collect();
        let small = truncate_for_context(&rows, "t", 600).unwrap();
        let large = truncate_for_context(&rows, "t", 2400).unwrap();

        assert!(small.truncated);
        assert!(large.truncated);
        assert!(small.showing.unwrap() <= large.showing.unwrap());
    }

    #[test]
    fn schema_covers_full_table_not_shown_prefix() {
        // The column that proves widening only appears in later rows.
        let mut rows: Vec<_> = (0..20).map(|i| json!({"id": i, "pad": "p".repeat(60)})).collect();
        rows.push(json!({"id": 0.5, "pad": "p"}));
        let view = truncate_for_context(&rows, "t", 400).unwrap();

        assert!(view.truncated);
        assert!(view.schema.unwrap().contains("id DOUBLE"));
    }

    #[test]
    fn schema_contains_column_types() {
        let rows: Vec<_> = (0..100)
            .map(|i| json!({"id": i, "name": format!("user{i}"), "active": true, "score": 99.5}))
            .collect();
        let view = truncate_for_context(&rows, "users", 500).unwrap();

        assert!(view.truncated);
        let schema = view.schema.unwrap();
        assert!(schema.contains("id BIGINT"));
        assert!(schema.contains("name VARCHAR"));
        assert!(schema.contains("score DOUBLE"));
    }
}
