//! Column-type summaries for extracted tables.
//!
//! Types are inferred across every record and rendered with the analytical
//! engine's vocabulary (`BIGINT`, `DOUBLE`, `VARCHAR`, `BOOLEAN`, nested
//! `STRUCT(...)`) so the agent can write SQL against the table without
//! seeing its full contents.

use serde::Serialize;
use serde_json::Value;

/// Derived description of one table: row count, column types, and a hint
/// telling the agent the table name is queryable.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub schema: String,
    pub hint: String,
}

/// Inferred storage type for one column.
#[derive(Debug, Clone, PartialEq)]
enum ColType {
    /// Seen only nulls so far; defers to whatever else appears.
    Unknown,
    Bigint,
    Double,
    Boolean,
    Varchar,
    /// Arrays and other shapes the engine stores opaquely.
    Json,
    Struct(Vec<(String, ColType)>),
}

impl ColType {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => ColType::Unknown,
            Value::Bool(_) => ColType::Boolean,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    ColType::Bigint
                } else {
                    ColType::Double
                }
            }
            Value::String(_) => ColType::Varchar,
            Value::Array(_) => ColType::Json,
            Value::Object(map) => {
                let fields = map.iter().map(|(k, v)| (k.clone(), ColType::of(v))).collect();
                ColType::Struct(fields)
            }
        }
    }

    /// Merge two observations of the same column.
    ///
    /// Integers widen to DOUBLE when mixed with floats; structs merge
    /// field-wise; any other disagreement collapses to VARCHAR.
    fn merge(self, other: ColType) -> ColType {
        use ColType::*;
        match (self, other) {
            (Unknown, t) | (t, Unknown) => t,
            (a, b) if a == b => a,
            (Bigint, Double) | (Double, Bigint) => Double,
            (Struct(a), Struct(b)) => Struct(merge_fields(a, b)),
            _ => Varchar,
        }
    }

    fn render(&self) -> String {
        match self {
            ColType::Unknown | ColType::Json => "JSON".to_string(),
            ColType::Bigint => "BIGINT".to_string(),
            ColType::Double => "DOUBLE".to_string(),
            ColType::Boolean => "BOOLEAN".to_string(),
            ColType::Varchar => "VARCHAR".to_string(),
            ColType::Struct(fields) => {
                let inner: Vec<String> =
                    fields.iter().map(|(k, t)| format!("{k} {}", t.render())).collect();
                format!("STRUCT({})", inner.join(", "))
            }
        }
    }
}

fn merge_fields(
    mut base: Vec<(String, ColType)>,
    other: Vec<(String, ColType)>,
) -> Vec<(String, ColType)> {
    for (name, t) in other {
        if let Some(slot) = base.iter_mut().find(|(n, _)| *n == name) {
            let merged = std::mem::replace(&mut slot.1, ColType::Unknown).merge(t);
            slot.1 = merged;
        } else {
            base.push((name, t));
        }
    }
    base
}

/// Compute the summary for a table.
///
/// An empty table yields `rows=0` and an empty schema; the hint always
/// references the table name so the agent knows what to query.
pub fn table_summary(rows: &[Value], name: &str) -> TableSummary {
    if rows.is_empty() {
        return TableSummary {
            rows: 0,
            schema: String::new(),
            hint: format!("Table '{name}' is empty; sql_query on it returns no rows."),
        };
    }

    // Accumulate column types in first-seen order across all records.
    let mut columns: Vec<(String, ColType)> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for (key, value) in map {
                let observed = ColType::of(value);
                if let Some(slot) = columns.iter_mut().find(|(n, _)| n == key) {
                    let merged = std::mem::replace(&mut slot.1, ColType::Unknown).merge(observed);
                    slot.1 = merged;
                } else {
                    columns.push((key.clone(), observed));
                }
            }
        }
    }

    let schema = columns
        .iter()
        .map(|(name, t)| format!("{name} {}", t.render()))
        .collect::<Vec<_>>()
        .join(", ");

    TableSummary {
        rows: rows.len(),
        schema,
        hint: format!("Result stored as table '{name}'; use sql_query to filter or join."),
    }
}
