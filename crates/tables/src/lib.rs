//! Session-scoped tabular datasets extracted from API responses.
//!
//! One API response becomes zero or more named tables; tables are summarized
//! for the agent (column types, row count) and truncated to a character
//! budget before anything returns to the model context. SQL execution over
//! the tables is delegated to an injected engine.

pub mod extract;
pub mod sql;
pub mod summary;
pub mod truncate;

pub use extract::extract_tables;
pub use summary::{table_summary, TableSummary};
pub use truncate::{truncate_for_context, ContextView, DEFAULT_MAX_RESULT_CHARS};
