//! Compact, token-efficient schema renderings and schema search.
//!
//! Both compactors are pure tree-rewrites: GraphQL introspection output or an
//! OpenAPI document in, one condensed text document out. The raw schema JSON
//! is kept alongside the compact text so the search module can answer
//! anything the compaction dropped.

pub mod govern;
pub mod graphql;
pub mod openapi;
pub mod search;

pub use govern::govern_size;
pub use search::{search_schema, SearchOptions};
