//! Outbound API access: transport, request policy, and polling.
//!
//! The raw HTTP exchange sits behind the [`transport::Transport`] trait so
//! the layers above it (URL building, the unsafe-verb allowlist, GraphQL
//! envelopes, schema loading, the polling state machine) stay testable with
//! canned responses. Policy failures are structured data, never errors.

pub mod graphql;
pub mod loader;
pub mod poll;
pub mod rest;
pub mod transport;

pub use rest::{ApiOutcome, RestClient};
pub use transport::{HttpTransport, Transport, TransportResponse};
