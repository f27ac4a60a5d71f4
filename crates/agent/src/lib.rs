//! Question orchestration over an injected agent runtime.
//!
//! Wires the capability crates into callable tools, runs one agent per
//! question, and normalizes the outcome into a structured report. The LLM
//! turn loop itself and the SQL engine are external collaborators supplied
//! through the [`runtime::AgentRuntime`] and `SqlEngine` traits.

pub mod flow;
pub mod prompts;
pub mod report;
pub mod runtime;
pub mod session;
pub mod tools;

pub use flow::{answer_question, AgentDeps};
pub use report::{AnswerReport, IssuedCalls};
pub use runtime::{AgentRuntime, AgentSpec, AgentTool, RunOutcome, ToolHandler};
pub use session::{ApiCallRecord, Session};
