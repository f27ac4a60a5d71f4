//! Interface to the external agent runtime.
//!
//! The turn loop, model invocation, and tool-call dispatch live outside this
//! repository. The orchestration layer registers callable tools, hands over
//! the augmented question, and receives either a final textual answer or a
//! turn-limit signal.

use std::sync::Arc;

use async_trait::async_trait;

use sg_domain::error::Result;
use sg_domain::tool::ToolDefinition;

/// Handler behind one registered tool.
///
/// Returns serialized JSON, never an error: failures are data the model
/// reads and recovers from.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: serde_json::Value) -> String;
}

/// A tool as registered with the runtime.
pub struct AgentTool {
    pub definition: ToolDefinition,
    pub handler: Arc<dyn ToolHandler>,
}

/// One agent run request.
pub struct AgentSpec {
    pub name: String,
    pub instructions: String,
    pub tools: Vec<AgentTool>,
}

/// Terminal result of one run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The agent produced a final text answer (possibly empty).
    Completed { final_output: String, turns_used: u32 },
    /// The runtime hit the turn ceiling before an answer.
    TurnLimitExceeded { turns_used: u32 },
}

/// External turn loop: invokes the model, dispatches tool calls, and
/// enforces the turn ceiling.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(&self, spec: AgentSpec, input: &str, max_turns: u32) -> Result<RunOutcome>;
}
