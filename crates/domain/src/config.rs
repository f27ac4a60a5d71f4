use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-wide limits shared by every question. Immutable after load;
/// per-question state never lives here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// Budgets for one agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum agent turns before the runtime cuts the run off.
    #[serde(default = "d_10")]
    pub max_turns: u32,
    /// Maximum attempts for one poll_until_done invocation.
    #[serde(default = "d_10")]
    pub max_polls: u32,
    /// Default delay between poll attempts (ms), overridable per call.
    #[serde(default = "d_3000")]
    pub poll_delay_ms: u64,
    /// Character budget for any tool result returned to the agent.
    #[serde(default = "d_32000")]
    pub max_result_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            max_polls: 10,
            poll_delay_ms: 3000,
            max_result_chars: 32_000,
        }
    }
}

/// Budgets for schema context generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Character ceiling for the compact schema text injected into the
    /// question. Over the ceiling, comments are stripped, then the text is
    /// hard-truncated with a search-tool marker.
    #[serde(default = "d_50000")]
    pub max_schema_chars: usize,
    /// Maximum matches emitted per search_schema call (paginate via offset).
    #[serde(default = "d_20")]
    pub max_search_matches: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_schema_chars: 50_000,
            max_search_matches: 20,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_10() -> u32 {
    10
}
fn d_20() -> usize {
    20
}
fn d_3000() -> u64 {
    3000
}
fn d_32000() -> usize {
    32_000
}
fn d_50000() -> usize {
    50_000
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.agent.max_turns == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "agent.max_turns".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.agent.max_polls == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "agent.max_polls".into(),
                message: "must be greater than 0".into(),
            });
        }

        // A budget this small cannot hold even one typical row plus metadata.
        if self.agent.max_result_chars < 500 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "agent.max_result_chars".into(),
                message: "budgets under 500 chars truncate almost every result".into(),
            });
        }

        if self.schema.max_schema_chars == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "schema.max_schema_chars".into(),
                message: "must be greater than 0".into(),
            });
        }

        errors
    }
}
