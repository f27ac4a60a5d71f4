//! Polling state machine for long-running operations.
//!
//! Drives bounded repeated requests through an injected [`RequestRunner`],
//! inspecting a dotted-path "done" field after each attempt. Terminal states:
//! the done value matched, the field was absent on the very first response,
//! the request capability failed, or the attempt budget ran out. Every
//! attempt is recorded in the returned log regardless of outcome.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use sg_domain::json_path::{get_path, get_path_mut};

use crate::rest::{ApiOutcome, RestClient};

/// Dotted path of the counter auto-incremented between attempts.
const POLL_COUNT_PATH: &str = "polling.count";

/// Request-execution capability the machine drives.
#[async_trait]
pub trait RequestRunner: Send + Sync {
    async fn run(
        &self,
        method: &str,
        path: &str,
        path_params: Option<&Map<String, Value>>,
        query_params: Option<&Map<String, Value>>,
        body: Option<&Value>,
    ) -> ApiOutcome;
}

#[async_trait]
impl RequestRunner for RestClient {
    async fn run(
        &self,
        method: &str,
        path: &str,
        path_params: Option<&Map<String, Value>>,
        query_params: Option<&Map<String, Value>>,
        body: Option<&Value>,
    ) -> ApiOutcome {
        self.execute(method, path, path_params, query_params, body).await
    }
}

/// One poll operation.
#[derive(Debug, Clone)]
pub struct PollRequest {
    pub method: String,
    pub path: String,
    /// Dotted path of the field signalling completion.
    pub done_field: String,
    /// Target value, compared case-insensitively against the field's string
    /// form.
    pub done_value: String,
    /// Parsed request body; mutated in place when it carries `polling.count`.
    pub body: Option<Value>,
    pub path_params: Option<Map<String, Value>>,
    pub query_params: Option<Map<String, Value>>,
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Record of one issued attempt, appended to the session call log.
#[derive(Debug, Clone, Serialize)]
pub struct PollAttempt {
    pub method: String,
    pub path: String,
    /// Body as sent on this attempt (empty when the request had none).
    pub body: String,
    pub poll_attempt: u32,
}

/// Terminal state of one poll operation.
#[derive(Debug)]
pub enum PollOutcome {
    /// The done field matched; carries the final response body.
    Done { body: Value, attempts: u32 },
    /// The done field was absent from the first response.
    FieldMissing { path: String, available_keys: Vec<String> },
    /// The request capability reported failure.
    RequestFailed { attempt: u32, error: String },
    /// All attempts used without a match.
    Exhausted { last_value: Option<Value>, attempts: u32 },
}

/// Outcome plus the full attempt log (never empty once a request was issued).
#[derive(Debug)]
pub struct PollResult {
    pub outcome: PollOutcome,
    pub log: Vec<PollAttempt>,
}

/// Run the machine to a terminal state.
pub async fn run_poll(runner: &dyn RequestRunner, mut req: PollRequest) -> PollResult {
    let mut log: Vec<PollAttempt> = Vec::new();
    let mut last_value: Option<Value> = None;
    let mut attempt = 0u32;

    while attempt < req.max_attempts {
        attempt += 1;

        let outcome = runner
            .run(
                &req.method,
                &req.path,
                req.path_params.as_ref(),
                req.query_params.as_ref(),
                req.body.as_ref(),
            )
            .await;

        log.push(PollAttempt {
            method: req.method.clone(),
            path: req.path.clone(),
            body: req
                .body
                .as_ref()
                .and_then(|b| serde_json::to_string(b).ok())
                .unwrap_or_default(),
            poll_attempt: attempt,
        });

        if !outcome.success {
            return PollResult {
                outcome: PollOutcome::RequestFailed {
                    attempt,
                    error: outcome.error.unwrap_or_else(|| "request failed".into()),
                },
                log,
            };
        }

        let data = outcome.data.unwrap_or(Value::Null);
        let current = get_path(&data, &req.done_field).cloned();

        // Only the first response proves the field name wrong; later ones may
        // legitimately lack it until the API starts processing.
        if current.is_none() && attempt == 1 {
            let available_keys = data
                .as_object()
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default();
            return PollResult {
                outcome: PollOutcome::FieldMissing { path: req.done_field, available_keys },
                log,
            };
        }

        if value_text(current.as_ref()).eq_ignore_ascii_case(&req.done_value) {
            return PollResult { outcome: PollOutcome::Done { body: data, attempts: attempt }, log };
        }
        last_value = current;

        if attempt < req.max_attempts {
            tokio::time::sleep(req.delay).await;
            if let Some(body) = req.body.as_mut() {
                increment_counter(body);
            }
        }
    }

    PollResult { outcome: PollOutcome::Exhausted { last_value, attempts: attempt }, log }
}

/// String form used for the done comparison: scalars render bare, everything
/// else as compact JSON, a missing value as `null`.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn increment_counter(body: &mut Value) {
    if let Some(Value::Number(n)) = get_path_mut(body, POLL_COUNT_PATH) {
        if let Some(i) = n.as_i64() {
            *n = (i + 1).into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Runner that replays scripted outcomes and records the bodies it saw.
    struct ScriptedRunner {
        script: Mutex<Vec<ApiOutcome>>,
        bodies: Mutex<Vec<Option<Value>>>,
    }

    impl ScriptedRunner {
        fn new(script: Vec<ApiOutcome>) -> Self {
            Self {
                script: Mutex::new(script),
                bodies: Mutex::new(Vec::new()),
            }
        }

        fn ok(data: Value) -> ApiOutcome {
            ApiOutcome::ok(200, data)
        }
    }

    #[async_trait]
    impl RequestRunner for ScriptedRunner {
        async fn run(
            &self,
            _method: &str,
            _path: &str,
            _path_params: Option<&Map<String, Value>>,
            _query_params: Option<&Map<String, Value>>,
            body: Option<&Value>,
        ) -> ApiOutcome {
            self.bodies.lock().push(body.cloned());
            self.script.lock().remove(0)
        }
    }

    fn request(done_field: &str, done_value: &str, body: Option<Value>) -> PollRequest {
        PollRequest {
            method: "POST".into(),
            path: "/search/flights".into(),
            done_field: done_field.into(),
            done_value: done_value.into(),
            body,
            path_params: None,
            query_params: None,
            max_attempts: 10,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn terminates_on_done_value() {
        // retry.next counts down 2, 1, 0 - zero means done.
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(json!({"retry": {"next": 2}, "trips": []})),
            ScriptedRunner::ok(json!({"retry": {"next": 1}, "trips": []})),
            ScriptedRunner::ok(json!({"retry": {"next": 0}, "trips": []})),
        ]);
        let result = run_poll(&runner, request("retry.next", "0", None)).await;

        match result.outcome {
            PollOutcome::Done { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected Done, got {other:?}"),
        }
        assert_eq!(result.log.len(), 3);
    }

    #[tokio::test]
    async fn boolean_done_value_compares_case_insensitively() {
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(json!({"polling": {"completed": false}})),
            ScriptedRunner::ok(json!({"polling": {"completed": true}})),
        ]);
        let result = run_poll(&runner, request("polling.completed", "TRUE", None)).await;

        assert!(matches!(result.outcome, PollOutcome::Done { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn missing_field_on_first_attempt_reports_keys() {
        let runner = ScriptedRunner::new(vec![ScriptedRunner::ok(
            json!({"status": "pending", "results": []}),
        )]);
        let result = run_poll(&runner, request("polling.completed", "true", None)).await;

        match result.outcome {
            PollOutcome::FieldMissing { path, available_keys } => {
                assert_eq!(path, "polling.completed");
                assert_eq!(available_keys, vec!["status".to_string(), "results".to_string()]);
            }
            other => panic!("expected FieldMissing, got {other:?}"),
        }
        assert_eq!(result.log.len(), 1);
    }

    #[tokio::test]
    async fn missing_field_after_first_attempt_keeps_polling() {
        // The field appears only once the API starts processing.
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(json!({"status": {"done": false}})),
            ScriptedRunner::ok(json!({"other": 1})),
            ScriptedRunner::ok(json!({"status": {"done": true}})),
        ]);
        let result = run_poll(&runner, request("status.done", "true", None)).await;

        assert!(matches!(result.outcome, PollOutcome::Done { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn exhaustion_reports_last_value_and_logs_every_attempt() {
        let script: Vec<ApiOutcome> = (0..4)
            .map(|_| ScriptedRunner::ok(json!({"polling": {"completed": false}})))
            .collect();
        let runner = ScriptedRunner::new(script);
        let mut req = request("polling.completed", "true", None);
        req.max_attempts = 4;
        let result = run_poll(&runner, req).await;

        match result.outcome {
            PollOutcome::Exhausted { last_value, attempts } => {
                assert_eq!(attempts, 4);
                assert_eq!(last_value, Some(json!(false)));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(result.log.len(), 4);
        assert_eq!(result.log.last().unwrap().poll_attempt, 4);
    }

    #[tokio::test]
    async fn request_failure_stops_immediately() {
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(json!({"polling": {"completed": false}})),
            ApiOutcome::failure("connection refused"),
        ]);
        let result = run_poll(&runner, request("polling.completed", "true", None)).await;

        match result.outcome {
            PollOutcome::RequestFailed { attempt, error } => {
                assert_eq!(attempt, 2);
                assert!(error.contains("connection refused"));
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
        assert_eq!(result.log.len(), 2);
    }

    #[tokio::test]
    async fn auto_increments_polling_count_between_attempts() {
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(json!({"polling": {"completed": false}})),
            ScriptedRunner::ok(json!({"polling": {"completed": false}})),
            ScriptedRunner::ok(json!({"polling": {"completed": true}})),
        ]);
        let result = run_poll(
            &runner,
            request("polling.completed", "true", Some(json!({"polling": {"count": 1}}))),
        )
        .await;

        assert!(matches!(result.outcome, PollOutcome::Done { .. }));
        let bodies = runner.bodies.lock();
        assert_eq!(bodies[0], Some(json!({"polling": {"count": 1}})));
        assert_eq!(bodies[1], Some(json!({"polling": {"count": 2}})));
        assert_eq!(bodies[2], Some(json!({"polling": {"count": 3}})));
    }

    #[tokio::test]
    async fn body_without_counter_is_left_alone() {
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(json!({"status": {"done": false}})),
            ScriptedRunner::ok(json!({"status": {"done": true}})),
        ]);
        let result =
            run_poll(&runner, request("status.done", "true", Some(json!({"query": "test"})))).await;

        assert!(matches!(result.outcome, PollOutcome::Done { .. }));
        let bodies = runner.bodies.lock();
        assert_eq!(bodies[0], Some(json!({"query": "test"})));
        assert_eq!(bodies[1], Some(json!({"query": "test"})));
    }

    #[tokio::test]
    async fn attempt_log_snapshots_the_sent_body() {
        let runner = ScriptedRunner::new(vec![
            ScriptedRunner::ok(json!({"polling": {"completed": false}})),
            ScriptedRunner::ok(json!({"polling": {"completed": true}})),
        ]);
        let result = run_poll(
            &runner,
            request("polling.completed", "true", Some(json!({"polling": {"count": 5}}))),
        )
        .await;

        assert!(matches!(result.outcome, PollOutcome::Done { .. }));
        assert!(result.log[0].body.contains("\"count\":5"));
        assert!(result.log[1].body.contains("\"count\":6"));
    }
}
