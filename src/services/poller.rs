use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::client::{AcceClient, RemoteResponse, error_messages};
use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// What a single poll response says about the submission
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// `status` is `running` or `pending`
    InProgress,
    /// Non-200 status or an `error` key in the body
    Failed,
    /// Body carries a `result` key
    Completed(Value),
    /// None of the above, keep waiting
    Unrecognized,
}

/// Classifies a poll response
///
/// The order matters: a body that is still `running` wins over an `error`
/// key, and an error wins over a `result` key.
pub fn classify(response: &RemoteResponse) -> PollState {
    let body = &response.body;

    if matches!(
        body.get("status").and_then(Value::as_str),
        Some("running" | "pending")
    ) {
        return PollState::InProgress;
    }

    if response.status != StatusCode::OK || body.get("error").is_some() {
        return PollState::Failed;
    }

    match body.get("result") {
        Some(result) => PollState::Completed(result.clone()),
        None => PollState::Unrecognized,
    }
}

fn failure_messages(response: &RemoteResponse) -> Vec<String> {
    let mut errors = response
        .body
        .get("error")
        .map(error_messages)
        .unwrap_or_default();
    if response.status != StatusCode::OK {
        errors.push(format!(
            "Bad status code {} from results polling",
            response.status.as_u16()
        ));
    }
    errors
}

/// How polling ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The service delivered a `result`
    Completed { result: Value },
    /// The service reported an error; `payload` is the full body
    Failed { payload: Value },
    /// Attempts ran out; `last_seen` is whatever body arrived last and may
    /// not look like a result at all
    Exhausted { last_seen: Value },
}

impl PollOutcome {
    /// Value reported to the host
    pub fn into_payload(self) -> Value {
        match self {
            PollOutcome::Completed { result } => result,
            PollOutcome::Failed { payload } => payload,
            PollOutcome::Exhausted { last_seen } => last_seen,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollReport {
    pub outcome: PollOutcome,
    pub errors: Vec<String>,
}

/// Polls a results URL at a fixed pace until it settles or attempts run out
pub struct Poller<'a> {
    client: &'a AcceClient,
    max_attempts: u32,
    delay: Duration,
    max_wait: Duration,
}

impl<'a> Poller<'a> {
    pub fn new(client: &'a AcceClient, config: &ServiceConfig) -> Self {
        Self {
            client,
            max_attempts: config.max_poll_attempts,
            delay: config.poll_delay,
            max_wait: config.max_poll_wait(),
        }
    }

    pub async fn poll_for_results(
        &self,
        results_url: &str,
        legacy: bool,
    ) -> Result<PollReport, ServiceError> {
        let mut last_seen = Value::Null;

        for attempt in 1..=self.max_attempts {
            let response = self.client.fetch_results(results_url, legacy).await?;
            debug!(
                "Poll {}/{} returned {}",
                attempt, self.max_attempts, response.status
            );

            match classify(&response) {
                PollState::InProgress | PollState::Unrecognized => {}
                PollState::Failed => {
                    let errors = failure_messages(&response);
                    warn!("ACCE reported a failure while polling: {:?}", errors);
                    return Ok(PollReport {
                        outcome: PollOutcome::Failed {
                            payload: response.body,
                        },
                        errors,
                    });
                }
                PollState::Completed(result) => {
                    info!("ACCE analysis finished after {} poll(s)", attempt);
                    return Ok(PollReport {
                        outcome: PollOutcome::Completed { result },
                        errors: Vec::new(),
                    });
                }
            }

            last_seen = response.body;
            tokio::time::sleep(self.delay).await;
        }

        Ok(PollReport {
            outcome: PollOutcome::Exhausted { last_seen },
            errors: vec![format!(
                "Max poll attempts ({}) exceeded after waiting {} seconds",
                self.max_attempts,
                self.max_wait.as_secs_f64()
            )],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> RemoteResponse {
        RemoteResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    #[test]
    fn test_running_and_pending_keep_polling() {
        assert_eq!(
            classify(&response(200, json!({"status": "running"}))),
            PollState::InProgress
        );
        assert_eq!(
            classify(&response(200, json!({"status": "pending"}))),
            PollState::InProgress
        );
    }

    #[test]
    fn test_running_beats_error() {
        let r = response(500, json!({"status": "running", "error": "transient"}));
        assert_eq!(classify(&r), PollState::InProgress);
    }

    #[test]
    fn test_error_beats_result() {
        let r = response(200, json!({"error": "bad sample", "result": {"x": 1}}));
        assert_eq!(classify(&r), PollState::Failed);
        assert_eq!(failure_messages(&r), vec!["bad sample"]);
    }

    #[test]
    fn test_bad_status_collects_both_errors() {
        let r = response(503, json!({"error": "maintenance"}));
        assert_eq!(classify(&r), PollState::Failed);
        assert_eq!(
            failure_messages(&r),
            vec![
                "maintenance".to_string(),
                "Bad status code 503 from results polling".to_string()
            ]
        );
    }

    #[test]
    fn test_result_completes() {
        let r = response(200, json!({"status": "done", "result": {"verdict": "clean"}}));
        assert_eq!(
            classify(&r),
            PollState::Completed(json!({"verdict": "clean"}))
        );
    }

    #[test]
    fn test_other_bodies_are_unrecognized() {
        assert_eq!(
            classify(&response(200, json!({"status": "queued"}))),
            PollState::Unrecognized
        );
        assert_eq!(classify(&response(200, json!([1, 2]))), PollState::Unrecognized);
    }

    #[test]
    fn test_outcome_payload() {
        let exhausted = PollOutcome::Exhausted {
            last_seen: json!({"status": "queued"}),
        };
        assert_eq!(exhausted.into_payload(), json!({"status": "queued"}));
    }
}
