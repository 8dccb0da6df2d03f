use serde_json::Value;
use tracing::{error, info, warn};

use super::artifacts::fetch_artifacts;
use super::client::AcceClient;
use super::host::ArtifactSink;
use super::poller::{PollOutcome, PollReport, Poller};
use super::submitter::submit_sample;
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::models::{ResultSection, ServiceOutcome, ServiceRequest, ServiceResult};

pub const RESULT_SECTION_TITLE: &str = "ACCE Detailed Results";

/// Submits samples to ACCE and turns its verdicts into host results
pub struct AcceService {
    config: ServiceConfig,
    base_url: String,
}

impl AcceService {
    /// Validates the configuration once, before any request is served
    pub fn start(config: ServiceConfig) -> Result<Self, ServiceError> {
        let base_url = config.validated_base_url()?;
        if config.api_key.is_none() {
            warn!("No default ACCE api_key configured, every request must carry its own");
        }
        info!(
            "ACCE service ready: {} (polls: {} x {:?})",
            base_url, config.max_poll_attempts, config.poll_delay
        );
        Ok(Self { config, base_url })
    }

    /// Runs upload, polling and optional artifact extraction for one sample
    ///
    /// Returns `Ok(None)` when the sample path is unusable or ACCE refuses the
    /// upload. Later failures are collected in [`ServiceOutcome::errors`] and
    /// logged; they never reach the result section.
    pub async fn execute(
        &self,
        request: &ServiceRequest,
        sink: &dyn ArtifactSink,
    ) -> Result<Option<ServiceOutcome>, ServiceError> {
        let api_key = self.config.resolve_api_key(request.api_key.as_deref())?;
        let client = AcceClient::new(&self.base_url, &api_key)?;
        let mut errors = Vec::new();

        let submission = match submit_sample(&client, &request.file_path, &mut errors).await {
            Ok(submission) => submission,
            Err(e) if e.aborts_without_result() => {
                error!("{}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let payload = match submission.results_url.as_deref() {
            Some(results_url) => {
                let PollReport {
                    outcome,
                    errors: poll_errors,
                } = Poller::new(&client, &self.config)
                    .poll_for_results(results_url, request.mwcp_legacy)
                    .await?;
                errors.extend(poll_errors);
                if let PollOutcome::Exhausted { .. } = outcome {
                    warn!("Reporting the last poll response, ACCE never returned a result");
                }
                outcome.into_payload()
            }
            None => submission.body.clone(),
        };

        if request.get_artifacts {
            match submission.submission_id.as_deref() {
                Some(submission_id) => {
                    let extraction = fetch_artifacts(
                        &client,
                        submission_id,
                        &request.working_directory,
                        &request.file_digest,
                        sink,
                    )
                    .await?;
                    errors.extend(extraction.errors);
                }
                None => errors.push(
                    "No submission_id available, skipping artifact download".to_string(),
                ),
            }
        }

        for err in &errors {
            warn!("ACCE: {}", err);
        }

        Ok(Some(ServiceOutcome {
            result: build_result(&payload)?,
            errors,
        }))
    }
}

fn build_result(payload: &Value) -> Result<ServiceResult, ServiceError> {
    let section = ResultSection::json(RESULT_SECTION_TITLE, payload)
        .map_err(|e| ServiceError::Remote(format!("Unserializable ACCE payload: {}", e)))?;
    let mut result = ServiceResult::default();
    result.add_section(section);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BodyFormat;
    use serde_json::json;

    #[test]
    fn test_start_requires_base_url() {
        assert!(matches!(
            AcceService::start(ServiceConfig::default()),
            Err(ServiceError::Configuration(_))
        ));
        assert!(AcceService::start(ServiceConfig::new("https://acce.example.com")).is_ok());
    }

    #[test]
    fn test_build_result() {
        let result = build_result(&json!({"verdict": "malicious"})).unwrap();
        assert_eq!(result.sections.len(), 1);
        let section = &result.sections[0];
        assert_eq!(section.title, RESULT_SECTION_TITLE);
        assert_eq!(section.body_format, BodyFormat::Json);
        assert_eq!(section.json_body(), Some(json!({"verdict": "malicious"})));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_fatal() {
        let service = AcceService::start(ServiceConfig::new("https://acce.example.com")).unwrap();
        let request = ServiceRequest::new("/nonexistent", "digest", "/tmp");
        let sink = crate::services::host::LocalArtifactStore::new();
        let err = service.execute(&request, &sink).await.unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }
}
