use reqwest::StatusCode;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error, info};

use super::client::{AcceClient, error_messages};
use crate::error::ServiceError;
use crate::utils::validation::{upload_filename, validate_sample_path};

/// Handles ACCE gave back for an accepted sample
#[derive(Debug, Clone)]
pub struct Submission {
    pub results_url: Option<String>,
    pub submission_id: Option<String>,
    /// Raw creation response, kept for degraded reporting
    pub body: Value,
}

impl Submission {
    fn from_body(body: Value) -> Self {
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            results_url: text("result"),
            submission_id: text("uuid"),
            body,
        }
    }
}

/// Uploads the sample once
///
/// Anything but `201 Created` is returned as [`ServiceError::Remote`]; errors
/// embedded in an accepted response are pushed onto `errors`.
pub async fn submit_sample(
    client: &AcceClient,
    sample_path: &Path,
    errors: &mut Vec<String>,
) -> Result<Submission, ServiceError> {
    validate_sample_path(sample_path).await?;

    let filename = upload_filename(sample_path);
    debug!("Reading {} into memory.", filename);
    let data = tokio::fs::read(sample_path).await?;

    info!("Submitting {} ({} bytes) to ACCE", filename, data.len());
    let response = client.submit_sample(&filename, data).await?;

    if response.status != StatusCode::CREATED {
        if let Some(err) = response.body.get("error") {
            for msg in error_messages(err) {
                error!("{}", msg);
            }
        }
        return Err(ServiceError::Remote(format!(
            "Invalid status code {} received from file upload",
            response.status.as_u16()
        )));
    }

    if let Some(err) = response.body.get("error") {
        errors.extend(error_messages(err));
    }

    let submission = Submission::from_body(response.body);
    if submission.results_url.is_none() || submission.submission_id.is_none() {
        errors.push(
            "Results url/submission_id not returned from original request, unable to retrieve results"
                .to_string(),
        );
    }

    debug!(
        "ACCE accepted {} as submission {:?}",
        filename, submission.submission_id
    );
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_from_body() {
        let sub = Submission::from_body(json!({"uuid": "abc", "result": "http://x/poll"}));
        assert_eq!(sub.submission_id.as_deref(), Some("abc"));
        assert_eq!(sub.results_url.as_deref(), Some("http://x/poll"));
    }

    #[test]
    fn test_submission_missing_handles() {
        let sub = Submission::from_body(json!({"uuid": "", "result": 7}));
        assert!(sub.submission_id.is_none());
        assert!(sub.results_url.is_none());

        let sub = Submission::from_body(json!(["not", "an", "object"]));
        assert!(sub.submission_id.is_none());
    }
}
