use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use crate::error::ServiceError;

/// Status code and decoded JSON body of an ACCE response
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Thin wrapper over the ACCE REST endpoints
///
/// Every call carries the same `Authorization: Token <key>` header, fixed
/// when the client is built.
pub struct AcceClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl AcceClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("acce-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Token {}", api_key),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn submissions_url(&self) -> String {
        format!("{}/api/v1/submissions", self.base_url)
    }

    pub fn archive_url(&self, submission_id: &str) -> String {
        format!(
            "{}/api/v1/submissions/{}/result/archive",
            self.base_url, submission_id
        )
    }

    /// Uploads a sample as the multipart field `sample`
    pub async fn submit_sample(
        &self,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<RemoteResponse, ServiceError> {
        let part = Part::bytes(data).file_name(filename.to_string());
        let form = Form::new().part("sample", part);

        let response = self
            .http
            .post(self.submissions_url())
            .header(AUTHORIZATION, &self.auth_header)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = safe_json(&response.bytes().await?);
        Ok(RemoteResponse { status, body })
    }

    /// Fetches the current state of a submission from its results URL
    pub async fn fetch_results(
        &self,
        results_url: &str,
        legacy: bool,
    ) -> Result<RemoteResponse, ServiceError> {
        let response = self
            .http
            .get(results_url)
            .header(AUTHORIZATION, &self.auth_header)
            .query(&[("legacy", legacy_flag(legacy))])
            .send()
            .await?;

        let status = response.status();
        let body = safe_json(&response.bytes().await?);
        Ok(RemoteResponse { status, body })
    }

    /// Downloads the artifact archive; the body is returned whatever the status
    pub async fn fetch_archive(
        &self,
        submission_id: &str,
    ) -> Result<(StatusCode, Bytes), ServiceError> {
        let response = self
            .http
            .get(self.archive_url(submission_id))
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await?;

        let status = response.status();
        let content = response.bytes().await?;
        Ok((status, content))
    }
}

/// ACCE reads the flag the way Python spells booleans
fn legacy_flag(legacy: bool) -> &'static str {
    if legacy { "True" } else { "False" }
}

/// Decodes a JSON body, turning decode failures into `{"error": [msg]}`
pub fn safe_json(content: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(content) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Failed to decode ACCE response as JSON: {}", e);
            json!({ "error": [e.to_string()] })
        }
    }
}

/// Flattens an `error` field into readable messages
pub fn error_messages(error: &Value) -> Vec<String> {
    match error {
        Value::Null => Vec::new(),
        Value::String(msg) => vec![msg.clone()],
        Value::Array(items) => items
            .iter()
            .flat_map(error_messages)
            .collect(),
        other => vec![other.to_string()],
    }
}
