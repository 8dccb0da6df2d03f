use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the pipeline reads from the host for one sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub file_path: PathBuf,
    /// SHA-256 of the sample, used as artifact provenance
    pub file_digest: String,
    /// Scratch directory where extracted artifacts are written
    pub working_directory: PathBuf,
    /// Per-request key, overrides the configured default
    pub api_key: Option<String>,
    pub mwcp_legacy: bool,
    pub get_artifacts: bool,
}

impl ServiceRequest {
    pub fn new(
        file_path: impl Into<PathBuf>,
        file_digest: impl Into<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            file_digest: file_digest.into(),
            working_directory: working_directory.into(),
            api_key: None,
            mwcp_legacy: false,
            get_artifacts: false,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_mwcp_legacy(mut self, legacy: bool) -> Self {
        self.mwcp_legacy = legacy;
        self
    }

    pub fn with_artifacts(mut self, get_artifacts: bool) -> Self {
        self.get_artifacts = get_artifacts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyFormat {
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSection {
    pub title: String,
    pub body_format: BodyFormat,
    pub body: String,
}

impl ResultSection {
    pub fn json(
        title: impl Into<String>,
        value: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            title: title.into(),
            body_format: BodyFormat::Json,
            body: serde_json::to_string(value)?,
        })
    }

    /// Parses the body back into JSON
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceResult {
    pub sections: Vec<ResultSection>,
}

impl ServiceResult {
    pub fn add_section(&mut self, section: ResultSection) {
        self.sections.push(section);
    }
}

/// A file pulled out of the ACCE archive and handed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArtifact {
    pub path: PathBuf,
    /// SHA-256 of the artifact bytes
    pub name: String,
    pub description: String,
}

/// Result of one execution plus every non-fatal error met on the way
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    pub result: ServiceResult,
    pub errors: Vec<String>,
}
