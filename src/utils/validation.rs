use crate::error::ServiceError;
use std::path::Path;

/// Archive folder holding the components ACCE carved out of a sample
pub const ARTIFACT_PREFIX: &str = "extracted_components/";

/// Makes sure the sample path points at a regular file
pub async fn validate_sample_path(path: &Path) -> Result<(), ServiceError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Err(ServiceError::Input(
            "The path specified appears to be a directory and not a file.".to_string(),
        )),
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) | Err(_) => Err(ServiceError::Input(
            "The file specified for upload does not exist.".to_string(),
        )),
    }
}

/// Filename sent in the multipart upload: the last path component
pub fn upload_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string())
}

/// True for archive members under `extracted_components/` with a non-empty name
pub fn is_artifact_member(name: &str) -> bool {
    name.strip_prefix(ARTIFACT_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('\n'))
}
