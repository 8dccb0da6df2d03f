use reqwest::StatusCode;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, error, info, warn};
use zip::ZipArchive;
use zip::result::InvalidPassword;

use super::client::AcceClient;
use super::host::ArtifactSink;
use crate::error::ServiceError;
use crate::models::ExtractedArtifact;
use crate::utils::hash::calculate_hash;
use crate::utils::validation::is_artifact_member;

/// Password ACCE uses for every result archive
pub const ARCHIVE_PASSWORD: &[u8] = b"infected";

#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub artifacts: Vec<ExtractedArtifact>,
    pub errors: Vec<String>,
}

/// Downloads the result archive of a submission and extracts its components
///
/// A non-200 answer is only logged: whatever bytes came back still go
/// through the ZIP check, which is where a bad download ends up failing.
pub async fn fetch_artifacts(
    client: &AcceClient,
    submission_id: &str,
    working_dir: &Path,
    source_digest: &str,
    sink: &dyn ArtifactSink,
) -> Result<ExtractionReport, ServiceError> {
    let (status, content) = client.fetch_archive(submission_id).await?;
    if status != StatusCode::OK {
        error!("Failed to get archive from ACCE.");
    }
    debug!("Archive download returned {} bytes", content.len());

    extract_artifacts(&content, working_dir, source_digest, sink).await
}

/// Extracts every `extracted_components/` member of `content` into `working_dir`
///
/// Each member is stored under its SHA-256 and registered with `sink`.
/// No size or count limit is applied.
pub async fn extract_artifacts(
    content: &[u8],
    working_dir: &Path,
    source_digest: &str,
    sink: &dyn ArtifactSink,
) -> Result<ExtractionReport, ServiceError> {
    let mut report = ExtractionReport::default();

    let mut archive = match ZipArchive::new(Cursor::new(content)) {
        Ok(archive) => archive,
        Err(e) => {
            let err = ServiceError::Archive(format!(
                "Expected content to be a zipfile, but the archive could not be opened: {}",
                e
            ));
            warn!("{}", err);
            report.errors.push(err.to_string());
            return Ok(report);
        }
    };

    let mut members = Vec::new();
    for index in 0..archive.len() {
        match archive.by_index_raw(index) {
            Ok(entry) if is_artifact_member(entry.name()) && !entry.is_dir() => {
                members.push((index, entry.name().to_string()));
            }
            Ok(_) => {}
            Err(e) => {
                let msg = format!("Failed to read archive entry {}: {}", index, e);
                warn!("{}", msg);
                report.errors.push(msg);
            }
        }
    }

    if members.is_empty() {
        info!("ACCE archive holds no extracted components");
        return Ok(report);
    }

    tokio::fs::create_dir_all(working_dir).await?;

    for (index, member) in members {
        let data = match read_member(&mut archive, index, &member) {
            Ok(data) => data,
            Err(msg) => {
                warn!("{}", msg);
                report.errors.push(msg);
                continue;
            }
        };

        let digest = calculate_hash(&data);
        let path = working_dir.join(&digest);
        tokio::fs::write(&path, &data).await?;

        let artifact = ExtractedArtifact {
            path,
            name: digest,
            description: format!("Extracted from {}", source_digest),
        };
        if let Err(e) = sink.add_extracted(artifact.clone()).await {
            let msg = format!("Failed to register artifact {}: {}", artifact.name, e);
            warn!("{}", msg);
            report.errors.push(msg);
            continue;
        }
        debug!("Extracted {} as {}", member, artifact.name);
        report.artifacts.push(artifact);
    }

    info!("Extracted {} artifact(s) from ACCE archive", report.artifacts.len());
    Ok(report)
}

fn read_member(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    index: usize,
    name: &str,
) -> Result<Vec<u8>, String> {
    let mut file = match archive.by_index_decrypt(index, ARCHIVE_PASSWORD) {
        Ok(Ok(file)) => file,
        Ok(Err(InvalidPassword)) => {
            return Err(format!("Wrong archive password for {}", name));
        }
        Err(e) => return Err(format!("Failed to open {}: {}", name, e)),
    };

    // the declared size comes from the remote archive, so only real bytes are buffered
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|e| format!("Failed to read {}: {}", name, e))?;
    Ok(data)
}
