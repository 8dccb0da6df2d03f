use anyhow::Result;
use tokio::sync::Mutex;

use crate::models::ExtractedArtifact;

/// Host-side registration of files extracted from a sample
#[async_trait::async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Take ownership of an artifact already written to the scratch directory
    async fn add_extracted(&self, artifact: ExtractedArtifact) -> Result<()>;
}

/// Keeps registered artifacts in memory, for the CLI and tests
#[derive(Default)]
pub struct LocalArtifactStore {
    artifacts: Mutex<Vec<ExtractedArtifact>>,
}

impl LocalArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn artifacts(&self) -> Vec<ExtractedArtifact> {
        self.artifacts.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ArtifactSink for LocalArtifactStore {
    async fn add_extracted(&self, artifact: ExtractedArtifact) -> Result<()> {
        tracing::debug!("Registered extracted artifact {}", artifact.name);
        self.artifacts.lock().await.push(artifact);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_local_store_keeps_order() {
        let store = LocalArtifactStore::new();
        for name in ["a", "b"] {
            store
                .add_extracted(ExtractedArtifact {
                    path: PathBuf::from(name),
                    name: name.to_string(),
                    description: "Extracted from x".to_string(),
                })
                .await
                .unwrap();
        }
        let names: Vec<_> = store.artifacts().await.into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
