use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// One file in an artifact store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Storage area for decoded audio replies
///
/// Implementations:
/// - `FsArtifactStore`: a cache directory on the local filesystem
/// - test doubles that inject listing or removal failures
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `bytes` under `name`, returning the resulting path
    ///
    /// Never overwrites: an existing `name` fails with an
    /// `io::ErrorKind::AlreadyExists` error (see `is_name_taken`).
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;

    /// Every file currently in the store
    async fn list(&self) -> Result<Vec<ArtifactEntry>>;

    /// Delete one file
    async fn remove(&self, path: &Path) -> Result<()>;
}

/// Whether a `write` failed because the name is already in use
pub fn is_name_taken(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::AlreadyExists)
}

/// Artifact store backed by a directory
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        // Create output directory if it doesn't exist
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create artifact directory: {:?}", dir))?;

        info!("Artifact store at {}", dir.display());

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to create artifact: {:?}", path))?;

        file.write_all(bytes)
            .await
            .with_context(|| format!("Failed to write artifact: {:?}", path))?;
        file.flush().await?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    async fn list(&self) -> Result<Vec<ArtifactEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to read artifact directory: {:?}", self.dir))?;

        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            entries.push(ArtifactEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }

        Ok(entries)
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to remove artifact: {:?}", path))
    }
}
