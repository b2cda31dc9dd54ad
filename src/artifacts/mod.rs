//! Audio artifacts decoded from voice replies
//!
//! Replies carrying audio are written to a cache directory as
//! `<prefix>_<unixMillis>.<format>` and removed by `ArtifactJanitor` once they
//! are older than the retention window.

pub mod janitor;
pub mod naming;
pub mod store;

use std::path::PathBuf;
use std::time::Duration;

pub use janitor::{ArtifactJanitor, SweepReport};
pub use naming::{ArtifactName, DEFAULT_PREFIX};
pub use store::{is_name_taken, ArtifactEntry, ArtifactStore, FsArtifactStore};

/// How long an artifact is kept before the janitor deletes it
pub const RETENTION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Artifact settings
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    /// Cache directory holding artifacts
    pub dir: PathBuf,
    /// File name prefix shared by writer and janitor
    pub prefix: String,
    /// Age after which artifacts are swept
    pub retention: Duration,
}

impl ArtifactConfig {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            prefix: DEFAULT_PREFIX.to_string(),
            retention: RETENTION_WINDOW,
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("medeasy-voice"))
    }
}
