use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::naming::ArtifactName;
use super::store::ArtifactStore;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Artifacts recognized by name
    pub scanned: usize,

    /// Expired artifacts deleted
    pub removed: usize,

    /// Artifacts still inside the retention window
    pub retained: usize,

    /// Expired artifacts that could not be deleted
    pub failed: usize,
}

/// Deletes audio artifacts older than the retention window
///
/// Pull-based: nothing here runs on a timer. The host calls `sweep()` when
/// it sees fit (startup, returning to foreground).
pub struct ArtifactJanitor {
    store: Arc<dyn ArtifactStore>,
    prefix: String,
    retention: Duration,
}

impl ArtifactJanitor {
    pub fn new(store: Arc<dyn ArtifactStore>, prefix: impl Into<String>, retention: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Sweep against the current wall clock
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now().timestamp_millis()).await
    }

    /// Sweep as if the current time were `now_ms` (unix millis)
    pub async fn sweep_at(&self, now_ms: i64) -> Result<SweepReport> {
        let entries = self
            .store
            .list()
            .await
            .context("Failed to list artifacts")?;

        let retention_ms = i64::try_from(self.retention.as_millis()).unwrap_or(i64::MAX);
        let mut report = SweepReport::default();

        for entry in entries {
            let Some(name) = ArtifactName::parse(&self.prefix, &entry.name) else {
                continue;
            };
            report.scanned += 1;

            let age_ms = now_ms.saturating_sub(name.timestamp_ms);
            if age_ms <= retention_ms {
                report.retained += 1;
                continue;
            }

            // One failed delete must not stop the rest of the sweep
            match self.store.remove(&entry.path).await {
                Ok(()) => {
                    debug!("Removed expired artifact {}", entry.name);
                    report.removed += 1;
                }
                Err(e) => {
                    warn!("Failed to remove artifact {}: {:#}", entry.name, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Artifact sweep complete: {} scanned, {} removed, {} retained, {} failed",
            report.scanned, report.removed, report.retained, report.failed
        );

        Ok(report)
    }
}
