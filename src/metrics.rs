//! Metrics Module
//!
//! Durable per-phase artifacts: a throughput report per phase and the
//! listing of created object identifiers. Written as plain structured text
//! so a later invocation (burn split across runs) can parse them back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::types::{ObjectRef, Phase};

/// Throughput of one phase, derived from confirmed counts only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputReport {
    /// Units confirmed from change records
    pub total_count: u64,
    /// Wall-clock phase duration in seconds
    pub total_time_seconds: f64,
    /// Confirmed units per second
    pub rate: f64,
    /// When the report was written (RFC 3339)
    pub generated_at: String,
}

impl ThroughputReport {
    pub fn new(total_count: u64, elapsed: Duration) -> Self {
        let total_time_seconds = elapsed.as_secs_f64();
        let rate = if total_time_seconds > 0.0 {
            total_count as f64 / total_time_seconds
        } else {
            0.0
        };
        Self {
            total_count,
            total_time_seconds,
            rate,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Writes phase artifacts into the configured output directory
pub struct MetricsWriter {
    directory: PathBuf,
}

impl MetricsWriter {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Write a phase's throughput report to `<dir>/<phase>_metrics.json`
    ///
    /// Called exactly once per phase, immediately after its barrier.
    pub fn write_phase(&self, phase: Phase, report: &ThroughputReport) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self
            .directory
            .join(format!("{}_metrics.json", phase.as_str()));
        fs::write(&path, serde_json::to_string_pretty(report)?)?;
        info!("wrote {} metrics to {}", phase.as_str(), path.display());
        Ok(path)
    }

    /// Write the created-object listing, one `id version digest` line each
    pub fn write_created_objects(&self, objects: &[ObjectRef]) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join("created_objects.txt");
        let mut lines = String::new();
        for object in objects {
            lines.push_str(&format!(
                "{} {} {}\n",
                object.id, object.version, object.digest
            ));
        }
        fs::write(&path, lines)?;
        info!("wrote {} created objects to {}", objects.len(), path.display());
        Ok(path)
    }
}
