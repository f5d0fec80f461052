//! Shared types for ModelFetch
//!
//! This crate contains the data structures shared between the CLI and the
//! core download engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// Download Types
// ============================================================================

/// One logical download: a source URL bound to a destination directory and
/// the API token that authorizes it. Owned exclusively by the task that
/// executes it; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub id: Uuid,
    pub url: String,
    pub destination: PathBuf,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl DownloadRequest {
    pub fn new(url: String, destination: PathBuf, token: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            destination,
            token,
            created_at: Utc::now(),
        }
    }
}

/// Where a download actually lives, discovered by following the API's
/// explicit redirect. Produced once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub final_url: String,
    pub filename: String,
    /// Absent when the server omits `Content-Length`; progress reporting
    /// then falls back to a plain byte counter with no percentage or ETA.
    pub total_size: Option<u64>,
}

/// Progress of one transfer. The byte count only ever increases, and it is
/// written by exactly one task for the lifetime of the transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
    pub elapsed: Duration,
}

impl TransferProgress {
    pub fn percentage(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some((self.downloaded as f64 / total as f64) * 100.0),
            _ => None,
        }
    }

    /// Average speed in bytes per second since the transfer started.
    pub fn speed(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.downloaded as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time remaining. None when the total size or speed is
    /// unknown.
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total?;
        let speed = self.speed();
        if speed <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(self.downloaded);
        Some(Duration::from_secs_f64(remaining as f64 / speed))
    }
}

/// Terminal state of a download request; written once, read by the
/// reporting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum TransferOutcome {
    Completed { filename: String, elapsed: Duration },
    Failed { reason: String },
}

impl TransferOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Model metadata returned by `GET /models/{id}`. Only the download URLs
/// nested in the version list matter to the engine; the rest is carried for
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model_versions: Vec<ModelVersionInfo>,
}

/// Version metadata returned by `GET /model-versions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersionInfo {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// Download URL for the version's primary file.
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub files: Vec<ModelFile>,
}

/// One downloadable file attached to a model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default, rename = "sizeKB")]
    pub size_kb: Option<f64>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Engine configuration. Passed in explicitly at construction; there is no
/// process-wide mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the metadata API.
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Default destination directory for downloads.
    pub destination: PathBuf,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://civitai.com/api/v1".to_string(),
            token: String::new(),
            destination: dirs::download_dir()
                .map(|p| p.join("modelfetch"))
                .unwrap_or_else(|| PathBuf::from(".")),
            connect_timeout_secs: 30,
            read_timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percentage_requires_total() {
        let progress = TransferProgress {
            downloaded: 512,
            total: Some(1024),
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(progress.percentage(), Some(50.0));

        let unsized_progress = TransferProgress {
            downloaded: 512,
            total: None,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(unsized_progress.percentage(), None);
        assert_eq!(unsized_progress.eta(), None);
    }

    #[test]
    fn progress_speed_is_bytes_per_second() {
        let progress = TransferProgress {
            downloaded: 4096,
            total: Some(8192),
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(progress.speed(), 2048.0);
        assert_eq!(progress.eta(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn model_info_decodes_camel_case() {
        let payload = serde_json::json!({
            "id": 1102,
            "name": "Example Checkpoint",
            "modelVersions": [{
                "id": 1144,
                "name": "v1.0",
                "downloadUrl": "https://example.com/api/download/models/1144",
                "files": [{
                    "name": "example.safetensors",
                    "downloadUrl": "https://example.com/api/download/models/1144?type=Model",
                    "sizeKB": 2048.5
                }]
            }]
        });

        let info: ModelInfo = serde_json::from_value(payload).unwrap();
        assert_eq!(info.model_versions.len(), 1);
        let version = &info.model_versions[0];
        assert!(version.download_url.is_some());
        assert_eq!(version.files[0].size_kb, Some(2048.5));
    }
}
