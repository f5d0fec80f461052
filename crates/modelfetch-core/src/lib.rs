//! ModelFetch Core - Download Engine
//!
//! Resolves model-hosting download URLs through their explicit redirect,
//! streams bodies to disk in bounded chunks, and reports progress, with one
//! concurrent task per download.

mod api;
mod engine;
mod error;
mod progress;
mod resolver;
mod stream;

pub use api::*;
pub use engine::*;
pub use error::*;
pub use progress::*;
pub use resolver::*;
pub use stream::*;

use modelfetch_types::{DownloadRequest, FetcherConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Factory invoked once per launched download to choose its progress sink.
pub type SinkFactory = Arc<dyn Fn(&DownloadRequest) -> Box<dyn ProgressSink> + Send + Sync>;

/// The caller-facing entry point: metadata lookup plus the download engine.
pub struct Fetcher {
    config: FetcherConfig,
    engine: DownloadEngine,
    api: ApiClient,
    sink_factory: SinkFactory,
}

impl Fetcher {
    /// Create a fetcher that reports progress through [`HeadlessSink`].
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        Self::with_sink_factory(
            config,
            Arc::new(|_| Box::new(HeadlessSink) as Box<dyn ProgressSink>),
        )
    }

    /// Create a fetcher with an injected sink selection, evaluated once per
    /// launched download.
    pub fn with_sink_factory(
        config: FetcherConfig,
        sink_factory: SinkFactory,
    ) -> Result<Self, FetchError> {
        let engine = DownloadEngine::new(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.read_timeout_secs),
        )?;
        let api = ApiClient::new(engine.client(), &config.api_base_url, &config.token);
        Ok(Self {
            config,
            engine,
            api,
            sink_factory,
        })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Download a single asset from a direct download URL. Non-blocking;
    /// the transfer runs on its own task.
    pub fn download_by_url(&self, url: &str, destination: impl Into<PathBuf>) -> DownloadHandle {
        let request = DownloadRequest::new(
            url.to_string(),
            destination.into(),
            self.config.token.clone(),
        );
        let sink = (self.sink_factory)(&request);
        self.engine.launch(request, sink)
    }

    /// Download the primary file of a model version, resolving its download
    /// URL through the metadata API first.
    pub async fn download_by_model_id(
        &self,
        version_id: u64,
        destination: &Path,
    ) -> Result<DownloadHandle, FetchError> {
        let version = self.api.get_model_version_info(version_id).await?;
        let url = version.download_url.ok_or_else(|| {
            FetchError::Api(format!("model version {version_id} has no download URL"))
        })?;
        Ok(self.download_by_url(&url, destination))
    }

    /// Download every file of every version of a model, one task per file.
    /// Launching never short-circuits: a file that later fails does not stop
    /// the others from being started.
    pub async fn batch_download(
        &self,
        model_id: u64,
        destination: &Path,
    ) -> Result<Vec<DownloadHandle>, FetchError> {
        let model = self.api.get_model_info(model_id).await?;

        let mut handles = Vec::new();
        for version in &model.model_versions {
            handles.extend(self.launch_version_files(version, destination));
        }
        Ok(handles)
    }

    /// Download every file of a single model version, one task per file.
    pub async fn version_batch_download(
        &self,
        version_id: u64,
        destination: &Path,
    ) -> Result<Vec<DownloadHandle>, FetchError> {
        let version = self.api.get_model_version_info(version_id).await?;
        Ok(self.launch_version_files(&version, destination))
    }

    fn launch_version_files(
        &self,
        version: &modelfetch_types::ModelVersionInfo,
        destination: &Path,
    ) -> Vec<DownloadHandle> {
        let mut handles = Vec::new();
        for file in &version.files {
            match file.download_url.as_deref() {
                Some(url) => handles.push(self.download_by_url(url, destination)),
                None => warn!(
                    "Skipping file {:?} of version {}: no download URL",
                    file.name, version.id
                ),
            }
        }
        handles
    }
}
