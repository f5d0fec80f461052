//! Client for the model-hosting metadata API
//!
//! The engine only needs a `downloadUrl` per file; these endpoints supply
//! them for model- and version-level lookups.

use crate::error::FetchError;
use modelfetch_types::{ModelInfo, ModelVersionInfo};
use reqwest::Client;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// The base URL is injected per instance; there is no process-wide
    /// default.
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    /// `GET /models/{id}` — model metadata with all versions and files.
    pub async fn get_model_info(&self, model_id: u64) -> Result<ModelInfo, FetchError> {
        self.get_json(&format!("{}/models/{}", self.base_url, model_id))
            .await
    }

    /// `GET /model-versions/{id}` — metadata for a single model version.
    pub async fn get_model_version_info(
        &self,
        version_id: u64,
    ) -> Result<ModelVersionInfo, FetchError> {
        self.get_json(&format!("{}/model-versions/{}", self.base_url, version_id))
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Api(format!("GET {url} returned {status}")));
        }
        Ok(response.json().await?)
    }
}
