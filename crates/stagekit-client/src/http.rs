//! HTTP source of truth

use crate::source::{cancellable, AssemblySource, SourceError, SourceResult};
use reqwest::Client;
use serde::Deserialize;
use stagekit_core::{document_from_value, Component};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const DEFAULT_FETCH_PATH: &str = "/get/kinematics/assembly";
pub const DEFAULT_SUBMIT_PATH: &str = "/post/kinematics/assembly";

pub struct HttpAssemblySource {
    client: Client,
    base_url: String,
    fetch_path: String,
    submit_path: String,
}

impl HttpAssemblySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fetch_path: DEFAULT_FETCH_PATH.to_string(),
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
        }
    }

    pub fn with_paths(
        mut self,
        fetch_path: impl Into<String>,
        submit_path: impl Into<String>,
    ) -> Self {
        self.fetch_path = fetch_path.into();
        self.submit_path = submit_path.into();
        self
    }

    /// Apply a per-request timeout. Timed-out requests surface as network errors.
    pub fn with_timeout(mut self, timeout: Duration) -> SourceResult<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn do_fetch(&self) -> SourceResult<Component> {
        let url = self.url(&self.fetch_path);
        debug!("Fetching assembly from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Fetch failed {}: {}", status, error_text);
            return Err(SourceError::RequestFailed(format!("{}: {}", status, error_text)));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;
        Ok(document_from_value(value)?)
    }

    async fn do_submit(&self, document: &Component) -> SourceResult<Component> {
        let url = self.url(&self.submit_path);
        debug!("Submitting assembly to {}", url);

        let response = self.client.post(&url).json(document).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .map(|b| b.error)
                .unwrap_or(error_text);
            info!("Submission rejected {}: {}", status, message);
            return Err(SourceError::rejected(status.as_u16(), message));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;
        Ok(document_from_value(value)?)
    }
}

/// Rejection payload: `{"error": "..."}`. Anything else is passed through as text.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[async_trait::async_trait]
impl AssemblySource for HttpAssemblySource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, cancel: Option<CancellationToken>) -> SourceResult<Component> {
        cancellable(self.do_fetch(), cancel).await
    }

    async fn submit(
        &self,
        document: &Component,
        cancel: Option<CancellationToken>,
    ) -> SourceResult<Component> {
        cancellable(self.do_submit(document), cancel).await
    }
}
