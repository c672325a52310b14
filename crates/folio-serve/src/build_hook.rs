//! Site build trigger.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

/// Starts a rebuild of the static site and returns whatever the build
/// service reports.
#[async_trait]
pub trait BuildTrigger: Send + Sync {
    async fn trigger(&self) -> anyhow::Result<serde_json::Value>;
}

/// Calls a remote build service with `POST <url>`.
pub struct HttpBuildTrigger {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpBuildTrigger {
    pub fn new(url: String, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl BuildTrigger for HttpBuildTrigger {
    async fn trigger(&self) -> anyhow::Result<serde_json::Value> {
        let mut request = self.client.post(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("build request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("build service returned {status}");
        }

        let body = response
            .json()
            .await
            .context("build service returned invalid json")?;
        tracing::info!(url = %self.url, "site build started");
        Ok(body)
    }
}
