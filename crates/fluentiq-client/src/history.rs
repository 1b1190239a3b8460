use fluentiq_core::config::ApiConfig;
use fluentiq_core::error::{FluentError, Result};
use fluentiq_core::{Session, SummaryStats};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Read-only client for the remote session history.
pub struct HistoryClient {
    client: reqwest::Client,
    base: Url,
}

impl HistoryClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| FluentError::Config(format!("Invalid api.base_url '{}': {}", config.base_url, e)))?;
        match base.scheme() {
            "http" | "https" => {}
            other => {
                return Err(FluentError::Config(format!(
                    "Scheme '{}' is not supported (only http/https)",
                    other
                )));
            }
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("fluentiq/0.1")
            .build()?;
        Ok(Self { client, base })
    }

    /// URL of `<base>/<path>`, tolerating a trailing slash on the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Upload endpoint for an asset kind (`audio`, `video`, ...).
    pub fn analyze_url(&self, asset_kind: &str) -> String {
        self.endpoint(&format!("analyze/{}", asset_kind))
    }

    /// `GET /history/all`, newest first by convention.
    pub async fn fetch_all(&self) -> Result<Vec<Session>> {
        let sessions: Vec<Session> = self.get_json("history/all").await?;
        tracing::info!("Fetched {} sessions", sessions.len());
        Ok(sessions)
    }

    /// `GET /history/summary`, the server-computed aggregate.
    pub async fn fetch_summary(&self) -> Result<SummaryStats> {
        self.get_json("history/summary").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FluentError::Remote {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
