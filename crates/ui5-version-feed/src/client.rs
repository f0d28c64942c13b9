//! HTTP client for the UI5 version overview
//!
//! The overview is a single static JSON document, so the client is a thin
//! wrapper around one GET request with a configurable URL and timeout.

use crate::error::FeedError;
use crate::overview::VersionOverview;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Published location of the overview document.
pub const DEFAULT_OVERVIEW_URL: &str = "https://ui5.sap.com/versionoverview.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// URL of `versionoverview.json`
    pub overview_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with the request
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            overview_url: std::env::var("UI5VC_OVERVIEW_URL")
                .unwrap_or_else(|_| DEFAULT_OVERVIEW_URL.to_string()),
            timeout_secs: std::env::var("UI5VC_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("ui5-version-feed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FeedConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific overview URL
    pub fn new(overview_url: &str) -> Self {
        FeedConfig {
            overview_url: overview_url.to_string(),
            ..Self::default()
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Client for the version overview feed
#[derive(Debug, Clone)]
pub struct FeedClient {
    config: FeedConfig,
    http_client: reqwest::Client,
}

impl FeedClient {
    /// Create a new feed client
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Config(e.to_string()))?;

        Ok(FeedClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(FeedConfig::from_env())
    }

    /// Configured overview URL
    pub fn overview_url(&self) -> &str {
        &self.config.overview_url
    }

    /// Download and decode the version overview.
    pub async fn fetch_overview(&self) -> Result<VersionOverview> {
        let url = &self.config.overview_url;
        info!(url = %url, "Fetching UI5 version overview");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let overview = VersionOverview::from_json(&body)?;
        debug!(
            versions = overview.versions.len(),
            patches = overview.patches.len(),
            "Version overview decoded"
        );
        Ok(overview)
    }
}
