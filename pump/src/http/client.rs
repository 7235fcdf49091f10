//! HTTP client implementation

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::errors::PumpError;

/// Options for the orchestration API client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Orchestration API endpoint, e.g. `http://heat.example:8004/v1/<tenant>`
    pub endpoint: String,

    /// Auth token sent as `X-Auth-Token`
    pub token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the orchestration API
pub struct HeatClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HeatClient {
    /// Create a new client
    pub fn new(options: &ClientOptions) -> Result<Self, PumpError> {
        if options.endpoint.is_empty() {
            return Err(PumpError::ConfigError(
                "orchestration endpoint is not set".to_string(),
            ));
        }
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            base_url: options.endpoint.trim_end_matches('/').to_string(),
            token: options.token.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PumpError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.header("X-Auth-Token", token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(PumpError::ApiError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }
}
