//! disease.sh REST client
//!
//! Thin reqwest wrapper. Bodies are read whole and decoded with simd-json.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{Snapshot, Timeline};
use super::StatsSource;
use crate::config::ApiConfig;

/// The read-only endpoints the dashboard consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Worldwide aggregate
    All,
    /// Every country's snapshot
    Countries,
    /// One country by ISO2 code (or name)
    Country(String),
    /// Worldwide cumulative timeline for the last N days
    HistoricalAll { last_days: u32 },
}

impl Endpoint {
    /// Path relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Endpoint::All => "/all".to_string(),
            Endpoint::Countries => "/countries".to_string(),
            Endpoint::Country(code) => format!("/countries/{}", urlencoding::encode(code)),
            Endpoint::HistoricalAll { last_days } => {
                format!("/historical/all?lastdays={last_days}")
            }
        }
    }
}

/// HTTP client for the disease.sh COVID-19 API
pub struct DiseaseClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl DiseaseClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("covid-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Absolute URL for an endpoint
    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, ApiError> {
        let url = self.url(&endpoint);
        tracing::debug!(%url, "GET");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(url.clone())
            } else {
                ApiError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let mut body = response.bytes().await?.to_vec();
        tracing::trace!(%url, bytes = body.len(), timeout = ?self.timeout, "response body read");

        simd_json::serde::from_slice(&mut body).map_err(|e| ApiError::Decode {
            url,
            error: e.to_string(),
        })
    }
}

#[async_trait]
impl StatsSource for DiseaseClient {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Snapshot, ApiError> {
        self.get(endpoint).await
    }

    async fn fetch_countries(&self) -> Result<Vec<Snapshot>, ApiError> {
        self.get(Endpoint::Countries).await
    }

    async fn fetch_timeline(&self, last_days: u32) -> Result<Timeline, ApiError> {
        self.get(Endpoint::HistoricalAll { last_days }).await
    }
}
