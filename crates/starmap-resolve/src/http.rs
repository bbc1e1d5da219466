//! The reqwest-backed lookup client.
//!
//! One POST per group: repeated `systemName[]` form keys plus
//! `showCoordinates=1`. A non-success status fails the group with the
//! response body in the error; the caller treats that as fatal for the
//! whole batch.

use crate::{RawSystem, ResolveError, SystemLookup};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const STARMAP_RESOLVER_BASE_URL_ENV: &str = "STARMAP_RESOLVER_BASE_URL";
pub const STARMAP_HTTP_TIMEOUT_SECS_ENV: &str = "STARMAP_HTTP_TIMEOUT_SECS";

const DEFAULT_ENDPOINT: &str = "https://www.edsm.net/api-v1/systems";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const MAX_HTTP_TIMEOUT_SECS: u64 = 600;

fn parse_timeout_value(v: &str) -> Result<u64, ResolveError> {
    let v = v.trim();
    if v.is_empty() {
        return Ok(DEFAULT_HTTP_TIMEOUT_SECS);
    }
    let parsed = v.parse::<u64>().map_err(|_| {
        ResolveError::Config(format!(
            "invalid {STARMAP_HTTP_TIMEOUT_SECS_ENV}={v:?} (expected integer seconds)"
        ))
    })?;
    Ok(parsed.clamp(1, MAX_HTTP_TIMEOUT_SECS))
}

fn http_timeout_secs() -> Result<u64, ResolveError> {
    match std::env::var(STARMAP_HTTP_TIMEOUT_SECS_ENV) {
        Ok(v) => parse_timeout_value(&v),
        Err(std::env::VarError::NotPresent) => Ok(DEFAULT_HTTP_TIMEOUT_SECS),
        Err(e) => Err(ResolveError::Config(format!(
            "failed to read {STARMAP_HTTP_TIMEOUT_SECS_ENV}: {e}"
        ))),
    }
}

/// HTTP client for the coordinate service.
pub struct HttpSystemLookup {
    client: Client,
    endpoint: String,
}

impl HttpSystemLookup {
    /// Build against an explicit endpoint.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolveError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Build from the environment, falling back to the public service
    /// endpoint and the default timeout.
    pub fn from_env() -> Result<Self, ResolveError> {
        let endpoint = std::env::var(STARMAP_RESOLVER_BASE_URL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = Duration::from_secs(http_timeout_secs()?);
        Self::new(endpoint, timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SystemLookup for HttpSystemLookup {
    async fn fetch_group(&self, names: &[String]) -> Result<Vec<RawSystem>, ResolveError> {
        let mut form: Vec<(&str, &str)> = names
            .iter()
            .map(|n| ("systemName[]", n.as_str()))
            .collect();
        form.push(("showCoordinates", "1"));

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| ResolveError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "coordinate service rejected group");
            return Err(ResolveError::Service {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<RawSystem>>()
            .await
            .map_err(|e| ResolveError::InvalidResponse(e.to_string()))
    }
}
