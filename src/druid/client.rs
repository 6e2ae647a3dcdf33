use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::query::DruidRequest;

/// Status and body of an analytical-engine answer. Bodies that are not
/// JSON are kept as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct DruidResponse {
    pub status: u16,
    pub body: Value,
}

impl DruidResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// Anything able to run a Druid query.
///
/// Error statuses are returned as responses; `Err` is reserved for transport
/// failures (connection refused, timeout, unreadable body).
#[async_trait]
pub trait DruidBackend: Send + Sync {
    async fn query(&self, request: &DruidRequest) -> Result<DruidResponse>;
}

pub struct HttpDruidClient {
    client: Client,
}

impl HttpDruidClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("aqs/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("failed to build HTTP client for Druid")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DruidBackend for HttpDruidClient {
    async fn query(&self, request: &DruidRequest) -> Result<DruidResponse> {
        let body = request
            .body_json()
            .context("failed to serialize Druid query")?;
        let mut builder = self
            .client
            .post(&request.uri)
            .timeout(request.timeout)
            .body(body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("failed to reach Druid at {}", request.uri))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .context("failed to read Druid response body")?;

        if status != 200 {
            warn!(status, uri = %request.uri, "Druid answered with an error status");
        } else {
            debug!(status, bytes = text.len(), "Druid query completed");
        }

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(DruidResponse { status, body })
    }
}
