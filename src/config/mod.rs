use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{AqsError, AqsResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ServerConfig,
    pub druid: DruidConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where the analytical engine lives. Every part is optional so a
/// deployment without Druid can still serve validation errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DruidConfig {
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub query_path: Option<String>,
    #[serde(default)]
    pub datasources: DruidDatasources,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DruidDatasources {
    #[serde(default)]
    pub mediawiki_history: Option<String>,
}

impl DruidConfig {
    /// Render `scheme://host:port/path`, leaving out absent parts.
    pub fn request_uri(&self) -> AqsResult<String> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| AqsError::Internal("Druid configuration not set".to_string()))?;

        let scheme = self
            .scheme
            .as_deref()
            .map(|s| format!("{s}://"))
            .unwrap_or_default();
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        let path = self.query_path.as_deref().unwrap_or("");

        Ok(format!("{scheme}{host}{port}{path}"))
    }

    pub fn mediawiki_history_datasource(&self) -> AqsResult<String> {
        self.datasources.mediawiki_history.clone().ok_or_else(|| {
            AqsError::Internal("Druid datasource configuration not set".to_string())
        })
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "7231".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let druid_port = match std::env::var("DRUID_PORT") {
            Ok(port) => Some(
                port.parse::<u16>()
                    .context("DRUID_PORT must be a valid port number")?,
            ),
            Err(_) => None,
        };

        let druid = DruidConfig {
            scheme: std::env::var("DRUID_SCHEME").ok(),
            host: std::env::var("DRUID_HOST").ok(),
            port: druid_port,
            query_path: std::env::var("DRUID_QUERY_PATH").ok(),
            datasources: DruidDatasources {
                mediawiki_history: std::env::var("DRUID_MEDIAWIKI_HISTORY_DATASOURCE").ok(),
            },
        };

        if druid.host.is_none() {
            tracing::warn!(
                "DRUID_HOST is not set; mediawiki history endpoints will answer with 500"
            );
        }

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            druid,
        })
    }
}
