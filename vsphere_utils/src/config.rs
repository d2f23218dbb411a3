/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::{path::Path, path::PathBuf, time::Duration};

use reqwest::{Certificate, Client};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 30;
pub const DEFAULT_READ_TIMEOUT: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub hostname: String,
    pub port: Option<u16>,
    #[serde(default)]
    pub https_strategy: HttpsStrategy,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpsStrategy {
    #[default]
    Strict,
    Specific(PathBuf),
    IgnoreHostname(Option<PathBuf>),
    IgnoreCertificate,
    Http,
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_read_timeout() -> u64 {
    DEFAULT_READ_TIMEOUT
}

impl Config {
    pub fn new<S: Into<String>>(hostname: S) -> Self {
        Self {
            hostname: hostname.into(),
            port: None,
            https_strategy: HttpsStrategy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub async fn create_client(&self) -> Result<Client, TransportError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("vsphere-sdk/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(self.connect_timeout))
            .timeout(Duration::from_secs(self.read_timeout))
            .danger_accept_invalid_hostnames(matches!(
                self.https_strategy,
                HttpsStrategy::IgnoreHostname(_)
            ))
            .danger_accept_invalid_certs(matches!(
                self.https_strategy,
                HttpsStrategy::IgnoreCertificate
            ));

        if let HttpsStrategy::Specific(path) = &self.https_strategy {
            let certificate = Self::load_certificate(path).await?;
            builder = builder
                .add_root_certificate(certificate)
                .tls_built_in_root_certs(false);
        }
        if let HttpsStrategy::IgnoreHostname(Some(path)) = &self.https_strategy
        {
            let certificate = Self::load_certificate(path).await?;
            builder = builder
                .add_root_certificate(certificate)
                .tls_built_in_root_certs(false);
        }

        builder.build().map_err(TransportError::BuildClient)
    }

    async fn load_certificate(
        path: &Path,
    ) -> Result<Certificate, TransportError> {
        let content = tokio::fs::read(&path)
            .await
            .map_err(|e| TransportError::ReadFile(path.to_path_buf(), e))?;
        Certificate::from_der(&content)
            .or_else(|_| Certificate::from_pem(&content))
            .map_err(|e| {
                TransportError::ParseCertificate(path.to_path_buf(), e)
            })
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.hostname, self.http_port())
    }

    pub fn scheme(&self) -> &'static str {
        matches!(self.https_strategy, HttpsStrategy::Http)
            .then_some("http")
            .unwrap_or("https")
    }

    pub fn http_port(&self) -> u16 {
        self.port.unwrap_or_else(|| {
            matches!(self.https_strategy, HttpsStrategy::Http)
                .then_some(80)
                .unwrap_or(DEFAULT_PORT)
        })
    }
}
