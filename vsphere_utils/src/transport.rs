/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use reqwest::Client;
use soap::{SessionCookie, SoapClient};

use crate::{config::Config, error::TransportError};

pub(crate) const SDK_PATH: &str = "/sdk";
pub(crate) const API_PATH: &str = "/api";

/// The http client shared by all handles of a factory and its clients.
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    config: Config,
    client: Client,
}

impl Transport {
    pub(crate) async fn new(config: Config) -> Result<Self, TransportError> {
        let client = config.create_client().await?;
        Ok(Self { config, client })
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    /// A fresh soap handle on `path`.
    pub(crate) fn soap(
        &self,
        path: &str,
        action: &str,
        session: Option<SessionCookie>,
    ) -> SoapClient {
        let client = SoapClient::new(
            self.url(path),
            action.to_string(),
            self.client.clone(),
        );
        match session {
            Some(session) => client.with_session(session),
            None => client,
        }
    }
}
