/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Stubs for the JSON api (`/api`) of vCenter.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tap::Pipe;

use crate::session::SessionId;

pub const SESSION_HEADER: &str = "vmware-api-session-id";

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("failed to send request to {0}: {1}")]
    SendRequest(String, #[source] reqwest::Error),
    #[error("failed to recieve response from {0}: {1}")]
    RecieveResponse(String, #[source] reqwest::Error),
    #[error("request to {0} failed {1}: {2}")]
    FailedRequest(String, StatusCode, String),
    #[error("failed to serialize json: {0}")]
    SerializeRequest(#[source] serde_json::Error),
    #[error("failed to deserialize json: {0}")]
    DeserializeResponse(#[source] serde_json::Error),
}

/// How a stub authenticates its requests.
#[derive(Clone)]
pub enum SecurityContext {
    UserPassword { username: String, password: String },
    Session(SessionId),
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserPassword { username, .. } => f
                .debug_struct("UserPassword")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Session(id) => f.debug_tuple("Session").field(id).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StubConfiguration {
    base_url: String,
    client: Client,
    security_context: SecurityContext,
}

impl StubConfiguration {
    pub fn security_context(&self) -> &SecurityContext {
        &self.security_context
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// A service that can be instantiated by the stub factory.
pub trait Service {
    fn new(config: StubConfiguration) -> Self;
}

#[derive(Clone, Debug)]
pub struct StubFactory {
    base_url: String,
    client: Client,
}

impl StubFactory {
    pub(crate) fn new(base_url: String, client: Client) -> Self {
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn create_stub<S: Service>(
        &self,
        security_context: SecurityContext,
    ) -> S {
        S::new(StubConfiguration {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            security_context,
        })
    }
}

/// Untyped access to json api resources.
#[derive(Clone, Debug)]
pub struct RestStub {
    config: StubConfiguration,
}

impl Service for RestStub {
    fn new(config: StubConfiguration) -> Self {
        Self { config }
    }
}

impl RestStub {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, RestError> {
        let url = self.config.url(path);
        debug!("{} {}", method, url);
        let mut req = self
            .config
            .client
            .request(method, &url)
            .header(header::ACCEPT, "application/json");
        req = match &self.config.security_context {
            SecurityContext::UserPassword { username, password } => {
                req.basic_auth(username, Some(password))
            }
            SecurityContext::Session(id) => {
                req.header(SESSION_HEADER, id.as_str())
            }
        };
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| RestError::SendRequest(url.clone(), e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RestError::RecieveResponse(url.clone(), e))?;
        trace!("response from {url}: {body}");

        if status.is_success() {
            Ok(body)
        } else {
            Err(RestError::FailedRequest(url, status, body))
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, RestError> {
        self.execute(Method::GET, path, None)
            .await?
            .as_str()
            .pipe(serde_json::from_str)
            .map_err(RestError::DeserializeResponse)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RestError> {
        let body =
            serde_json::to_value(body).map_err(RestError::SerializeRequest)?;
        self.execute(Method::POST, path, Some(body))
            .await?
            .as_str()
            .pipe(serde_json::from_str)
            .map_err(RestError::DeserializeResponse)
    }

    pub async fn delete(&self, path: &str) -> Result<(), RestError> {
        self.execute(Method::DELETE, path, None).await.map(drop)
    }
}

/// The api session service (`/api/session`).
#[derive(Clone, Debug)]
pub struct Session {
    stub: RestStub,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SessionInfo {
    pub user: String,
    pub created_time: DateTime<Utc>,
    pub last_accessed_time: DateTime<Utc>,
}

impl Service for Session {
    fn new(config: StubConfiguration) -> Self {
        Self {
            stub: RestStub::new(config),
        }
    }
}

impl Session {
    /// Create a session; the response is the session id as a json string.
    pub async fn create(&self) -> Result<SessionId, RestError> {
        self.stub
            .execute(Method::POST, "/session", None)
            .await?
            .as_str()
            .pipe(serde_json::from_str::<String>)
            .map(SessionId::new)
            .map_err(RestError::DeserializeResponse)
    }

    pub async fn get(&self) -> Result<SessionInfo, RestError> {
        self.stub.get("/session").await
    }

    pub async fn delete(&self) -> Result<(), RestError> {
        self.stub.delete("/session").await
    }
}
