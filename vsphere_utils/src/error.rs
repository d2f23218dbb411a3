/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::path::PathBuf;

use crate::{vapi::RestError, version::VersionError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),
    #[error("{0}")]
    Version(#[from] VersionError),
    #[error("{0}")]
    Vim(#[from] vim25::Error),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Rest(#[from] RestError),
    /// The task failed; carries the server's localized message.
    #[error("{0}")]
    TaskFailed(String),
    #[error("timed out waiting for updates")]
    TimedOut,
}

impl Error {
    /// The remote fault, if the server answered with one.
    pub fn fault(&self) -> Option<&soap::Fault> {
        match self {
            Self::Vim(e) => e.fault(),
            Self::Authentication(
                AuthenticationError::Login(e)
                | AuthenticationError::ServiceContent(e),
            ) => e.fault(),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("login failed: {0}")]
    Login(#[source] vim25::Error),
    #[error("unable to retrieve the service content: {0}")]
    ServiceContent(#[source] vim25::Error),
    #[error("no {0} cookie in login response")]
    MissingSessionCookie(&'static str),
    #[error("failed to create api session: {0}")]
    ApiSession(#[source] RestError),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unable to open file {0}: {1}")]
    ReadFile(PathBuf, #[source] std::io::Error),
    #[error("unable to parse the provided certificate {0}: {1}")]
    ParseCertificate(PathBuf, #[source] reqwest::Error),
    #[error("unable to build a http client: {0}")]
    BuildClient(#[source] reqwest::Error),
}
