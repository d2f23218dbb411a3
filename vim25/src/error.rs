/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use soap::{Fault, ParseError, SoapError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Soap(#[from] SoapError),
    #[error("failed to generate request: {0}")]
    GenerateRequest(#[from] xml::writer::Error),
    #[error("template could not be filled: {0}")]
    Template(Box<handlebars::RenderError>),
    #[error("failed to parse {0} response: {1}")]
    ParseResponse(&'static str, ParseError),
    #[error("failed to deserialize {0} response: {1}")]
    Deserialize(&'static str, serde_xml_rs::Error),
    #[error("missing return value in {0} response")]
    MissingReturnValue(&'static str),
    #[error("the service at {0} does not publish a service content")]
    NoServiceContent(&'static str),
}

impl Error {
    /// The remote fault, if the server answered with one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Soap(e) => e.fault(),
            _ => None,
        }
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(value: handlebars::RenderError) -> Self {
        Self::Template(Box::new(value))
    }
}
