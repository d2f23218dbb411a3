/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use reqwest::StatusCode;

use crate::{fault::Fault, from_xml::XmlInput};

pub type Result<T> = std::result::Result<T, SoapError>;

#[derive(thiserror::Error, Debug)]
pub enum SoapError {
    #[error("failed to send request to {0}: {1}")]
    Request(String, #[source] reqwest::Error),
    #[error("failed to receive response from {0}: {1}")]
    Response(String, #[source] reqwest::Error),
    #[error("request to {0} failed with status {1}: {2}")]
    Status(String, StatusCode, String),
    #[error("{0}")]
    Fault(Fault),
}

impl SoapError {
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

pub type ParseResult<'a, T> =
    std::result::Result<(T, XmlInput<'a>), ParseError>;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    Syntax(&'static str),
    #[error("unexpected tag: {0}")]
    UnexpectedTag(String),
    #[error("unexpected end tag: {0}")]
    UnexpectedEndTag(String),
    #[error("unexpected input: {0:?}")]
    Unexpected(xml::reader::XmlEvent),
    #[error("unexpected end of input")]
    Eof,
    #[error("failed to read xml: {0}")]
    Read(xml::reader::Error),
}
