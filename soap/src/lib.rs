/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod client;
mod error;
mod fault;
pub mod from_xml;
pub mod writer;

pub use client::{SessionCookie, SoapClient, SoapResponse};
pub use error::{ParseError, ParseResult, Result, SoapError};
pub use fault::Fault;
