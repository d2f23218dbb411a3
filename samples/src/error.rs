/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Vsphere(#[from] vsphere_utils::Error),
    #[error("{0}")]
    Vim(#[from] vim25::Error),
    #[error("unable to read config file {0}: {1}")]
    ReadConfig(PathBuf, #[source] std::io::Error),
    #[error("unable to parse config file {0}: {1}")]
    ParseConfig(PathBuf, #[source] serde_json::Error),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("{0} {1:?} not found")]
    NotFound(String, String),
    #[error("{0} is only available on vCenter")]
    Unsupported(&'static str),
    #[error("unable to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}
